//! Integration tests for rule resolution and form initialization.

use formwire::memory::{MemoryPage, NodeId};
use formwire::*;
use pretty_assertions::assert_eq;

fn initializer(registry: RuleRegistry) -> FormInitializer<NodeId> {
    FormInitializer::new(registry, FormwireConfig::default())
}

#[test]
fn test_init_forms_covers_every_form() {
    let page = MemoryPage::from_html(
        r#"<form id="a"><input name="x" data-val-required="X?"></form>
           <form id="b"><input name="y"></form>
           <form id="c"><input name="z" data-val-required="Z?" data-val-unknown="?"></form>"#,
    );
    let mut init = initializer(RuleRegistry::with_builtin_rules());

    let outcomes: Vec<InitOutcome> = init
        .init_forms(&page)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![
            InitOutcome::Initialized { issues: vec![] },
            InitOutcome::Skipped,
            InitOutcome::Initialized {
                issues: vec![UnknownRule {
                    field: "z".into(),
                    rule: "unknown".into()
                }]
            },
        ]
    );
    assert!(init.is_watching());
    assert_eq!(init.forms().count(), 2);
}

#[test]
fn test_form_updated_initializes_injected_forms_once() {
    let page = MemoryPage::from_html(
        r#"<form id="existing"><input name="x" data-val-required="X?"></form><div id="slot"></div>"#,
    );
    let mut init = initializer(RuleRegistry::with_builtin_rules());
    init.init_forms(&page);

    let slot = page.find("#slot").unwrap();
    page.set_inner_html(
        &slot,
        r#"<form id="injected"><input name="y" data-val-required="Y?"></form>"#,
    );

    let body = page.body();
    let outcomes: Vec<InitOutcome> = init
        .handle_form_updated(&page, &body)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![
            InitOutcome::AlreadyInitialized,
            InitOutcome::Initialized { issues: vec![] },
        ]
    );
    let existing = page.find("#existing").unwrap();
    let injected = page.find("#injected").unwrap();
    assert_eq!(page.listener_count(existing), 1);
    assert_eq!(page.listener_count(injected), 1);
}

#[test]
fn test_form_updated_from_a_form_includes_it() {
    let page = MemoryPage::from_html(r#"<div id="slot"></div>"#);
    let mut init = initializer(RuleRegistry::with_builtin_rules());
    init.init_forms(&page);

    let slot = page.find("#slot").unwrap();
    page.set_inner_html(&slot, r#"<form id="f"><input name="y" data-val-required="Y?"></form>"#);
    let form = page.find("#f").unwrap();

    init.handle_form_updated(&page, &form);
    assert!(init.validator_for(&form).is_some());
}

#[test]
fn test_reregistered_rule_is_the_one_used() {
    let page = MemoryPage::from_html(
        r#"<form><input name="code" value="abc" data-val-required="Code?"><span data-valmsg-for="code"></span></form>"#,
    );
    let mut registry = RuleRegistry::with_builtin_rules();
    registry.add_rule("required", |field| {
        RuleDescriptor::new("required", RuleKind::String, format!("{} must be digits", field.name))
            .required()
            .with_validator(|_, value| value.text.chars().all(|c| c.is_ascii_digit()))
    });
    let mut init = initializer(registry);
    init.init_forms(&page);
    let form = page.find("form").unwrap();

    assert_eq!(
        init.handle_event(&page, &form, EventKind::Submit, &form),
        Some(SubmitDecision::Block)
    );
    assert_eq!(page.text(page.find("span").unwrap()), "code must be digits");
}

#[test]
fn test_blur_and_input_revalidate_single_field() {
    let page = MemoryPage::from_html(
        r#"<form>
             <input id="a" name="a" data-val-required="A?">
             <input id="b" name="b" data-val-required="B?">
           </form>"#,
    );
    let mut init = initializer(RuleRegistry::with_builtin_rules());
    init.init_forms(&page);
    let form = page.find("form").unwrap();
    let a = page.find("#a").unwrap();
    let b = page.find("#b").unwrap();

    init.handle_event(&page, &form, EventKind::Blur, &a);
    assert!(page.has_class(a, "input-validation-error"));
    assert!(!page.has_class(b, "input-validation-error"));

    page.set_value(a, "filled");
    init.handle_event(&page, &form, EventKind::Input, &a);
    assert!(!page.has_class(a, "input-validation-error"));
    assert_eq!(page.field_value(&a), "filled");
}

#[test]
fn test_whitespace_only_is_invalid_and_not_trimmed_in_place() {
    let page = MemoryPage::from_html(r#"<form><input name="t" value="   " data-val-required="T?"></form>"#);
    let mut init = initializer(RuleRegistry::with_builtin_rules());
    init.init_forms(&page);
    let form = page.find("form").unwrap();
    let input = page.find("input").unwrap();

    assert_eq!(
        init.handle_event(&page, &form, EventKind::Submit, &form),
        Some(SubmitDecision::Block)
    );
    assert_eq!(page.field_value(&input), "   ");
}
