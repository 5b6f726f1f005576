//! Form validation controller
//!
//! One [`FormValidation`] per form. Lifecycle:
//!
//! ```text
//! Uninitialized --init_rules--> RulesBuilt --set_up_events--> Listening
//! ```
//!
//! A form without any declared rule never leaves `Uninitialized`: no listeners,
//! no page changes, submissions pass straight through.

use crate::ajax::wants_ajax;
use crate::config::FormwireConfig;
use crate::error::UnknownRule;
use crate::field::{FieldOutcome, FieldValidator};
use crate::platform::{EventKind, Platform};
use crate::registry::RuleRegistry;
use crate::rule::{declared_rule_names, FieldSnapshot};
use std::fmt::Debug;
use std::sync::Arc;

const FIELD_SELECTOR: &str = "input, select, textarea";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    RulesBuilt,
    Listening,
}

/// What the host should do with a submit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitDecision {
    /// Let the browser submit natively.
    Proceed,
    /// Cancel native submission and hand the form to the AJAX submitter.
    Ajax,
    /// Cancel submission; at least one field failed.
    Block,
}

impl SubmitDecision {
    pub fn prevents_default(self) -> bool {
        !matches!(self, SubmitDecision::Proceed)
    }
}

#[derive(Debug)]
pub struct FormValidation<E> {
    form: E,
    config: Arc<FormwireConfig>,
    fields: Vec<FieldValidator<E>>,
    declared: Vec<Vec<String>>,
    state: ControllerState,
}

impl<E: Clone + PartialEq + Debug> FormValidation<E> {
    /// Discover the fields of `form` that declare at least one rule.
    pub fn new<P>(platform: &P, form: E, config: Arc<FormwireConfig>) -> Self
    where
        P: Platform<Element = E>,
    {
        let mut fields = Vec::new();
        let mut declared = Vec::new();
        for element in platform.query_all(&form, FIELD_SELECTOR) {
            let rules = declared_rule_names(platform, &element, &config);
            if rules.is_empty() {
                continue;
            }
            let name = platform.attribute(&element, "name").unwrap_or_default();
            fields.push(FieldValidator::new(element, name));
            declared.push(rules);
        }

        Self {
            form,
            config,
            fields,
            declared,
            state: ControllerState::Uninitialized,
        }
    }

    pub fn form(&self) -> &E {
        &self.form
    }

    pub fn fields(&self) -> &[FieldValidator<E>] {
        &self.fields
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Resolve each field's declared rules against `registry` and build their
    /// descriptors. Unknown names are skipped and returned.
    pub fn init_rules<P>(&mut self, platform: &P, registry: &RuleRegistry) -> Vec<UnknownRule>
    where
        P: Platform<Element = E>,
    {
        if !self.has_fields() {
            return Vec::new();
        }

        let mut unknown = Vec::new();
        for (field, rules) in self.fields.iter_mut().zip(&self.declared) {
            let snapshot =
                FieldSnapshot::capture(platform, &self.form, &field.element, &self.config);
            for rule in rules {
                match registry.get_rule(rule) {
                    Ok(factory) => field.set_descriptor(factory(&snapshot)),
                    Err(_) => unknown.push(UnknownRule {
                        field: field.name.clone(),
                        rule: rule.clone(),
                    }),
                }
            }
        }

        for issue in &unknown {
            tracing::warn!("{}; rule skipped", issue);
        }
        self.state = ControllerState::RulesBuilt;
        unknown
    }

    /// Subscribe to field and submit events. No-op unless rules are built.
    pub fn set_up_events<P>(&mut self, platform: &P)
    where
        P: Platform<Element = E>,
    {
        if self.state != ControllerState::RulesBuilt {
            return;
        }
        platform.listen(&self.form, &EventKind::ALL);
        self.state = ControllerState::Listening;
    }

    /// Drop the event subscription.
    pub fn teardown<P>(&mut self, platform: &P)
    where
        P: Platform<Element = E>,
    {
        if self.state == ControllerState::Listening {
            platform.unlisten(&self.form);
            self.state = ControllerState::RulesBuilt;
        }
    }

    /// React to an event raised on `target` inside this form.
    ///
    /// Field events re-validate the fields `target` affects (the field itself, or
    /// every validated field sharing its name) and return `None`. Submit events
    /// validate everything and return the decision.
    pub fn handle_event<P>(
        &mut self,
        platform: &P,
        kind: EventKind,
        target: &E,
    ) -> Option<SubmitDecision>
    where
        P: Platform<Element = E>,
    {
        if self.state != ControllerState::Listening {
            return None;
        }

        match kind {
            EventKind::Submit => {
                if !self.validate_all(platform) {
                    tracing::debug!("submission blocked by failing fields");
                    return Some(SubmitDecision::Block);
                }
                Some(if wants_ajax(platform, &self.form, &self.config) {
                    SubmitDecision::Ajax
                } else {
                    SubmitDecision::Proceed
                })
            }
            EventKind::Input | EventKind::Change | EventKind::Blur => {
                let target_name = platform.attribute(target, "name").unwrap_or_default();
                let config = Arc::clone(&self.config);
                let form = &self.form;
                let affected = |field: &&mut FieldValidator<E>| {
                    field.element == *target
                        || (!target_name.is_empty() && field.name == target_name)
                };
                for field in self.fields.iter_mut().filter(affected) {
                    let outcome = field.validate(platform, form, &config);
                    field.render(platform, form, &outcome, &config);
                }
                None
            }
        }
    }

    /// Validate and render every field. Returns the aggregate validity.
    pub fn validate_all<P>(&mut self, platform: &P) -> bool
    where
        P: Platform<Element = E>,
    {
        let config = Arc::clone(&self.config);
        let form = &self.form;
        let mut valid = true;
        for field in self.fields.iter_mut() {
            let outcome = field.validate(platform, form, &config);
            field.render(platform, form, &outcome, &config);
            valid &= outcome.is_valid();
        }
        valid
    }

    /// Aggregate of the latest evaluation; fields never evaluated count as valid.
    pub fn is_valid(&self) -> bool {
        self.fields
            .iter()
            .all(|field| field.last_outcome().map_or(true, FieldOutcome::is_valid))
    }

    /// Latest failures as `(field name, message)`.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|field| match field.last_outcome() {
                Some(FieldOutcome::Invalid { message, .. }) => {
                    Some((field.name.clone(), message.clone()))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPage;
    use pretty_assertions::assert_eq;

    fn controller(page: &MemoryPage) -> FormValidation<crate::memory::NodeId> {
        let form = page.find("form").unwrap();
        FormValidation::new(page, form, Arc::new(FormwireConfig::default()))
    }

    #[test]
    fn test_state_machine() {
        let page = MemoryPage::from_html(r#"<form><input name="a" data-val-required="A?"></form>"#);
        let registry = RuleRegistry::with_builtin_rules();
        let mut val = controller(&page);
        let form = *val.form();

        assert_eq!(val.state(), ControllerState::Uninitialized);
        val.set_up_events(&page);
        assert_eq!(page.listener_count(form), 0);

        assert!(val.init_rules(&page, &registry).is_empty());
        assert_eq!(val.state(), ControllerState::RulesBuilt);

        val.set_up_events(&page);
        val.set_up_events(&page);
        assert_eq!(val.state(), ControllerState::Listening);
        assert_eq!(page.listener_count(form), 1);
        assert_eq!(page.listened_events(form), EventKind::ALL.to_vec());

        val.teardown(&page);
        assert_eq!(page.listener_count(form), 0);
    }

    #[test]
    fn test_form_without_rules_is_left_alone() {
        let page = MemoryPage::from_html(r#"<form><input name="a" data-val="true"><button type="submit">Go</button></form>"#);
        let registry = RuleRegistry::with_builtin_rules();
        let mut val = controller(&page);
        let form = *val.form();

        assert!(!val.has_fields());
        val.init_rules(&page, &registry);
        val.set_up_events(&page);

        assert_eq!(val.state(), ControllerState::Uninitialized);
        assert_eq!(page.listener_count(form), 0);
        assert_eq!(val.handle_event(&page, EventKind::Submit, &form), None);
    }

    #[test]
    fn test_unknown_rules_are_reported_and_skipped() {
        let page = MemoryPage::from_html(
            r#"<form><input name="a" data-val-required="A?" data-val-mystery="??"></form>"#,
        );
        let registry = RuleRegistry::with_builtin_rules();
        let mut val = controller(&page);

        let unknown = val.init_rules(&page, &registry);
        assert_eq!(
            unknown,
            vec![UnknownRule {
                field: "a".into(),
                rule: "mystery".into()
            }]
        );
        assert_eq!(val.fields()[0].descriptors().len(), 1);
    }

    #[test]
    fn test_submit_decisions() {
        let page = MemoryPage::from_html(
            r#"<form data-ajax="true"><input name="a" data-val-required="A?"><span data-valmsg-for="a"></span></form>"#,
        );
        let registry = RuleRegistry::with_builtin_rules();
        let mut val = controller(&page);
        let form = *val.form();
        let input = page.find("input").unwrap();
        val.init_rules(&page, &registry);
        val.set_up_events(&page);

        assert_eq!(val.handle_event(&page, EventKind::Submit, &form), Some(SubmitDecision::Block));
        assert!(!val.is_valid());
        assert_eq!(val.errors(), vec![("a".to_string(), "A?".to_string())]);

        page.set_value(input, "x");
        assert_eq!(val.handle_event(&page, EventKind::Input, &input), None);
        assert!(val.is_valid());
        assert_eq!(page.text(page.find("span").unwrap()), "");

        assert_eq!(val.handle_event(&page, EventKind::Submit, &form), Some(SubmitDecision::Ajax));
        page.remove_attribute(&form, "data-ajax");
        assert_eq!(val.handle_event(&page, EventKind::Submit, &form), Some(SubmitDecision::Proceed));
    }

    #[test]
    fn test_group_member_change_revalidates_declaring_field() {
        let page = MemoryPage::from_html(
            r#"<form><input type="checkbox" name="c" id="first" data-val-required="Pick">
               <input type="checkbox" name="c" id="second"></form>"#,
        );
        let registry = RuleRegistry::with_builtin_rules();
        let mut val = controller(&page);
        let form = *val.form();
        let second = page.find("#second").unwrap();
        val.init_rules(&page, &registry);
        val.set_up_events(&page);

        val.handle_event(&page, EventKind::Submit, &form);
        assert!(!val.is_valid());

        page.set_checked(second, true);
        val.handle_event(&page, EventKind::Change, &second);
        assert!(val.is_valid());
    }
}
