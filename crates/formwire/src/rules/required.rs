// File: crates/formwire/src/rules/required.rs
// Purpose: The `required` rule for checkbox groups, single checkboxes, file inputs and text

use crate::rule::{FieldKind, FieldSnapshot, RuleDescriptor, RuleKind};

/// `data-val-required="<message>"`
///
/// - checkbox or radio sharing its name with other elements: at least one of them checked
/// - lone checkbox or radio: checked
/// - file input: at least one file selected
/// - anything else: non-empty once trimmed (whitespace-only is invalid)
pub fn required(field: &FieldSnapshot) -> RuleDescriptor {
    let message = field.message("required");

    match field.kind {
        FieldKind::Checkbox | FieldKind::Radio if field.group.len() > 1 => {
            RuleDescriptor::new("required", RuleKind::Boolean, message)
                .required()
                .with_validator(|_, value| value.field.group.iter().any(|checked| *checked))
        }
        FieldKind::Checkbox | FieldKind::Radio => {
            RuleDescriptor::new("required", RuleKind::Boolean, message)
                .required()
                .with_validator(|_, value| value.field.checked)
        }
        FieldKind::File => RuleDescriptor::new("required", RuleKind::String, message)
            .required()
            .with_validator(|_, value| value.field.file_count > 0),
        _ => RuleDescriptor::new("required", RuleKind::String, message)
            .required()
            .with_transform(|value| value.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormwireConfig;
    use crate::memory::MemoryPage;
    use crate::platform::Platform;
    use rstest::rstest;

    fn evaluate(page: &MemoryPage, selector: &str) -> bool {
        let form = page.find("form").unwrap();
        let field = page.find(selector).unwrap();
        let snapshot = FieldSnapshot::capture(page, &form, &field, &FormwireConfig::default());
        required(&snapshot).evaluate(&snapshot)
    }

    #[rstest]
    #[case("", false)]
    #[case("   ", false)]
    #[case("\t\n", false)]
    #[case("x", true)]
    #[case("  x  ", true)]
    fn test_text_requires_trimmed_value(#[case] value: &str, #[case] valid: bool) {
        let page = MemoryPage::from_html(r#"<form><input name="n" data-val-required="Name?"></form>"#);
        let input = page.find("input").unwrap();
        page.set_value(input, value);

        assert_eq!(evaluate(&page, "input"), valid);
    }

    #[test]
    fn test_transform_is_trim_and_field_is_untouched() {
        let page = MemoryPage::from_html(r#"<form><input name="n" value="  hi  " data-val-required="Name?"></form>"#);
        let form = page.find("form").unwrap();
        let input = page.find("input").unwrap();
        let snapshot = FieldSnapshot::capture(&page, &form, &input, &FormwireConfig::default());
        let rule = required(&snapshot);

        assert_eq!(rule.kind, RuleKind::String);
        assert_eq!(rule.message, "Name?");
        assert_eq!(rule.transformed(&snapshot.value), "hi");
        assert!(rule.evaluate(&snapshot));
        assert_eq!(page.field_value(&input), "  hi  ");
    }

    #[rstest]
    #[case(false, false)]
    #[case(true, true)]
    fn test_lone_checkbox_requires_checked(#[case] checked: bool, #[case] valid: bool) {
        let page = MemoryPage::from_html(r#"<form><input type="checkbox" name="tos" data-val-required="Accept"></form>"#);
        let input = page.find("input").unwrap();
        page.set_checked(input, checked);

        assert_eq!(evaluate(&page, "input"), valid);
    }

    #[rstest]
    #[case(&[false, false, false], false)]
    #[case(&[false, false, true], true)]
    #[case(&[true, true, false], true)]
    fn test_checkbox_group_requires_any_checked(#[case] states: &[bool], #[case] valid: bool) {
        let page = MemoryPage::from_html(
            r#"<form>
                <input type="checkbox" name="c" value="a" data-val-required="Pick one">
                <input type="checkbox" name="c" value="b">
                <input type="checkbox" name="c" value="c">
            </form>"#,
        );
        let root = page.document();
        for (input, checked) in page.query_all(&root, "input").into_iter().zip(states) {
            page.set_checked(input, *checked);
        }

        assert_eq!(evaluate(&page, "[data-val-required]"), valid);
    }

    #[rstest]
    #[case(&[false, false], false)]
    #[case(&[false, true], true)]
    fn test_radio_group_requires_any_checked(#[case] states: &[bool], #[case] valid: bool) {
        let page = MemoryPage::from_html(
            r#"<form>
                <input type="radio" name="size" value="s" data-val-required="Pick a size">
                <input type="radio" name="size" value="l">
            </form>"#,
        );
        let root = page.document();
        for (input, checked) in page.query_all(&root, "input").into_iter().zip(states) {
            page.set_checked(input, *checked);
        }

        assert_eq!(evaluate(&page, "[data-val-required]"), valid);
    }

    #[rstest]
    #[case(&[], false)]
    #[case(&["a.png"], true)]
    #[case(&["a.png", "b.png"], true)]
    fn test_file_requires_selection(#[case] files: &[&str], #[case] valid: bool) {
        let page = MemoryPage::from_html(r#"<form><input type="file" name="f" data-val-required="Upload"></form>"#);
        let input = page.find("input").unwrap();
        page.set_files(input, files);

        assert_eq!(evaluate(&page, "input"), valid);
    }
}
