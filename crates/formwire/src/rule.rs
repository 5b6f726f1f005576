// File: crates/formwire/src/rule.rs
// Purpose: Rule descriptors and the per-evaluation field snapshot they run against

use crate::config::FormwireConfig;
use crate::platform::{attr_selector, Platform};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Custom predicate: `(rule, value) -> valid`.
pub type Validator = Arc<dyn Fn(&RuleDescriptor, &FieldValue<'_>) -> bool + Send + Sync>;

/// Value transform applied before validation. Never written back to the field.
pub type Transform = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    String,
    Boolean,
}

/// How to validate one field against one rule.
#[derive(Clone)]
pub struct RuleDescriptor {
    pub rule: String,
    pub kind: RuleKind,
    pub required: bool,
    pub message: String,
    pub validator: Option<Validator>,
    pub transform: Option<Transform>,
}

impl fmt::Debug for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("rule", &self.rule)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("message", &self.message)
            .field("validator", &self.validator.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl RuleDescriptor {
    pub fn new(rule: impl Into<String>, kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            kind,
            required: false,
            message: message.into(),
            validator: None,
            transform: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&RuleDescriptor, &FieldValue<'_>) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Raw field text after this rule's transform.
    pub fn transformed(&self, raw: &str) -> String {
        match &self.transform {
            Some(transform) => transform(raw),
            None => raw.to_string(),
        }
    }

    /// Whether `field` satisfies this rule.
    pub fn evaluate(&self, field: &FieldSnapshot) -> bool {
        let text = self.transformed(&field.value);
        let value = FieldValue {
            text: &text,
            field,
        };

        match &self.validator {
            Some(validator) => validator(self, &value),
            None if !self.required => true,
            None => match self.kind {
                RuleKind::String => !text.is_empty(),
                RuleKind::Boolean => field.checked,
            },
        }
    }
}

/// What a validator sees: the transformed text plus the field it came from.
#[derive(Debug, Clone, Copy)]
pub struct FieldValue<'a> {
    pub text: &'a str,
    pub field: &'a FieldSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// `<input>` of any text-like type (text, email, password, number, ...)
    Text,
    Checkbox,
    Radio,
    File,
    Select,
    TextArea,
}

impl FieldKind {
    pub fn of<P: Platform>(platform: &P, field: &P::Element) -> Self {
        match platform.tag_name(field).as_str() {
            "select" => FieldKind::Select,
            "textarea" => FieldKind::TextArea,
            _ => match platform
                .attribute(field, "type")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str()
            {
                "checkbox" => FieldKind::Checkbox,
                "radio" => FieldKind::Radio,
                "file" => FieldKind::File,
                _ => FieldKind::Text,
            },
        }
    }
}

/// Everything a rule may read about one field at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    pub checked: bool,
    pub file_count: usize,
    /// Checked state of every element in the page sharing this checkbox's or
    /// radio's name, this one included. Empty for other kinds.
    pub group: Vec<bool>,
    /// Declarations with the rule prefix stripped: `required` -> message,
    /// `length-min` -> parameter.
    pub declarations: BTreeMap<String, String>,
    /// Current values of fields named by `*-other` parameters, keyed by the
    /// parameter value (`*.` prefixes are accepted and ignored for lookup).
    pub related: BTreeMap<String, String>,
}

impl FieldSnapshot {
    pub fn capture<P: Platform>(
        platform: &P,
        form: &P::Element,
        field: &P::Element,
        config: &FormwireConfig,
    ) -> Self {
        let name = platform.attribute(field, "name").unwrap_or_default();
        let kind = FieldKind::of(platform, field);
        let declarations = declarations(platform, field, config);

        let grouped = matches!(kind, FieldKind::Checkbox | FieldKind::Radio);
        let group = if grouped && !name.is_empty() {
            let root = platform.document();
            platform
                .query_all(&root, &attr_selector("name", &name))
                .iter()
                .map(|member| platform.is_checked(member))
                .collect()
        } else {
            Vec::new()
        };

        let related = declarations
            .iter()
            .filter(|(key, _)| key.ends_with("-other"))
            .filter_map(|(_, other)| {
                let name = other.trim_start_matches("*.");
                platform
                    .query_first(form, &attr_selector("name", name))
                    .map(|el| (other.clone(), platform.field_value(&el)))
            })
            .collect();

        Self {
            value: platform.field_value(field),
            checked: platform.is_checked(field),
            file_count: platform.file_count(field),
            name,
            kind,
            group,
            declarations,
            related,
        }
    }

    /// Rule names declared on the field (keys without a parameter suffix).
    pub fn declared_rules(&self) -> impl Iterator<Item = &str> {
        self.declarations
            .keys()
            .filter(|key| !key.contains('-'))
            .map(String::as_str)
    }

    /// Message declared for `rule`; empty when the attribute has no value.
    pub fn message(&self, rule: &str) -> String {
        self.declarations.get(rule).cloned().unwrap_or_default()
    }

    /// `data-val-<rule>-<param>` value.
    pub fn param(&self, rule: &str, param: &str) -> Option<&str> {
        self.declarations
            .get(&format!("{}-{}", rule, param))
            .map(String::as_str)
    }
}

/// Rule declarations on `field`, in attribute order, with the prefix stripped.
pub fn declared_rule_names<P: Platform>(
    platform: &P,
    field: &P::Element,
    config: &FormwireConfig,
) -> Vec<String> {
    platform
        .attributes(field)
        .into_iter()
        .filter_map(|(name, _)| {
            name.strip_prefix(config.rule_prefix.as_str())
                .filter(|rule| !rule.is_empty() && !rule.contains('-'))
                .map(str::to_string)
        })
        .collect()
}

fn declarations<P: Platform>(
    platform: &P,
    field: &P::Element,
    config: &FormwireConfig,
) -> BTreeMap<String, String> {
    platform
        .attributes(field)
        .into_iter()
        .filter_map(|(name, value)| {
            name.strip_prefix(config.rule_prefix.as_str())
                .filter(|key| !key.is_empty())
                .map(|key| (key.to_string(), value))
        })
        .collect()
}
