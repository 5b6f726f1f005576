// File: crates/formwire/src/field.rs
// Purpose: One validated field, its rule descriptors, and how results are shown

use crate::config::FormwireConfig;
use crate::platform::{attr_selector, Platform};
use crate::rule::{FieldSnapshot, RuleDescriptor};

/// Result of validating one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Valid,
    Invalid { rule: String, message: String },
}

impl FieldOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FieldOutcome::Valid)
    }
}

/// A form field with its rule descriptors, at most one per rule name.
#[derive(Debug, Clone)]
pub struct FieldValidator<E> {
    pub element: E,
    pub name: String,
    descriptors: Vec<RuleDescriptor>,
    outcome: Option<FieldOutcome>,
}

impl<E: Clone + PartialEq> FieldValidator<E> {
    pub fn new(element: E, name: String) -> Self {
        Self {
            element,
            name,
            descriptors: Vec::new(),
            outcome: None,
        }
    }

    /// Add `descriptor`, replacing any existing one for the same rule.
    pub fn set_descriptor(&mut self, descriptor: RuleDescriptor) {
        match self
            .descriptors
            .iter_mut()
            .find(|existing| existing.rule == descriptor.rule)
        {
            Some(slot) => *slot = descriptor,
            None => self.descriptors.push(descriptor),
        }
    }

    pub fn descriptors(&self) -> &[RuleDescriptor] {
        &self.descriptors
    }

    /// Outcome of the latest [`validate`](Self::validate) call.
    pub fn last_outcome(&self) -> Option<&FieldOutcome> {
        self.outcome.as_ref()
    }

    /// Evaluate every descriptor against the field's current state.
    /// The first failing rule decides the outcome.
    pub fn validate<P>(&mut self, platform: &P, form: &E, config: &FormwireConfig) -> FieldOutcome
    where
        P: Platform<Element = E>,
    {
        let snapshot = FieldSnapshot::capture(platform, form, &self.element, config);
        let outcome = self
            .descriptors
            .iter()
            .find(|descriptor| !descriptor.evaluate(&snapshot))
            .map(|failed| FieldOutcome::Invalid {
                rule: failed.rule.clone(),
                message: failed.message.clone(),
            })
            .unwrap_or(FieldOutcome::Valid);

        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Reflect `outcome` on the page: error class, `aria-invalid`, and the
    /// `[data-valmsg-for="<name>"]` placeholder inside `form`, when present.
    pub fn render<P>(
        &self,
        platform: &P,
        form: &E,
        outcome: &FieldOutcome,
        config: &FormwireConfig,
    ) where
        P: Platform<Element = E>,
    {
        let placeholder = if self.name.is_empty() {
            None
        } else {
            platform.query_first(form, &attr_selector(&config.message_attribute, &self.name))
        };

        match outcome {
            FieldOutcome::Valid => {
                platform.remove_class(&self.element, &config.error_class);
                platform.remove_attribute(&self.element, "aria-invalid");
                if let Some(placeholder) = placeholder {
                    platform.set_text(&placeholder, "");
                }
            }
            FieldOutcome::Invalid { message, .. } => {
                platform.add_class(&self.element, &config.error_class);
                platform.set_attribute(&self.element, "aria-invalid", "true");
                if let Some(placeholder) = placeholder {
                    platform.set_text(&placeholder, message);
                }
            }
        }
    }
}
