// File: crates/formwire/src/error.rs
// Purpose: Error type shared by rule resolution, initialization and AJAX submission

use thiserror::Error;

/// A rule name declared on a field that has no registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRule {
    /// `name` attribute of the declaring field (empty when the field has none)
    pub field: String,
    pub rule: String,
}

impl std::fmt::Display for UnknownRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field '{}' declares unknown rule '{}'", self.field, self.rule)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no rule registered under '{0}'")]
    UnknownRule(String),

    #[error("form declares {} unknown rule(s): {}", .0.len(), join(.0))]
    UnknownRules(Vec<UnknownRule>),

    #[error("form has no '{0}' attribute naming the element to update")]
    MissingUpdateTarget(String),

    #[error("no element matches update target '{0}'")]
    TargetNotFound(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn join(rules: &[UnknownRule]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_rules_message_lists_each_rule() {
        let err = Error::UnknownRules(vec![
            UnknownRule {
                field: "email".into(),
                rule: "mx".into(),
            },
            UnknownRule {
                field: "age".into(),
                rule: "range".into(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "form declares 2 unknown rule(s): field 'email' declares unknown rule 'mx'; \
             field 'age' declares unknown rule 'range'"
        );
    }
}
