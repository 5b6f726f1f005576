//! Bundled validation rules
//!
//! Each rule is a factory turning a [`FieldSnapshot`](crate::rule::FieldSnapshot)
//! into a [`RuleDescriptor`](crate::rule::RuleDescriptor). Everything except
//! `required` passes on empty values so rules compose.

pub mod required;
pub mod string;

use crate::registry::RuleRegistry;

pub use required::required;
pub use string::{email, equal_to, length, regex, url};

/// Register every bundled rule on `registry`.
pub fn register_all(registry: &mut RuleRegistry) {
    registry
        .add_rule("required", required)
        .add_rule("length", length)
        .add_rule("email", email)
        .add_rule("url", url)
        .add_rule("regex", regex)
        .add_rule("equalto", equal_to);
}
