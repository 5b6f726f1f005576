// File: crates/formwire/src/rules/string.rs
// Purpose: Text rules: length, email, url, regex, equalto

use crate::rule::{FieldSnapshot, RuleDescriptor, RuleKind};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]{1,64}@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
        .unwrap()
});

fn usize_param(field: &FieldSnapshot, rule: &str, param: &str) -> Option<usize> {
    let raw = field.param(rule, param)?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(
                "field '{}': ignoring non-numeric {}-{} '{}'",
                field.name,
                rule,
                param,
                raw
            );
            None
        }
    }
}

/// `data-val-length` with `-min` / `-max`, counted in characters of the trimmed value.
pub fn length(field: &FieldSnapshot) -> RuleDescriptor {
    let min = usize_param(field, "length", "min");
    let max = usize_param(field, "length", "max");

    RuleDescriptor::new("length", RuleKind::String, field.message("length"))
        .with_transform(|value| value.trim().to_string())
        .with_validator(move |_, value| {
            if value.text.is_empty() {
                return true;
            }
            let count = value.text.chars().count();
            min.map_or(true, |min| count >= min) && max.map_or(true, |max| count <= max)
        })
}

/// `data-val-email`
pub fn email(field: &FieldSnapshot) -> RuleDescriptor {
    RuleDescriptor::new("email", RuleKind::String, field.message("email"))
        .with_transform(|value| value.trim().to_string())
        .with_validator(|_, value| {
            value.text.is_empty() || (EMAIL.is_match(value.text) && !value.text.contains(".."))
        })
}

/// `data-val-url`: http or https with a dotted host.
pub fn url(field: &FieldSnapshot) -> RuleDescriptor {
    RuleDescriptor::new("url", RuleKind::String, field.message("url"))
        .with_transform(|value| value.trim().to_string())
        .with_validator(|_, value| value.text.is_empty() || is_valid_url(value.text))
}

fn is_valid_url(url: &str) -> bool {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);

    !host.is_empty()
        && host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && !url.chars().any(char::is_whitespace)
}

/// `data-val-regex` with `-pattern`; the whole value must match.
/// A missing or invalid pattern fails every non-empty value.
pub fn regex(field: &FieldSnapshot) -> RuleDescriptor {
    let pattern = field.param("regex", "pattern").unwrap_or_default();
    let compiled = match Regex::new(&format!("^(?:{})$", pattern)) {
        Ok(re) if !pattern.is_empty() => Some(re),
        Ok(_) => {
            tracing::warn!("field '{}': regex rule without a pattern", field.name);
            None
        }
        Err(e) => {
            tracing::warn!("field '{}': invalid regex pattern: {}", field.name, e);
            None
        }
    };

    RuleDescriptor::new("regex", RuleKind::String, field.message("regex")).with_validator(
        move |_, value| {
            value.text.is_empty()
                || compiled
                    .as_ref()
                    .map_or(false, |re| re.is_match(value.text))
        },
    )
}

/// `data-val-equalto` with `-other` naming the field whose value must match.
pub fn equal_to(field: &FieldSnapshot) -> RuleDescriptor {
    let other = field.param("equalto", "other").unwrap_or_default().to_string();

    RuleDescriptor::new("equalto", RuleKind::String, field.message("equalto")).with_validator(
        move |_, value| {
            let expected = value.field.related.get(&other).map(String::as_str).unwrap_or("");
            value.text.is_empty() || value.text == expected
        },
    )
}
