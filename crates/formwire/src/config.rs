// File: crates/formwire/src/config.rs
// Purpose: Attribute names, signal name and timing knobs, loadable from `formwire.toml`

use serde::Deserialize;
use std::time::Duration;

/// Formwire runtime configuration.
///
/// Every field has a default, so an empty TOML document (or JS object) is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormwireConfig {
    /// Prefix of rule declarations: `data-val-required="message"`.
    #[serde(default = "default_rule_prefix", alias = "rule_prefix")]
    pub rule_prefix: String,
    /// Attribute on message placeholders: `<span data-valmsg-for="email">`.
    #[serde(default = "default_message_attribute", alias = "message_attribute")]
    pub message_attribute: String,
    #[serde(default = "default_error_class", alias = "error_class")]
    pub error_class: String,
    /// Forms carrying this attribute with value `true` are submitted over AJAX.
    #[serde(default = "default_ajax_attribute", alias = "ajax_attribute")]
    pub ajax_attribute: String,
    #[serde(default = "default_mode_attribute", alias = "mode_attribute")]
    pub mode_attribute: String,
    #[serde(default = "default_update_attribute", alias = "update_attribute")]
    pub update_attribute: String,
    /// Name of the bubbling signal fired after content is spliced in.
    #[serde(default = "default_updated_event", alias = "updated_event")]
    pub updated_event: String,
    #[serde(default = "default_scroll_delay_ms", alias = "scroll_delay_ms")]
    pub scroll_delay_ms: u64,
    /// Fail initialization on unknown rule names instead of reporting and skipping them.
    #[serde(default, alias = "strict_rules")]
    pub strict_rules: bool,
}

fn default_rule_prefix() -> String {
    "data-val-".into()
}
fn default_message_attribute() -> String {
    "data-valmsg-for".into()
}
fn default_error_class() -> String {
    "input-validation-error".into()
}
fn default_ajax_attribute() -> String {
    "data-ajax".into()
}
fn default_mode_attribute() -> String {
    "data-ajax-mode".into()
}
fn default_update_attribute() -> String {
    "data-ajax-update".into()
}
fn default_updated_event() -> String {
    "form-updated".into()
}
fn default_scroll_delay_ms() -> u64 {
    200
}

impl Default for FormwireConfig {
    fn default() -> Self {
        Self {
            rule_prefix: default_rule_prefix(),
            message_attribute: default_message_attribute(),
            error_class: default_error_class(),
            ajax_attribute: default_ajax_attribute(),
            mode_attribute: default_mode_attribute(),
            update_attribute: default_update_attribute(),
            updated_event: default_updated_event(),
            scroll_delay_ms: default_scroll_delay_ms(),
            strict_rules: false,
        }
    }
}

impl FormwireConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Parse a JSON object, as embedded in a page's
    /// `<script type="application/json">` block.
    pub fn from_json_str(contents: &str) -> crate::Result<Self> {
        let config: Self =
            serde_json::from_str(contents).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Load from a specific path.
    /// Returns default config if the file doesn't exist or fails to parse.
    pub fn load_from(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("failed to load {}: {}; using defaults", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    fn check(&self) -> crate::Result<()> {
        if self.rule_prefix.is_empty() {
            return Err(crate::Error::Config("rulePrefix must not be empty".into()));
        }
        if self.updated_event.is_empty() {
            return Err(crate::Error::Config("updatedEvent must not be empty".into()));
        }
        Ok(())
    }
}
