// crates/formwire/src/lib.rs: declarative form validation and AJAX form submission
//
// Fields declare rules through attributes (`data-val-required="Name is required"`),
// forms opt into AJAX with `data-ajax="true"` plus `data-ajax-update` / `data-ajax-mode`.
//
// Typical wiring:
// - `FormInitializer::init_forms` once the page is ready.
// - Route `input` / `change` / `focusout` / `submit` to `FormInitializer::handle_event`.
// - On `SubmitDecision::Ajax`, run `AjaxSubmitter::submit`; feed the resulting
//   form-updated signal back into `FormInitializer::handle_form_updated`.
//
// Everything talks to the page through `Platform`; `memory::MemoryPage` is the
// browser-free implementation, `formwire-wasm` the browser one.
pub mod ajax;
pub mod config;
pub mod controller;
pub mod error;
pub mod field;
pub mod init;
pub mod memory;
pub mod platform;
pub mod registry;
pub mod rule;
pub mod rules;

pub use ajax::{
    wants_ajax, AjaxMode, AjaxOptions, AjaxRequest, AjaxSubmitter, EncodingStrategy, RequestBody,
    SubmitReport, Transport,
};
pub use config::FormwireConfig;
pub use controller::{ControllerState, FormValidation, SubmitDecision};
pub use error::{Error, Result, UnknownRule};
pub use field::{FieldOutcome, FieldValidator};
pub use init::{FormInitializer, InitOutcome};
pub use platform::{EventKind, FormEntry, Platform};
pub use registry::{RuleFactory, RuleRegistry};
pub use rule::{FieldKind, FieldSnapshot, FieldValue, RuleDescriptor, RuleKind};
