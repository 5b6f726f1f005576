//! Formwire WASM
//!
//! Browser host for formwire: validates forms declaring `data-val-*` rules and
//! submits `data-ajax` forms over `fetch`.
//!
//! ```javascript
//! import init, { start } from './formwire_wasm.js';
//! await init();
//! start({ scrollDelayMs: 150 });
//! ```

mod platform;
mod transport;

pub use platform::WebPlatform;
pub use transport::FetchTransport;

use formwire::{
    wants_ajax, AjaxSubmitter, EventKind, FormInitializer, FormwireConfig, InitOutcome,
    RuleRegistry, SubmitDecision,
};
use platform::describe_js;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event};

thread_local! {
    static RUNTIME: RefCell<Option<Rc<Runtime>>> = const { RefCell::new(None) };
}

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Initialize every form on the page and install the document listeners.
///
/// `config` is an optional object with camelCase keys (`errorClass`,
/// `scrollDelayMs`). Calling `start` twice is a no-op.
#[wasm_bindgen]
pub fn start(config: JsValue) -> Result<(), JsValue> {
    if RUNTIME.with(|runtime| runtime.borrow().is_some()) {
        return Ok(());
    }

    let config: FormwireConfig = if config.is_undefined() || config.is_null() {
        FormwireConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?
    };

    let runtime = Runtime::install(config).map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));
    Ok(())
}

/// Validate `form` now and render its messages. Forms that are not tracked count
/// as valid.
#[wasm_bindgen(js_name = validateForm)]
pub fn validate_form(form: &Element) -> bool {
    with_runtime(|runtime| {
        let mut initializer = runtime.initializer.borrow_mut();
        initializer
            .validator_for_mut(form)
            .map_or(true, |val| val.validate_all(&runtime.platform))
    })
    .unwrap_or(true)
}

/// Forget `form` and build its validation again from the current markup.
#[wasm_bindgen(js_name = resetForm)]
pub fn reset_form(form: &Element) {
    with_runtime(|runtime| {
        let mut initializer = runtime.initializer.borrow_mut();
        initializer.reset_form(&runtime.platform, form);
        if let Err(e) = initializer.init_form(&runtime.platform, form) {
            console_error(&e.to_string());
        }
    });
}

fn with_runtime<R>(f: impl FnOnce(&Rc<Runtime>) -> R) -> Option<R> {
    let runtime = RUNTIME.with(|slot| slot.borrow().clone());
    match runtime {
        Some(runtime) => Some(f(&runtime)),
        None => {
            console_error("start() has not been called");
            None
        }
    }
}

fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(&format!("formwire: {}", message)));
}

fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(&format!("formwire: {}", message)));
}

struct Runtime {
    platform: WebPlatform,
    initializer: RefCell<FormInitializer<Element>>,
    submitter: AjaxSubmitter<FetchTransport>,
}

impl Runtime {
    fn install(config: FormwireConfig) -> anyhow::Result<Rc<Self>> {
        let platform = WebPlatform::new()?;
        let transport = FetchTransport::new(platform.window().clone());
        let runtime = Rc::new(Self {
            initializer: RefCell::new(FormInitializer::new(
                RuleRegistry::with_builtin_rules(),
                config.clone(),
            )),
            submitter: AjaxSubmitter::new(transport, config),
            platform,
        });

        for kind in EventKind::ALL {
            let handler = Rc::clone(&runtime);
            runtime.listen(kind.dom_name(), move |event| handler.on_event(kind, &event))?;
        }
        let handler = Rc::clone(&runtime);
        let updated_event = runtime.initializer.borrow().config().updated_event.clone();
        runtime.listen(&updated_event, move |event| handler.on_form_updated(&event))?;

        if runtime.platform.html_document().ready_state() == "loading" {
            let handler = Rc::clone(&runtime);
            runtime.listen("DOMContentLoaded", move |_| handler.init_forms())?;
        } else {
            runtime.init_forms();
        }
        Ok(runtime)
    }

    /// Document-level listener that lives as long as the page.
    fn listen(&self, name: &str, handler: impl FnMut(Event) + 'static) -> anyhow::Result<()> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        self.platform
            .html_document()
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("cannot listen for '{}': {}", name, describe_js(&e)))?;
        closure.forget();
        Ok(())
    }

    fn init_forms(&self) {
        let results = self.initializer.borrow_mut().init_forms(&self.platform);
        report_init(results);
    }

    fn on_form_updated(&self, event: &Event) {
        let Some(origin) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let results = self
            .initializer
            .borrow_mut()
            .handle_form_updated(&self.platform, &origin);
        report_init(results);
    }

    fn on_event(self: &Rc<Self>, kind: EventKind, event: &Event) {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let form = match kind {
            EventKind::Submit => Some(target.clone()),
            _ => target.closest("form").ok().flatten(),
        };
        let Some(form) = form else {
            return;
        };

        let decision = if self.platform.is_listening(&form, kind) {
            self.initializer
                .borrow_mut()
                .handle_event(&self.platform, &form, kind, &target)
        } else {
            None
        };

        if kind != EventKind::Submit {
            return;
        }
        let decision = decision.unwrap_or_else(|| {
            if wants_ajax(&self.platform, &form, self.submitter.config()) {
                SubmitDecision::Ajax
            } else {
                SubmitDecision::Proceed
            }
        });

        if decision.prevents_default() {
            event.prevent_default();
        }
        if decision == SubmitDecision::Ajax {
            self.submit(form);
        }
    }

    fn submit(self: &Rc<Self>, form: Element) {
        let runtime = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = runtime.submitter.submit(&runtime.platform, &form).await {
                console_error(&e.to_string());
            }
        });
    }
}

/// Print initialization problems; no tracing subscriber runs in the browser.
fn report_init(results: Vec<formwire::Result<InitOutcome>>) {
    for result in results {
        match result {
            Ok(InitOutcome::Initialized { issues }) => {
                for issue in issues {
                    console_warn(&format!("{}; rule skipped", issue));
                }
            }
            Ok(_) => {}
            Err(e) => console_error(&e.to_string()),
        }
    }
}
