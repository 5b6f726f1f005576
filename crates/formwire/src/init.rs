// File: crates/formwire/src/init.rs
// Purpose: Discover forms, own their controllers, and pick up forms injected later

use crate::config::FormwireConfig;
use crate::controller::{FormValidation, SubmitDecision};
use crate::error::{Error, Result, UnknownRule};
use crate::platform::{EventKind, Platform};
use crate::registry::RuleRegistry;
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The form declares no rules; nothing was attached.
    Skipped,
    /// A controller already exists for the form; nothing was attached.
    AlreadyInitialized,
    /// Listeners attached. `issues` lists declared rules that were skipped.
    Initialized { issues: Vec<UnknownRule> },
}

/// Owns one [`FormValidation`] per initialized form.
///
/// Keeping controllers here (rather than on the element) makes initialization
/// idempotent: a form is only ever listened to once until it is reset or leaves
/// the page.
#[derive(Debug)]
pub struct FormInitializer<E> {
    registry: RuleRegistry,
    config: Arc<FormwireConfig>,
    controllers: Vec<FormValidation<E>>,
    watching: bool,
}

impl<E: Clone + PartialEq + Debug> FormInitializer<E> {
    pub fn new(registry: RuleRegistry, config: FormwireConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
            controllers: Vec::new(),
            watching: false,
        }
    }

    pub fn config(&self) -> &FormwireConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Whether [`init_forms`](Self::init_forms) has run, so form-updated signals
    /// are acted on.
    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// Build and attach a controller for `form`.
    ///
    /// In strict mode an unknown rule aborts initialization with
    /// [`Error::UnknownRules`] and nothing is attached.
    pub fn init_form<P>(&mut self, platform: &P, form: &E) -> Result<InitOutcome>
    where
        P: Platform<Element = E>,
    {
        if self.validator_for(form).is_some() {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let mut val = FormValidation::new(platform, form.clone(), Arc::clone(&self.config));
        if !val.has_fields() {
            return Ok(InitOutcome::Skipped);
        }

        let issues = val.init_rules(platform, &self.registry);
        if self.config.strict_rules && !issues.is_empty() {
            return Err(Error::UnknownRules(issues));
        }

        val.set_up_events(platform);
        tracing::debug!("validation attached to {:?} ({} fields)", form, val.fields().len());
        self.controllers.push(val);
        Ok(InitOutcome::Initialized { issues })
    }

    /// Initialize every form on the page and start honoring form-updated signals.
    pub fn init_forms<P>(&mut self, platform: &P) -> Vec<Result<InitOutcome>>
    where
        P: Platform<Element = E>,
    {
        let root = platform.document();
        let results = self.init_within(platform, &root);
        self.watching = true;
        results
    }

    /// Form-updated signal raised from `origin`: forget forms that left the page,
    /// then initialize forms inside `origin`.
    pub fn handle_form_updated<P>(&mut self, platform: &P, origin: &E) -> Vec<Result<InitOutcome>>
    where
        P: Platform<Element = E>,
    {
        if !self.watching {
            return Vec::new();
        }
        self.prune(platform);
        self.init_within(platform, origin)
    }

    /// Drop controllers whose form is no longer connected to the page.
    pub fn prune<P>(&mut self, platform: &P)
    where
        P: Platform<Element = E>,
    {
        self.controllers.retain_mut(|val| {
            let connected = platform.is_connected(val.form());
            if !connected {
                val.teardown(platform);
            }
            connected
        });
    }

    /// Tear down the controller for `form`, so the next `init_form` rebuilds it.
    pub fn reset_form<P>(&mut self, platform: &P, form: &E) -> bool
    where
        P: Platform<Element = E>,
    {
        match self.controllers.iter().position(|val| val.form() == form) {
            Some(index) => {
                let mut val = self.controllers.remove(index);
                val.teardown(platform);
                true
            }
            None => false,
        }
    }

    /// Validation state of `form`, when it has been initialized.
    pub fn validator_for(&self, form: &E) -> Option<&FormValidation<E>> {
        self.controllers.iter().find(|val| val.form() == form)
    }

    pub fn validator_for_mut(&mut self, form: &E) -> Option<&mut FormValidation<E>> {
        self.controllers.iter_mut().find(|val| val.form() == form)
    }

    pub fn forms(&self) -> impl Iterator<Item = &E> {
        self.controllers.iter().map(FormValidation::form)
    }

    /// Route an event raised on `target` inside `form`.
    /// Returns `None` for untracked forms and for non-submit events.
    pub fn handle_event<P>(
        &mut self,
        platform: &P,
        form: &E,
        kind: EventKind,
        target: &E,
    ) -> Option<SubmitDecision>
    where
        P: Platform<Element = E>,
    {
        self.validator_for_mut(form)?
            .handle_event(platform, kind, target)
    }

    fn init_within<P>(&mut self, platform: &P, scope: &E) -> Vec<Result<InitOutcome>>
    where
        P: Platform<Element = E>,
    {
        let mut forms = Vec::new();
        if platform.tag_name(scope) == "form" {
            forms.push(scope.clone());
        }
        forms.extend(platform.query_all(scope, "form"));

        forms
            .iter()
            .map(|form| {
                let result = self.init_form(platform, form);
                if let Err(e) = &result {
                    tracing::warn!("form {:?} not initialized: {}", form, e);
                }
                result
            })
            .collect()
    }
}
