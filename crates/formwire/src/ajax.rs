//! AJAX form submission
//!
//! [`AjaxSubmitter::submit`] serializes a form, sends it through a [`Transport`],
//! and splices the textual response into the element named by the form's
//! `data-ajax-update` selector:
//!
//! | `data-ajax-mode` | effect on the target                              |
//! |------------------|---------------------------------------------------|
//! | `before`         | parsed top-level elements go ahead of its content |
//! | `after`          | parsed top-level elements are appended            |
//! | `replace-with`   | the target itself is replaced by the markup       |
//! | anything else    | its inner content is replaced (`replace`)         |
//!
//! Afterwards a bubbling form-updated signal is fired from the target's parent so
//! [`FormInitializer`](crate::init::FormInitializer) can pick up new forms.
//! Failures re-enable the submit control; nothing is retried or rolled back.

use crate::config::FormwireConfig;
use crate::error::{Error, Result};
use crate::platform::{FormEntry, Platform, ScrollOptions};
use async_trait::async_trait;
use std::sync::Arc;

pub const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");
pub const URL_ENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AjaxMode {
    Before,
    After,
    ReplaceWith,
    Replace,
}

impl AjaxMode {
    /// Case-insensitive; unrecognized values mean `Replace`.
    pub fn parse(mode: &str) -> Self {
        match mode.trim().to_ascii_lowercase().as_str() {
            "before" => AjaxMode::Before,
            "after" => AjaxMode::After,
            "replace-with" => AjaxMode::ReplaceWith,
            _ => AjaxMode::Replace,
        }
    }
}

/// Per-submission settings read from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AjaxOptions {
    pub mode: AjaxMode,
    /// Selector of the element to update.
    pub update: String,
}

impl AjaxOptions {
    pub fn from_form<P: Platform>(
        platform: &P,
        form: &P::Element,
        config: &FormwireConfig,
    ) -> Result<Self> {
        let mode = platform
            .attribute(form, &config.mode_attribute)
            .map(|mode| AjaxMode::parse(&mode))
            .unwrap_or(AjaxMode::Replace);
        let update = platform
            .attribute(form, &config.update_attribute)
            .map(|update| update.trim().to_string())
            .filter(|update| !update.is_empty())
            .ok_or_else(|| Error::MissingUpdateTarget(config.update_attribute.clone()))?;

        Ok(Self { mode, update })
    }
}

/// Whether `form` opted into AJAX submission (`data-ajax="true"`).
pub fn wants_ajax<P: Platform>(platform: &P, form: &P::Element, config: &FormwireConfig) -> bool {
    platform
        .attribute(form, &config.ajax_attribute)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// How the form body travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingStrategy {
    Multipart,
    /// For hosts without multipart support.
    UrlEncoded,
}

impl EncodingStrategy {
    pub fn detect<P: Platform>(platform: &P) -> Self {
        if platform.supports_multipart() {
            EncodingStrategy::Multipart
        } else {
            EncodingStrategy::UrlEncoded
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    SameOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    NoCache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Multipart(Vec<(String, FormEntry)>),
    UrlEncoded(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AjaxRequest {
    /// Uppercase HTTP method.
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub credentials: Credentials,
    pub cache: CacheMode,
}

impl AjaxRequest {
    /// Serialize `form` using its `method` and `action` attributes.
    /// `GET` forms carry their fields in the query string.
    pub fn from_form<P: Platform>(
        platform: &P,
        form: &P::Element,
        strategy: EncodingStrategy,
    ) -> Self {
        let method = platform
            .attribute(form, "method")
            .map(|m| m.trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "GET".to_string());
        let mut url = platform.attribute(form, "action").unwrap_or_default();
        let entries = platform.form_entries(form);
        let mut headers = vec![(REQUESTED_WITH.0.to_string(), REQUESTED_WITH.1.to_string())];

        let body = if method == "GET" || method == "HEAD" {
            let query = url_encode(&entries);
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
            RequestBody::Empty
        } else {
            match strategy {
                EncodingStrategy::Multipart => RequestBody::Multipart(entries),
                EncodingStrategy::UrlEncoded => {
                    headers.push((
                        "Content-Type".to_string(),
                        URL_ENCODED_CONTENT_TYPE.to_string(),
                    ));
                    RequestBody::UrlEncoded(url_encode(&entries))
                }
            }
        };

        Self {
            method,
            url,
            headers,
            body,
            credentials: Credentials::SameOrigin,
            cache: CacheMode::NoCache,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn url_encode(entries: &[(String, FormEntry)]) -> String {
    entries
        .iter()
        .map(|(name, entry)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(entry.as_text())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Sends a request and yields the response body as text.
///
/// `form` is the element the request was serialized from; browser transports
/// rebuild multipart bodies from it so selected files travel as files.
/// Browser futures are not `Send`, so neither is this trait's.
#[async_trait(?Send)]
pub trait Transport<E> {
    async fn send(&self, request: AjaxRequest, form: &E) -> Result<String>;
}

/// What a successful submission did to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport<E> {
    pub mode: AjaxMode,
    /// Elements inserted by `before`, `after` and `replace-with`.
    pub inserted: Vec<E>,
    /// Where the form-updated signal was fired from.
    pub signal_origin: Option<E>,
    pub scroll_scheduled: bool,
}

pub struct AjaxSubmitter<T> {
    transport: T,
    config: Arc<FormwireConfig>,
}

impl<T> AjaxSubmitter<T> {
    pub fn new(transport: T, config: FormwireConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &FormwireConfig {
        &self.config
    }

    /// Submit `form` and splice the response into the page.
    ///
    /// The submit control is disabled for the duration and re-enabled only on
    /// failure; on success the response normally replaces it anyway.
    pub async fn submit<P>(
        &self,
        platform: &P,
        form: &P::Element,
    ) -> Result<SubmitReport<P::Element>>
    where
        P: Platform,
        T: Transport<P::Element>,
    {
        let submit = platform.query_first(form, "[type=\"submit\"]");
        if let Some(submit) = &submit {
            platform.set_disabled(submit, true);
        }

        let result = self.run(platform, form).await;

        if let Err(e) = &result {
            tracing::error!("ajax submission failed: {}", e);
            if let Some(submit) = &submit {
                platform.set_disabled(submit, false);
            }
        }
        result
    }

    async fn run<P>(&self, platform: &P, form: &P::Element) -> Result<SubmitReport<P::Element>>
    where
        P: Platform,
        T: Transport<P::Element>,
    {
        let options = AjaxOptions::from_form(platform, form, &self.config)?;
        let request = AjaxRequest::from_form(platform, form, EncodingStrategy::detect(platform));
        tracing::debug!("{} {} ({:?})", request.method, request.url, options.mode);

        let content = self.transport.send(request, form).await?;
        self.update_contents(platform, &options, &content)
    }

    /// Splice `content` into the target named by `options`.
    pub fn update_contents<P: Platform>(
        &self,
        platform: &P,
        options: &AjaxOptions,
        content: &str,
    ) -> Result<SubmitReport<P::Element>> {
        let root = platform.document();
        let target = platform
            .query_first(&root, &options.update)
            .ok_or_else(|| Error::TargetNotFound(options.update.clone()))?;
        let parent = platform.parent(&target);

        let inserted = match options.mode {
            AjaxMode::Before => {
                let nodes = platform.parse_fragment(content);
                platform.prepend(&target, &nodes);
                nodes
            }
            AjaxMode::After => {
                let nodes = platform.parse_fragment(content);
                for node in &nodes {
                    platform.append_child(&target, node);
                }
                nodes
            }
            AjaxMode::ReplaceWith => platform.replace_with_html(&target, content),
            AjaxMode::Replace => {
                platform.set_inner_html(&target, content);
                Vec::new()
            }
        };

        // After replace-with the target is detached; follow what took its place.
        let visible_subject = match options.mode {
            AjaxMode::ReplaceWith => inserted.first().cloned(),
            _ => Some(target),
        };
        let mut scroll_scheduled = false;
        if let Some(subject) = visible_subject {
            if !platform.bounding_rect(&subject).is_within(platform.viewport()) {
                platform.schedule_scroll_into_view(
                    &subject,
                    self.config.scroll_delay(),
                    ScrollOptions::centered(),
                );
                scroll_scheduled = true;
            }
        }

        match &parent {
            Some(parent) => platform.dispatch(parent, &self.config.updated_event, true),
            None => tracing::warn!(
                "update target '{}' has no parent; no signal fired",
                options.update
            ),
        }

        Ok(SubmitReport {
            mode: options.mode,
            inserted,
            signal_origin: parent,
            scroll_scheduled,
        })
    }
}
