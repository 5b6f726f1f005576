//! `fetch`-backed [`Transport`].

use crate::platform::describe_js;
use async_trait::async_trait;
use formwire::ajax::{AjaxRequest, CacheMode, Credentials, RequestBody, Transport};
use formwire::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Element, FormData, Headers, HtmlFormElement, Request, RequestCache, RequestCredentials,
    RequestInit, Response, Window,
};

pub struct FetchTransport {
    window: Window,
}

impl FetchTransport {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    async fn fetch(&self, request: AjaxRequest, form: &Element) -> Result<String, JsValue> {
        let init = RequestInit::new();
        init.set_method(&request.method);
        init.set_credentials(match request.credentials {
            Credentials::SameOrigin => RequestCredentials::SameOrigin,
        });
        init.set_cache(match request.cache {
            CacheMode::NoCache => RequestCache::NoCache,
        });

        let headers = Headers::new()?;
        for (name, value) in &request.headers {
            headers.set(name, value)?;
        }
        init.set_headers(&headers);

        match &request.body {
            RequestBody::Empty => {}
            RequestBody::UrlEncoded(body) => init.set_body(&JsValue::from_str(body)),
            RequestBody::Multipart(entries) => {
                // Built from the live form so selected files are sent as files.
                let data = match form.dyn_ref::<HtmlFormElement>() {
                    Some(form) => FormData::new_with_form(form)?,
                    None => {
                        let data = FormData::new()?;
                        for (name, entry) in entries {
                            data.append_with_str(name, entry.as_text())?;
                        }
                        data
                    }
                };
                init.set_body(&data);
            }
        }

        let request = Request::new_with_str_and_init(&request.url, &init)?;
        let response: Response = JsFuture::from(self.window.fetch_with_request(&request))
            .await?
            .dyn_into()?;
        if !response.ok() {
            tracing::warn!("{} answered {}", response.url(), response.status());
        }
        let text = JsFuture::from(response.text()?).await?;
        Ok(text.as_string().unwrap_or_default())
    }
}

#[async_trait(?Send)]
impl Transport<Element> for FetchTransport {
    async fn send(&self, request: AjaxRequest, form: &Element) -> formwire::Result<String> {
        self.fetch(request, form)
            .await
            .map_err(|e| Error::Transport(describe_js(&e)))
    }
}
