//! End-to-end tests for validation + AJAX submission against the in-memory page.
//!
//! `submit_like_a_browser` plays the host's part: it routes the submit event to
//! the initializer and only calls the submitter when the decision says so.

use async_trait::async_trait;
use formwire::memory::{MemoryPage, NodeId};
use formwire::platform::{Rect, Viewport};
use formwire::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;

struct MockTransport {
    response: std::result::Result<String, String>,
    requests: RefCell<Vec<AjaxRequest>>,
}

impl MockTransport {
    fn replying(body: &str) -> Self {
        Self {
            response: Ok(body.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            response: Err(reason.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport<NodeId> for MockTransport {
    async fn send(&self, request: AjaxRequest, _form: &NodeId) -> Result<String> {
        self.requests.borrow_mut().push(request);
        self.response.clone().map_err(Error::Transport)
    }
}

fn setup(html: &str) -> (MemoryPage, FormInitializer<NodeId>) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
    let page = MemoryPage::from_html(html);
    let mut init = FormInitializer::new(RuleRegistry::with_builtin_rules(), FormwireConfig::default());
    for result in init.init_forms(&page) {
        result.unwrap();
    }
    (page, init)
}

async fn submit_like_a_browser(
    page: &MemoryPage,
    init: &mut FormInitializer<NodeId>,
    submitter: &AjaxSubmitter<MockTransport>,
    form: NodeId,
) -> Option<Result<SubmitReport<NodeId>>> {
    let decision = init.handle_event(page, &form, EventKind::Submit, &form);
    match decision {
        Some(SubmitDecision::Ajax) => {
            let result = submitter.submit(page, &form).await;
            if let Ok(report) = &result {
                if let Some(origin) = &report.signal_origin {
                    init.handle_form_updated(page, origin);
                }
            }
            Some(result)
        }
        _ => None,
    }
}

#[tokio::test]
async fn test_empty_required_field_blocks_submission() {
    let (page, mut init) = setup(
        r##"<form data-ajax="true" data-ajax-update="#out" method="post">
              <input name="title" data-val-required="Title is required">
              <span data-valmsg-for="title"></span>
              <button type="submit">Save</button>
            </form><div id="out"></div>"##,
    );
    let form = page.find("form").unwrap();
    let button = page.find("button").unwrap();
    let submitter = AjaxSubmitter::new(MockTransport::replying("<p>saved</p>"), FormwireConfig::default());

    let decision = init.handle_event(&page, &form, EventKind::Submit, &form);
    assert_eq!(decision, Some(SubmitDecision::Block));
    assert!(decision.unwrap().prevents_default());

    assert!(submit_like_a_browser(&page, &mut init, &submitter, form).await.is_none());
    assert_eq!(submitter.transport().request_count(), 0);
    assert!(!page.is_disabled(&button));
    assert_eq!(page.text(page.find("span").unwrap()), "Title is required");
    assert!(!init.validator_for(&form).unwrap().is_valid());
}

#[tokio::test]
async fn test_form_without_rules_is_never_intercepted() {
    let (page, mut init) = setup(r#"<form><input name="q"><button type="submit">Go</button></form>"#);
    let form = page.find("form").unwrap();

    assert_eq!(page.listener_count(form), 0);
    assert!(init.validator_for(&form).is_none());
    assert_eq!(init.handle_event(&page, &form, EventKind::Submit, &form), None);
}

#[tokio::test]
async fn test_after_mode_appends_and_signals_from_parent() {
    let (page, mut init) = setup(
        r##"<section id="wrap"><ul id="list"><li>one</li></ul></section>
            <form data-ajax="true" data-ajax-mode="after" data-ajax-update="#list" method="post" action="/items">
              <input name="item" value="two" data-val-required="Item?">
              <button type="submit">Add</button>
            </form>"##,
    );
    let form = page.find("form").unwrap();
    let list = page.find("#list").unwrap();
    let wrap = page.find("#wrap").unwrap();
    let submitter = AjaxSubmitter::new(
        MockTransport::replying("<li>two</li>\n<li>three</li>"),
        FormwireConfig::default(),
    );

    let report = submit_like_a_browser(&page, &mut init, &submitter, form)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(page.inner_html(list), "<li>one</li><li>two</li><li>three</li>");
    assert_eq!(report.inserted.len(), 2);
    assert_eq!(report.signal_origin, Some(wrap));

    let signals = page.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].target, wrap);
    assert_eq!(signals[0].name, "form-updated");
    assert!(signals[0].bubbles);

    let requests = submitter.transport().requests.borrow();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/items");
    assert_eq!(requests[0].header("X-Requested-With"), Some("XMLHttpRequest"));
}

#[tokio::test]
async fn test_before_mode_keeps_response_order() {
    let (page, mut init) = setup(
        r##"<ol id="feed"><li>old</li></ol>
            <form data-ajax="true" data-ajax-mode="before" data-ajax-update="#feed" method="post">
              <input name="m" value="x" data-val-required="?">
            </form>"##,
    );
    let form = page.find("form").unwrap();
    let feed = page.find("#feed").unwrap();
    let submitter = AjaxSubmitter::new(
        MockTransport::replying("<li>new 1</li><li>new 2</li>"),
        FormwireConfig::default(),
    );

    submit_like_a_browser(&page, &mut init, &submitter, form)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(page.inner_html(feed), "<li>new 1</li><li>new 2</li><li>old</li>");
}

#[tokio::test]
async fn test_full_document_response_splices_body_content() {
    let (page, mut init) = setup(
        r##"<ul id="list"><li>one</li></ul>
            <form data-ajax="true" data-ajax-mode="after" data-ajax-update="#list" method="post">
              <input name="item" value="two" data-val-required="Item?">
            </form>"##,
    );
    let form = page.find("form").unwrap();
    let list = page.find("#list").unwrap();
    let submitter = AjaxSubmitter::new(
        MockTransport::replying(
            "<!DOCTYPE html><html><head></head><body><li>two</li></body></html>",
        ),
        FormwireConfig::default(),
    );

    let report = submit_like_a_browser(&page, &mut init, &submitter, form)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(page.inner_html(list), "<li>one</li><li>two</li>");
    assert_eq!(report.inserted.len(), 1);
}

#[tokio::test]
async fn test_replace_with_keeps_top_level_text() {
    let (page, mut init) = setup(
        r##"<main><div id="panel">old</div></main>
            <form data-ajax="true" data-ajax-mode="replace-with" data-ajax-update="#panel" method="post">
              <input name="n" value="x" data-val-required="?">
            </form>"##,
    );
    let form = page.find("form").unwrap();
    let main = page.find("main").unwrap();
    let submitter = AjaxSubmitter::new(
        MockTransport::replying("Saved! <b>ok</b>"),
        FormwireConfig::default(),
    );

    submit_like_a_browser(&page, &mut init, &submitter, form)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(page.inner_html(main), "Saved! <b>ok</b>");
}

#[tokio::test]
async fn test_replace_with_swaps_target_and_inits_new_form() {
    let (page, mut init) = setup(
        r##"<main id="main">
              <div id="panel">
                <form data-ajax="true" data-ajax-mode="replace-with" data-ajax-update="#panel" method="post">
                  <input name="name" value="Ada" data-val-required="Name?">
                  <button type="submit">Next</button>
                </form>
              </div>
            </main>"##,
    );
    let form = page.find("form").unwrap();
    let panel = page.find("#panel").unwrap();
    let main = page.find("#main").unwrap();
    let submitter = AjaxSubmitter::new(
        MockTransport::replying(
            r#"<div id="panel2"><form><input name="email" data-val-email="Bad email"></form></div>"#,
        ),
        FormwireConfig::default(),
    );

    let report = submit_like_a_browser(&page, &mut init, &submitter, form)
        .await
        .unwrap()
        .unwrap();

    assert!(!page.is_connected(&panel));
    assert!(page.find("#panel").is_none());
    let replacement = page.find("#panel2").unwrap();
    assert_eq!(page.parent(&replacement), Some(main));
    assert_eq!(report.inserted, vec![replacement]);
    assert_eq!(report.signal_origin, Some(main));

    // the old form left the page, the injected one is now validated
    let new_form = page.find("#panel2 form").unwrap();
    assert!(init.validator_for(&form).is_none());
    assert!(init.validator_for(&new_form).is_some());
    assert_eq!(page.listener_count(new_form), 1);
    assert_eq!(page.listener_count(form), 0);
}

#[tokio::test]
async fn test_replace_mode_swaps_inner_content() {
    let (page, mut init) = setup(
        r##"<div id="out"><p>stale</p></div>
            <form data-ajax="true" data-ajax-update="#out" method="post"><input name="a" value="1" data-val-required="?"></form>"##,
    );
    let form = page.find("form").unwrap();
    let out = page.find("#out").unwrap();
    let submitter = AjaxSubmitter::new(MockTransport::replying("<p>fresh</p>"), FormwireConfig::default());

    let report = submit_like_a_browser(&page, &mut init, &submitter, form)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(page.inner_html(out), "<p>fresh</p>");
    assert_eq!(report.mode, AjaxMode::Replace);
    assert!(report.inserted.is_empty());
}

#[tokio::test]
async fn test_rejected_request_reenables_submit_and_leaves_page() {
    let (page, mut init) = setup(
        r##"<div id="out"><p>keep</p></div>
            <form data-ajax="true" data-ajax-update="#out" method="post">
              <input name="a" value="1" data-val-required="?">
              <button type="submit">Send</button>
            </form>"##,
    );
    let form = page.find("form").unwrap();
    let out = page.find("#out").unwrap();
    let button = page.find("button").unwrap();
    let submitter = AjaxSubmitter::new(MockTransport::failing("offline"), FormwireConfig::default());

    let result = submit_like_a_browser(&page, &mut init, &submitter, form).await.unwrap();

    assert!(matches!(result, Err(Error::Transport(ref reason)) if reason == "offline"));
    assert!(!page.is_disabled(&button));
    assert_eq!(page.inner_html(out), "<p>keep</p>");
    assert!(page.signals().is_empty());
    assert_eq!(submitter.transport().request_count(), 1);
}

#[tokio::test]
async fn test_missing_target_after_response_reenables_submit() {
    let (page, mut init) = setup(
        r##"<form data-ajax="true" data-ajax-update="#gone" method="post">
              <input name="a" value="1" data-val-required="?">
              <button type="submit">Send</button>
            </form>"##,
    );
    let form = page.find("form").unwrap();
    let button = page.find("button").unwrap();
    let submitter = AjaxSubmitter::new(MockTransport::replying("<p>x</p>"), FormwireConfig::default());

    let result = submit_like_a_browser(&page, &mut init, &submitter, form).await.unwrap();

    assert!(matches!(result, Err(Error::TargetNotFound(ref sel)) if sel == "#gone"));
    assert!(!page.is_disabled(&button));
}

#[tokio::test]
async fn test_submit_control_stays_disabled_after_success() {
    let (page, _init) = setup(
        r##"<div id="out"></div>
            <form data-ajax-update="#out" method="post"><button type="submit">Send</button></form>"##,
    );
    let form = page.find("form").unwrap();
    let button = page.find("button").unwrap();
    let submitter = AjaxSubmitter::new(MockTransport::replying("ok"), FormwireConfig::default());

    submitter.submit(&page, &form).await.unwrap();
    assert!(page.is_disabled(&button));
}

#[tokio::test]
async fn test_offscreen_target_schedules_centered_scroll() {
    let (page, _init) = setup(
        r##"<div id="out"></div><div id="near"></div>
            <form id="far-form" data-ajax-update="#out" method="post"></form>
            <form id="near-form" data-ajax-update="#near" method="post"></form>"##,
    );
    page.set_viewport(Viewport {
        width: 800.0,
        height: 600.0,
    });
    let out = page.find("#out").unwrap();
    page.set_rect(
        out,
        Rect {
            top: 900.0,
            left: 0.0,
            bottom: 1000.0,
            right: 400.0,
        },
    );
    let submitter = AjaxSubmitter::new(MockTransport::replying("<p>hi</p>"), FormwireConfig::default());

    let far = submitter
        .submit(&page, &page.find("#far-form").unwrap())
        .await
        .unwrap();
    let near = submitter
        .submit(&page, &page.find("#near-form").unwrap())
        .await
        .unwrap();

    assert!(far.scroll_scheduled);
    assert!(!near.scroll_scheduled);
    let scrolls = page.scrolls();
    assert_eq!(scrolls.len(), 1);
    assert_eq!(scrolls[0].target, out);
    assert_eq!(scrolls[0].delay, std::time::Duration::from_millis(200));
    assert_eq!(scrolls[0].options, platform::ScrollOptions::centered());
}

#[tokio::test]
async fn test_url_encoded_fallback_reaches_transport() {
    let (page, _init) = setup(
        r##"<div id="out"></div>
            <form data-ajax-update="#out" method="post"><input name="q" value="a b"></form>"##,
    );
    page.set_multipart_support(false);
    let form = page.find("form").unwrap();
    let submitter = AjaxSubmitter::new(MockTransport::replying(""), FormwireConfig::default());

    submitter.submit(&page, &form).await.unwrap();

    let requests = submitter.transport().requests.borrow();
    assert_eq!(requests[0].body, RequestBody::UrlEncoded("q=a%20b".into()));
    assert_eq!(
        requests[0].header("Content-Type"),
        Some("application/x-www-form-urlencoded; charset=UTF-8")
    );
}
