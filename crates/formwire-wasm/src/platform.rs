//! Browser implementation of [`Platform`] over `web-sys`.

use formwire::platform::{
    EventKind, FormEntry, Platform, Rect, ScrollAlign, ScrollBehavior, ScrollOptions, Viewport,
};
use js_sys::Array;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, HtmlInputElement, HtmlOptionElement,
    HtmlSelectElement, HtmlTemplateElement, HtmlTextAreaElement, NodeList, ScrollIntoViewOptions,
    ScrollLogicalPosition, Window,
};

const CONTROL_SELECTOR: &str = "input, select, textarea";

/// The live page.
///
/// Events are delivered by listeners the host installs once on the document, so
/// `listen`/`unlisten` only keep the per-form subscription list the host consults.
#[derive(Clone)]
pub struct WebPlatform {
    window: Window,
    document: Document,
    root: Element,
    subscriptions: Rc<RefCell<Vec<(Element, Vec<EventKind>)>>>,
}

impl WebPlatform {
    pub fn new() -> anyhow::Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow::anyhow!("window has no document"))?;
        let root = document
            .document_element()
            .ok_or_else(|| anyhow::anyhow!("document has no root element"))?;
        Ok(Self {
            window,
            document,
            root,
            subscriptions: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn html_document(&self) -> &Document {
        &self.document
    }

    /// Detached `<template>` holding the parsed `html`.
    fn template(&self, html: &str) -> Option<HtmlTemplateElement> {
        match self.document.create_element("template") {
            Ok(element) => {
                let template = element.unchecked_into::<HtmlTemplateElement>();
                template.set_inner_html(html);
                Some(template)
            }
            Err(e) => {
                tracing::error!("cannot create template: {}", describe_js(&e));
                None
            }
        }
    }

    /// Whether `form` subscribed to `kind`.
    pub fn is_listening(&self, form: &Element, kind: EventKind) -> bool {
        self.subscriptions
            .borrow()
            .iter()
            .any(|(subscribed, events)| subscribed == form && events.contains(&kind))
    }
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{:?}", value),
    }
}

fn report(action: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        tracing::warn!("{} failed: {}", action, describe_js(&e));
    }
}

fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn template_elements(template: &HtmlTemplateElement) -> Vec<Element> {
    let children = template.content().children();
    (0..children.length())
        .filter_map(|i| children.item(i))
        .collect()
}

fn to_array(nodes: &[Element]) -> Array {
    nodes.iter().collect()
}

fn scroll_position(align: ScrollAlign) -> ScrollLogicalPosition {
    match align {
        ScrollAlign::Start => ScrollLogicalPosition::Start,
        ScrollAlign::Center => ScrollLogicalPosition::Center,
        ScrollAlign::End => ScrollLogicalPosition::End,
        ScrollAlign::Nearest => ScrollLogicalPosition::Nearest,
    }
}

impl Platform for WebPlatform {
    type Element = Element;

    fn document(&self) -> Element {
        self.root.clone()
    }

    fn query_all(&self, scope: &Element, selector: &str) -> Vec<Element> {
        match scope.query_selector_all(selector) {
            Ok(list) => elements(list),
            Err(e) => {
                tracing::warn!("bad selector '{}': {}", selector, describe_js(&e));
                Vec::new()
            }
        }
    }

    fn query_first(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).ok().flatten()
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn is_connected(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn attributes(&self, element: &Element) -> Vec<(String, String)> {
        element
            .get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .filter_map(|name| {
                let value = element.get_attribute(&name)?;
                Some((name, value))
            })
            .collect()
    }

    fn set_attribute(&self, element: &Element, name: &str, value: &str) {
        report("setAttribute", element.set_attribute(name, value));
    }

    fn remove_attribute(&self, element: &Element, name: &str) {
        report("removeAttribute", element.remove_attribute(name));
    }

    fn add_class(&self, element: &Element, class: &str) {
        report("classList.add", element.class_list().add_1(class));
    }

    fn remove_class(&self, element: &Element, class: &str) {
        report("classList.remove", element.class_list().remove_1(class));
    }

    fn set_text(&self, element: &Element, text: &str) {
        element.set_text_content(Some(text));
    }

    fn field_value(&self, element: &Element) -> String {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn is_checked(&self, element: &Element) -> bool {
        element
            .dyn_ref::<HtmlInputElement>()
            .is_some_and(HtmlInputElement::checked)
    }

    fn file_count(&self, element: &Element) -> usize {
        element
            .dyn_ref::<HtmlInputElement>()
            .and_then(HtmlInputElement::files)
            .map_or(0, |files| files.length() as usize)
    }

    fn set_disabled(&self, element: &Element, disabled: bool) {
        if disabled {
            report("setAttribute", element.set_attribute("disabled", ""));
        } else {
            report("removeAttribute", element.remove_attribute("disabled"));
        }
    }

    fn is_disabled(&self, element: &Element) -> bool {
        element.has_attribute("disabled")
    }

    fn form_entries(&self, form: &Element) -> Vec<(String, FormEntry)> {
        let mut entries = Vec::new();
        for control in self.query_all(form, CONTROL_SELECTOR) {
            if control.has_attribute("disabled") {
                continue;
            }
            let name = match control.get_attribute("name") {
                Some(name) if !name.is_empty() => name,
                _ => continue,
            };

            if let Some(select) = control.dyn_ref::<HtmlSelectElement>() {
                if select.multiple() {
                    let selected = select.selected_options();
                    for option in (0..selected.length()).filter_map(|i| selected.item(i)) {
                        if let Some(option) = option.dyn_ref::<HtmlOptionElement>() {
                            entries.push((name.clone(), FormEntry::Text(option.value())));
                        }
                    }
                    continue;
                }
            }

            let Some(input) = control.dyn_ref::<HtmlInputElement>() else {
                entries.push((name, FormEntry::Text(self.field_value(&control))));
                continue;
            };
            match input.type_().to_ascii_lowercase().as_str() {
                "submit" | "button" | "reset" | "image" => {}
                "checkbox" | "radio" => {
                    if input.checked() {
                        entries.push((name, FormEntry::Text(input.value())));
                    }
                }
                "file" => {
                    let files = input.files();
                    let count = files.as_ref().map_or(0, |files| files.length());
                    if count == 0 {
                        entries.push((
                            name.clone(),
                            FormEntry::File {
                                file_name: String::new(),
                            },
                        ));
                    }
                    for file in (0..count).filter_map(|i| files.as_ref()?.item(i)) {
                        entries.push((name.clone(), FormEntry::File { file_name: file.name() }));
                    }
                }
                _ => entries.push((name, FormEntry::Text(input.value()))),
            }
        }
        entries
    }

    fn listen(&self, form: &Element, events: &[EventKind]) {
        let mut subscriptions = self.subscriptions.borrow_mut();
        match subscriptions.iter_mut().find(|(subscribed, _)| subscribed == form) {
            Some((_, subscribed)) => {
                for kind in events {
                    if !subscribed.contains(kind) {
                        subscribed.push(*kind);
                    }
                }
            }
            None => subscriptions.push((form.clone(), events.to_vec())),
        }
    }

    fn unlisten(&self, form: &Element) {
        self.subscriptions
            .borrow_mut()
            .retain(|(subscribed, _)| subscribed != form);
    }

    fn parse_fragment(&self, html: &str) -> Vec<Element> {
        self.template(html)
            .map(|template| template_elements(&template))
            .unwrap_or_default()
    }

    fn prepend(&self, parent: &Element, nodes: &[Element]) {
        report("prepend", parent.prepend_with_node(&to_array(nodes)));
    }

    fn append_child(&self, parent: &Element, node: &Element) {
        report("appendChild", parent.append_child(node).map(drop));
    }

    fn set_inner_html(&self, element: &Element, html: &str) {
        element.set_inner_html(html);
    }

    fn replace_with_html(&self, element: &Element, html: &str) -> Vec<Element> {
        let Some(template) = self.template(html) else {
            return Vec::new();
        };
        let inserted = template_elements(&template);
        // Moves every parsed node in, text and comments included.
        report("replaceWith", element.replace_with_with_node_1(&template.content()));
        inserted
    }

    fn bounding_rect(&self, element: &Element) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect {
            top: rect.top(),
            left: rect.left(),
            bottom: rect.bottom(),
            right: rect.right(),
        }
    }

    fn viewport(&self) -> Viewport {
        let width = self
            .window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .or_else(|| Some(f64::from(self.root.client_width())))
            .unwrap_or_default();
        let height = self
            .window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .or_else(|| Some(f64::from(self.root.client_height())))
            .unwrap_or_default();
        Viewport { width, height }
    }

    fn schedule_scroll_into_view(
        &self,
        element: &Element,
        delay: Duration,
        options: ScrollOptions,
    ) {
        let scroll = ScrollIntoViewOptions::new();
        scroll.set_behavior(match options.behavior {
            ScrollBehavior::Auto => web_sys::ScrollBehavior::Auto,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        scroll.set_block(scroll_position(options.block));
        scroll.set_inline(scroll_position(options.inline));

        let element = element.clone();
        let callback = Closure::once_into_js(move || {
            element.scroll_into_view_with_scroll_into_view_options(&scroll);
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            tracing::warn!("setTimeout failed: {}", describe_js(&e));
        }
    }

    fn dispatch(&self, element: &Element, name: &str, bubbles: bool) {
        let init = CustomEventInit::new();
        init.set_bubbles(bubbles);
        let result = CustomEvent::new_with_event_init_dict(name, &init)
            .and_then(|event| element.dispatch_event(&event).map(drop));
        report("dispatchEvent", result);
    }

    fn supports_multipart(&self) -> bool {
        js_sys::Reflect::has(&self.window, &JsValue::from_str("FormData")).unwrap_or(false)
    }
}
