//! Page access abstraction
//!
//! Everything formwire needs from its host environment goes through [`Platform`]:
//! element lookup, attribute and field state, listener bookkeeping, content splicing,
//! geometry and signals. The browser binding lives in `formwire-wasm`; tests and
//! non-browser hosts use [`crate::memory::MemoryPage`].

use std::fmt::Debug;
use std::time::Duration;

/// Events a validated form subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Input,
    Change,
    Blur,
    Submit,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Input,
        EventKind::Change,
        EventKind::Blur,
        EventKind::Submit,
    ];

    /// DOM event name. Blur does not bubble, so hosts delegating from the
    /// document listen for `focusout` instead.
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Blur => "focusout",
            EventKind::Submit => "submit",
        }
    }

    pub fn from_dom_name(name: &str) -> Option<Self> {
        match name {
            "input" => Some(EventKind::Input),
            "change" => Some(EventKind::Change),
            "blur" | "focusout" => Some(EventKind::Blur),
            "submit" => Some(EventKind::Submit),
            _ => None,
        }
    }
}

/// Element box relative to the viewport, as `getBoundingClientRect` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn is_within(&self, viewport: Viewport) -> bool {
        self.top >= 0.0
            && self.left >= 0.0
            && self.bottom <= viewport.height
            && self.right <= viewport.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Auto,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
    End,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    pub behavior: ScrollBehavior,
    pub block: ScrollAlign,
    pub inline: ScrollAlign,
}

impl ScrollOptions {
    /// Smooth scroll that centers the element vertically.
    pub fn centered() -> Self {
        Self {
            behavior: ScrollBehavior::Smooth,
            block: ScrollAlign::Center,
            inline: ScrollAlign::Nearest,
        }
    }
}

/// One successful control of a serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEntry {
    Text(String),
    File { file_name: String },
}

impl FormEntry {
    /// Text used when the entry has to be flattened into a URL-encoded body.
    pub fn as_text(&self) -> &str {
        match self {
            FormEntry::Text(value) => value,
            FormEntry::File { file_name } => file_name,
        }
    }
}

/// Host page operations.
///
/// All methods take `&self`: the page is shared mutable state owned by the
/// environment, and formwire only ever touches it from the UI thread.
pub trait Platform {
    type Element: Clone + PartialEq + Debug;

    /// Root element to run document-wide queries against.
    fn document(&self) -> Self::Element;

    /// Descendants of `scope` matching `selector`, in document order.
    fn query_all(&self, scope: &Self::Element, selector: &str) -> Vec<Self::Element>;

    fn query_first(&self, scope: &Self::Element, selector: &str) -> Option<Self::Element> {
        self.query_all(scope, selector).into_iter().next()
    }

    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    fn is_connected(&self, element: &Self::Element) -> bool;

    /// Lowercase tag name.
    fn tag_name(&self, element: &Self::Element) -> String;

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    fn attributes(&self, element: &Self::Element) -> Vec<(String, String)>;

    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);

    fn remove_attribute(&self, element: &Self::Element, name: &str);

    fn add_class(&self, element: &Self::Element, class: &str);

    fn remove_class(&self, element: &Self::Element, class: &str);

    fn set_text(&self, element: &Self::Element, text: &str);

    /// Current value of a form control (`""` for elements without one).
    fn field_value(&self, element: &Self::Element) -> String;

    fn is_checked(&self, element: &Self::Element) -> bool;

    /// Number of files selected in a file input.
    fn file_count(&self, element: &Self::Element) -> usize;

    fn set_disabled(&self, element: &Self::Element, disabled: bool);

    fn is_disabled(&self, element: &Self::Element) -> bool;

    /// Successful controls of `form`, in document order.
    fn form_entries(&self, form: &Self::Element) -> Vec<(String, FormEntry)>;

    /// Start delivering `events` raised inside `form`.
    fn listen(&self, form: &Self::Element, events: &[EventKind]);

    /// Stop delivering events for `form`.
    fn unlisten(&self, form: &Self::Element);

    /// Parse markup and return its top-level elements, detached from the page.
    fn parse_fragment(&self, html: &str) -> Vec<Self::Element>;

    /// Insert `nodes`, in order, ahead of the first child of `parent`.
    fn prepend(&self, parent: &Self::Element, nodes: &[Self::Element]);

    fn append_child(&self, parent: &Self::Element, node: &Self::Element);

    fn set_inner_html(&self, element: &Self::Element, html: &str);

    /// Replace `element` with the parsed `html`, returning the inserted elements.
    fn replace_with_html(&self, element: &Self::Element, html: &str) -> Vec<Self::Element>;

    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    fn viewport(&self) -> Viewport;

    fn schedule_scroll_into_view(
        &self,
        element: &Self::Element,
        delay: Duration,
        options: ScrollOptions,
    );

    /// Fire a custom signal named `name` from `element`.
    fn dispatch(&self, element: &Self::Element, name: &str, bubbles: bool);

    /// Whether request bodies can be sent as multipart form data.
    fn supports_multipart(&self) -> bool {
        true
    }
}

/// Attribute selector with the value quoted and escaped.
pub fn attr_selector(name: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{}=\"{}\"]", name, escaped)
}
