//! In-memory page backend
//!
//! A small DOM tree implementing [`Platform`] without a browser: tolerant HTML
//! fragment parsing, a selector engine covering what formwire queries, and logs of
//! listeners, signals and scheduled scrolls. Fast and non-persistent; clones share
//! the same page.

use crate::platform::{EventKind, FormEntry, Platform, Rect, ScrollOptions, Viewport};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Handle to a node of a [`MemoryPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A signal fired through [`Platform::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub target: NodeId,
    pub name: String,
    pub bubbles: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledScroll {
    pub target: NodeId,
    pub delay: Duration,
    pub options: ScrollOptions,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Dropped when parsing a fragment, so full-document responses splice their
/// body content only.
const DOCUMENT_WRAPPERS: &[&str] = &["html", "head", "body"];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    files: HashMap<NodeId, Vec<String>>,
    rects: HashMap<NodeId, Rect>,
    viewport: Viewport,
    multipart: bool,
    listeners: Vec<(NodeId, Vec<EventKind>)>,
    signals: Vec<Signal>,
    scrolls: Vec<ScheduledScroll>,
}

/// In-memory page.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    inner: Rc<RefCell<Tree>>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// Empty page: `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut tree = Tree {
            nodes: Vec::new(),
            root: NodeId(0),
            files: HashMap::new(),
            rects: HashMap::new(),
            viewport: Viewport {
                width: 1024.0,
                height: 768.0,
            },
            multipart: true,
            listeners: Vec::new(),
            signals: Vec::new(),
            scrolls: Vec::new(),
        };
        let root = tree.create_element("html", Vec::new());
        let body = tree.create_element("body", Vec::new());
        tree.attach(root, body, None);
        tree.root = root;
        Self {
            inner: Rc::new(RefCell::new(tree)),
        }
    }

    /// Page whose body holds the parsed `html`.
    pub fn from_html(html: &str) -> Self {
        let page = Self::new();
        let body = page.body();
        page.set_inner_html(&body, html);
        page
    }

    pub fn body(&self) -> NodeId {
        let tree = self.inner.borrow();
        tree.nodes[tree.root.0].children[0]
    }

    /// First element in the page matching `selector`.
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        let root = self.document();
        self.query_first(&root, selector)
    }

    pub fn set_value(&self, element: NodeId, value: &str) {
        let is_textarea = self.tag_name(&element) == "textarea";
        if is_textarea {
            self.set_text(&element, value);
        } else {
            self.set_attribute(&element, "value", value);
        }
    }

    pub fn set_checked(&self, element: NodeId, checked: bool) {
        if checked {
            self.set_attribute(&element, "checked", "");
        } else {
            self.remove_attribute(&element, "checked");
        }
    }

    /// Select files (by name) in a file input.
    pub fn set_files(&self, element: NodeId, files: &[&str]) {
        self.inner
            .borrow_mut()
            .files
            .insert(element, files.iter().map(|f| f.to_string()).collect());
    }

    pub fn set_rect(&self, element: NodeId, rect: Rect) {
        self.inner.borrow_mut().rects.insert(element, rect);
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.inner.borrow_mut().viewport = viewport;
    }

    pub fn set_multipart_support(&self, supported: bool) {
        self.inner.borrow_mut().multipart = supported;
    }

    /// Detach `element` from its parent.
    pub fn remove(&self, element: NodeId) {
        self.inner.borrow_mut().detach(element);
    }

    /// Number of active `listen` registrations for `form`.
    pub fn listener_count(&self, form: NodeId) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(id, _)| *id == form)
            .count()
    }

    pub fn listened_events(&self, form: NodeId) -> Vec<EventKind> {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(id, _)| *id == form)
            .flat_map(|(_, events)| events.iter().copied())
            .collect()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.inner.borrow().signals.clone()
    }

    pub fn scrolls(&self) -> Vec<ScheduledScroll> {
        self.inner.borrow().scrolls.clone()
    }

    pub fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.attribute(&element, "class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn text(&self, element: NodeId) -> String {
        let tree = self.inner.borrow();
        let mut out = String::new();
        tree.collect_text(element, &mut out);
        out
    }

    pub fn inner_html(&self, element: NodeId) -> String {
        let tree = self.inner.borrow();
        let mut out = String::new();
        for child in &tree.nodes[element.0].children {
            tree.serialize(*child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, element: NodeId) -> String {
        let tree = self.inner.borrow();
        let mut out = String::new();
        tree.serialize(element, &mut out);
        out
    }

    /// Element children of `element`.
    pub fn children(&self, element: NodeId) -> Vec<NodeId> {
        let tree = self.inner.borrow();
        tree.nodes[element.0]
            .children
            .iter()
            .copied()
            .filter(|id| tree.is_element(*id))
            .collect()
    }
}

impl Tree {
    fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Element { .. })
    }

    fn tag(&self, id: NodeId) -> &str {
        match &self.nodes[id.0].data {
            NodeData::Element { tag, .. } => tag,
            NodeData::Text(_) => "#text",
        }
    }

    fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs,
            NodeData::Text(_) => &[],
        }
    }

    fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => Some(attrs),
            NodeData::Text(_) => None,
        }
    }

    fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if let Some(attrs) = self.attrs_mut(id) {
            match attrs.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((name, value.to_string())),
            }
        }
    }

    fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(attrs) = self.attrs_mut(id) {
            attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(i) if i <= children.len() => children.insert(i, child),
            _ => children.push(child),
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Pre-order descendants of `id`, excluding `id`.
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape(value, true));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &self.nodes[id.0].children {
                    self.serialize(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Parse `html` into detached top-level nodes (elements and text).
    fn parse(&mut self, html: &str) -> Vec<NodeId> {
        let mut top = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut rest = html;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("<!--") {
                rest = after.find("-->").map(|end| &after[end + 3..]).unwrap_or("");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                rest = rest.find('>').map(|end| &rest[end + 1..]).unwrap_or("");
            } else if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').unwrap_or(after.len());
                let name = after[..end].trim().to_ascii_lowercase();
                if let Some(pos) = stack.iter().rposition(|id| self.tag(*id) == name) {
                    stack.truncate(pos);
                }
                rest = after.get(end + 1..).unwrap_or("");
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let (tag, attrs, self_closing, after) = parse_tag(&rest[1..]);
                if DOCUMENT_WRAPPERS.contains(&tag.as_str()) {
                    rest = after;
                    continue;
                }
                let id = self.create_element(&tag, attrs);
                self.place(id, &stack, &mut top);
                rest = after;

                if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                    let close = format!("</{}", tag);
                    let end = find_ignore_case(rest, &close).unwrap_or(rest.len());
                    if end > 0 {
                        let text = self.push(NodeData::Text(unescape(&rest[..end])));
                        self.attach(id, text, None);
                    }
                    rest = &rest[end..];
                    rest = rest.find('>').map(|e| &rest[e + 1..]).unwrap_or("");
                } else if !self_closing && !VOID_ELEMENTS.contains(&tag.as_str()) {
                    stack.push(id);
                }
            } else {
                let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                let end = rest[first..]
                    .find('<')
                    .map(|e| e + first)
                    .unwrap_or(rest.len());
                let text = self.push(NodeData::Text(unescape(&rest[..end])));
                self.place(text, &stack, &mut top);
                rest = &rest[end..];
            }
        }
        top
    }

    fn place(&mut self, id: NodeId, stack: &[NodeId], top: &mut Vec<NodeId>) {
        match stack.last() {
            Some(parent) => self.attach(*parent, id, None),
            None => top.push(id),
        }
    }
}

/// Parse the inside of a start tag (after `<`).
/// Returns tag name, attributes, self-closing flag, and the remaining input.
fn parse_tag(input: &str) -> (String, Vec<(String, String)>, bool, &str) {
    let name_end = input
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(input.len());
    let tag = input[..name_end].to_ascii_lowercase();
    let mut rest = &input[name_end..];
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if let Some(after) = rest.strip_prefix('>') {
            rest = after;
            break;
        }
        if let Some(after) = rest.strip_prefix("/>") {
            self_closing = true;
            rest = after;
            break;
        }
        if let Some(after) = rest.strip_prefix('/') {
            rest = after;
            continue;
        }

        let end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..end].to_ascii_lowercase();
        rest = rest[end..].trim_start();

        let mut value = String::new();
        if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            if let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') {
                let body = &after[1..];
                let close = body.find(quote).unwrap_or(body.len());
                value = unescape(&body[..close]);
                rest = body.get(close + 1..).unwrap_or("");
            } else {
                let close = after
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(after.len());
                value = unescape(&after[..close]);
                rest = &after[close..];
            }
        }

        if !name.is_empty() && !attrs.iter().any(|(k, _)| *k == name) {
            attrs.push((name, value));
        }
    }

    (tag, attrs, self_closing, rest)
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn escape(text: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Selectors

#[derive(Debug, Default, Clone, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

/// Selector list: alternatives, each a descendant chain of compounds.
type SelectorList = Vec<Vec<Compound>>;

fn parse_selector(selector: &str) -> Option<SelectorList> {
    let mut list: SelectorList = Vec::new();
    let mut chain: Vec<Compound> = Vec::new();
    let mut current = Compound::default();
    let mut dirty = false;
    let mut chars = selector.chars().peekable();

    fn ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
        let mut out = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                out.push(c);
                chars.next();
            } else {
                break;
            }
        }
        out
    }

    while let Some(&c) = chars.peek() {
        match c {
            ',' => {
                chars.next();
                if dirty {
                    chain.push(std::mem::take(&mut current));
                    dirty = false;
                }
                if chain.is_empty() {
                    return None;
                }
                list.push(std::mem::take(&mut chain));
            }
            c if c.is_whitespace() => {
                chars.next();
                if dirty {
                    chain.push(std::mem::take(&mut current));
                    dirty = false;
                }
            }
            '#' => {
                chars.next();
                current.id = Some(ident(&mut chars));
                dirty = true;
            }
            '.' => {
                chars.next();
                current.classes.push(ident(&mut chars));
                dirty = true;
            }
            '*' => {
                chars.next();
                dirty = true;
            }
            '[' => {
                chars.next();
                let name: String = {
                    let mut out = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '=' || c == ']' || c.is_whitespace() {
                            break;
                        }
                        out.push(c.to_ascii_lowercase());
                        chars.next();
                    }
                    out
                };
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                let value = match chars.next() {
                    Some(']') => None,
                    Some('=') => {
                        while chars.peek().is_some_and(|c| c.is_whitespace()) {
                            chars.next();
                        }
                        let mut value = String::new();
                        match chars.peek().copied() {
                            Some(quote @ ('"' | '\'')) => {
                                chars.next();
                                loop {
                                    match chars.next() {
                                        Some('\\') => value.extend(chars.next()),
                                        Some(c) if c == quote => break,
                                        Some(c) => value.push(c),
                                        None => return None,
                                    }
                                }
                            }
                            _ => {
                                while let Some(&c) = chars.peek() {
                                    if c == ']' || c.is_whitespace() {
                                        break;
                                    }
                                    value.push(c);
                                    chars.next();
                                }
                            }
                        }
                        while chars.peek().is_some_and(|c| c.is_whitespace()) {
                            chars.next();
                        }
                        if chars.next() != Some(']') {
                            return None;
                        }
                        Some(value)
                    }
                    _ => return None,
                };
                if name.is_empty() {
                    return None;
                }
                current.attrs.push((name, value));
                dirty = true;
            }
            c if c.is_alphabetic() => {
                current.tag = Some(ident(&mut chars).to_ascii_lowercase());
                dirty = true;
            }
            _ => return None,
        }
    }

    if dirty {
        chain.push(current);
    }
    if chain.is_empty() {
        return None;
    }
    list.push(chain);
    Some(list)
}

impl Tree {
    fn matches_compound(&self, id: NodeId, compound: &Compound) -> bool {
        if !self.is_element(id) {
            return false;
        }
        if let Some(tag) = &compound.tag {
            if self.tag(id) != tag {
                return false;
            }
        }
        if let Some(wanted) = &compound.id {
            if self.attr(id, "id") != Some(wanted.as_str()) {
                return false;
            }
        }
        if !compound.classes.is_empty() {
            let classes = self.attr(id, "class").unwrap_or("");
            if !compound
                .classes
                .iter()
                .all(|c| classes.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        compound.attrs.iter().all(|(name, value)| match value {
            None => self.attr(id, name).is_some(),
            Some(value) => self.attr(id, name) == Some(value.as_str()),
        })
    }

    fn matches_chain(&self, id: NodeId, chain: &[Compound]) -> bool {
        let Some((last, ancestors)) = chain.split_last() else {
            return false;
        };
        if !self.matches_compound(id, last) {
            return false;
        }
        let mut remaining = ancestors;
        let mut cursor = self.nodes[id.0].parent;
        while let Some((wanted, rest)) = remaining.split_last() {
            let Some(ancestor) = cursor else {
                return false;
            };
            if self.matches_compound(ancestor, wanted) {
                remaining = rest;
            }
            cursor = self.nodes[ancestor.0].parent;
        }
        true
    }
}

// ---------------------------------------------------------------------------

impl Platform for MemoryPage {
    type Element = NodeId;

    fn document(&self) -> NodeId {
        self.inner.borrow().root
    }

    fn query_all(&self, scope: &NodeId, selector: &str) -> Vec<NodeId> {
        let Some(list) = parse_selector(selector) else {
            tracing::warn!("unsupported selector '{}'", selector);
            return Vec::new();
        };
        let tree = self.inner.borrow();
        tree.descendants(*scope)
            .into_iter()
            .filter(|id| list.iter().any(|chain| tree.matches_chain(*id, chain)))
            .collect()
    }

    fn parent(&self, element: &NodeId) -> Option<NodeId> {
        self.inner.borrow().nodes[element.0].parent
    }

    fn is_connected(&self, element: &NodeId) -> bool {
        let tree = self.inner.borrow();
        let mut cursor = Some(*element);
        while let Some(id) = cursor {
            if id == tree.root {
                return true;
            }
            cursor = tree.nodes[id.0].parent;
        }
        false
    }

    fn tag_name(&self, element: &NodeId) -> String {
        self.inner.borrow().tag(*element).to_string()
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .attr(*element, &name.to_ascii_lowercase())
            .map(str::to_string)
    }

    fn attributes(&self, element: &NodeId) -> Vec<(String, String)> {
        self.inner.borrow().attrs(*element).to_vec()
    }

    fn set_attribute(&self, element: &NodeId, name: &str, value: &str) {
        self.inner.borrow_mut().set_attr(*element, name, value);
    }

    fn remove_attribute(&self, element: &NodeId, name: &str) {
        self.inner.borrow_mut().remove_attr(*element, name);
    }

    fn add_class(&self, element: &NodeId, class: &str) {
        let mut tree = self.inner.borrow_mut();
        let current = tree.attr(*element, "class").unwrap_or("").to_string();
        if current.split_whitespace().any(|c| c == class) {
            return;
        }
        let updated = if current.trim().is_empty() {
            class.to_string()
        } else {
            format!("{} {}", current.trim(), class)
        };
        tree.set_attr(*element, "class", &updated);
    }

    fn remove_class(&self, element: &NodeId, class: &str) {
        let mut tree = self.inner.borrow_mut();
        let Some(current) = tree.attr(*element, "class").map(str::to_string) else {
            return;
        };
        let updated = current
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        tree.set_attr(*element, "class", &updated);
    }

    fn set_text(&self, element: &NodeId, text: &str) {
        let mut tree = self.inner.borrow_mut();
        tree.clear_children(*element);
        if !text.is_empty() {
            let node = tree.push(NodeData::Text(text.to_string()));
            tree.attach(*element, node, None);
        }
    }

    fn field_value(&self, element: &NodeId) -> String {
        let tree = self.inner.borrow();
        match tree.tag(*element) {
            "textarea" => {
                let mut out = String::new();
                tree.collect_text(*element, &mut out);
                out
            }
            "select" => {
                let options: Vec<NodeId> = tree
                    .descendants(*element)
                    .into_iter()
                    .filter(|id| tree.tag(*id) == "option")
                    .collect();
                options
                    .iter()
                    .find(|id| tree.attr(**id, "selected").is_some())
                    .or(options.first())
                    .map(|id| match tree.attr(*id, "value") {
                        Some(value) => value.to_string(),
                        None => {
                            let mut out = String::new();
                            tree.collect_text(*id, &mut out);
                            out
                        }
                    })
                    .unwrap_or_default()
            }
            "input" => match tree.attr(*element, "type") {
                Some(t)
                    if t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio") =>
                {
                    tree.attr(*element, "value").unwrap_or("on").to_string()
                }
                _ => tree.attr(*element, "value").unwrap_or("").to_string(),
            },
            _ => String::new(),
        }
    }

    fn is_checked(&self, element: &NodeId) -> bool {
        self.inner.borrow().attr(*element, "checked").is_some()
    }

    fn file_count(&self, element: &NodeId) -> usize {
        self.inner
            .borrow()
            .files
            .get(element)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn set_disabled(&self, element: &NodeId, disabled: bool) {
        let mut tree = self.inner.borrow_mut();
        if disabled {
            tree.set_attr(*element, "disabled", "");
        } else {
            tree.remove_attr(*element, "disabled");
        }
    }

    fn is_disabled(&self, element: &NodeId) -> bool {
        self.inner.borrow().attr(*element, "disabled").is_some()
    }

    fn form_entries(&self, form: &NodeId) -> Vec<(String, FormEntry)> {
        let controls: Vec<NodeId> = {
            let tree = self.inner.borrow();
            tree.descendants(*form)
                .into_iter()
                .filter(|id| matches!(tree.tag(*id), "input" | "select" | "textarea"))
                .filter(|id| tree.attr(*id, "disabled").is_none())
                .filter(|id| tree.attr(*id, "name").is_some_and(|n| !n.is_empty()))
                .collect()
        };

        let mut entries = Vec::new();
        for control in controls {
            let name = self.attribute(&control, "name").unwrap_or_default();
            let kind = self
                .attribute(&control, "type")
                .unwrap_or_default()
                .to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "reset" | "image" => {}
                "checkbox" | "radio" => {
                    if self.is_checked(&control) {
                        entries.push((name, FormEntry::Text(self.field_value(&control))));
                    }
                }
                "file" => {
                    let files = self
                        .inner
                        .borrow()
                        .files
                        .get(&control)
                        .cloned()
                        .unwrap_or_default();
                    if files.is_empty() {
                        entries.push((
                            name.clone(),
                            FormEntry::File {
                                file_name: String::new(),
                            },
                        ));
                    }
                    for file_name in files {
                        entries.push((name.clone(), FormEntry::File { file_name }));
                    }
                }
                _ => entries.push((name, FormEntry::Text(self.field_value(&control)))),
            }
        }
        entries
    }

    fn listen(&self, form: &NodeId, events: &[EventKind]) {
        self.inner
            .borrow_mut()
            .listeners
            .push((*form, events.to_vec()));
    }

    fn unlisten(&self, form: &NodeId) {
        self.inner
            .borrow_mut()
            .listeners
            .retain(|(id, _)| id != form);
    }

    fn parse_fragment(&self, html: &str) -> Vec<NodeId> {
        let mut tree = self.inner.borrow_mut();
        let nodes = tree.parse(html);
        nodes.into_iter().filter(|id| tree.is_element(*id)).collect()
    }

    fn prepend(&self, parent: &NodeId, nodes: &[NodeId]) {
        let mut tree = self.inner.borrow_mut();
        for (index, node) in nodes.iter().enumerate() {
            tree.attach(*parent, *node, Some(index));
        }
    }

    fn append_child(&self, parent: &NodeId, node: &NodeId) {
        self.inner.borrow_mut().attach(*parent, *node, None);
    }

    fn set_inner_html(&self, element: &NodeId, html: &str) {
        let mut tree = self.inner.borrow_mut();
        tree.clear_children(*element);
        for node in tree.parse(html) {
            tree.attach(*element, node, None);
        }
    }

    fn replace_with_html(&self, element: &NodeId, html: &str) -> Vec<NodeId> {
        let mut tree = self.inner.borrow_mut();
        let Some(parent) = tree.nodes[element.0].parent else {
            return Vec::new();
        };
        let index = tree.nodes[parent.0]
            .children
            .iter()
            .position(|c| c == element)
            .unwrap_or(0);
        let nodes = tree.parse(html);
        tree.detach(*element);
        for (offset, node) in nodes.iter().enumerate() {
            tree.attach(parent, *node, Some(index + offset));
        }
        nodes.into_iter().filter(|id| tree.is_element(*id)).collect()
    }

    fn bounding_rect(&self, element: &NodeId) -> Rect {
        self.inner
            .borrow()
            .rects
            .get(element)
            .copied()
            .unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    fn schedule_scroll_into_view(
        &self,
        element: &NodeId,
        delay: Duration,
        options: ScrollOptions,
    ) {
        self.inner.borrow_mut().scrolls.push(ScheduledScroll {
            target: *element,
            delay,
            options,
        });
    }

    fn dispatch(&self, element: &NodeId, name: &str, bubbles: bool) {
        self.inner.borrow_mut().signals.push(Signal {
            target: *element,
            name: name.to_string(),
            bubbles,
        });
    }

    fn supports_multipart(&self) -> bool {
        self.inner.borrow().multipart
    }
}
