//! Arena-backed document for hosts that mirror a page outside a browser.
//!
//! Structural edits made while a node is connected are recorded as
//! [`MutationRecord`]s, which the host can hand back to
//! [`crate::Spacer::on_mutations`] the way a browser's mutation observer
//! would.

use crate::dom::{ComputedStyle, Display, Dom, MutationKind, MutationRecord, NodeKind, Styles, Visibility};
use indextree::{Arena, NodeId};

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }
}

/// Initial `display` for elements without an inline style.
fn default_display(tag: &str) -> &'static str {
    match tag {
        "head" | "script" | "style" | "template" | "title" | "meta" | "link" => "none",
        "li" => "list-item",
        "td" | "th" => "table-cell",
        "tr" => "table-row",
        "table" => "table",
        "address" | "article" | "aside" | "blockquote" | "body" | "center" | "dd" | "details"
        | "div" | "dl" | "dt" | "figcaption" | "figure" | "footer" | "form" | "h1" | "h2"
        | "h3" | "h4" | "h5" | "h6" | "header" | "hr" | "html" | "main" | "nav" | "ol" | "p"
        | "pre" | "section" | "summary" | "ul" => "block",
        _ => "inline",
    }
}

pub struct Document {
    arena: Arena<NodeData>,
    document: NodeId,
    body: NodeId,
    title: String,
    records: Vec<MutationRecord<NodeId>>,
}

impl Document {
    /// An empty document with a `<body>`.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData::Document);
        let body = arena.new_node(NodeData::Element(ElementData::new("body")));
        document.append(body, &mut arena);
        Document {
            arena,
            document,
            body,
            title: String::new(),
            records: Vec::new(),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.arena.new_node(NodeData::Comment(data.to_string()))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element(element) = self.arena[node].get_mut() {
            element.set_attribute(name, value);
        }
        self.record(node, MutationKind::Attributes, Vec::new());
    }

    /// Replace the data of a text or comment node.
    pub fn set_data(&mut self, node: NodeId, data: &str) {
        match self.arena[node].get_mut() {
            NodeData::Text(text) | NodeData::Comment(text) => *text = data.to_string(),
            _ => return,
        }
        self.record(node, MutationKind::CharacterData, Vec::new());
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = parent.checked_append(child, &mut self.arena) {
            log::warn!("cannot append {child:?} to {parent:?}: {err}");
            return;
        }
        self.record(parent, MutationKind::ChildList, vec![child]);
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_element(tag);
        self.append_child(parent, node);
        node
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, data: &str) -> NodeId {
        let node = Dom::create_text(self, data);
        self.append_child(parent, node);
        node
    }

    /// Detach `node` and its subtree from the document.
    pub fn remove(&mut self, node: NodeId) {
        node.detach(&mut self.arena);
    }

    /// Take the mutation records accumulated since the last call.
    pub fn take_records(&mut self) -> Vec<MutationRecord<NodeId>> {
        std::mem::take(&mut self.records)
    }

    fn record(&mut self, target: NodeId, kind: MutationKind, added_nodes: Vec<NodeId>) {
        if self.is_connected(target) {
            self.records.push(MutationRecord { kind, added_nodes });
        }
    }

    /// Serialize a subtree as HTML, mostly for tests and debugging.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match self.arena[node].get() {
            NodeData::Document => {
                for child in node.children(&self.arena) {
                    self.write_html(child, out);
                }
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
                    out.push('"');
                }
                out.push('>');
                for child in node.children(&self.arena) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
            NodeData::Text(text) => {
                out.push_str(&text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;"));
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom for Document {
    type Node = NodeId;

    fn kind(&self, node: NodeId) -> NodeKind<'_> {
        match self.arena[node].get() {
            NodeData::Element(element) => NodeKind::Element { tag: &element.tag },
            NodeData::Text(text) => NodeKind::Text(text),
            NodeData::Document | NodeData::Comment(_) => NodeKind::Other,
        }
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.arena[node].parent()?;
        matches!(self.arena[parent].get(), NodeData::Element(_)).then_some(parent)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].first_child()
    }

    fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].last_child()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].next_sibling()
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].previous_sibling()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.arena[node].get() {
            NodeData::Element(element) => element.attribute(name),
            _ => None,
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        node.ancestors(&self.arena).any(|n| n == self.document)
    }

    fn normalize(&mut self, root: NodeId) {
        let parents: Vec<NodeId> = root
            .descendants(&self.arena)
            .filter(|&n| !matches!(self.arena[n].get(), NodeData::Text(_)))
            .collect();

        for parent in parents {
            let mut child = self.arena[parent].first_child();
            let mut previous_text: Option<NodeId> = None;
            while let Some(node) = child {
                child = self.arena[node].next_sibling();
                let NodeData::Text(data) = self.arena[node].get() else {
                    previous_text = None;
                    continue;
                };
                if data.is_empty() {
                    node.detach(&mut self.arena);
                    continue;
                }
                match previous_text {
                    Some(prev) => {
                        let data = data.clone();
                        if let NodeData::Text(text) = self.arena[prev].get_mut() {
                            text.push_str(&data);
                        }
                        node.detach(&mut self.arena);
                    }
                    None => previous_text = Some(node),
                }
            }
        }
    }

    fn create_text(&mut self, data: &str) -> NodeId {
        self.arena.new_node(NodeData::Text(data.to_string()))
    }

    fn create_marker(&mut self, class: &str, data: &str) -> NodeId {
        let mut element = ElementData::new("span");
        element.set_attribute("class", class);
        let marker = self.arena.new_node(NodeData::Element(element));
        if !data.is_empty() {
            let text = self.arena.new_node(NodeData::Text(data.to_string()));
            marker.append(text, &mut self.arena);
        }
        marker
    }

    fn replace_with(&mut self, node: NodeId, replacement: &[NodeId]) {
        let Some(parent) = self.arena[node].parent() else {
            return;
        };
        for &new in replacement {
            if let Err(err) = node.checked_insert_before(new, &mut self.arena) {
                log::warn!("cannot insert {new:?} before {node:?}: {err}");
            }
        }
        node.detach(&mut self.arena);
        self.record(parent, MutationKind::ChildList, replacement.to_vec());
    }

    fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        let Some(parent) = self.arena[reference].parent() else {
            return;
        };
        if let Err(err) = reference.checked_insert_before(new, &mut self.arena) {
            log::warn!("cannot insert {new:?} before {reference:?}: {err}");
            return;
        }
        self.record(parent, MutationKind::ChildList, vec![new]);
    }

    fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        let Some(parent) = self.arena[reference].parent() else {
            return;
        };
        if let Err(err) = reference.checked_insert_after(new, &mut self.arena) {
            log::warn!("cannot insert {new:?} after {reference:?}: {err}");
            return;
        }
        self.record(parent, MutationKind::ChildList, vec![new]);
    }

    fn title(&self) -> Option<String> {
        Some(self.title.clone())
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}

impl Styles for Document {
    fn computed_style(&self, node: NodeId) -> ComputedStyle {
        let NodeData::Element(element) = self.arena[node].get() else {
            return ComputedStyle::default();
        };

        let mut style = ComputedStyle {
            display: Display::from_css(default_display(&element.tag)),
            ..ComputedStyle::default()
        };
        if element.attribute("hidden").is_some() {
            style.display = Display::None;
        }
        // inline declarations only; no cascade
        if let Some(declarations) = element.attribute("style") {
            for declaration in declarations.split(';') {
                let Some((property, value)) = declaration.split_once(':') else {
                    continue;
                };
                match property.trim().to_ascii_lowercase().as_str() {
                    "display" => style.display = Display::from_css(value),
                    "visibility" => style.visibility = Visibility::from_css(value),
                    "opacity" => {
                        if let Ok(opacity) = value.trim().parse::<f32>() {
                            style.opacity = opacity;
                        }
                    }
                    _ => {}
                }
            }
        }
        style
    }
}
