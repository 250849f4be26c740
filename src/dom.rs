//! The view of a host document that the engine works against.
//!
//! A host (a browser binding, or [`crate::tree::Document`]) implements
//! [`Dom`] for structure and edits and [`Styles`] for computed style. The
//! engine never holds node references across host events other than the
//! ones it schedules itself.

use std::fmt::Debug;
use std::hash::Hash;

/// Tagged view of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Element { tag: &'a str },
    Text(&'a str),
    /// Comments, processing instructions, foreign content...
    Other,
}

/// Structural access to a host document plus the handful of edits the
/// engine performs.
pub trait Dom {
    type Node: Copy + Eq + Hash + Debug + 'static;

    fn kind(&self, node: Self::Node) -> NodeKind<'_>;
    /// Parent element; `None` when the parent is the document or absent.
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;
    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;
    fn last_child(&self, node: Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;
    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;
    /// Whether the node is still part of the document.
    fn is_connected(&self, node: Self::Node) -> bool;

    /// Merge adjacent text nodes and drop empty ones in the subtree.
    fn normalize(&mut self, root: Self::Node);
    fn create_text(&mut self, data: &str) -> Self::Node;
    /// A `span` carrying `class`, with `data` as its only text.
    fn create_marker(&mut self, class: &str, data: &str) -> Self::Node;
    /// Replace `node` with `replacement`, in order.
    fn replace_with(&mut self, node: Self::Node, replacement: &[Self::Node]);
    fn insert_before(&mut self, reference: Self::Node, new: Self::Node);
    fn insert_after(&mut self, reference: Self::Node, new: Self::Node);

    fn title(&self) -> Option<String> {
        None
    }

    fn set_title(&mut self, _title: &str) {}

    fn children(&self, node: Self::Node) -> Children<'_, Self> {
        Children {
            dom: self,
            next: self.first_child(node),
        }
    }

    fn tag(&self, node: Self::Node) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    fn text_data(&self, node: Self::Node) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Text(data) => Some(data),
            _ => None,
        }
    }

    fn has_class(&self, node: Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// All nodes below `root` in document order, `root` excluded.
    fn descendants(&self, root: Self::Node) -> Vec<Self::Node> {
        let mut result = Vec::new();
        let mut stack: Vec<Self::Node> = Vec::new();
        let mut child = self.last_child(root);
        while let Some(node) = child {
            stack.push(node);
            child = self.previous_sibling(node);
        }
        while let Some(node) = stack.pop() {
            result.push(node);
            let mut child = self.last_child(node);
            while let Some(c) = child {
                stack.push(c);
                child = self.previous_sibling(c);
            }
        }
        result
    }

    /// Concatenated text of every text node in the subtree.
    fn text_content(&self, node: Self::Node) -> String {
        if let Some(data) = self.text_data(node) {
            return data.to_string();
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|n| self.text_data(n))
            .collect()
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'a, D: Dom + ?Sized> {
    dom: &'a D,
    next: Option<D::Node>,
}

impl<D: Dom + ?Sized> Iterator for Children<'_, D> {
    type Item = D::Node;

    fn next(&mut self) -> Option<D::Node> {
        let node = self.next?;
        self.next = self.dom.next_sibling(node);
        Some(node)
    }
}

/// Outer display type, reduced to what the sibling walk needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    None,
    Inline,
    Block,
}

impl Display {
    /// `inline`, `inline-block`, `inline flex`... are inline; anything else
    /// that is not `none` starts a new line.
    pub fn from_css(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("none") {
            Display::None
        } else if value.to_ascii_lowercase().contains("inline") {
            Display::Inline
        } else {
            Display::Block
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    pub fn from_css(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hidden" => Visibility::Hidden,
            "collapse" => Visibility::Collapse,
            _ => Visibility::Visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    pub opacity: f32,
}

impl ComputedStyle {
    pub fn is_visible(&self) -> bool {
        self.display != Display::None && self.visibility == Visibility::Visible && self.opacity > 0.0
    }

    pub fn is_inline(&self) -> bool {
        self.display == Display::Inline
    }
}

impl Default for ComputedStyle {
    fn default() -> Self {
        ComputedStyle {
            display: Display::Inline,
            visibility: Visibility::Visible,
            opacity: 1.0,
        }
    }
}

/// Computed style capability of the host.
pub trait Styles: Dom {
    /// Only meaningful for elements; other nodes may return the default.
    fn computed_style(&self, node: Self::Node) -> ComputedStyle;

    fn is_visible(&self, node: Self::Node) -> bool {
        self.computed_style(node).is_visible()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One record of the host's subtree change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    pub added_nodes: Vec<N>,
}

/// One record of the host's viewport intersection feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry<N> {
    pub target: N,
    pub is_intersecting: bool,
}
