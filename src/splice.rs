//! Computing and applying the marker edits for one leaf.
//!
//! Planning only reads the document; the resulting [`Edit`]s are handed to
//! the [`MutationQueue`] and applied once the leaf is on screen. By then the
//! page may have changed, so every edit re-checks its target first.

use crate::boundary::{boundaries_with_lookahead, is_boundary_at};
use crate::config::Config;
use crate::dom::{Dom, NodeKind, Styles};
use crate::leaves::is_leaf;
use crate::queue::{MutationQueue, Viewport};
use crate::utils::{split_at_indexes, split_last_char};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<N> {
    /// Wrap the character before each index of a text node in a marker.
    /// `data` is the text the indexes were computed against.
    Split { node: N, data: String, indexes: Vec<usize> },
    /// Insert an empty marker right before the node.
    MarkBefore(N),
    /// Insert an empty marker right after the node.
    MarkAfter(N),
}

/// The next node rendered after `node`, if any.
///
/// Comments and other non-content nodes, invisible elements and
/// whitespace-only text are skipped. At the end of a parent the walk
/// continues from the parent's next sibling; a block element ends it.
pub fn next_visible_sibling<D: Styles + ?Sized>(dom: &D, node: D::Node) -> Option<D::Node> {
    let mut current = node;
    loop {
        let Some(candidate) = dom.next_sibling(current) else {
            current = dom.parent_element(current)?;
            continue;
        };
        current = candidate;

        match dom.kind(candidate) {
            NodeKind::Other => {}
            NodeKind::Text(data) => {
                if !data.trim().is_empty() {
                    return Some(candidate);
                }
            }
            NodeKind::Element { .. } => {
                let style = dom.computed_style(candidate);
                if style.is_visible() {
                    return style.is_inline().then_some(candidate);
                }
            }
        }
    }
}

/// The previous node on the same line within the same parent. Mirrors
/// [`next_visible_sibling`] but does not leave the parent.
pub fn previous_visible_sibling<D: Styles + ?Sized>(dom: &D, node: D::Node) -> Option<D::Node> {
    let mut current = node;
    loop {
        let candidate = dom.previous_sibling(current)?;
        current = candidate;

        match dom.kind(candidate) {
            NodeKind::Other => {}
            NodeKind::Text(data) => {
                if !data.trim().is_empty() {
                    return Some(candidate);
                }
            }
            NodeKind::Element { .. } => {
                let style = dom.computed_style(candidate);
                if style.is_visible() {
                    return style.is_inline().then_some(candidate);
                }
            }
        }
    }
}

pub fn first_visible_char<D: Styles + ?Sized>(dom: &D, node: D::Node) -> Option<char> {
    edge_char(dom, node, false)
}

pub fn last_visible_char<D: Styles + ?Sized>(dom: &D, node: D::Node) -> Option<char> {
    edge_char(dom, node, true)
}

fn edge_char<D: Styles + ?Sized>(dom: &D, node: D::Node, from_end: bool) -> Option<char> {
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        match dom.kind(n) {
            NodeKind::Other => {}
            NodeKind::Text(data) => {
                if data.trim().is_empty() {
                    continue;
                }
                return if from_end { data.chars().last() } else { data.chars().next() };
            }
            NodeKind::Element { .. } => {
                if n != node && !dom.is_visible(n) {
                    continue;
                }
                // push so that the child nearest the wanted edge pops first
                let mut child = if from_end { dom.first_child(n) } else { dom.last_child(n) };
                while let Some(c) = child {
                    stack.push(c);
                    child = if from_end { dom.next_sibling(c) } else { dom.previous_sibling(c) };
                }
            }
        }
    }
    None
}

/// Whether the text of `node` is never scanned by any leaf: a blocked
/// element, or a text node whose parent is not a visible eligible element.
fn is_opaque<D: Styles + ?Sized>(dom: &D, config: &Config, node: D::Node) -> bool {
    match dom.kind(node) {
        NodeKind::Element { .. } => config.is_blocked(dom, node),
        NodeKind::Text(_) => match dom.parent_element(node) {
            Some(parent) => !(config.is_eligible(dom, parent) && dom.is_visible(parent)),
            None => true,
        },
        NodeKind::Other => false,
    }
}

/// A boundary between `node` and unscanned content right before it.
fn follows_opaque<D: Styles + ?Sized>(dom: &D, config: &Config, node: D::Node) -> bool {
    let Some(prev) = previous_visible_sibling(dom, node) else {
        return false;
    };
    if !is_opaque(dom, config, prev) {
        return false;
    }
    match (last_visible_char(dom, prev), first_visible_char(dom, node)) {
        (Some(before), Some(after)) => is_boundary_at(before, after),
        _ => false,
    }
}

/// Whether `leaf` ends with blocked content, so that no text pass can
/// reach across its end. Trailing inline elements are descended into,
/// unless they are leaves themselves, which own that edge.
fn ends_opaque<D: Styles + ?Sized>(dom: &D, config: &Config, leaf: D::Node) -> bool {
    let mut current = leaf;
    while let Some(last) = last_significant_child(dom, current) {
        let NodeKind::Element { .. } = dom.kind(last) else {
            return false;
        };
        if config.is_blocked(dom, last) {
            return true;
        }
        if !dom.computed_style(last).is_inline() || is_scanned_leaf(dom, config, last) {
            return false;
        }
        current = last;
    }
    false
}

/// The last child that renders anything: non-blank text or a visible element.
fn last_significant_child<D: Styles + ?Sized>(dom: &D, node: D::Node) -> Option<D::Node> {
    let mut child = dom.last_child(node);
    while let Some(c) = child {
        match dom.kind(c) {
            NodeKind::Other => {}
            NodeKind::Text(data) => {
                if !data.trim().is_empty() {
                    return Some(c);
                }
            }
            NodeKind::Element { .. } => {
                if dom.is_visible(c) {
                    return Some(c);
                }
            }
        }
        child = dom.previous_sibling(c);
    }
    None
}

fn is_scanned_leaf<D: Styles + ?Sized>(dom: &D, config: &Config, node: D::Node) -> bool {
    config.is_eligible(dom, node) && dom.is_visible(node) && is_leaf(dom, node)
}

/// Compute the edits for one leaf without touching the document.
pub fn plan<D: Styles + ?Sized>(dom: &D, config: &Config, leaf: D::Node) -> Vec<Edit<D::Node>> {
    let mut edits = Vec::new();

    if follows_opaque(dom, config, leaf) {
        edits.push(Edit::MarkBefore(leaf));
    }

    for child in dom.children(leaf) {
        let NodeKind::Text(data) = dom.kind(child) else {
            continue;
        };

        if follows_opaque(dom, config, child) {
            edits.push(Edit::MarkBefore(child));
        }

        // The first character of whatever follows only reveals a boundary
        // at the very end of this node.
        let lookahead = next_visible_sibling(dom, child).and_then(|next| first_visible_char(dom, next));
        let indexes = boundaries_with_lookahead(data, lookahead);
        // An unchanged node must not be rewritten: the write would come back
        // through the change feed as new content.
        if indexes.is_empty() {
            continue;
        }
        log::trace!("text {:?}: boundaries {:?}", child, indexes);
        edits.push(Edit::Split {
            node: child,
            data: data.to_string(),
            indexes,
        });
    }

    if ends_opaque(dom, config, leaf) {
        let crosses = next_visible_sibling(dom, leaf)
            .and_then(|next| Some((last_visible_char(dom, leaf)?, first_visible_char(dom, next)?)))
            .is_some_and(|(before, after)| is_boundary_at(before, after));
        if crosses {
            edits.push(Edit::MarkAfter(leaf));
        }
    }

    edits
}

/// Plan the edits for `leaf` and queue them until it is visible. Returns
/// whether anything was scheduled.
pub fn adjust<D, V>(dom: &D, queue: &mut MutationQueue<D, V>, config: &Config, leaf: D::Node) -> bool
where
    D: Styles + 'static,
    V: Viewport<D::Node>,
{
    let edits = plan(dom, config, leaf);
    if edits.is_empty() {
        return false;
    }
    queue.schedule(leaf, splice_task(config.marker_class.clone(), edits));
    true
}

fn splice_task<D: Dom + 'static>(marker_class: String, edits: Vec<Edit<D::Node>>) -> impl FnOnce(&mut D, D::Node) + 'static {
    move |dom, _| apply(dom, &marker_class, &edits)
}

/// Apply planned edits. Targets that left the document or whose text
/// changed since planning are skipped.
pub fn apply<D: Dom + ?Sized>(dom: &mut D, marker_class: &str, edits: &[Edit<D::Node>]) {
    for edit in edits {
        match edit {
            Edit::Split { node, data, indexes } => {
                if !dom.is_connected(*node) || dom.text_data(*node) != Some(data.as_str()) {
                    log::debug!("skipping stale text node {:?}", node);
                    continue;
                }

                let fragments = split_at_indexes(data, indexes);
                let Some((last, init)) = fragments.split_last() else {
                    continue;
                };
                let mut replacement = Vec::with_capacity(fragments.len() * 2);
                for fragment in init {
                    let (head, ch) = split_last_char(fragment);
                    if ch.is_empty() {
                        continue;
                    }
                    if !head.is_empty() {
                        replacement.push(dom.create_text(head));
                    }
                    replacement.push(dom.create_marker(marker_class, ch));
                }
                if !last.is_empty() {
                    replacement.push(dom.create_text(last));
                }
                dom.replace_with(*node, &replacement);
            }
            // the same mark may be queued by several scans of one leaf
            Edit::MarkBefore(node) => {
                let marked = dom.previous_sibling(*node).is_some_and(|s| dom.has_class(s, marker_class));
                if dom.is_connected(*node) && !marked {
                    let marker = dom.create_marker(marker_class, "");
                    dom.insert_before(*node, marker);
                }
            }
            Edit::MarkAfter(node) => {
                let marked = dom.next_sibling(*node).is_some_and(|s| dom.has_class(s, marker_class));
                if dom.is_connected(*node) && !marked {
                    let marker = dom.create_marker(marker_class, "");
                    dom.insert_after(*node, marker);
                }
            }
        }
    }
}
