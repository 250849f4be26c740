use crate::config::{Config, Selector};
use crate::dom::{NodeKind, Styles};

/// Collect the leaf elements under `root`, in document order.
///
/// A leaf is an eligible, visible element that either has a direct text
/// child, or has exactly one child while not being the only child of its
/// parent. The root itself comes first when it is eligible.
pub fn leaves<D: Styles + ?Sized>(dom: &mut D, root: D::Node, config: &Config) -> Vec<D::Node> {
    // adjacent text nodes would hide boundaries between them
    dom.normalize(root);
    let dom = &*dom;

    let mut result = Vec::new();
    if config.is_eligible(dom, root) {
        result.push(root);
    }

    // Ancestors above the root are checked once; inside the subtree the
    // blocked/lang state is carried down the walk and blocked subtrees
    // are skipped whole.
    if has_blocked_ancestor(dom, root, config) {
        return result;
    }
    let root_lang = inherited_lang(dom, root, config);

    let mut stack: Vec<(D::Node, bool)> = Vec::new();
    push_children(dom, root, root_lang, &mut stack);

    while let Some((node, lang_ok)) = stack.pop() {
        let NodeKind::Element { tag } = dom.kind(node) else {
            continue;
        };
        if config.is_blocked(dom, node) || config.is_marker(dom, node) {
            continue;
        }
        let lang_ok = match dom.attribute(node, "lang") {
            Some(lang) => config.lang_matches(lang),
            None => lang_ok,
        };

        if lang_ok && config.is_allowed_tag(tag) && dom.is_visible(node) && is_leaf(dom, node) {
            result.push(node);
        }
        push_children(dom, node, lang_ok, &mut stack);
    }

    log::trace!("found {} leaves", result.len());
    result
}

fn push_children<D: Styles + ?Sized>(dom: &D, node: D::Node, lang_ok: bool, stack: &mut Vec<(D::Node, bool)>) {
    let mut child = dom.last_child(node);
    while let Some(c) = child {
        stack.push((c, lang_ok));
        child = dom.previous_sibling(c);
    }
}

fn has_blocked_ancestor<D: Styles + ?Sized>(dom: &D, root: D::Node, config: &Config) -> bool {
    let mut current = Some(root);
    while let Some(node) = current {
        if config.is_blocked(dom, node) || config.is_marker(dom, node) {
            return true;
        }
        current = dom.parent_element(node);
    }
    false
}

fn inherited_lang<D: Styles + ?Sized>(dom: &D, root: D::Node, config: &Config) -> bool {
    if config.lang.is_none() {
        return true;
    }
    let mut current = Some(root);
    while let Some(node) = current {
        if let Some(lang) = dom.attribute(node, "lang") {
            return config.lang_matches(lang);
        }
        current = dom.parent_element(node);
    }
    false
}

pub(crate) fn is_leaf<D: Styles + ?Sized>(dom: &D, node: D::Node) -> bool {
    let mut count = 0;
    for child in dom.children(node) {
        if matches!(dom.kind(child), NodeKind::Text(_)) {
            return true;
        }
        count += 1;
    }
    count == 1 && !is_only_child(dom, node)
}

fn is_only_child<D: Styles + ?Sized>(dom: &D, node: D::Node) -> bool {
    dom.previous_sibling(node).is_none() && dom.next_sibling(node).is_none()
}

/// The outermost nodes in `root`'s subtree (root included) matching any of
/// `selectors`, in document order. An empty selector list yields `root`.
pub fn containers<D: Styles + ?Sized>(dom: &D, root: D::Node, selectors: &[Selector]) -> Vec<D::Node> {
    if selectors.is_empty() {
        return vec![root];
    }

    let matches = |node: D::Node| selectors.iter().any(|s| s.matches(dom, node));
    if matches(root) {
        return vec![root];
    }

    let mut result = Vec::new();
    let mut stack: Vec<(D::Node, bool)> = Vec::new();
    push_children(dom, root, true, &mut stack);
    while let Some((node, _)) = stack.pop() {
        if matches(node) {
            result.push(node);
        } else {
            push_children(dom, node, true, &mut stack);
        }
    }
    result
}
