use crate::dom::{Dom, IntersectionEntry};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// The host's viewport intersection watcher.
///
/// The queue asks it to start watching an element when the first edit for
/// that element is scheduled, and to stop once the element has been seen.
/// Reports come back through [`MutationQueue::on_intersections`].
pub trait Viewport<N> {
    fn observe(&mut self, target: N);
    fn unobserve(&mut self, target: N);
}

/// Tracks the observed set only; useful when the host polls for it.
impl<N: Eq + Hash> Viewport<N> for HashSet<N> {
    fn observe(&mut self, target: N) {
        self.insert(target);
    }

    fn unobserve(&mut self, target: N) {
        self.remove(&target);
    }
}

/// A deferred DOM write, called with the document and the element it was
/// keyed on.
pub type PendingEdit<D> = Box<dyn FnOnce(&mut D, <D as Dom>::Node)>;

/// Defers DOM writes for an element until that element is in the viewport.
///
/// Edits for one element run in the order they were scheduled, exactly once,
/// on the first intersection report; the element is then no longer watched.
/// Nothing is ordered across elements.
pub struct MutationQueue<D: Dom, V> {
    pending: HashMap<D::Node, Vec<PendingEdit<D>>>,
    viewport: V,
}

impl<D: Dom + 'static, V: Viewport<D::Node>> MutationQueue<D, V> {
    pub fn new(viewport: V) -> Self {
        MutationQueue {
            pending: HashMap::new(),
            viewport,
        }
    }

    pub fn schedule(&mut self, element: D::Node, edit: impl FnOnce(&mut D, D::Node) + 'static) {
        let edits = self.pending.entry(element).or_insert_with(|| {
            self.viewport.observe(element);
            Vec::new()
        });
        edits.push(Box::new(edit));
    }

    /// Handle a batch from the intersection feed. Returns the number of
    /// edits that ran.
    pub fn on_intersections(&mut self, dom: &mut D, entries: &[IntersectionEntry<D::Node>]) -> usize {
        let mut ran = 0;
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let element = entry.target;
            self.viewport.unobserve(element);

            let Some(edits) = self.pending.remove(&element) else {
                continue;
            };
            if !dom.is_connected(element) {
                log::debug!("dropping {} edits for detached {:?}", edits.len(), element);
                continue;
            }
            log::trace!("running {} edits for {:?}", edits.len(), element);
            for edit in edits {
                edit(dom, element);
                ran += 1;
            }
        }
        ran
    }

    /// Forget elements that have left the document. Returns how many were
    /// dropped.
    pub fn prune(&mut self, dom: &D) -> usize {
        let before = self.pending.len();
        let viewport = &mut self.viewport;
        self.pending.retain(|&element, _| {
            let keep = dom.is_connected(element);
            if !keep {
                viewport.unobserve(element);
            }
            keep
        });
        before - self.pending.len()
    }

    pub fn is_pending(&self, element: D::Node) -> bool {
        self.pending.contains_key(&element)
    }

    /// Number of elements with edits waiting.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;
    use indextree::NodeId;

    fn intersecting(target: NodeId) -> IntersectionEntry<NodeId> {
        IntersectionEntry {
            target,
            is_intersecting: true,
        }
    }

    #[test]
    fn test_edits_wait_for_intersection() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.body(), "p");
        let text = doc.append_text(p, "");
        let mut queue: MutationQueue<Document, HashSet<NodeId>> = MutationQueue::new(HashSet::new());

        queue.schedule(p, move |doc, _| doc.set_data(text, "first"));
        queue.schedule(p, move |doc, _| {
            let data = doc.text_content(text);
            doc.set_data(text, &format!("{data} second"));
        });
        assert!(queue.viewport().contains(&p));
        assert_eq!(doc.text_content(p), "");

        // not intersecting yet
        let ran = queue.on_intersections(&mut doc, &[IntersectionEntry { target: p, is_intersecting: false }]);
        assert_eq!(ran, 0);
        assert!(queue.is_pending(p));

        assert_eq!(queue.on_intersections(&mut doc, &[intersecting(p)]), 2);
        assert_eq!(doc.text_content(p), "first second");
        assert!(!queue.viewport().contains(&p));
        assert!(queue.is_empty());

        // a second report runs nothing
        assert_eq!(queue.on_intersections(&mut doc, &[intersecting(p)]), 0);
        assert_eq!(doc.text_content(p), "first second");
    }

    #[test]
    fn test_elements_are_independent() {
        let mut doc = Document::new();
        let a = doc.append_element(doc.body(), "p");
        let b = doc.append_element(doc.body(), "p");
        let mut queue: MutationQueue<Document, HashSet<NodeId>> = MutationQueue::new(HashSet::new());

        queue.schedule(a, |doc, element| {
            doc.append_text(element, "a");
        });
        queue.schedule(b, |doc, element| {
            doc.append_text(element, "b");
        });

        assert_eq!(queue.on_intersections(&mut doc, &[intersecting(b)]), 1);
        assert_eq!(doc.text_content(doc.body()), "b");
        assert!(queue.is_pending(a));
        assert!(queue.viewport().contains(&a));
    }

    #[test]
    fn test_prune_detached() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.body(), "p");
        let mut queue: MutationQueue<Document, HashSet<NodeId>> = MutationQueue::new(HashSet::new());
        queue.schedule(p, |doc, element| {
            doc.append_text(element, "never");
        });

        doc.remove(p);
        assert_eq!(queue.prune(&doc), 1);
        assert!(queue.is_empty());
        assert!(queue.viewport().is_empty());
        assert_eq!(queue.on_intersections(&mut doc, &[intersecting(p)]), 0);
        assert_eq!(doc.text_content(p), "");
    }
}
