//! Typographic spacing between CJK and Latin text in a live DOM.
//!
//! The engine finds every place where a Chinese character touches a Latin
//! letter, digit or symbol, including across text nodes and elements, and
//! wraps the character before that point in a marker `span` that a
//! stylesheet can give a small margin. The text itself is never changed, so
//! selection, copy and search still see the original.
//!
//! Writes are deferred until the affected element scrolls into view, and the
//! engine's own insertions are recognised by the marker class so they are
//! not processed again when they come back through the change feed.

mod boundary;
pub mod config;
pub mod dom;
pub mod leaves;
pub mod queue;
mod run;
mod script;
pub mod splice;
pub mod tree;
mod utils;

#[cfg(target_arch = "wasm32")]
mod plugin;

pub use boundary::{add_space_to_string, boundaries_with_lookahead, find_boundaries, is_boundary_at, Boundaries, THIN_SPACE};
pub use config::{Config, ConfigError, Selector};
pub use dom::{ComputedStyle, Display, Dom, IntersectionEntry, MutationKind, MutationRecord, NodeKind, Styles, Visibility};
pub use queue::{MutationQueue, Viewport};
pub use run::{script_runs, Run};
pub use script::{classify, is_cjk, is_latin_like, ScriptClass};
pub use splice::Edit;
pub use tree::Document;
pub use utils::split_at_indexes;

/// The engine: owns the selection policy and the mutation queue, and reacts
/// to the host's two event feeds.
pub struct Spacer<D: Dom, V> {
    config: Config,
    queue: MutationQueue<D, V>,
}

impl<D, V> Spacer<D, V>
where
    D: Styles + 'static,
    V: Viewport<D::Node>,
{
    pub fn new(config: Config, viewport: V) -> Self {
        Spacer {
            config,
            queue: MutationQueue::new(viewport),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &MutationQueue<D, V> {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut MutationQueue<D, V> {
        &mut self.queue
    }

    /// Initial pass over a freshly loaded page: the title (if enabled) and
    /// every configured container under `root`. Returns the number of leaves
    /// with edits scheduled.
    pub fn start(&mut self, dom: &mut D, root: D::Node) -> usize {
        if self.config.process_title {
            self.space_title(dom);
        }
        let seeds = leaves::containers(dom, root, &self.config.containers);
        log::debug!("starting with {} containers", seeds.len());
        seeds.into_iter().map(|seed| self.run(dom, seed)).sum()
    }

    /// Space the document title in place. Returns whether it changed.
    pub fn space_title(&self, dom: &mut D) -> bool {
        let Some(title) = dom.title() else {
            return false;
        };
        let spaced = add_space_to_string(&title);
        if spaced == title {
            return false;
        }
        dom.set_title(&spaced);
        true
    }

    /// Scan the subtree at `root` and schedule edits for its leaves.
    pub fn run(&mut self, dom: &mut D, root: D::Node) -> usize {
        let leaves = leaves::leaves(dom, root, &self.config);
        let mut scheduled = 0;
        for &leaf in &leaves {
            if splice::adjust(dom, &mut self.queue, &self.config, leaf) {
                scheduled += 1;
            }
        }
        log::debug!("{:?}: {} leaves, {} scheduled", root, leaves.len(), scheduled);
        scheduled
    }

    /// Handle a batch from the subtree change feed.
    ///
    /// Records carrying a marker span are the engine's own writes and are
    /// skipped; anything else is rescanned from the added element, or from
    /// the parent of an added text node.
    pub fn on_mutations(&mut self, dom: &mut D, records: &[MutationRecord<D::Node>]) -> usize {
        let pruned = self.queue.prune(dom);
        if pruned > 0 {
            log::debug!("pruned {pruned} detached elements from the queue");
        }

        let mut scheduled = 0;
        for record in records {
            if record.kind != MutationKind::ChildList {
                continue;
            }
            if record.added_nodes.iter().any(|&node| self.config.is_marker(dom, node)) {
                log::trace!("skipping self-generated mutation of {} nodes", record.added_nodes.len());
                continue;
            }

            for &node in &record.added_nodes {
                let root = match dom.kind(node) {
                    NodeKind::Element { .. } => Some(node),
                    NodeKind::Text(_) => dom.parent_element(node),
                    NodeKind::Other => None,
                };
                if let Some(root) = root.filter(|&r| dom.is_connected(r)) {
                    scheduled += self.run(dom, root);
                }
            }
        }
        scheduled
    }

    /// Handle a batch from the viewport intersection feed. Returns the
    /// number of edits that ran.
    pub fn on_intersections(&mut self, dom: &mut D, entries: &[IntersectionEntry<D::Node>]) -> usize {
        self.queue.on_intersections(dom, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indextree::NodeId;
    use std::collections::HashSet;

    type TestSpacer = Spacer<Document, HashSet<NodeId>>;

    fn spacer(config: Config) -> TestSpacer {
        Spacer::new(config, HashSet::new())
    }

    /// Report every observed element as intersecting, like scrolling the
    /// whole page into view.
    fn reveal_all(spacer: &mut TestSpacer, doc: &mut Document) -> usize {
        let entries: Vec<IntersectionEntry<NodeId>> = spacer
            .queue()
            .viewport()
            .iter()
            .map(|&target| IntersectionEntry {
                target,
                is_intersecting: true,
            })
            .collect();
        spacer.on_intersections(doc, &entries)
    }

    fn marker(ch: &str) -> String {
        format!("<span class=\"gadget-space\">{ch}</span>")
    }

    fn page() -> (Document, NodeId) {
        let mut doc = Document::new();
        doc.set_title("維基百科Wikipedia");
        let body = doc.body();
        let p = doc.append_element(body, "p");
        doc.append_text(p, "使用Rust編寫");
        let pre = doc.append_element(body, "pre");
        doc.append_text(pre, "let 中文 = 1;");
        doc.take_records();
        (doc, p)
    }

    #[test]
    fn test_start_is_gated_by_visibility() {
        let (mut doc, p) = page();
        let body = doc.body();
        let mut spacer = spacer(Config::default());

        assert_eq!(spacer.start(&mut doc, body), 1);
        assert_eq!(doc.title().as_deref(), Some("維基百科\u{2009}Wikipedia"));
        // nothing is written before the element is seen
        assert_eq!(doc.to_html(p), "<p>使用Rust編寫</p>");
        assert!(spacer.queue().viewport().contains(&p));

        assert_eq!(reveal_all(&mut spacer, &mut doc), 1);
        assert_eq!(
            doc.to_html(p),
            format!("<p>使{}Rus{}編寫</p>", marker("用"), marker("t"))
        );
        assert_eq!(doc.text_content(body), "使用Rust編寫let 中文 = 1;");
        assert!(spacer.queue().is_empty());
        assert!(spacer.queue().viewport().is_empty());
    }

    #[test]
    fn test_own_mutations_are_ignored() {
        let (mut doc, _) = page();
        let body = doc.body();
        let mut spacer = spacer(Config::default());
        spacer.start(&mut doc, body);
        reveal_all(&mut spacer, &mut doc);

        let records = doc.take_records();
        assert!(!records.is_empty());
        assert_eq!(spacer.on_mutations(&mut doc, &records), 0);
        assert!(spacer.queue().is_empty());
    }

    #[test]
    fn test_idempotent() {
        let (mut doc, _) = page();
        let body = doc.body();
        let mut spacer = spacer(Config::default());
        spacer.start(&mut doc, body);
        reveal_all(&mut spacer, &mut doc);
        let once = doc.to_html(body);
        let title = doc.title();

        assert_eq!(spacer.start(&mut doc, body), 0);
        reveal_all(&mut spacer, &mut doc);
        assert_eq!(doc.to_html(body), once);
        assert_eq!(doc.title(), title);
    }

    #[test]
    fn test_idempotent_around_blocked_content() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_element(body, "p");
        let code = doc.append_element(p, "code");
        doc.append_text(code, "abc");
        doc.append_text(p, "中文");
        let q = doc.append_element(body, "p");
        let span = doc.append_element(q, "span");
        let a = doc.append_element(span, "a");
        let kbd = doc.append_element(a, "kbd");
        doc.append_text(kbd, "Ctrl");
        doc.append_text(q, "中文");
        doc.take_records();
        let mut spacer = spacer(Config::default());

        assert_eq!(spacer.start(&mut doc, body), 2);
        reveal_all(&mut spacer, &mut doc);
        assert_eq!(doc.to_html(p), format!("<p><code>abc</code>{}中文</p>", marker("")));
        assert_eq!(
            doc.to_html(q),
            format!("<p><span><a><kbd>Ctrl</kbd></a></span>{}中文</p>", marker(""))
        );
        let once = doc.to_html(body);

        let records = doc.take_records();
        assert_eq!(spacer.on_mutations(&mut doc, &records), 0);
        assert_eq!(spacer.start(&mut doc, body), 0);
        assert_eq!(reveal_all(&mut spacer, &mut doc), 0);
        assert_eq!(doc.to_html(body), once);
    }

    #[test]
    fn test_rescan_before_visible_marks_once() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_element(body, "p");
        let code = doc.append_element(p, "code");
        doc.append_text(code, "abc");
        doc.append_text(p, "中文");
        doc.take_records();
        let mut spacer = spacer(Config::default());

        assert_eq!(spacer.start(&mut doc, body), 1);
        // the paragraph is scanned again while still off screen
        let comment = doc.create_comment("");
        doc.append_child(p, comment);
        doc.append_text(p, "DEF");
        let records = doc.take_records();
        assert_eq!(spacer.on_mutations(&mut doc, &records), 1);

        assert_eq!(reveal_all(&mut spacer, &mut doc), 2);
        assert_eq!(
            doc.to_html(p),
            format!("<p><code>abc</code>{}中{}<!---->DEF</p>", marker(""), marker("文"))
        );

        let records = doc.take_records();
        assert_eq!(spacer.on_mutations(&mut doc, &records), 0);
        assert_eq!(spacer.start(&mut doc, body), 0);
        assert_eq!(doc.text_content(p), "abc中文DEF");
    }

    #[test]
    fn test_added_content_is_spaced() {
        let (mut doc, _) = page();
        let body = doc.body();
        let mut spacer = spacer(Config::default());
        spacer.start(&mut doc, body);
        reveal_all(&mut spacer, &mut doc);
        doc.take_records();

        let li = doc.create_element("li");
        doc.append_text(li, "第3章");
        doc.append_child(body, li);
        let records = doc.take_records();
        assert_eq!(spacer.on_mutations(&mut doc, &records), 1);

        reveal_all(&mut spacer, &mut doc);
        assert_eq!(doc.to_html(li), format!("<li>{}{}章</li>", marker("第"), marker("3")));
    }

    #[test]
    fn test_repeated_scans_before_visible_apply_once() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_element(body, "p");
        doc.append_text(p, "中文ABC");
        doc.take_records();
        let mut spacer = spacer(Config::default());

        assert_eq!(spacer.start(&mut doc, body), 1);
        // more text arrives while the paragraph is still off screen
        let comment = doc.create_comment("");
        doc.append_child(p, comment);
        doc.append_text(p, "DEF中");
        let records = doc.take_records();
        assert_eq!(spacer.on_mutations(&mut doc, &records), 1);

        assert_eq!(reveal_all(&mut spacer, &mut doc), 2);
        assert_eq!(
            doc.to_html(p),
            format!("<p>中{}ABC<!---->DE{}中</p>", marker("文"), marker("F"))
        );
        assert_eq!(doc.text_content(p), "中文ABCDEF中");
    }

    #[test]
    fn test_containers_and_title_config() {
        let mut doc = Document::new();
        doc.set_title("標題Title");
        let body = doc.body();
        let nav = doc.append_element(body, "div");
        doc.append_text(nav, "導航Nav");
        let content = doc.append_element(body, "div");
        doc.set_attribute(content, "class", "mw-parser-output");
        let p = doc.append_element(content, "p");
        doc.append_text(p, "內容Content");
        doc.take_records();

        let config = Config::from_json(r#"{ "containers": [".mw-parser-output"], "process_title": false }"#).unwrap();
        let mut spacer = spacer(config);
        assert_eq!(spacer.start(&mut doc, body), 1);
        reveal_all(&mut spacer, &mut doc);

        assert_eq!(doc.to_html(nav), "<div>導航Nav</div>");
        assert_eq!(doc.to_html(p), format!("<p>內{}Content</p>", marker("容")));
        assert_eq!(doc.title().as_deref(), Some("標題Title"));
    }

    #[test]
    fn test_removed_before_visible() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append_element(body, "p");
        doc.append_text(p, "中文ABC");
        doc.take_records();
        let mut spacer = spacer(Config::default());
        spacer.start(&mut doc, body);

        doc.remove(p);
        spacer.on_mutations(&mut doc, &[]);
        assert!(spacer.queue().is_empty());
        assert_eq!(reveal_all(&mut spacer, &mut doc), 0);
        assert_eq!(doc.to_html(p), "<p>中文ABC</p>");
    }
}
