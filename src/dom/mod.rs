//! Arena-backed document tree.
//!
//! The rendered page is held as a small DOM: elements with a tag, attributes
//! and a class list, plus text nodes. Nodes live in an arena and are addressed
//! by [`NodeId`]. Detaching a node keeps its id valid; [`Dom::release`] hands
//! the slot back for reuse by the next node created.
//!
//! The operations mirror the handful of browser DOM calls the interaction
//! layer needs: document-order walks, `replaceChild`, `normalize`,
//! `getElementById`, `closest` and class-list edits.

mod html;

pub use html::{escape_attr, escape_text};

/// Opaque handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element: tag name, attributes and class list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        if name == "class" {
            return None;
        }
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute. `class` is routed to the class list.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name == "class" {
            self.classes = value.split_whitespace().map(ToOwned::to_owned).collect();
            return;
        }
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name.to_string(), value));
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class; adding one that is already present is a no-op.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    released: bool,
}

impl Slot {
    const fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            released: false,
        }
    }
}

/// A document tree rooted at a single element.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Slot>,
    free: Vec<NodeId>,
    root: NodeId,
    reflows: u64,
}

impl Dom {
    /// Create a tree whose root is an element with `root_tag`.
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Slot::new(NodeData::Element(Element::new(root_tag)))],
            free: Vec::new(),
            root: NodeId(0),
            reflows: 0,
        }
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Arena slots, live or waiting for reuse.
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Slots that are currently free.
    pub fn released(&self) -> usize {
        self.free.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = Slot::new(data);
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Slot::new(data));
        id
    }

    /// Detach `id` and hand its slot, and those of its subtree, back to the
    /// arena. The ids must not be used afterwards. The root is never released.
    pub fn release(&mut self, id: NodeId) {
        if id == self.root || self.nodes[id.0].released {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let slot = &mut self.nodes[node.0];
            if slot.released {
                continue;
            }
            stack.append(&mut slot.children);
            slot.parent = None;
            slot.released = true;
            slot.data = NodeData::Text(String::new());
            self.free.push(node);
        }
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// True when `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != child);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` before `reference`; appends when `reference` is not a
    /// child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|c| *c == reference) {
            Some(pos) => siblings.insert(pos, child),
            None => siblings.push(child),
        }
    }

    /// Replace `old` with `new` under `parent`. Returns false when `old` is not
    /// a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        let Some(pos) = self.nodes[parent.0].children.iter().position(|c| *c == old) else {
            return false;
        };
        self.detach(new);
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == old)
            .unwrap_or(pos);
        self.nodes[parent.0].children[pos] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        true
    }

    /// Nodes under `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(scope).to_vec();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// Text nodes under `scope` in document order.
    pub fn text_nodes(&self, scope: NodeId) -> Vec<NodeId> {
        self.descendants(scope).filter(|id| self.is_text(*id)).collect()
    }

    /// Concatenated text of `id` and everything below it.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Replace the children of `id` with a single text node. A lone text
    /// child is updated in place.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let NodeData::Text(value) = &mut self.nodes[id.0].data {
            text.clone_into(value);
            return;
        }
        let children = self.nodes[id.0].children.clone();
        if let &[only] = children.as_slice()
            && !text.is_empty()
            && let NodeData::Text(value) = &mut self.nodes[only.0].data
        {
            text.clone_into(value);
            return;
        }
        for child in children {
            self.release(child);
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// Merge adjacent text nodes and drop empty ones, recursively. Merged and
    /// dropped nodes are released.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            let Some(text) = self.text(child).map(ToOwned::to_owned) else {
                self.normalize(child);
                kept.push(child);
                continue;
            };
            let previous_text = kept.last().copied().filter(|prev| self.is_text(*prev));
            if text.is_empty() || previous_text.is_some() {
                if let Some(prev) = previous_text
                    && let NodeData::Text(value) = &mut self.nodes[prev.0].data
                {
                    value.push_str(&text);
                }
                self.release(child);
            } else {
                kept.push(child);
            }
        }
        self.nodes[id.0].children = kept;
    }

    /// First attached element whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|node| self.element(*node).and_then(Element::id) == Some(id))
    }

    /// Elements under `scope` carrying `class`, in document order.
    pub fn elements_with_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|node| self.element(*node).is_some_and(|el| el.has_class(class)))
            .collect()
    }

    /// Walk from `id` (inclusive) up to the root and return the first element
    /// accepted by `matches`.
    pub fn closest(&self, id: NodeId, matches: impl Fn(&Element) -> bool) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).is_some_and(&matches) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.add_class(class);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_class(class);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    /// Record a forced layout flush (the `offsetWidth` read that restarts a
    /// CSS animation).
    pub const fn force_reflow(&mut self) {
        self.reflows += 1;
    }

    pub const fn reflow_count(&self) -> u64 {
        self.reflows
    }

    /// Serialize `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        html::write_node(self, id, &mut out);
        out
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            html::write_node(self, *child, &mut out);
        }
        out
    }
}

/// Pre-order iterator returned by [`Dom::descendants`].
pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(node).iter().rev().copied());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(dom: &mut Dom, parts: &[&str]) -> NodeId {
        let p = dom.create_element("p");
        for part in parts {
            let text = dom.create_text(*part);
            dom.append_child(p, text);
        }
        let root = dom.root();
        dom.append_child(root, p);
        p
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let mut dom = Dom::new("div");
        let p = paragraph(&mut dom, &["a", "b"]);
        let em = dom.create_element("em");
        let c = dom.create_text("c");
        dom.append_child(em, c);
        dom.append_child(p, em);
        let d = dom.create_text("d");
        let root = dom.root();
        dom.append_child(root, d);

        let texts: Vec<_> = dom
            .text_nodes(root)
            .into_iter()
            .filter_map(|id| dom.text(id).map(ToOwned::to_owned))
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_normalize_merges_adjacent_text_and_drops_empty() {
        let mut dom = Dom::new("div");
        let p = paragraph(&mut dom, &["foo", "", "bar"]);
        dom.normalize(p);
        assert_eq!(dom.children(p).len(), 1);
        assert_eq!(dom.text_content(p), "foobar");
    }

    #[test]
    fn test_replace_child_detaches_old_node() {
        let mut dom = Dom::new("div");
        let p = paragraph(&mut dom, &["old"]);
        let old = dom.children(p)[0];
        let new = dom.create_text("new");
        assert!(dom.replace_child(p, new, old));
        assert!(!dom.is_attached(old));
        assert!(dom.is_attached(new));
        assert_eq!(dom.text_content(p), "new");
    }

    #[test]
    fn test_released_slots_are_reused() {
        let mut dom = Dom::new("div");
        let p = paragraph(&mut dom, &["a", "b"]);
        let before = dom.allocated();
        dom.release(p);
        assert_eq!(dom.released(), 3);
        assert!(dom.children(dom.root()).is_empty());

        paragraph(&mut dom, &["c", "d"]);
        assert_eq!(dom.allocated(), before);
        assert_eq!(dom.released(), 0);
        assert_eq!(dom.text_content(dom.root()), "cd");
    }

    #[test]
    fn test_release_ignores_root_and_repeats() {
        let mut dom = Dom::new("div");
        let text = dom.create_text("x");
        dom.release(text);
        dom.release(text);
        dom.release(dom.root());
        assert_eq!(dom.released(), 1);
    }

    #[test]
    fn test_set_text_content_updates_lone_text_child() {
        let mut dom = Dom::new("div");
        let span = paragraph(&mut dom, &["1/3"]);
        let child = dom.children(span)[0];
        let before = dom.allocated();
        for _ in 0..10 {
            dom.set_text_content(span, "2/3");
        }
        assert_eq!(dom.children(span), [child]);
        assert_eq!(dom.allocated(), before);
        dom.set_text_content(span, "");
        assert!(dom.children(span).is_empty());
        assert_eq!(dom.released(), 1);
    }

    #[test]
    fn test_replace_child_rejects_foreign_node() {
        let mut dom = Dom::new("div");
        let p = paragraph(&mut dom, &["x"]);
        let stray = dom.create_text("stray");
        let new = dom.create_text("new");
        assert!(!dom.replace_child(p, new, stray));
    }

    #[test]
    fn test_element_by_id_ignores_detached_nodes() {
        let mut dom = Dom::new("div");
        let h = dom.create_element("h2");
        dom.set_attr(h, "id", "intro");
        assert_eq!(dom.element_by_id("intro"), None);
        let root = dom.root();
        dom.append_child(root, h);
        assert_eq!(dom.element_by_id("intro"), Some(h));
        assert_eq!(dom.element_by_id(""), None);
    }

    #[test]
    fn test_closest_includes_start_node() {
        let mut dom = Dom::new("div");
        let a = dom.create_element("a");
        dom.set_attr(a, "href", "#x");
        let text = dom.create_text("go");
        dom.append_child(a, text);
        let root = dom.root();
        dom.append_child(root, a);
        assert_eq!(dom.closest(text, |el| el.tag() == "a"), Some(a));
        assert_eq!(dom.closest(a, |el| el.tag() == "a"), Some(a));
        assert_eq!(dom.closest(text, |el| el.tag() == "pre"), None);
    }

    #[test]
    fn test_class_list_edits_are_idempotent() {
        let mut dom = Dom::new("html");
        let root = dom.root();
        dom.add_class(root, "theme-dark");
        dom.add_class(root, "theme-dark");
        assert_eq!(dom.element(root).unwrap().classes(), ["theme-dark"]);
        dom.remove_class(root, "theme-dark");
        assert!(!dom.has_class(root, "theme-dark"));
    }

    #[test]
    fn test_outer_html_escapes_text_and_attributes() {
        let mut dom = Dom::new("div");
        let a = dom.create_element("a");
        dom.set_attr(a, "href", "x?a=1&b=\"2\"");
        dom.add_class(a, "link");
        let text = dom.create_text("<b> & co");
        dom.append_child(a, text);
        let root = dom.root();
        dom.append_child(root, a);
        assert_eq!(
            dom.inner_html(root),
            "<a href=\"x?a=1&amp;b=&quot;2&quot;\" class=\"link\">&lt;b&gt; &amp; co</a>"
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let mut dom = Dom::new("div");
        let input = dom.create_element("input");
        dom.set_attr(input, "type", "checkbox");
        dom.set_attr(input, "disabled", "");
        let root = dom.root();
        dom.append_child(root, input);
        assert_eq!(dom.inner_html(root), "<input type=\"checkbox\" disabled=\"\">");
    }
}
