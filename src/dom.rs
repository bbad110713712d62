//! Minimal arena-backed document tree.
//!
//! Holds exactly what selection extraction needs: elements (lowercase name,
//! attributes, and the image source the renderer actually loaded) and text
//! nodes. Both the live page and detached clones of a selection are
//! [`Document`]s.

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "td",
    "th", "tr", "ul",
];

/// `true` for elements that lay out as their own block.
pub fn is_block(name: &str) -> bool {
    BLOCK_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name))
}

/// Index of a node inside its owning [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Lowercase tag name.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Source the renderer resolved and loaded (`img.currentSrc`), if known.
    pub current_src: Option<String>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            current_src: None,
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_current_src(mut self, src: &str) -> Self {
        self.current_src = Some(src.to_string());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Document or fragment root.
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Traversal verdict for a single node, in `TreeWalker` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Visit the node and its children.
    Accept,
    /// Do not visit the node, but visit its children.
    Skip,
    /// Visit neither the node nor anything below it.
    Reject,
}

/// Arena tree. Node 0 is always the [`NodeData::Root`].
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Append `data` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.append(parent, NodeData::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append(parent, NodeData::Text(text.to_string()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// DOM node length: characters for text, child count otherwise.
    pub fn node_length(&self, id: NodeId) -> usize {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => t.chars().count(),
            _ => self.nodes[id.0].children.len(),
        }
    }

    /// Child indices leading from the root to `id`.
    pub fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|c| *c == current)
                .unwrap_or_default();
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn node_at_path(&self, path: &[usize]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, &i| self.children(node).get(i).copied())
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Pre-order walk of the descendants of `from` (excluding `from`).
    pub fn walk<F>(&self, from: NodeId, mut filter: F) -> Vec<NodeId>
    where
        F: FnMut(&Document, NodeId) -> Filter,
    {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            match filter(self, id) {
                Filter::Reject => continue,
                Filter::Accept => out.push(id),
                Filter::Skip => {}
            }
            stack.extend(self.children(id).iter().rev());
        }

        out
    }

    /// Every text node below `from`, in document order.
    pub fn text_nodes(&self, from: NodeId) -> Vec<NodeId> {
        self.walk(from, |doc, id| {
            if doc.is_text(id) {
                Filter::Accept
            } else {
                Filter::Skip
            }
        })
    }

    /// Every element named `name` below `from`, in document order.
    pub fn elements_named(&self, from: NodeId, name: &str) -> Vec<NodeId> {
        self.walk(from, |doc, id| match doc.element(id) {
            Some(el) if el.is(name) => Filter::Accept,
            _ => Filter::Skip,
        })
    }

    /// Concatenated text of every text node below (and including) `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.text_nodes(id)
            .into_iter()
            .filter_map(|t| self.text(t))
            .collect()
    }

    /// Deep-copy the subtree at `src` under `dst_parent` in `dst`.
    pub fn copy_subtree(&self, src: NodeId, dst: &mut Document, dst_parent: NodeId) -> NodeId {
        let copied = dst.append(dst_parent, self.data(src).clone());
        let mut pending = vec![(src, copied)];
        while let Some((from, to)) = pending.pop() {
            for &child in self.children(from) {
                let id = dst.append(to, self.data(child).clone());
                pending.push((child, id));
            }
        }
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<div><p>one <b>two</b></p><script>x</script><p>three</p></div>`
    fn sample() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.append_element(root, Element::new("DIV"));
        let p1 = doc.append_element(div, Element::new("p"));
        doc.append_text(p1, "one ");
        let b = doc.append_element(p1, Element::new("b"));
        doc.append_text(b, "two");
        let script = doc.append_element(div, Element::new("script"));
        doc.append_text(script, "x");
        let p2 = doc.append_element(div, Element::new("p"));
        doc.append_text(p2, "three");
        (doc, div)
    }

    #[test]
    fn element_names_are_lowercased() {
        let (doc, div) = sample();
        assert_eq!(doc.element(div).unwrap().name, "div");
    }

    #[test]
    fn walk_rejects_whole_subtree() {
        let (doc, div) = sample();
        let texts: Vec<&str> = doc
            .walk(div, |d, id| match d.element(id) {
                Some(el) if el.is("script") => Filter::Reject,
                _ if d.is_text(id) => Filter::Accept,
                _ => Filter::Skip,
            })
            .into_iter()
            .filter_map(|id| doc.text(id))
            .collect();
        assert_eq!(texts, vec!["one ", "two", "three"]);
    }

    #[test]
    fn walk_skip_still_descends() {
        let (doc, div) = sample();
        assert_eq!(doc.text_nodes(div).len(), 4);
    }

    #[test]
    fn path_round_trips() {
        let (doc, div) = sample();
        let b = doc.elements_named(div, "b")[0];
        let path = doc.path(b);
        assert_eq!(path, vec![0, 0, 1]);
        assert_eq!(doc.node_at_path(&path), Some(b));
        assert_eq!(doc.node_at_path(&[0, 9]), None);
    }

    #[test]
    fn text_content_concatenates() {
        let (doc, div) = sample();
        assert_eq!(doc.text_content(div), "one twoxthree");
    }

    #[test]
    fn copy_subtree_preserves_order() {
        let (doc, div) = sample();
        let mut dst = Document::new();
        let root = dst.root();
        let copied = doc.copy_subtree(div, &mut dst, root);
        assert_eq!(dst.text_content(copied), doc.text_content(div));
        assert_eq!(dst.len(), doc.len());
    }

    #[test]
    fn ancestry() {
        let (doc, div) = sample();
        let b = doc.elements_named(div, "b")[0];
        assert!(doc.is_inclusive_ancestor(div, b));
        assert!(doc.is_inclusive_ancestor(b, b));
        assert!(!doc.is_inclusive_ancestor(b, div));
    }
}
