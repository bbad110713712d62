//! Ranges, structural cloning, and the selection handle the extractor reads.
//!
//! Boundary points follow DOM semantics: `(container, offset)` where the
//! offset counts characters inside a text node and children inside any other
//! node. Points compare in document order by the key
//! `path(container) ++ [offset]`, which makes "before child `i`" sort ahead
//! of every point inside that child.

use thiserror::Error;
use tracing::debug;

use crate::dom::{Document, NodeData, NodeId};
use crate::geometry::Rect;
use crate::layout::GeometryProvider;

/// Errors building a [`Range`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("boundary node #{0} does not exist")]
    UnknownNode(usize),

    #[error("offset {offset} exceeds node length {length}")]
    OffsetOutOfBounds { offset: usize, length: usize },

    #[error("range end precedes its start")]
    Reversed,
}

/// Errors producing a structural clone.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CloneError {
    #[error("structural cloning is not available in this environment")]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    fn key(self, doc: &Document) -> Vec<usize> {
        let mut key = doc.path(self.node);
        key.push(self.offset);
        key
    }
}

/// A validated, contiguous range of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

impl Range {
    pub fn new(doc: &Document, start: BoundaryPoint, end: BoundaryPoint) -> Result<Self, RangeError> {
        for point in [start, end] {
            if !doc.contains(point.node) {
                return Err(RangeError::UnknownNode(point.node.index()));
            }
            let length = doc.node_length(point.node);
            if point.offset > length {
                return Err(RangeError::OffsetOutOfBounds {
                    offset: point.offset,
                    length,
                });
            }
        }

        if start.key(doc) > end.key(doc) {
            return Err(RangeError::Reversed);
        }

        Ok(Self { start, end })
    }

    /// Range covering everything inside `node`.
    pub fn select_node_contents(doc: &Document, node: NodeId) -> Self {
        Self {
            start: BoundaryPoint::new(node, 0),
            end: BoundaryPoint::new(node, doc.node_length(node)),
        }
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both boundary containers.
    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        let mut candidate = Some(self.start.node);
        while let Some(node) = candidate {
            if doc.is_inclusive_ancestor(node, self.end.node) {
                return node;
            }
            candidate = doc.parent(node);
        }
        doc.root()
    }

    /// `true` if any part of `node` lies inside the range.
    pub fn intersects_node(&self, doc: &Document, node: NodeId) -> bool {
        let Some(parent) = doc.parent(node) else {
            return true;
        };
        let index = doc.path(node).last().copied().unwrap_or_default();
        let mut before = doc.path(parent);
        before.push(index);
        let mut after = doc.path(parent);
        after.push(index + 1);

        before < self.end.key(doc) && after > self.start.key(doc)
    }

    /// Detached copy of the range's content (`Range.cloneContents`).
    ///
    /// Fully contained nodes are deep-copied, partially contained elements
    /// are copied without their children and recursed into, and partially
    /// contained text is sliced at the boundary offsets.
    pub fn clone_contents(&self, doc: &Document) -> Document {
        let mut fragment = Document::new();
        if self.is_collapsed() {
            return fragment;
        }

        let ancestor = self.common_ancestor(doc);
        let fragment_root = fragment.root();

        if let Some(text) = doc.text(ancestor) {
            fragment.append_text(fragment_root, &slice_chars(text, self.start.offset, self.end.offset));
            return fragment;
        }

        let start_key = self.start.key(doc);
        let end_key = self.end.key(doc);
        self.clone_children(doc, ancestor, &mut fragment, fragment_root, &start_key, &end_key);
        fragment
    }

    fn clone_children(
        &self,
        doc: &Document,
        parent: NodeId,
        fragment: &mut Document,
        fragment_parent: NodeId,
        start_key: &[usize],
        end_key: &[usize],
    ) {
        let parent_path = doc.path(parent);

        for (i, &child) in doc.children(parent).iter().enumerate() {
            let mut before = parent_path.clone();
            before.push(i);
            let mut after = parent_path.clone();
            after.push(i + 1);

            if after.as_slice() <= start_key || before.as_slice() >= end_key {
                continue;
            }

            if start_key <= before.as_slice() && after.as_slice() <= end_key {
                doc.copy_subtree(child, fragment, fragment_parent);
                continue;
            }

            match doc.data(child) {
                NodeData::Text(text) => {
                    let from = if self.start.node == child { self.start.offset } else { 0 };
                    let to = if self.end.node == child {
                        self.end.offset
                    } else {
                        text.chars().count()
                    };
                    fragment.append_text(fragment_parent, &slice_chars(text, from, to));
                }
                data => {
                    let shallow = fragment.append(fragment_parent, data.clone());
                    self.clone_children(doc, child, fragment, shallow, start_key, end_key);
                }
            }
        }
    }
}

fn slice_chars(text: &str, from: usize, to: usize) -> String {
    text.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// The user's selection: the first range plus what the host knows about it.
#[derive(Debug, Clone)]
pub struct Selection {
    range: Range,
    rect: Option<Rect>,
    structural_clone: bool,
}

impl Selection {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            rect: None,
            structural_clone: true,
        }
    }

    /// Use a bounding rectangle reported by the host instead of computing one.
    #[must_use]
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    /// Declare that the host cannot produce structural clones.
    #[must_use]
    pub fn without_structural_clone(mut self) -> Self {
        self.structural_clone = false;
        self
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn supports_structural_clone(&self) -> bool {
        self.structural_clone
    }

    pub fn clone_contents(&self, doc: &Document) -> Result<Document, CloneError> {
        if !self.structural_clone {
            return Err(CloneError::Unsupported);
        }
        Ok(self.range.clone_contents(doc))
    }

    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        self.range.common_ancestor(doc)
    }

    /// The common ancestor if it is an element, otherwise its parent.
    pub fn enclosing_node(&self, doc: &Document) -> NodeId {
        let ancestor = self.common_ancestor(doc);
        if doc.is_text(ancestor) {
            doc.parent(ancestor).unwrap_or(ancestor)
        } else {
            ancestor
        }
    }

    /// Viewport rectangle of the selection.
    ///
    /// Without a host-reported rectangle this is the union of the client
    /// rectangles of intersected text nodes and the boxes of intersected
    /// images. Partially selected text contributes its whole extent.
    pub fn bounding_rect(&self, doc: &Document, geometry: &dyn GeometryProvider) -> Rect {
        if let Some(rect) = self.rect {
            return rect;
        }
        if self.range.is_collapsed() {
            return Rect::default();
        }

        let ancestor = self.common_ancestor(doc);
        let mut nodes = vec![ancestor];
        nodes.extend(doc.walk(ancestor, |_, _| crate::dom::Filter::Accept));

        let mut rects = Vec::new();
        for node in nodes {
            if !self.range.intersects_node(doc, node) {
                continue;
            }
            if doc.is_text(node) {
                rects.extend_from_slice(geometry.client_rects(node));
            } else if doc.element(node).is_some_and(|el| el.is("img")) {
                rects.extend(geometry.bounding_rect(node));
            }
        }

        let rect = Rect::union_all(&rects).unwrap_or_default();
        debug!(rects = rects.len(), ?rect, "computed selection rectangle");
        rect
    }
}
