//! Geometry provider capability and a deterministic flow layout.
//!
//! The extractor never talks to a renderer. It asks a [`GeometryProvider`]
//! for element boxes and text client rectangles, so the same algorithm runs
//! over a captured page snapshot, a synthetic layout of plain HTML, or
//! hand-written rectangles in tests.

use std::collections::HashMap;

use crate::dom::{is_block, Document, NodeData, NodeId};
use crate::geometry::Rect;

/// Rectangle queries the geometric extractor depends on.
pub trait GeometryProvider {
    /// Bounding box of an element (`getBoundingClientRect`), if rendered.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Per-line rectangles of a text node (`getClientRects` over its contents).
    fn client_rects(&self, node: NodeId) -> &[Rect];
}

/// Geometry table keyed by node.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    boxes: HashMap<NodeId, Rect>,
    fragments: HashMap<NodeId, Vec<Rect>>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_box(&mut self, node: NodeId, rect: Rect) {
        self.boxes.insert(node, rect);
    }

    pub fn set_client_rects(&mut self, node: NodeId, rects: Vec<Rect>) {
        self.fragments.insert(node, rects);
    }

    /// Number of nodes with any geometry.
    pub fn len(&self) -> usize {
        self.boxes.len() + self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.fragments.is_empty()
    }
}

impl GeometryProvider for Layout {
    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.boxes.get(&node).copied()
    }

    fn client_rects(&self, node: NodeId) -> &[Rect] {
        self.fragments.get(&node).map_or(&[], Vec::as_slice)
    }
}

/// Elements that never produce boxes.
const INVISIBLE_TAGS: &[&str] = &[
    "head", "title", "script", "style", "noscript", "template", "meta", "link",
];

const DEFAULT_IMAGE_SIZE: f64 = 64.0;

/// Monospace, left-aligned line layout for documents without a renderer.
///
/// Block elements start and end lines, words wrap at the viewport width and
/// images sit inline at their `width`/`height` attributes.
#[derive(Debug, Clone)]
pub struct FlowLayout {
    pub viewport_width: f64,
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            char_width: 8.0,
            line_height: 24.0,
        }
    }
}

struct Cursor {
    x: f64,
    y: f64,
    line_height: f64,
}

impl FlowLayout {
    pub fn layout(&self, doc: &Document) -> Layout {
        let mut layout = Layout::new();
        let mut cursor = Cursor {
            x: 0.0,
            y: 0.0,
            line_height: self.line_height,
        };
        self.visit(doc, doc.root(), &mut cursor, &mut layout);
        layout
    }

    fn break_line(&self, cursor: &mut Cursor) {
        cursor.y += cursor.line_height;
        cursor.x = 0.0;
        cursor.line_height = self.line_height;
    }

    fn visit(&self, doc: &Document, node: NodeId, cursor: &mut Cursor, layout: &mut Layout) -> Option<Rect> {
        match doc.data(node) {
            NodeData::Root => self.visit_children(doc, node, cursor, layout),
            NodeData::Text(text) => self.place_text(text, node, cursor, layout),
            NodeData::Element(el) => {
                if INVISIBLE_TAGS.iter().any(|t| el.is(t)) {
                    return None;
                }
                if el.is("br") {
                    self.break_line(cursor);
                    return None;
                }
                if el.is("img") {
                    let width = dimension(el.attr("width"));
                    let height = dimension(el.attr("height"));
                    if cursor.x > 0.0 && cursor.x + width > self.viewport_width {
                        self.break_line(cursor);
                    }
                    let rect = Rect::new(cursor.x, cursor.y, width, height);
                    cursor.x += width;
                    cursor.line_height = cursor.line_height.max(height);
                    layout.set_box(node, rect);
                    return Some(rect);
                }

                let block = is_block(&el.name);
                if block && cursor.x > 0.0 {
                    self.break_line(cursor);
                }
                let extent = self.visit_children(doc, node, cursor, layout);
                if block && cursor.x > 0.0 {
                    self.break_line(cursor);
                }
                if let Some(rect) = extent {
                    layout.set_box(node, rect);
                }
                extent
            }
        }
    }

    fn visit_children(&self, doc: &Document, node: NodeId, cursor: &mut Cursor, layout: &mut Layout) -> Option<Rect> {
        let mut extent: Option<Rect> = None;
        for &child in doc.children(node) {
            if let Some(rect) = self.visit(doc, child, cursor, layout) {
                extent = Some(extent.map_or(rect, |e| e.union(&rect)));
            }
        }
        extent
    }

    #[allow(clippy::cast_precision_loss)]
    fn place_text(&self, text: &str, node: NodeId, cursor: &mut Cursor, layout: &mut Layout) -> Option<Rect> {
        let mut rects = Vec::new();
        let mut segment_left: Option<f64> = None;

        for word in text.split_whitespace() {
            let width = word.chars().count() as f64 * self.char_width;
            let mut gap = if cursor.x > 0.0 { self.char_width } else { 0.0 };

            if cursor.x > 0.0 && cursor.x + gap + width > self.viewport_width {
                if let Some(left) = segment_left.take() {
                    rects.push(Rect::new(left, cursor.y, cursor.x - left, self.line_height));
                }
                self.break_line(cursor);
                gap = 0.0;
            }

            segment_left.get_or_insert(cursor.x + gap);
            cursor.x += gap + width;
        }

        if let Some(left) = segment_left {
            rects.push(Rect::new(left, cursor.y, cursor.x - left, self.line_height));
        }
        if rects.is_empty() {
            return None;
        }

        let extent = Rect::union_all(&rects);
        layout.set_client_rects(node, rects);
        extent
    }
}

fn dimension(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(DEFAULT_IMAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn layout_table_answers_queries() {
        let mut doc = Document::new();
        let root = doc.root();
        let text = doc.append_text(root, "x");
        let mut layout = Layout::new();
        assert!(layout.client_rects(text).is_empty());
        layout.set_client_rects(text, vec![Rect::new(0.0, 0.0, 8.0, 24.0)]);
        assert_eq!(layout.client_rects(text).len(), 1);
        assert!(layout.bounding_rect(text).is_none());
    }

    #[test]
    fn blocks_stack_vertically() {
        let mut doc = Document::new();
        let root = doc.root();
        let p1 = doc.append_element(root, Element::new("p"));
        let a = doc.append_text(p1, "first");
        let p2 = doc.append_element(root, Element::new("p"));
        let b = doc.append_text(p2, "second");

        let layout = FlowLayout::default().layout(&doc);
        let ra = layout.client_rects(a)[0];
        let rb = layout.client_rects(b)[0];
        assert_eq!(ra.top, 0.0);
        assert_eq!(rb.top, 24.0);
        assert_eq!(ra.width(), 40.0);
        assert_eq!(layout.bounding_rect(p2), Some(rb));
    }

    #[test]
    fn inline_runs_share_a_line() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_element(root, Element::new("p"));
        let a = doc.append_text(p, "ab");
        let span = doc.append_element(p, Element::new("span"));
        let b = doc.append_text(span, "cd");

        let layout = FlowLayout::default().layout(&doc);
        let ra = layout.client_rects(a)[0];
        let rb = layout.client_rects(b)[0];
        assert_eq!(ra.top, rb.top);
        assert_eq!(rb.left, 24.0);
    }

    #[test]
    fn long_text_wraps_into_several_rects() {
        let mut doc = Document::new();
        let root = doc.root();
        let words = vec!["word"; 40].join(" ");
        let text = doc.append_text(root, &words);

        let flow = FlowLayout {
            viewport_width: 200.0,
            ..FlowLayout::default()
        };
        let layout = flow.layout(&doc);
        let rects = layout.client_rects(text);
        assert!(rects.len() > 1);
        assert!(rects.iter().all(|r| r.right <= 200.0));
        assert!(rects.windows(2).all(|w| w[1].top > w[0].top));
    }

    #[test]
    fn images_use_attribute_size_and_scripts_are_hidden() {
        let mut doc = Document::new();
        let root = doc.root();
        let img = doc.append_element(
            root,
            Element::new("img").with_attr("width", "120").with_attr("height", "40px"),
        );
        let script = doc.append_element(root, Element::new("script"));
        let code = doc.append_text(script, "var x = 1;");

        let layout = FlowLayout::default().layout(&doc);
        assert_eq!(layout.bounding_rect(img), Some(Rect::new(0.0, 0.0, 120.0, 40.0)));
        assert!(layout.client_rects(code).is_empty());
    }

    #[test]
    fn whitespace_only_text_has_no_rects() {
        let mut doc = Document::new();
        let root = doc.root();
        let text = doc.append_text(root, "  \n\t ");
        assert!(FlowLayout::default().layout(&doc).client_rects(text).is_empty());
    }
}
