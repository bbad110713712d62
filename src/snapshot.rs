//! Page snapshots captured from a real renderer.
//!
//! A snapshot is JSON holding the node tree below `<body>` (or any root the
//! capturing script chose), each element's bounding rectangle, each text
//! node's client rectangles, the source every image actually loaded, and the
//! first selection range as child-index paths. Offsets inside text nodes are
//! UTF-16 code units, exactly as `Range.startOffset`/`endOffset` report them:
//!
//! ```json
//! {
//!   "base_url": "https://example.com/post",
//!   "nodes": [
//!     { "tag": "p", "rect": {"top": 0, "left": 0, "right": 200, "bottom": 20},
//!       "children": [
//!         { "text": "Caption", "rects": [{"top": 0, "left": 0, "right": 56, "bottom": 20}] },
//!         { "tag": "img", "attrs": {"src": "img.png"}, "current_src": "https://x/img.png",
//!           "rect": {"top": 0, "left": 60, "right": 160, "bottom": 80} }
//!       ] }
//!   ],
//!   "selection": {
//!     "start": {"path": [0], "offset": 0},
//!     "end": {"path": [0], "offset": 2}
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::dom::{Document, Element, NodeData, NodeId};
use crate::geometry::Rect;
use crate::layout::Layout;
use crate::page::Page;
use crate::selection::{BoundaryPoint, Range, Selection};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text {
        text: String,
        #[serde(default)]
        rects: Vec<Rect>,
    },
    Element {
        tag: String,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        rect: Option<Rect>,
        #[serde(default)]
        current_src: Option<String>,
        #[serde(default)]
        children: Vec<SnapshotNode>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotPoint {
    /// Child indices from the snapshot root to the container node.
    pub path: Vec<usize>,
    /// UTF-16 code units into a text node, or a child index into an element.
    pub offset: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotSelection {
    pub start: SnapshotPoint,
    pub end: SnapshotPoint,
    /// Rectangle the renderer reported for the range, if captured.
    #[serde(default)]
    pub rect: Option<Rect>,
    /// Whether the capturing environment supports structural cloning.
    #[serde(default = "default_true")]
    pub structural_clone: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub selection: Option<SnapshotSelection>,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid page snapshot JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("failed to load snapshot {}", path.display()))
    }

    /// Build the document, layout and selection.
    pub fn into_page(self) -> Result<Page> {
        let mut document = Document::new();
        let mut layout = Layout::new();
        let root = document.root();

        let mut pending: Vec<(SnapshotNode, NodeId)> = self.nodes.into_iter().rev().map(|n| (n, root)).collect();
        while let Some((node, parent)) = pending.pop() {
            match node {
                SnapshotNode::Text { text, rects } => {
                    let id = document.append(parent, NodeData::Text(text));
                    if !rects.is_empty() {
                        layout.set_client_rects(id, rects);
                    }
                }
                SnapshotNode::Element {
                    tag,
                    attrs,
                    rect,
                    current_src,
                    children,
                } => {
                    let mut element = Element::new(&tag);
                    for (name, value) in &attrs {
                        element = element.with_attr(name, value);
                    }
                    element.current_src = current_src;
                    let id = document.append_element(parent, element);
                    if let Some(rect) = rect {
                        layout.set_box(id, rect);
                    }
                    pending.extend(children.into_iter().rev().map(|c| (c, id)));
                }
            }
        }

        let base_url = self
            .base_url
            .as_deref()
            .map(|u| Url::parse(u).with_context(|| format!("invalid base_url {u:?}")))
            .transpose()?;

        let selection = self
            .selection
            .map(|s| build_selection(&document, s))
            .transpose()?;

        tracing::debug!(
            nodes = document.len(),
            geometry = layout.len(),
            has_selection = selection.is_some(),
            "loaded page snapshot"
        );

        Ok(Page {
            document,
            layout,
            selection,
            base_url,
        })
    }
}

fn build_selection(document: &Document, snapshot: SnapshotSelection) -> Result<Selection> {
    let point = |p: &SnapshotPoint, which: &str| -> Result<BoundaryPoint> {
        let node = document
            .node_at_path(&p.path)
            .ok_or_else(|| anyhow!("selection {which} path {:?} does not name a node", p.path))?;
        let offset = match document.text(node) {
            Some(text) => char_offset(text, p.offset)
                .ok_or_else(|| anyhow!("selection {which} offset {} is past the end of its text", p.offset))?,
            None => p.offset,
        };
        Ok(BoundaryPoint::new(node, offset))
    };

    let range = Range::new(document, point(&snapshot.start, "start")?, point(&snapshot.end, "end")?)
        .context("invalid selection range")?;

    let mut selection = Selection::new(range);
    if let Some(rect) = snapshot.rect {
        selection = selection.with_rect(rect);
    }
    if !snapshot.structural_clone {
        selection = selection.without_structural_clone();
    }
    Ok(selection)
}

/// Convert a UTF-16 code unit offset (what a browser `Range` reports) into a
/// char offset. An offset between the halves of a surrogate pair falls back
/// to the start of that character.
fn char_offset(text: &str, utf16_offset: usize) -> Option<usize> {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        if units + c.len_utf16() > utf16_offset {
            return Some(index);
        }
        units += c.len_utf16();
    }
    (units == utf16_offset).then(|| text.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GeometryProvider;

    const SAMPLE: &str = r#"{
        "base_url": "https://example.com/post/",
        "nodes": [
            { "tag": "P", "rect": {"top": 0, "left": 0, "right": 200, "bottom": 80},
              "children": [
                { "text": "Caption", "rects": [{"top": 0, "left": 0, "right": 56, "bottom": 20}] },
                { "tag": "img", "attrs": {"src": "img.png"},
                  "rect": {"top": 0, "left": 60, "right": 160, "bottom": 80} }
              ] }
        ],
        "selection": {
            "start": {"path": [0], "offset": 0},
            "end": {"path": [0], "offset": 2}
        }
    }"#;

    #[test]
    fn builds_tree_geometry_and_selection() {
        let page = PageSnapshot::from_json(SAMPLE).unwrap().into_page().unwrap();
        let p = page.document.node_at_path(&[0]).unwrap();
        let caption = page.document.node_at_path(&[0, 0]).unwrap();
        let img = page.document.node_at_path(&[0, 1]).unwrap();

        assert_eq!(page.document.element(p).unwrap().name, "p");
        assert_eq!(page.document.text(caption), Some("Caption"));
        assert_eq!(page.layout.client_rects(caption).len(), 1);
        assert_eq!(page.layout.bounding_rect(img), Some(Rect::new(60.0, 0.0, 100.0, 80.0)));

        let selection = page.selection.unwrap();
        assert!(selection.supports_structural_clone());
        assert_eq!(selection.common_ancestor(&page.document), p);
        assert_eq!(page.base_url.unwrap().as_str(), "https://example.com/post/");
    }

    #[test]
    fn selection_is_optional() {
        let page = PageSnapshot::from_json(r#"{"nodes": [{"text": "x"}]}"#)
            .unwrap()
            .into_page()
            .unwrap();
        assert!(page.selection.is_none());
        assert!(page.base_url.is_none());
    }

    #[test]
    fn bad_path_is_rejected() {
        let json = r#"{
            "nodes": [{"text": "x"}],
            "selection": {"start": {"path": [3], "offset": 0}, "end": {"path": [0], "offset": 1}}
        }"#;
        let err = PageSnapshot::from_json(json).unwrap().into_page().unwrap_err();
        assert!(err.to_string().contains("does not name a node"));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let json = r#"{
            "nodes": [{"text": "hello"}],
            "selection": {"start": {"path": [0], "offset": 4}, "end": {"path": [0], "offset": 1}}
        }"#;
        assert!(PageSnapshot::from_json(json).unwrap().into_page().is_err());
    }

    #[test]
    fn clone_support_flag_is_honored() {
        let json = r#"{
            "nodes": [{"text": "hello"}],
            "selection": {"start": {"path": [0], "offset": 0}, "end": {"path": [0], "offset": 5},
                          "structural_clone": false}
        }"#;
        let page = PageSnapshot::from_json(json).unwrap().into_page().unwrap();
        assert!(!page.selection.unwrap().supports_structural_clone());
    }

    fn selected_text(json: &str) -> String {
        let page = PageSnapshot::from_json(json).unwrap().into_page().unwrap();
        let fragment = page.selection.unwrap().clone_contents(&page.document).unwrap();
        fragment.text_content(fragment.root())
    }

    #[test]
    fn text_offsets_count_utf16_units() {
        // "😀 hi": the emoji is two UTF-16 units, so offset 4 ends after "h".
        let json = r#"{
            "nodes": [{ "tag": "p", "children": [{ "text": "😀 hi" }] }],
            "selection": { "start": {"path": [0, 0], "offset": 0}, "end": {"path": [0, 0], "offset": 4} }
        }"#;
        assert_eq!(selected_text(json), "😀 h");
    }

    #[test]
    fn full_utf16_length_selects_whole_text() {
        let json = r#"{
            "nodes": [{ "tag": "p", "children": [{ "text": "😀😀 hi" }] }],
            "selection": { "start": {"path": [0, 0], "offset": 2}, "end": {"path": [0, 0], "offset": 7} }
        }"#;
        assert_eq!(selected_text(json), "😀 hi");
    }

    #[test]
    fn utf16_offset_past_end_is_an_error() {
        let json = r#"{
            "nodes": [{ "tag": "p", "children": [{ "text": "😀" }] }],
            "selection": { "start": {"path": [0, 0], "offset": 0}, "end": {"path": [0, 0], "offset": 3} }
        }"#;
        let err = PageSnapshot::from_json(json).unwrap().into_page().unwrap_err();
        assert!(err.to_string().contains("past the end"));
    }

    #[test]
    fn char_offset_handles_surrogate_pairs() {
        assert_eq!(char_offset("a😀b", 0), Some(0));
        assert_eq!(char_offset("a😀b", 1), Some(1));
        assert_eq!(char_offset("a😀b", 2), Some(1));
        assert_eq!(char_offset("a😀b", 3), Some(2));
        assert_eq!(char_offset("a😀b", 4), Some(3));
        assert_eq!(char_offset("a😀b", 5), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(PageSnapshot::from_json("{not json").is_err());
    }
}
