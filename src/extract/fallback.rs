//! Geometric-order scan for hosts that cannot clone the selection.
//!
//! Candidates are the text line fragments and images whose rectangles
//! intersect the selection rectangle. They are sorted top-to-bottom, then
//! left-to-right, clustered into rows whose midpoints lie within the row
//! threshold of the row's first item, re-ordered left-to-right within each
//! row, and each row becomes one text paragraph with images split out.


use tracing::debug;

use super::{
    collapse_whitespace, ContentItem, ExtractContext, ExtractError, ExtractStrategy, PositionedItem, StrategyKind,
};
use crate::config::ImageScope;
use crate::markdown::Paragraph;
use crate::source::content_image_source;

/// Items judged to sit on one visual line.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    /// Vertical midpoint of the item that opened the row.
    pub y: f64,
    pub items: Vec<PositionedItem>,
}

/// Orders selection content by its on-screen position.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricExtractor;

impl GeometricExtractor {
    /// Collect images, then text fragments, intersecting the selection.
    pub fn candidates(&self, ctx: &ExtractContext<'_>) -> Vec<PositionedItem> {
        let doc = ctx.document;
        let text_root = ctx.selection.enclosing_node(doc);
        let image_root = match ctx.config.image_scope {
            ImageScope::Selection => text_root,
            ImageScope::Document => doc.root(),
        };

        let mut found = Vec::new();

        for node in doc.elements_named(image_root, "img") {
            let Some(rect) = ctx.geometry.bounding_rect(node) else {
                continue;
            };
            if !rect.has_extent() || !rect.intersects(&ctx.selection_rect) {
                continue;
            }
            let Some(url) = doc.element(node).and_then(|el| content_image_source(ctx.resolver, el)) else {
                continue;
            };
            found.push(PositionedItem {
                item: ContentItem::Image(url),
                position: rect.midpoint(),
            });
        }

        for node in doc.text_nodes(text_root) {
            let text = collapse_whitespace(doc.text(node).unwrap_or_default());
            if text.is_empty() {
                continue;
            }
            for rect in ctx.geometry.client_rects(node) {
                if rect.intersects(&ctx.selection_rect) {
                    found.push(PositionedItem {
                        item: ContentItem::Text(text.clone()),
                        position: rect.midpoint(),
                    });
                }
            }
        }

        found
    }

    /// Stable sort by vertical, then horizontal midpoint.
    ///
    /// Uses the IEEE total order, so a NaN midpoint from a degenerate rect
    /// sorts after every real position instead of breaking the sort.
    pub fn sort_reading_order(items: &mut [PositionedItem]) {
        items.sort_by(|a, b| {
            a.position
                .y
                .total_cmp(&b.position.y)
                .then(a.position.x.total_cmp(&b.position.x))
        });
    }

    /// Cluster sorted items into rows.
    ///
    /// An item joins the open row when its vertical midpoint is strictly
    /// closer than `threshold` to the row's reference `y`; otherwise it
    /// opens a new row at its own `y`. Each row is then ordered left to right.
    pub fn group_rows(items: Vec<PositionedItem>, threshold: f64) -> Vec<RowGroup> {
        let mut rows: Vec<RowGroup> = Vec::new();
        for item in items {
            match rows.last_mut() {
                Some(row) if (row.y - item.position.y).abs() < threshold => row.items.push(item),
                _ => rows.push(RowGroup {
                    y: item.position.y,
                    items: vec![item],
                }),
            }
        }
        for row in &mut rows {
            row.items.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));
        }
        rows
    }

    /// Turn rows into paragraphs: joined text per row, one paragraph per image.
    pub fn rows_to_paragraphs(rows: Vec<RowGroup>) -> Vec<Paragraph> {
        let mut paragraphs = Vec::new();
        let mut pending = String::new();

        for row in rows {
            for positioned in row.items {
                match positioned.item {
                    ContentItem::Text(text) => {
                        if !pending.is_empty() {
                            pending.push(' ');
                        }
                        pending.push_str(&text);
                    }
                    ContentItem::Image(url) => {
                        flush(&mut pending, &mut paragraphs);
                        paragraphs.push(Paragraph::Image(url));
                    }
                }
            }
            flush(&mut pending, &mut paragraphs);
        }

        paragraphs
    }
}

fn flush(pending: &mut String, paragraphs: &mut Vec<Paragraph>) {
    if !pending.is_empty() {
        paragraphs.push(Paragraph::Text(std::mem::take(pending)));
    }
}

impl ExtractStrategy for GeometricExtractor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Geometric
    }

    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Vec<Paragraph>, ExtractError> {
        let mut items = self.candidates(ctx);
        if items.is_empty() {
            debug!(rect = ?ctx.selection_rect, "no candidates intersect the selection");
            return Err(ExtractError::NoCandidatesFound);
        }

        Self::sort_reading_order(&mut items);
        let candidates = items.len();
        let rows = Self::group_rows(items, ctx.config.row_threshold);
        debug!(candidates, rows = rows.len(), "geometric scan finished");

        Ok(Self::rows_to_paragraphs(rows))
    }
}
