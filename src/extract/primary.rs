//! DOM-order walk over a structural clone of the selection.

use tracing::debug;

use super::{collapse_whitespace, ContentItem, ExtractContext, ExtractError, ExtractStrategy, StrategyKind};
use crate::config::ExtractConfig;
use crate::dom::{is_block, Document, NodeData, NodeId};
use crate::markdown::Paragraph;
use crate::source::{content_image_source, SourceResolver};

/// Emits text runs and images in exactly the clone's document order.
///
/// Text accumulates into one run until an image (or, with
/// `block_paragraphs`, a block boundary) flushes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomOrderExtractor;

impl DomOrderExtractor {
    /// Walk `fragment` and return its content items.
    pub fn items(
        &self,
        fragment: &Document,
        resolver: &dyn SourceResolver,
        config: &ExtractConfig,
    ) -> Vec<ContentItem> {
        let mut walk = Walk {
            resolver,
            config,
            buffer: String::new(),
            items: Vec::new(),
        };
        walk.visit_children(fragment, fragment.root());
        walk.flush();
        walk.items
    }
}

impl ExtractStrategy for DomOrderExtractor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DomOrder
    }

    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Vec<Paragraph>, ExtractError> {
        let fragment = ctx.selection.clone_contents(ctx.document)?;
        let items = self.items(&fragment, ctx.resolver, ctx.config);
        debug!(items = items.len(), nodes = fragment.len(), "DOM-order walk finished");
        Ok(items.into_iter().map(Paragraph::from).collect())
    }
}

struct Walk<'a> {
    resolver: &'a dyn SourceResolver,
    config: &'a ExtractConfig,
    buffer: String,
    items: Vec<ContentItem>,
}

impl Walk<'_> {
    fn visit_children(&mut self, doc: &Document, node: NodeId) {
        for &child in doc.children(node) {
            match doc.data(child) {
                NodeData::Text(text) => self.push_text(text),
                NodeData::Element(el) => {
                    if self.config.skips(&el.name) {
                        continue;
                    }
                    if el.is("img") {
                        self.flush();
                        if let Some(url) = content_image_source(self.resolver, el) {
                            self.items.push(ContentItem::Image(url));
                        }
                        continue;
                    }

                    let boundary = self.config.block_paragraphs && (el.is("br") || is_block(&el.name));
                    if boundary {
                        self.flush();
                    }
                    self.visit_children(doc, child);
                    if boundary {
                        self.flush();
                    }
                }
                NodeData::Root => self.visit_children(doc, child),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return;
        }
        if !self.buffer.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push_str(&text);
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.items.push(ContentItem::Text(std::mem::take(&mut self.buffer)));
        }
    }
}
