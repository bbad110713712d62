//! Selection → ordered paragraphs.
//!
//! Two strategies implement [`ExtractStrategy`]:
//!
//! | Strategy | Order source | Used when |
//! |----------|--------------|-----------|
//! | [`DomOrderExtractor`] | document order of a structural clone | structural cloning works |
//! | [`GeometricExtractor`] | on-screen position of text lines and images | the DOM-order walk fails |
//!
//! [`Extractor`] runs the guard checks, tries the DOM-order walk and falls
//! back to geometry on failure. Both paths end in a [`MarkdownDocument`].
//!
//! ```text
//! Idle → Extracting → PrimarySucceeded ─────────────┐
//!                   └→ PrimaryFailed → Fallback ────┴→ Serialized → Delivered
//! ```

pub mod fallback;
pub mod primary;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::dom::Document;
use crate::geometry::{Point, Rect};
use crate::layout::GeometryProvider;
use crate::markdown::{MarkdownDocument, Paragraph};
use crate::selection::{CloneError, Selection};
use crate::source::SourceResolver;

pub use fallback::{GeometricExtractor, RowGroup};
pub use primary::DomOrderExtractor;

/// Reasons an extraction stops without output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no active selection")]
    NoSelection,

    #[error("selection rectangle is empty")]
    EmptySelectionRectangle,

    #[error("DOM-order extraction failed: {0}")]
    PrimaryExtractionFailure(#[from] CloneError),

    #[error("no text or image intersects the selection")]
    NoCandidatesFound,
}

/// A unit of selected content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Text(String),
    Image(String),
}

impl From<ContentItem> for Paragraph {
    fn from(item: ContentItem) -> Self {
        match item {
            ContentItem::Text(text) => Paragraph::Text(text),
            ContentItem::Image(url) => Paragraph::Image(url),
        }
    }
}

/// A content item at the midpoint of the rectangle it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedItem {
    pub item: ContentItem,
    pub position: Point,
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{feff}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything a strategy may read.
pub struct ExtractContext<'a> {
    pub document: &'a Document,
    pub selection: &'a Selection,
    pub selection_rect: Rect,
    pub geometry: &'a dyn GeometryProvider,
    pub resolver: &'a dyn SourceResolver,
    pub config: &'a ExtractConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    DomOrder,
    Geometric,
}

/// Extract ordered paragraphs from a selection.
pub trait ExtractStrategy {
    fn kind(&self) -> StrategyKind;

    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Vec<Paragraph>, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Extracting,
    PrimarySucceeded,
    PrimaryFailed,
    Fallback,
    Serialized,
    Delivered,
}

/// A finished extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: MarkdownDocument,
    pub markdown: String,
    pub strategy: StrategyKind,
    /// States visited, in order.
    pub trail: Vec<ExtractionState>,
}

impl Extraction {
    pub fn mark_delivered(&mut self) {
        self.trail.push(ExtractionState::Delivered);
    }
}

/// Primary strategy with a single fallback.
pub struct Extractor {
    config: ExtractConfig,
    primary: Box<dyn ExtractStrategy + Send + Sync>,
    fallback: Box<dyn ExtractStrategy + Send + Sync>,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self::with_strategies(config, Box::new(DomOrderExtractor), Box::new(GeometricExtractor))
    }

    pub fn with_strategies(
        config: ExtractConfig,
        primary: Box<dyn ExtractStrategy + Send + Sync>,
        fallback: Box<dyn ExtractStrategy + Send + Sync>,
    ) -> Self {
        Self {
            config,
            primary,
            fallback,
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Run one extraction.
    pub fn run(
        &self,
        document: &Document,
        selection: Option<&Selection>,
        geometry: &dyn GeometryProvider,
        resolver: &dyn SourceResolver,
    ) -> Result<Extraction, ExtractError> {
        let mut trail = vec![ExtractionState::Idle];

        let Some(selection) = selection else {
            info!("no selection to export");
            return Err(ExtractError::NoSelection);
        };

        let selection_rect = selection.bounding_rect(document, geometry);
        if selection_rect.is_degenerate() {
            info!(?selection_rect, "selection rectangle is empty");
            return Err(ExtractError::EmptySelectionRectangle);
        }
        trail.push(ExtractionState::Extracting);

        let ctx = ExtractContext {
            document,
            selection,
            selection_rect,
            geometry,
            resolver,
            config: &self.config,
        };

        let (paragraphs, strategy) = match self.primary.extract(&ctx) {
            Ok(paragraphs) => {
                trail.push(ExtractionState::PrimarySucceeded);
                (paragraphs, self.primary.kind())
            }
            Err(err) => {
                debug!(error = %err, "primary extraction failed, using geometric order");
                trail.push(ExtractionState::PrimaryFailed);
                trail.push(ExtractionState::Fallback);
                (self.fallback.extract(&ctx)?, self.fallback.kind())
            }
        };

        let document = MarkdownDocument::new(paragraphs);
        let markdown = document.render();
        trail.push(ExtractionState::Serialized);

        debug!(
            ?strategy,
            paragraphs = document.paragraphs().len(),
            bytes = markdown.len(),
            ?trail,
            "extraction finished"
        );

        Ok(Extraction {
            document,
            markdown,
            strategy,
            trail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;
    use crate::layout::Layout;
    use crate::selection::Range;
    use crate::source::LoadedSourceResolver;

    struct Failing;

    impl ExtractStrategy for Failing {
        fn kind(&self) -> StrategyKind {
            StrategyKind::DomOrder
        }

        fn extract(&self, _ctx: &ExtractContext<'_>) -> Result<Vec<Paragraph>, ExtractError> {
            Err(ExtractError::PrimaryExtractionFailure(CloneError::Unsupported))
        }
    }

    struct Fixed(&'static str);

    impl ExtractStrategy for Fixed {
        fn kind(&self) -> StrategyKind {
            StrategyKind::Geometric
        }

        fn extract(&self, _ctx: &ExtractContext<'_>) -> Result<Vec<Paragraph>, ExtractError> {
            Ok(vec![Paragraph::Text(self.0.to_string())])
        }
    }

    fn paragraph_doc() -> (Document, Selection) {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_element(root, Element::new("p"));
        doc.append_text(p, "Hello   world");
        let selection = Selection::new(Range::select_node_contents(&doc, p))
            .with_rect(Rect::new(0.0, 0.0, 100.0, 20.0));
        (doc, selection)
    }

    #[test]
    fn collapse_whitespace_is_idempotent() {
        let once = collapse_whitespace("  a \n\t b\u{a0}\u{a0}c\u{feff} ");
        assert_eq!(once, "a b c");
        assert_eq!(collapse_whitespace(&once), once);
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    #[test]
    fn missing_selection_is_reported() {
        let doc = Document::new();
        let err = Extractor::new(ExtractConfig::default())
            .run(&doc, None, &Layout::new(), &LoadedSourceResolver::default())
            .unwrap_err();
        assert_eq!(err, ExtractError::NoSelection);
    }

    #[test]
    fn zero_area_selection_is_reported() {
        let (doc, selection) = paragraph_doc();
        let selection = selection.with_rect(Rect::new(10.0, 10.0, 0.0, 0.0));
        let err = Extractor::new(ExtractConfig::default())
            .run(&doc, Some(&selection), &Layout::new(), &LoadedSourceResolver::default())
            .unwrap_err();
        assert_eq!(err, ExtractError::EmptySelectionRectangle);
    }

    #[test]
    fn primary_success_records_trail() {
        let (doc, selection) = paragraph_doc();
        let extraction = Extractor::new(ExtractConfig::default())
            .run(&doc, Some(&selection), &Layout::new(), &LoadedSourceResolver::default())
            .unwrap();
        assert_eq!(extraction.markdown, "Hello world\n");
        assert_eq!(extraction.strategy, StrategyKind::DomOrder);
        assert_eq!(
            extraction.trail,
            vec![
                ExtractionState::Idle,
                ExtractionState::Extracting,
                ExtractionState::PrimarySucceeded,
                ExtractionState::Serialized,
            ]
        );
    }

    #[test]
    fn primary_failure_switches_to_fallback() {
        let (doc, selection) = paragraph_doc();
        let extractor = Extractor::with_strategies(
            ExtractConfig::default(),
            Box::new(Failing),
            Box::new(Fixed("from geometry")),
        );
        let mut extraction = extractor
            .run(&doc, Some(&selection), &Layout::new(), &LoadedSourceResolver::default())
            .unwrap();
        extraction.mark_delivered();

        assert_eq!(extraction.markdown, "from geometry\n");
        assert_eq!(extraction.strategy, StrategyKind::Geometric);
        assert!(extraction.trail.contains(&ExtractionState::PrimaryFailed));
        assert_eq!(extraction.trail.last(), Some(&ExtractionState::Delivered));
    }

    #[test]
    fn fallback_failure_propagates() {
        let (doc, selection) = paragraph_doc();
        let selection = selection.without_structural_clone();
        let err = Extractor::new(ExtractConfig::default())
            .run(&doc, Some(&selection), &Layout::new(), &LoadedSourceResolver::default())
            .unwrap_err();
        assert_eq!(err, ExtractError::NoCandidatesFound);
    }
}
