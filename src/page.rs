//! A loaded page: document, geometry and the user's selection.

use url::Url;

use crate::dom::Document;
use crate::extract::{ExtractError, Extraction, Extractor};
use crate::layout::Layout;
use crate::selection::Selection;
use crate::source::LoadedSourceResolver;

/// Everything one extraction reads, as produced by a host
/// ([`crate::snapshot`] or [`crate::html`]).
#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub layout: Layout,
    pub selection: Option<Selection>,
    pub base_url: Option<Url>,
}

impl Page {
    /// Pretend the host cannot produce structural clones.
    #[must_use]
    pub fn force_fallback(mut self) -> Self {
        self.selection = self.selection.map(Selection::without_structural_clone);
        self
    }

    pub fn resolver(&self) -> LoadedSourceResolver {
        LoadedSourceResolver::new(self.base_url.clone())
    }

    pub fn extract(&self, extractor: &Extractor) -> Result<Extraction, ExtractError> {
        extractor.run(&self.document, self.selection.as_ref(), &self.layout, &self.resolver())
    }
}
