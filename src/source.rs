//! Image source resolution.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::dom::Element;

static INLINE_SVG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^data:image/svg").expect("static regex"));

/// `true` for inline SVG data URIs, which are treated as decoration.
pub fn is_inline_svg(url: &str) -> bool {
    INLINE_SVG.is_match(url)
}

/// Resolves the URL an image element actually shows.
pub trait SourceResolver {
    fn effective_source(&self, element: &Element) -> Option<String>;
}

/// Prefers the loaded source (`currentSrc`) over the `src` attribute and
/// resolves relative `src` values against an optional base URL.
#[derive(Debug, Clone, Default)]
pub struct LoadedSourceResolver {
    base: Option<Url>,
}

impl LoadedSourceResolver {
    pub fn new(base: Option<Url>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }
}

impl SourceResolver for LoadedSourceResolver {
    fn effective_source(&self, element: &Element) -> Option<String> {
        if let Some(current) = element.current_src.as_deref().map(str::trim) {
            if !current.is_empty() {
                return Some(current.to_string());
            }
        }

        let src = element.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
        match &self.base {
            Some(base) => Some(base.join(src).map_or_else(|_| src.to_string(), String::from)),
            None => Some(src.to_string()),
        }
    }
}

/// Effective source of `element`, with inline SVG filtered out.
pub fn content_image_source(resolver: &dyn SourceResolver, element: &Element) -> Option<String> {
    resolver
        .effective_source(element)
        .filter(|url| !url.is_empty() && !is_inline_svg(url))
}
