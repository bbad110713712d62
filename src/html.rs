//! HTML input: parse with `scraper`, select with CSS, lay out with
//! [`FlowLayout`].
//!
//! Without a renderer there is no user selection, so the selection covers
//! the contents of the first element matching a CSS selector.

use anyhow::{anyhow, Result};
use scraper::{Html, Node, Selector};
use url::Url;

use crate::dom::{Document, Element, NodeData};
use crate::layout::FlowLayout;
use crate::page::Page;
use crate::selection::{Range, Selection};

/// Options for loading an HTML document.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// CSS selector naming the element whose contents are selected.
    pub select: String,
    /// Base URL for relative image sources; overrides `<base href>`.
    pub base_url: Option<Url>,
    pub layout: FlowLayout,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            select: "body".into(),
            base_url: None,
            layout: FlowLayout::default(),
        }
    }
}

/// Parse `html` into a [`Page`].
///
/// A selector that matches nothing yields a page without a selection.
pub fn parse(html: &str, options: &HtmlOptions) -> Result<Page> {
    let parsed = Html::parse_document(html);
    let selector = Selector::parse(&options.select)
        .map_err(|e| anyhow!("invalid CSS selector {:?}: {e}", options.select))?;
    let target = parsed.select(&selector).next().map(|el| el.id());

    let mut document = Document::new();
    let mut selected = None;
    let mut pending = vec![(parsed.tree.root(), document.root())];

    while let Some((source, parent)) = pending.pop() {
        for child in source.children() {
            let data = match child.value() {
                Node::Element(el) => {
                    let mut element = Element::new(el.name());
                    for (name, value) in el.attrs() {
                        element = element.with_attr(name, value);
                    }
                    NodeData::Element(element)
                }
                Node::Text(text) => {
                    let content: &str = text;
                    NodeData::Text(content.to_owned())
                }
                _ => continue,
            };
            let id = document.append(parent, data);
            if Some(child.id()) == target {
                selected = Some(id);
            }
            pending.push((child, id));
        }
    }

    let base_url = match &options.base_url {
        Some(url) => Some(url.clone()),
        None => document_base(&parsed),
    };

    let selection = selected.map(|node| Selection::new(Range::select_node_contents(&document, node)));
    if selection.is_none() {
        tracing::info!(selector = %options.select, "selector matched no element");
    }

    let layout = options.layout.layout(&document);
    tracing::debug!(nodes = document.len(), geometry = layout.len(), "parsed HTML document");

    Ok(Page {
        document,
        layout,
        selection,
        base_url,
    })
}

/// Absolute `<base href>` of the document, if any.
///
/// Without a document URL a relative or malformed `href` cannot be resolved;
/// it is ignored and relative image sources stay as written.
fn document_base(parsed: &Html) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = parsed.select(&selector).next()?.value().attr("href")?;
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(href, error = %e, "ignoring <base href> that is not an absolute URL");
            None
        }
    }
}
