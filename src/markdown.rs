//! Paragraph list → markdown string.
//!
//! Output is plain text plus `![](url)` image references. Markdown special
//! characters in selected text are passed through unescaped, so text such as
//! `*draft*` keeps its asterisks and may render as emphasis.

use std::fmt;

/// One output paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paragraph {
    Text(String),
    Image(String),
}

impl fmt::Display for Paragraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paragraph::Text(text) => f.write_str(text),
            Paragraph::Image(url) => write!(f, "![]({url})"),
        }
    }
}

/// Ordered paragraphs of an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownDocument {
    paragraphs: Vec<Paragraph>,
}

impl MarkdownDocument {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Paragraphs separated by a blank line, with a trailing newline.
    pub fn render(&self) -> String {
        let mut out = self
            .paragraphs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push('\n');
        out
    }
}

impl From<Vec<Paragraph>> for MarkdownDocument {
    fn from(paragraphs: Vec<Paragraph>) -> Self {
        Self::new(paragraphs)
    }
}
