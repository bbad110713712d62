//! `selmd` - Selection to markdown
//!
//! Turns the user's current selection in a rendered document into plain
//! markdown: text paragraphs and `![](url)` image references, in reading
//! order, ready for the clipboard.
//!
//! # Features
//!
//! - **DOM-order extraction**: walks a structural clone of the selected range
//! - **Geometric fallback**: orders visible text lines and images by position
//!   when the range cannot be cloned
//! - **Hosts**: JSON page snapshots with recorded geometry, or plain HTML laid
//!   out by a simple flow model
//! - **Delivery**: system clipboard with a copy-command fallback, plus notices
//!
//! # Example
//!
//! ```rust
//! use selmd::{html, Extractor, ExtractConfig};
//!
//! let page = html::parse("<p>Hello <b>world</b></p><img src=\"https://e.x/a.png\">", &html::HtmlOptions::default())?;
//! let extraction = page.extract(&Extractor::new(ExtractConfig::default()))?;
//! assert_eq!(extraction.markdown, "Hello world\n\n![](https://e.x/a.png)\n");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod clipboard;
pub mod config;
pub mod dom;
pub mod export;
pub mod extract;
pub mod geometry;
pub mod html;
pub mod layout;
pub mod markdown;
pub mod notify;
pub mod page;
pub mod selection;
pub mod sink;
pub mod snapshot;
pub mod source;
pub mod trigger;

pub use clipboard::{ClipboardError, ClipboardWriter, CopyCommand, CopyMethod, ShellCopyCommand, SystemClipboard};
pub use config::{Config, ExtractConfig, ImageScope, OutputConfig};
pub use dom::{Document, Element, NodeId};
pub use export::{ExportOutcome, Exporter};
pub use extract::{ExtractError, Extraction, ExtractionState, Extractor, StrategyKind};
pub use geometry::{Point, Rect};
pub use layout::{FlowLayout, GeometryProvider, Layout};
pub use markdown::{MarkdownDocument, Paragraph};
pub use notify::{DesktopNotifier, LogNotifier, Notice, Notifier, TerminalNotifier};
pub use page::Page;
pub use selection::{BoundaryPoint, Range, Selection};
pub use sink::{Delivery, FullTextDisplay, OutputSink, StdoutDisplay};
pub use snapshot::PageSnapshot;
pub use source::{LoadedSourceResolver, SourceResolver};
pub use trigger::{Hotkey, HotkeyRegistry, KeyEvent, Registration};

/// Version of selmd
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
