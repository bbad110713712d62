//! Output sink: clipboard delivery, notices and the full-text display.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::clipboard::{copy_with_fallback, ClipboardError, ClipboardWriter, CopyCommand, CopyMethod};
use crate::extract::Extraction;
use crate::notify::{Notice, Notifier};

/// Shows the complete markdown so it can be copied by hand.
pub trait FullTextDisplay: Send + Sync {
    fn show(&self, markdown: &str);
}

/// Prints the markdown to stdout unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutDisplay;

impl FullTextDisplay for StdoutDisplay {
    fn show(&self, markdown: &str) {
        if let Err(e) = write_full_text(&mut io::stdout().lock(), markdown) {
            debug!(error = %e, "could not write markdown to stdout");
        }
    }
}

/// Write and flush; a closed reader (`selmd ... | head`) is not fatal.
fn write_full_text(out: &mut impl Write, markdown: &str) -> io::Result<()> {
    out.write_all(markdown.as_bytes())?;
    out.flush()
}

/// Result of handing an extraction to the sink.
#[derive(Debug)]
pub enum Delivery {
    Copied(CopyMethod),
    /// Clipboard writing is disabled.
    NotCopied,
    /// Both the clipboard and the copy command failed.
    CopyFailed(ClipboardError),
}

/// Where a finished extraction goes.
pub struct OutputSink {
    clipboard: Option<(Box<dyn ClipboardWriter>, Box<dyn CopyCommand>)>,
    notifier: Box<dyn Notifier>,
    display: Option<Box<dyn FullTextDisplay>>,
}

impl OutputSink {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            clipboard: None,
            notifier,
            display: None,
        }
    }

    #[must_use]
    pub fn with_clipboard(mut self, writer: Box<dyn ClipboardWriter>, fallback: Box<dyn CopyCommand>) -> Self {
        self.clipboard = Some((writer, fallback));
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: Box<dyn FullTextDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Copy, notify, then show the full text.
    pub async fn deliver(&self, extraction: &mut Extraction) -> Delivery {
        let delivery = match &self.clipboard {
            Some((writer, fallback)) => {
                match copy_with_fallback(writer.as_ref(), fallback.as_ref(), &extraction.markdown).await {
                    Ok(method) => {
                        info!(?method, bytes = extraction.markdown.len(), "markdown copied");
                        self.notifier.notify(Notice::ExportSuccess);
                        Delivery::Copied(method)
                    }
                    Err(err) => {
                        warn!(error = %err, "could not copy markdown to the clipboard");
                        Delivery::CopyFailed(err)
                    }
                }
            }
            None => Delivery::NotCopied,
        };

        if let Some(display) = &self.display {
            display.show(&extraction.markdown);
        }
        extraction.mark_delivered();
        delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractionState, StrategyKind};
    use crate::markdown::{MarkdownDocument, Paragraph};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Notices(Arc<Mutex<Vec<Notice>>>);

    impl Notifier for Notices {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    #[derive(Clone, Default)]
    struct Shown(Arc<Mutex<Vec<String>>>);

    impl FullTextDisplay for Shown {
        fn show(&self, markdown: &str) {
            self.0.lock().unwrap().push(markdown.to_string());
        }
    }

    struct Broken;

    #[async_trait]
    impl ClipboardWriter for Broken {
        async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::Unavailable("headless".into()))
        }
    }

    struct Works;

    #[async_trait]
    impl ClipboardWriter for Works {
        async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
            Ok(())
        }
    }

    struct NoCommand;

    impl CopyCommand for NoCommand {
        fn copy(&self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::NoCommand)
        }
    }

    fn extraction() -> Extraction {
        let document = MarkdownDocument::new(vec![Paragraph::Text("Hello world".into())]);
        Extraction {
            markdown: document.render(),
            document,
            strategy: StrategyKind::DomOrder,
            trail: vec![ExtractionState::Serialized],
        }
    }

    #[tokio::test]
    async fn successful_copy_notifies_and_displays() {
        let notices = Notices::default();
        let shown = Shown::default();
        let sink = OutputSink::new(Box::new(notices.clone()))
            .with_clipboard(Box::new(Works), Box::new(NoCommand))
            .with_display(Box::new(shown.clone()));

        let mut extraction = extraction();
        let delivery = sink.deliver(&mut extraction).await;

        assert!(matches!(delivery, Delivery::Copied(CopyMethod::Clipboard)));
        assert_eq!(notices.0.lock().unwrap().as_slice(), [Notice::ExportSuccess]);
        assert_eq!(shown.0.lock().unwrap().as_slice(), ["Hello world\n"]);
        assert_eq!(extraction.trail.last(), Some(&ExtractionState::Delivered));
    }

    #[tokio::test]
    async fn failed_copy_still_displays_full_text() {
        let notices = Notices::default();
        let shown = Shown::default();
        let sink = OutputSink::new(Box::new(notices.clone()))
            .with_clipboard(Box::new(Broken), Box::new(NoCommand))
            .with_display(Box::new(shown.clone()));

        let delivery = sink.deliver(&mut extraction()).await;

        assert!(matches!(delivery, Delivery::CopyFailed(ClipboardError::WriteFailure { .. })));
        assert!(notices.0.lock().unwrap().is_empty());
        assert_eq!(shown.0.lock().unwrap().len(), 1);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn closed_reader_is_reported_not_panicked() {
        let err = write_full_text(&mut ClosedPipe, "Hello world\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn full_text_is_written_unchanged() {
        let mut out = Vec::new();
        write_full_text(&mut out, "Caption\n\n![](https://x/img.png)\n").unwrap();
        assert_eq!(out, b"Caption\n\n![](https://x/img.png)\n");
    }

    #[tokio::test]
    async fn clipboard_disabled_skips_copy() {
        let notices = Notices::default();
        let sink = OutputSink::new(Box::new(notices.clone()));
        let delivery = sink.deliver(&mut extraction()).await;
        assert!(matches!(delivery, Delivery::NotCopied));
        assert!(notices.0.lock().unwrap().is_empty());
    }
}
