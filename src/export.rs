//! One export: extract, then deliver or explain why not.

use tracing::warn;

use crate::extract::{ExtractError, Extraction, Extractor};
use crate::notify::Notice;
use crate::page::Page;
use crate::sink::{Delivery, OutputSink};

/// How an export ended.
#[derive(Debug)]
pub enum ExportOutcome {
    Delivered { extraction: Extraction, delivery: Delivery },
    /// Nothing was produced; the user saw `notice`.
    Declined { error: ExtractError, notice: Notice },
}

/// Extractor plus output sink.
pub struct Exporter {
    extractor: Extractor,
    sink: OutputSink,
}

impl Exporter {
    pub fn new(extractor: Extractor, sink: OutputSink) -> Self {
        Self { extractor, sink }
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// Export the page's selection. Never fails: every outcome is either
    /// delivered markdown or a notice.
    pub async fn export(&self, page: &Page) -> ExportOutcome {
        match page.extract(&self.extractor) {
            Ok(mut extraction) => {
                let delivery = self.sink.deliver(&mut extraction).await;
                ExportOutcome::Delivered { extraction, delivery }
            }
            Err(error) => {
                if matches!(error, ExtractError::PrimaryExtractionFailure(_)) {
                    warn!(error = %error, "extraction failed without fallback");
                }
                let notice = Notice::for_error(&error);
                self.sink.notify(notice);
                ExportOutcome::Declined { error, notice }
            }
        }
    }
}
