//! User-facing notices.
//!
//! Notices are short fixed messages. Where they are shown is up to the
//! [`Notifier`]: the terminal, the log, or a desktop notification.

use std::fmt;
use std::process::Command;

use tracing::{debug, info};

use crate::extract::ExtractError;

/// The fixed set of messages an export can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SelectionEmpty,
    NothingDetected,
    Ready,
    ExportSuccess,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::SelectionEmpty => "selection empty",
            Notice::NothingDetected => "no text/image detected in selection",
            Notice::Ready => "ready",
            Notice::ExportSuccess => "export success",
        }
    }

    /// Notice shown when an extraction stops with `err`.
    pub fn for_error(err: &ExtractError) -> Self {
        match err {
            ExtractError::NoSelection | ExtractError::EmptySelectionRectangle => Notice::SelectionEmpty,
            ExtractError::NoCandidatesFound | ExtractError::PrimaryExtractionFailure(_) => Notice::NothingDetected,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Displays notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("selmd: {notice}");
    }
}

/// Emits notices as `info` log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        info!(notice = notice.message(), "notice");
    }
}

/// Desktop notification (`osascript` on macOS, `notify-send` elsewhere),
/// falling back to stderr when neither is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    fn send(message: &str) -> bool {
        let status = if cfg!(target_os = "macos") {
            let script = format!("display notification \"{message}\" with title \"selmd\"");
            Command::new("osascript").args(["-e", &script]).status()
        } else {
            Command::new("notify-send").args(["selmd", message]).status()
        };
        match status {
            Ok(s) if s.success() => true,
            Ok(s) => {
                debug!(status = ?s.code(), "desktop notification command failed");
                false
            }
            Err(e) => {
                debug!(error = %e, "desktop notification unavailable");
                false
            }
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: Notice) {
        if !Self::send(notice.message()) {
            TerminalNotifier.notify(notice);
        }
    }
}
