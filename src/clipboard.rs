//! Clipboard writing with a synchronous copy-command fallback.

use std::io::Write;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard task failed: {0}")]
    Task(String),

    #[error("copy command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("no copy command available")]
    NoCommand,

    #[error("clipboard write failed ({primary}) and copy fallback failed ({fallback})")]
    WriteFailure {
        primary: Box<ClipboardError>,
        fallback: Box<ClipboardError>,
    },
}

/// Asynchronous clipboard writer.
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Synchronous fallback copy mechanism.
pub trait CopyCommand: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard via `arboard`, run on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

#[async_trait]
impl ClipboardWriter for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || {
            let mut clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))
        })
        .await
        .map_err(|e| ClipboardError::Task(e.to_string()))?
    }
}

/// Pipes text into the first platform copy tool that accepts it.
#[derive(Debug, Clone)]
pub struct ShellCopyCommand {
    candidates: Vec<(String, Vec<String>)>,
}

impl Default for ShellCopyCommand {
    fn default() -> Self {
        let candidates: Vec<(&str, Vec<&str>)> = if cfg!(target_os = "macos") {
            vec![("pbcopy", vec![])]
        } else if cfg!(target_os = "windows") {
            vec![("clip", vec![])]
        } else {
            vec![
                ("wl-copy", vec![]),
                ("xclip", vec!["-selection", "clipboard"]),
                ("xsel", vec!["--clipboard", "--input"]),
            ]
        };
        Self::new(
            candidates
                .into_iter()
                .map(|(cmd, args)| (cmd.to_string(), args.into_iter().map(String::from).collect()))
                .collect(),
        )
    }
}

impl ShellCopyCommand {
    pub fn new(candidates: Vec<(String, Vec<String>)>) -> Self {
        Self { candidates }
    }

    fn run(program: &str, args: &[String], text: &str) -> Result<(), ClipboardError> {
        let failed = |reason: String| ClipboardError::Command {
            command: program.to_string(),
            reason,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| failed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(|e| failed(e.to_string()))?;
        }

        let status = child.wait().map_err(|e| failed(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("exit status {status}")))
        }
    }
}

impl CopyCommand for ShellCopyCommand {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let mut last = ClipboardError::NoCommand;
        for (program, args) in &self.candidates {
            match Self::run(program, args, text) {
                Ok(()) => {
                    debug!(program = %program, bytes = text.len(), "copied via command");
                    return Ok(());
                }
                Err(e) => {
                    debug!(error = %e, "copy command failed");
                    last = e;
                }
            }
        }
        Err(last)
    }
}

/// How the text reached the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    Clipboard,
    Command,
}

/// Write `text` with `writer`, falling back to `fallback` on failure.
pub async fn copy_with_fallback(
    writer: &dyn ClipboardWriter,
    fallback: &dyn CopyCommand,
    text: &str,
) -> Result<CopyMethod, ClipboardError> {
    match writer.write_text(text).await {
        Ok(()) => Ok(CopyMethod::Clipboard),
        Err(primary) => {
            warn!(error = %primary, "clipboard write failed, trying copy command");
            fallback
                .copy(text)
                .map(|()| CopyMethod::Command)
                .map_err(|fallback| ClipboardError::WriteFailure {
                    primary: Box::new(primary),
                    fallback: Box::new(fallback),
                })
        }
    }
}
