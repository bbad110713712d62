//! Configuration loaded from `~/.config/selmd/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::trigger::Hotkey;

/// Row threshold in pixels used when grouping candidates into lines.
pub const DEFAULT_ROW_THRESHOLD: f64 = 20.0;

/// Where the geometric fallback looks for images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageScope {
    /// Same subtree as the text search (the selection's enclosing node).
    #[default]
    Selection,
    /// Every image in the document.
    Document,
}

/// Extraction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Maximum vertical midpoint distance for two items to share a row.
    pub row_threshold: f64,
    pub image_scope: ImageScope,
    /// Elements whose whole subtree the DOM-order walk ignores.
    pub skip_tags: Vec<String>,
    /// Start a new paragraph at block element boundaries in the DOM-order walk.
    pub block_paragraphs: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            row_threshold: DEFAULT_ROW_THRESHOLD,
            image_scope: ImageScope::default(),
            skip_tags: vec!["script".into(), "style".into(), "noscript".into()],
            block_paragraphs: false,
        }
    }
}

impl ExtractConfig {
    pub fn skips(&self, tag: &str) -> bool {
        self.skip_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Where the result goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write the markdown to the system clipboard.
    pub clipboard: bool,
    /// Show the full markdown text after export.
    pub show_full_text: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            clipboard: true,
            show_full_text: true,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Export hotkey, e.g. `Mod+Shift+M` (`Mod` is Cmd or Ctrl).
    pub hotkey: String,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: "Mod+Shift+M".into(),
            extract: ExtractConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };

        if !path.exists() {
            if required {
                bail!("config file {} does not exist", path.display());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::parse(&content).with_context(|| format!("invalid config in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.extract.row_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            bail!("extract.row_threshold must be a positive number, got {threshold}");
        }
        self.hotkey
            .parse::<Hotkey>()
            .with_context(|| format!("invalid hotkey {:?}", self.hotkey))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

/// Return the path to the default config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("selmd")
        .join("config.toml")
}
