//! `selmd` CLI - Export a document selection as markdown

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use selmd::Config;

#[derive(Parser)]
#[command(name = "selmd")]
#[command(about = "Turn a document selection into markdown text and image references")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/selmd/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log extraction details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the selection recorded in a JSON page snapshot
    Snapshot {
        /// Snapshot file (`-` for stdin)
        file: PathBuf,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export the contents of an element in an HTML document
    Html {
        /// HTML file (`-` for stdin)
        file: PathBuf,

        /// CSS selector of the element whose contents are selected
        #[arg(short, long, default_value = "body")]
        select: String,

        /// Base URL for relative image sources
        #[arg(long)]
        base_url: Option<String>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Show the effective configuration
    Config {
        /// Print only the config file location
        #[arg(long)]
        path: bool,
    },
}

/// Flags shared by the export commands.
#[derive(Args, Clone, Debug, Default)]
pub struct ExportArgs {
    /// Skip the DOM-order walk and order content by position
    #[arg(long)]
    pub force_fallback: bool,

    /// Do not touch the clipboard
    #[arg(long)]
    pub no_clipboard: bool,

    /// Write the markdown to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Simulated key press (e.g. `Ctrl+Shift+M`); export only if it matches the hotkey
    #[arg(long)]
    pub key: Option<String>,

    /// Show notices as desktop notifications
    #[arg(long)]
    pub desktop_notify: bool,

    /// Start a new paragraph at block element boundaries
    #[arg(long)]
    pub block_paragraphs: bool,

    /// Row grouping threshold in pixels for the positional fallback
    #[arg(long)]
    pub row_threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "selmd=debug" } else { "warn" };
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Snapshot { file, export } => {
            cmd::export::cmd_snapshot(&file, &export, config).await?;
        }
        Commands::Html {
            file,
            select,
            base_url,
            export,
        } => {
            cmd::export::cmd_html(&file, &select, base_url.as_deref(), &export, config).await?;
        }
        Commands::Config { path } => {
            cmd::config::cmd_config(&config, cli.config.as_deref(), path)?;
        }
    }

    Ok(())
}
