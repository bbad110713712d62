use std::io::Read;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use tracing::info;
use url::Url;

use selmd::html::{self, HtmlOptions};
use selmd::trigger::{self, Hotkey, KeyEvent};
use selmd::{
    Config, DesktopNotifier, ExportOutcome, Exporter, Extractor, Notifier, OutputSink, Page, PageSnapshot,
    ShellCopyCommand, StdoutDisplay, SystemClipboard, TerminalNotifier,
};

use crate::ExportArgs;

pub async fn cmd_snapshot(file: &Path, args: &ExportArgs, config: Config) -> Result<()> {
    let input = read_input(file)?;
    let page = PageSnapshot::from_json(&input)
        .with_context(|| format!("failed to parse snapshot {}", file.display()))?
        .into_page()?;
    run_export(page, args, config).await
}

pub async fn cmd_html(
    file: &Path,
    select: &str,
    base_url: Option<&str>,
    args: &ExportArgs,
    config: Config,
) -> Result<()> {
    let input = read_input(file)?;
    let base_url = base_url
        .map(Url::parse)
        .transpose()
        .context("invalid --base-url")?;
    let options = HtmlOptions {
        select: select.to_string(),
        base_url,
        ..HtmlOptions::default()
    };
    let page = html::parse(&input, &options)?;
    run_export(page, args, config).await
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

async fn run_export(page: Page, args: &ExportArgs, mut config: Config) -> Result<()> {
    if args.block_paragraphs {
        config.extract.block_paragraphs = true;
    }
    if let Some(threshold) = args.row_threshold {
        ensure!(
            threshold.is_finite() && threshold > 0.0,
            "--row-threshold must be a positive number, got {threshold}"
        );
        config.extract.row_threshold = threshold;
    }

    let page = if args.force_fallback { page.force_fallback() } else { page };

    let notifier: Box<dyn Notifier> = if args.desktop_notify {
        Box::new(DesktopNotifier)
    } else {
        Box::new(TerminalNotifier)
    };

    if let Some(key) = &args.key {
        let hotkey: Hotkey = config
            .hotkey
            .parse()
            .with_context(|| format!("invalid hotkey {:?} in config", config.hotkey))?;
        let event: KeyEvent = key.parse().with_context(|| format!("invalid --key {key:?}"))?;

        let registry = trigger::global();
        registry.register(hotkey, notifier.as_ref());
        if !registry.is_trigger(&event) {
            info!(key = %key, hotkey = %config.hotkey, "key press is not the export hotkey");
            return Ok(());
        }
    }

    let mut sink = OutputSink::new(notifier);
    if config.output.clipboard && !args.no_clipboard {
        sink = sink.with_clipboard(Box::new(SystemClipboard), Box::new(ShellCopyCommand::default()));
    }
    if args.output.is_none() && config.output.show_full_text {
        sink = sink.with_display(Box::new(StdoutDisplay));
    }

    let exporter = Exporter::new(Extractor::new(config.extract), sink);
    if let ExportOutcome::Delivered { extraction, delivery } = exporter.export(&page).await {
        info!(strategy = ?extraction.strategy, ?delivery, "export finished");
        if let Some(path) = &args.output {
            std::fs::write(path, &extraction.markdown)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = extraction.markdown.len(), "markdown saved");
        }
    }

    Ok(())
}
