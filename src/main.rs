use anyhow::Context;

use payfast_orders::config::{AppConfig, SourceConfig};
use payfast_orders::export::{OutputSheet, open_sink};
use payfast_orders::mailbox::{DirectoryMailbox, ImapMailbox};
use payfast_orders::pipeline::{OrderPipeline, RunSummary};

/// Drain the configured mailbox into a sheet. Blocking.
fn drain(config: AppConfig) -> anyhow::Result<(OutputSheet, RunSummary)> {
    let pipeline = OrderPipeline::new(config.pipeline);
    let mut sheet = OutputSheet::new();

    let summary = match config.source {
        SourceConfig::Imap(imap) => {
            let host = imap.host.clone();
            let mut mailbox = ImapMailbox::connect(imap)
                .with_context(|| format!("Failed to open mailbox on {host}"))?;
            let summary = pipeline.run(&mut mailbox, &mut sheet)?;
            mailbox.logout();
            summary
        }
        SourceConfig::Directory(dir) => {
            let mut mailbox = DirectoryMailbox::open(&dir)
                .with_context(|| format!("Failed to open message directory {}", dir.display()))?;
            pipeline.run(&mut mailbox, &mut sheet)?
        }
    };

    Ok((sheet, summary))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let export_config = config.export.clone();

    eprintln!("PayFast order export v{}", env!("CARGO_PKG_VERSION"));
    match &config.source {
        SourceConfig::Imap(imap) => {
            eprintln!("   Mailbox: {}:{} ({})", imap.host, imap.port, imap.folder)
        }
        SourceConfig::Directory(dir) => eprintln!("   Messages: {}", dir.display()),
    }
    eprintln!(
        "   Bundles: {} configured",
        config.pipeline.bundle_catalog.len()
    );
    eprintln!(
        "   Export: {} ({})",
        export_config.dir.display(),
        export_config.format.extension()
    );

    let (sheet, summary) = tokio::task::spawn_blocking(move || drain(config))
        .await
        .context("Mailbox task panicked")??;

    let mut sink = open_sink(export_config);
    let path = sink.write_sheet(&sheet).context("Failed to write export")?;

    eprintln!(
        "\n   Processed {} of {} message(s), {} skipped, {} row(s)",
        summary.processed, summary.found, summary.skipped, summary.rows
    );
    if summary.interrupted {
        eprintln!("   Mailbox connection lost; unprocessed messages remain unread");
    }
    println!("Data saved to: {}", path.display());

    Ok(())
}
