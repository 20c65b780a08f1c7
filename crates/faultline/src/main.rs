//! Faultline CLI binary.

use anyhow::Result;
use faultline::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the faultline CLI.
///
/// Every command is a short sequence of file reads, graph updates and file
/// writes, so the current-thread runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=faultline=debug,faultline_jsonl=trace.
    // Logs go to stderr so `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("faultline=info,faultline_jsonl=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting faultline CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Faultline CLI completed successfully");
    Ok(())
}
