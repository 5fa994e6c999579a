//! contact-harvest - Entry point for the mailbox contact exporter

use anyhow::{Context, Result};
use clap::Parser;

use contact_harvest::config::{Cli, Config};
use contact_harvest::providers::email::{ImapSession, MailSession};
use contact_harvest::services::{CsvExporter, HarvestService};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_cli(Cli::parse())?;
    tracing::debug!(?config, "configuration loaded");

    let session = ImapSession::connect(&config.imap(), &config.credentials())
        .await
        .with_context(|| format!("failed to connect to {}", config.host))?;

    let exporter = CsvExporter::new(&config.output_dir);
    exporter.ensure_output_dir().await?;

    HarvestService::new(exporter).run(&session).await;

    session.logout().await.context("logout failed")?;
    tracing::info!("Processing completed!");
    Ok(())
}
