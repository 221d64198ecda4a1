use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cryptotrader::application::{Cli, CommandExecutor};
use cryptotrader::shared::config::{Configuration, PropertyType};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let configuration = Arc::new(Configuration::from_file(&cli.config)?);
    let base_dir = cli.config.parent().unwrap_or_else(|| Path::new("."));

    info!(
        "Loaded {} ({} entries, version {:?})",
        cli.config.display(),
        configuration.len(),
        configuration.get_property(PropertyType::Version)
    );

    CommandExecutor::execute(cli.command, configuration, base_dir)?;

    Ok(())
}
