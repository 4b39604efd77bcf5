//! Command implementations

mod convert;
mod info;
mod table;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use croquis_core::config::CroquisConfig;
use croquis_core::formats::FilePayload;

use crate::cli::{Cli, Commands};
use crate::notifier::ConsoleNotifier;
use crate::output::OutputWriter;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let notifier = ConsoleNotifier::new(output, cli.yes);

    let mut config = CroquisConfig::with_defaults();
    if let Some(path) = &cli.config {
        config = config.load_from_file(path)?;
    }
    let config = config.load_from_env();

    match cli.command {
        Commands::Convert(args) => convert::execute(args, &output, &notifier, &config).await,
        Commands::Table(args) => table::execute(args, &output, &notifier, &config).await,
        Commands::Info(args) => info::execute(args, &output, &notifier, &config).await,
    }
}

/// Load input files into in-memory payloads, keyed by file name.
pub(crate) fn read_payloads(paths: &[PathBuf]) -> Result<Vec<FilePayload>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            Ok(FilePayload::new(name, bytes))
        })
        .collect()
}
