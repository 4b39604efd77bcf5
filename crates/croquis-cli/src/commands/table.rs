//! Table command implementation

use anyhow::{bail, Result};
use croquis_core::config::CroquisConfig;
use croquis_core::ports::NoopMapView;
use croquis_ui::{EditorSession, TableColumn};

use crate::cli::TableArgs;
use crate::commands::read_payloads;
use crate::notifier::ConsoleNotifier;
use crate::output::OutputWriter;

pub async fn execute(
    args: TableArgs,
    output: &OutputWriter,
    notifier: &ConsoleNotifier,
    config: &CroquisConfig,
) -> Result<()> {
    let mut session = EditorSession::new(config);
    let mut map = NoopMapView;
    let files = read_payloads(std::slice::from_ref(&args.input))?;
    let report = session.import(&mut map, notifier, files).await;

    if !report.failures.is_empty() {
        bail!("could not read '{}'", args.input.display());
    }
    if session.store().editable_count() == 0 {
        output.info("No features in the drawing");
        return Ok(());
    }

    let model = session.table_model();
    let headers: Vec<String> = model
        .columns
        .iter()
        .filter_map(|c| match c {
            TableColumn::Field(_) => Some(c.title()),
            _ => None,
        })
        .collect();
    let rows: Vec<Vec<String>> = model.rows.into_iter().map(|r| r.cells).collect();
    output.table(headers, rows);
    Ok(())
}
