//! Info command implementation

use anyhow::{bail, Result};
use croquis_core::config::CroquisConfig;
use croquis_core::formats::Destination;
use croquis_core::ports::NoopMapView;
use croquis_ui::EditorSession;

use crate::cli::InfoArgs;
use crate::commands::read_payloads;
use crate::notifier::ConsoleNotifier;
use crate::output::OutputWriter;

pub async fn execute(
    args: InfoArgs,
    output: &OutputWriter,
    notifier: &ConsoleNotifier,
    config: &CroquisConfig,
) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("no input files given");
    }

    // Run the real import against a scratch session; the toasts the pipeline
    // emits are exactly the summary the user wants.
    let mut session = EditorSession::new(config);
    let mut map = NoopMapView;
    let files = read_payloads(&args.inputs)?;
    let report = session.import(&mut map, notifier, files).await;

    if !report.layers.is_empty() {
        let headers = vec![
            "Layer".to_string(),
            "Kind".to_string(),
            "Features".to_string(),
        ];
        let rows = report
            .layers
            .iter()
            .map(|layer| {
                vec![
                    layer.name.clone(),
                    match layer.destination {
                        Destination::Editable => "drawing".to_string(),
                        Destination::Reference => "reference".to_string(),
                    },
                    layer.feature_count.to_string(),
                ]
            })
            .collect();
        output.table(headers, rows);
    }
    Ok(())
}
