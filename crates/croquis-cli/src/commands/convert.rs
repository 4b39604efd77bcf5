//! Convert command implementation

use std::fs;

use anyhow::{bail, Context, Result};
use croquis_core::config::CroquisConfig;
use croquis_core::ports::NoopMapView;
use croquis_ui::EditorSession;
use geojson::GeoJson;

use crate::cli::ConvertArgs;
use crate::commands::read_payloads;
use crate::notifier::ConsoleNotifier;
use crate::output::OutputWriter;

pub async fn execute(
    args: ConvertArgs,
    output: &OutputWriter,
    notifier: &ConsoleNotifier,
    config: &CroquisConfig,
) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("no input files given");
    }

    let mut session = EditorSession::new(config);
    let mut map = NoopMapView;
    let files = read_payloads(&args.inputs)?;
    let report = session.import(&mut map, notifier, files).await;

    if report.layers.is_empty() {
        bail!("none of the inputs produced a layer");
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create '{}'", args.out_dir.display()))?;

    let mut written = 0usize;

    // The merged drawing, when any input was a GeoJSON drawing.
    if session.store().editable_count() > 0 {
        let file = session.export(notifier)?;
        let path = args.out_dir.join(&file.filename);
        fs::write(&path, file.contents)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        output.success(format!("Wrote {}", path.display()));
        written += 1;
    }

    // Every reference layer becomes a standalone GeoJSON file.
    for layer in session.store().references() {
        let contents = serde_json::to_string_pretty(&GeoJson::from(layer.collection().clone()))?;
        let path = args.out_dir.join(format!("{}.geojson", layer.name()));
        fs::write(&path, contents)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        output.success(format!(
            "Wrote {} ({} features)",
            path.display(),
            layer.feature_count()
        ));
        written += 1;
    }

    if written == 0 {
        bail!("nothing to write");
    }
    Ok(())
}
