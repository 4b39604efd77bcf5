//! Batch ingestion pipeline.
//!
//! One upload batch can mix formats freely: standalone GeoJSON/KML/KMZ/zip
//! files next to loose shapefile components. Components are grouped by base
//! name into one bundle per shapefile; everything else goes through the
//! decoder registry. One broken file never sinks the batch.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::formats::shapefile::{ShapefileBundle, COMPONENT_EXTENSIONS};
use crate::formats::{DecodedCollection, DecoderRegistry, Destination, FilePayload};
use crate::models::{computed_style, tooltip_text, StyleDefaults};
use crate::ports::{MapView, Notifier, ToastLevel};
use crate::store::FeatureStore;

/// One layer that made it into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub name: String,
    pub destination: Destination,
    pub feature_count: usize,
}

/// One input that did not.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestFailure {
    pub name: String,
    pub reason: String,
}

/// Outcome of one upload batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub layers: Vec<LayerSummary>,
    pub failures: Vec<IngestFailure>,
    pub warnings: Vec<String>,
}

impl IngestReport {
    pub fn fully_successful(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }
}

/// Decodes upload batches and lands the results in the store.
pub struct Ingestor {
    registry: DecoderRegistry,
    defaults: StyleDefaults,
}

impl Ingestor {
    pub fn new(defaults: StyleDefaults) -> Self {
        Self {
            registry: DecoderRegistry::with_defaults(),
            defaults,
        }
    }

    /// Ingest a batch of files.
    ///
    /// Every file is decoded independently; failures are collected into the
    /// report and surfaced as error toasts while the rest of the batch
    /// proceeds. Unrecognized extensions are skipped without comment.
    pub async fn ingest(
        &self,
        store: &mut FeatureStore,
        map: &mut dyn MapView,
        notifier: &dyn Notifier,
        files: Vec<FilePayload>,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        let (groups, standalones) = partition(files);

        for (base, components) in groups {
            if !components.iter().any(|f| f.extension() == "shp") {
                warn!(base = %base, "shapefile group has no .shp member, skipping");
                report.warnings.push(format!(
                    "'{base}' is missing its .shp component and was skipped"
                ));
                continue;
            }
            notifier.toast(ToastLevel::Info, &format!("Importing {base}..."));
            match ShapefileBundle::from_group(&base, &components).and_then(ShapefileBundle::decode)
            {
                Ok((collection, warnings)) => {
                    report.warnings.extend(warnings);
                    self.land(
                        store,
                        map,
                        DecodedCollection {
                            name: base,
                            collection,
                            destination: Destination::Reference,
                            warnings: Vec::new(),
                        },
                        &mut report,
                    );
                }
                Err(error) => report.failures.push(IngestFailure {
                    name: base,
                    reason: error.to_string(),
                }),
            }
        }

        for payload in standalones {
            let Some(decoder) = self.registry.for_extension(&payload.extension()) else {
                continue;
            };
            notifier.toast(ToastLevel::Info, &format!("Importing {}...", payload.name));
            match decoder.decode(&payload).await {
                Ok(mut decoded) => {
                    report.warnings.append(&mut decoded.warnings);
                    decoded.name = layer_name(&decoded.name);
                    self.land(store, map, decoded, &mut report);
                }
                Err(error) => report.failures.push(IngestFailure {
                    name: payload.name,
                    reason: error.to_string(),
                }),
            }
        }

        for failure in &report.failures {
            notifier.toast(
                ToastLevel::Error,
                &format!("Could not import '{}': {}", failure.name, failure.reason),
            );
        }
        for warning in &report.warnings {
            notifier.toast(ToastLevel::Warning, warning);
        }
        if !report.layers.is_empty() {
            let message = format!(
                "Imported {} layer{}",
                report.layers.len(),
                if report.layers.len() == 1 { "" } else { "s" }
            );
            if report.fully_successful() {
                notifier.toast(ToastLevel::Success, &message);
            } else {
                // A batch with both outcomes still reports what landed.
                notifier.toast(ToastLevel::Warning, &format!("{message} (partial)"));
            }
        }

        report
    }

    /// Put one decoded collection into the store and push it to the view.
    fn land(
        &self,
        store: &mut FeatureStore,
        map: &mut dyn MapView,
        decoded: DecodedCollection,
        report: &mut IngestReport,
    ) {
        let feature_count = decoded.collection.features.len();
        match decoded.destination {
            Destination::Editable => {
                let ids = store.import_editable(decoded.collection);
                for id in &ids {
                    if let Some(feature) = store.feature(*id) {
                        map.apply_style(*id, &computed_style(feature, &self.defaults));
                        map.set_tooltip(*id, tooltip_text(&feature.attributes));
                    }
                }
                if let Some(bounds) = store.editable_bounds() {
                    map.fit_bounds(bounds);
                }
                info!(name = %decoded.name, count = ids.len(), "merged into drawing");
                report.layers.push(LayerSummary {
                    name: decoded.name,
                    destination: Destination::Editable,
                    feature_count: ids.len(),
                });
            }
            Destination::Reference => {
                store.add_reference(decoded.name.clone(), decoded.collection, None);
                // add_reference either inserted or overwrote this name.
                if let Some(layer) = store.reference(&decoded.name) {
                    map.add_reference_layer(layer.name(), layer.color(), layer.collection());
                    if let Some(bounds) = layer.bounds() {
                        map.fit_bounds(bounds);
                    }
                }
                info!(name = %decoded.name, count = feature_count, "added reference layer");
                report.layers.push(LayerSummary {
                    name: decoded.name,
                    destination: Destination::Reference,
                    feature_count,
                });
            }
        }
    }
}

/// Split a batch into shapefile component groups (keyed by base name) and
/// standalone files.
fn partition(files: Vec<FilePayload>) -> (BTreeMap<String, Vec<FilePayload>>, Vec<FilePayload>) {
    let mut groups: BTreeMap<String, Vec<FilePayload>> = BTreeMap::new();
    let mut standalones = Vec::new();
    for file in files {
        if COMPONENT_EXTENSIONS.contains(&file.extension().as_str()) {
            groups.entry(file.stem().to_string()).or_default().push(file);
        } else {
            standalones.push(file);
        }
    }
    (groups, standalones)
}

/// Layer display name for a file: the name minus its extension.
fn layer_name(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem.to_string())
        .unwrap_or_else(|| file_name.to_string())
}
