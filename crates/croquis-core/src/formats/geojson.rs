//! GeoJSON format decoder.
//!
//! The one format that merges into the editable collection instead of adding a
//! reference overlay: a GeoJSON upload is treated as a drawing to continue,
//! which is also what makes export/import round-trips possible.

use async_trait::async_trait;
use geojson::{FeatureCollection, GeoJson};

use crate::error::{CroquisError, Result};
use crate::formats::{DecodedCollection, Destination, FilePayload, FormatDecoder};

pub struct GeoJsonDecoder;

#[async_trait]
impl FormatDecoder for GeoJsonDecoder {
    async fn decode(&self, payload: &FilePayload) -> Result<DecodedCollection> {
        let geojson: GeoJson =
            payload
                .text()?
                .parse()
                .map_err(|e: geojson::Error| CroquisError::MalformedFile {
                    format: "GeoJSON",
                    name: payload.name.clone(),
                    reason: e.to_string(),
                })?;

        let collection = match geojson {
            GeoJson::FeatureCollection(collection) => collection,
            GeoJson::Feature(feature) => FeatureCollection {
                bbox: None,
                features: vec![feature],
                foreign_members: None,
            },
            GeoJson::Geometry(geometry) => FeatureCollection {
                bbox: None,
                features: vec![geojson::Feature {
                    bbox: None,
                    geometry: Some(geometry),
                    id: None,
                    properties: None,
                    foreign_members: None,
                }],
                foreign_members: None,
            },
        };

        Ok(DecodedCollection {
            name: payload.name.clone(),
            collection,
            destination: Destination::Editable,
            warnings: Vec::new(),
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}
