//! KMZ format decoder: a zip archive wrapping a KML document.

use std::io::{Cursor, Read};

use async_trait::async_trait;

use crate::error::{CroquisError, Result};
use crate::formats::kml::collection_from_kml_text;
use crate::formats::{DecodedCollection, Destination, FilePayload, FormatDecoder};

pub struct KmzDecoder;

#[async_trait]
impl FormatDecoder for KmzDecoder {
    async fn decode(&self, payload: &FilePayload) -> Result<DecodedCollection> {
        let text = extract_kml_text(payload)?;
        let collection = collection_from_kml_text(&payload.name, &text)?;
        Ok(DecodedCollection {
            name: payload.name.clone(),
            collection,
            destination: Destination::Reference,
            warnings: Vec::new(),
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["kmz"]
    }

    fn format_name(&self) -> &str {
        "KMZ"
    }
}

/// Pull the first `.kml` entry out of the archive.
fn extract_kml_text(payload: &FilePayload) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(&payload.bytes)).map_err(|e| {
        CroquisError::MalformedFile {
            format: "KMZ",
            name: payload.name.clone(),
            reason: e.to_string(),
        }
    })?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| CroquisError::MalformedFile {
            format: "KMZ",
            name: payload.name.clone(),
            reason: e.to_string(),
        })?;
        if !file.name().to_lowercase().ends_with(".kml") {
            continue;
        }
        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|e| CroquisError::MalformedFile {
                format: "KMZ",
                name: payload.name.clone(),
                reason: e.to_string(),
            })?;
        return Ok(text);
    }

    Err(CroquisError::KmzMissingKml {
        name: payload.name.clone(),
    })
}
