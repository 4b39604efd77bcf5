//! Format abstraction layer for multi-format import.
//!
//! Each supported file format implements the [`FormatDecoder`] trait over an
//! in-memory payload; the [`DecoderRegistry`] dispatches by file extension.
//! Decoders do no file I/O themselves, mirroring the browser upload model
//! where file contents arrive as byte buffers.

use async_trait::async_trait;
use ::geojson::FeatureCollection;

use crate::error::Result;

pub mod geojson;
pub mod kml;
pub mod kmz;
pub mod shapefile;

pub use self::geojson::GeoJsonDecoder;
pub use self::kml::KmlDecoder;
pub use self::kmz::KmzDecoder;
pub use self::shapefile::{ShapefileBundle, ZippedShapefileDecoder};

/// One user-selected file: its name and raw contents.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Lowercased extension, empty when the name has none.
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.name)
    }

    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| crate::CroquisError::MalformedFile {
            format: "text",
            name: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// Where a decoded collection lands in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Merged into the user's own drawing.
    Editable,
    /// Added as a named read-only overlay.
    Reference,
}

/// Canonical result of decoding one file.
#[derive(Debug, Clone)]
pub struct DecodedCollection {
    /// Display name of the resulting layer.
    pub name: String,
    pub collection: FeatureCollection,
    pub destination: Destination,
    /// Non-fatal observations surfaced with the batch report.
    pub warnings: Vec<String>,
}

/// Format decoder trait that all format implementations must implement.
#[async_trait]
pub trait FormatDecoder: Send + Sync {
    /// Decode a payload into the canonical feature collection.
    async fn decode(&self, payload: &FilePayload) -> Result<DecodedCollection>;

    /// Lowercase extensions this decoder handles (e.g. `["json", "geojson"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name (e.g. "GeoJSON", "KMZ").
    fn format_name(&self) -> &str;
}

/// Central registry for format decoders.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn FormatDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Registry covering every standalone import format.
    ///
    /// Grouped shapefile components bypass the registry; the ingestion
    /// pipeline bundles them before decoding.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GeoJsonDecoder));
        registry.register(Box::new(KmlDecoder));
        registry.register(Box::new(KmzDecoder));
        registry.register(Box::new(ZippedShapefileDecoder));
        registry
    }

    pub fn register(&mut self, decoder: Box<dyn FormatDecoder>) {
        self.decoders.push(decoder);
    }

    /// Decoder for an extension, `None` when the extension is unrecognized.
    /// Unrecognized extensions are silently ignored during import.
    pub fn for_extension(&self, extension: &str) -> Option<&dyn FormatDecoder> {
        self.decoders
            .iter()
            .find(|d| d.supported_extensions().contains(&extension))
            .map(|d| d.as_ref())
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        self.decoders
            .iter()
            .flat_map(|d| d.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
