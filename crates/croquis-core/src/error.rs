//! Error types for croquis

use thiserror::Error;

use crate::models::FeatureId;

#[derive(Debug, Error)]
pub enum CroquisError {
    // Per-file ingestion errors
    #[error("{format} file '{name}' could not be read: {reason}")]
    MalformedFile {
        format: &'static str,
        name: String,
        reason: String,
    },

    #[error("KML file '{name}' contains no usable features")]
    EmptyKml { name: String },

    #[error("no .kml entry found inside KMZ archive '{name}'")]
    KmzMissingKml { name: String },

    #[error("shapefile group '{base}' is missing its .shp member")]
    ShapefileGroupIncomplete { base: String },

    // Store errors
    #[error("nothing drawn yet: the editable collection is empty")]
    EmptyStore,

    #[error("no editable feature with id {id}")]
    UnknownFeature { id: FeatureId },

    #[error("no reference layer named '{name}'")]
    UnknownLayer { name: String },

    // Configuration errors
    #[error("invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CroquisError>;
