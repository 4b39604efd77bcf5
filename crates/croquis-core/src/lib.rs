//! Croquis core - feature model, store, selection, and format ingestion
//!
//! This crate contains the canonical data model of the drawing editor and the
//! pipeline that normalizes heterogeneous geospatial files into it. Rendering,
//! drawing gestures, and dialogs live behind the ports in [`ports`].

pub mod config;
pub mod error;
pub mod formats;
pub mod ingest;
pub mod models;
pub mod ports;
pub mod selection;
pub mod store;

pub use error::{CroquisError, Result};
