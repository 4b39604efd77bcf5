use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Croquis - lightweight drawing editor for geospatial files
#[derive(Parser, Debug)]
#[command(name = "croquis")]
#[command(about = "Lightweight drawing editor for geospatial files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert geospatial files (GeoJSON, KML, KMZ, zipped or loose
    /// shapefiles) into GeoJSON
    Convert(ConvertArgs),

    /// Print the attribute table of a drawing
    Table(TableArgs),

    /// Summarize what a set of files would import as
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Input files; shapefile components with the same base name are grouped
    pub inputs: Vec<PathBuf>,

    /// Directory to write the resulting GeoJSON files into
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Parser, Debug)]
pub struct TableArgs {
    /// A GeoJSON drawing
    pub input: PathBuf,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Input files to inspect
    pub inputs: Vec<PathBuf>,
}
