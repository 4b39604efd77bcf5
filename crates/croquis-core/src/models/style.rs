//! Render style computation from reserved attribute keys.
//!
//! Styling follows the SimpleStyle property names: a fixed, enumerated subset
//! of attribute keys is interpreted as style; every other key is free-form
//! data. The two sets never mix in a display surface.

use super::feature::{AttrValue, Attributes, Feature};

/// Reserved style keys, in display order.
pub const STYLE_KEYS: [&str; 7] = [
    "stroke",
    "stroke-width",
    "stroke-opacity",
    "fill",
    "fill-opacity",
    "marker-color",
    "marker-symbol",
];

pub fn is_style_key(key: &str) -> bool {
    STYLE_KEYS.contains(&key)
}

/// Fallback values applied when a style key is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefaults {
    pub stroke: String,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
    pub fill: String,
    pub fill_opacity: f64,
    pub marker_color: String,
    pub marker_symbol: String,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            stroke: "#3388ff".to_string(),
            stroke_width: 3.0,
            stroke_opacity: 1.0,
            fill: "#3388ff".to_string(),
            fill_opacity: 0.2,
            marker_color: "#3388ff".to_string(),
            marker_symbol: "location-dot".to_string(),
        }
    }
}

/// Highlight applied to the active feature.
pub const HIGHLIGHT_COLOR: &str = "#f59e0b";
pub const HIGHLIGHT_WEIGHT: f64 = 5.0;

/// Concrete visual parameters handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStyle {
    /// Point features render as a marker icon.
    Marker {
        color: String,
        symbol: String,
        /// False when neither marker key is set; the collaborator keeps its
        /// stock pin in that case.
        custom: bool,
    },
    /// Lines, polygons, and rectangles render as a stroked path.
    Path {
        stroke: String,
        weight: f64,
        opacity: f64,
        fill: String,
        fill_opacity: f64,
    },
}

fn text_or<'a>(attributes: &'a Attributes, key: &str, fallback: &'a str) -> &'a str {
    attributes
        .get(key)
        .and_then(AttrValue::as_text)
        .unwrap_or(fallback)
}

fn number_or(attributes: &Attributes, key: &str, fallback: f64) -> f64 {
    attributes
        .get(key)
        .and_then(AttrValue::as_number)
        .unwrap_or(fallback)
}

/// Compute the render style of a feature from its attributes.
///
/// Pure and idempotent: unchanged attributes always yield the same result.
pub fn computed_style(feature: &Feature, defaults: &StyleDefaults) -> RenderStyle {
    let attributes = &feature.attributes;
    if feature.kind().is_point() {
        let custom =
            attributes.contains_key("marker-color") || attributes.contains_key("marker-symbol");
        RenderStyle::Marker {
            color: text_or(attributes, "marker-color", &defaults.marker_color).to_string(),
            symbol: text_or(attributes, "marker-symbol", &defaults.marker_symbol).to_string(),
            custom,
        }
    } else {
        RenderStyle::Path {
            stroke: text_or(attributes, "stroke", &defaults.stroke).to_string(),
            weight: number_or(attributes, "stroke-width", defaults.stroke_width),
            opacity: number_or(attributes, "stroke-opacity", defaults.stroke_opacity),
            fill: text_or(attributes, "fill", &defaults.fill).to_string(),
            fill_opacity: number_or(attributes, "fill-opacity", defaults.fill_opacity),
        }
    }
}

/// Style of the active feature.
///
/// Markers cannot be restyled in place by the collaborator, so point features
/// keep their computed style while selected.
pub fn highlight_style(feature: &Feature, defaults: &StyleDefaults) -> RenderStyle {
    match computed_style(feature, defaults) {
        RenderStyle::Path {
            opacity,
            fill,
            fill_opacity,
            ..
        } => RenderStyle::Path {
            stroke: HIGHLIGHT_COLOR.to_string(),
            weight: HIGHLIGHT_WEIGHT,
            opacity,
            fill,
            fill_opacity,
        },
        marker => marker,
    }
}

/// Hover tooltip body: every data attribute as a `key: value` line.
///
/// Style keys and the bookkeeping `id` are filtered out. `None` when nothing
/// remains, so views can show their own placeholder.
pub fn tooltip_text(attributes: &Attributes) -> Option<String> {
    let lines: Vec<String> = attributes
        .iter()
        .filter(|(key, _)| !is_style_key(key) && *key != "id")
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
