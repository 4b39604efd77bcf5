//! Inspector form model.
//!
//! The inspector is the per-feature editing popup: a list of free-form data
//! fields on top, a style section below. Data and style stay separated in the
//! form even though they land in the same attribute mapping on save.

use croquis_core::models::{
    computed_style, is_style_key, AttrValue, Attributes, Feature, FeatureId, RenderStyle,
    StyleDefaults,
};

/// Symbols offered in the marker style dropdown.
pub const MARKER_SYMBOLS: [&str; 8] = [
    "location-dot",
    "circle",
    "square",
    "star",
    "house",
    "tree",
    "car",
    "play",
];

/// The style half of the form, shaped by the feature's geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleSection {
    Marker {
        color: String,
        symbol: String,
    },
    Path {
        stroke: String,
        width: f64,
        opacity: f64,
        fill: String,
        fill_opacity: f64,
    },
}

/// An open inspector: staged edits for exactly one feature.
///
/// The form is a copy; nothing reaches the store until the session submits it,
/// and then everything lands in one write.
#[derive(Debug, Clone)]
pub struct InspectorForm {
    feature: FeatureId,
    data: Vec<(String, String)>,
    style: StyleSection,
}

impl InspectorForm {
    /// Build the form for a feature, prefilled from its attributes.
    ///
    /// Style keys are routed to the style section; everything else becomes an
    /// editable data field, in attribute order.
    pub fn for_feature(feature: &Feature, defaults: &StyleDefaults) -> Self {
        let data = feature
            .attributes
            .iter()
            .filter(|(key, _)| !is_style_key(key))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let style = match computed_style(feature, defaults) {
            RenderStyle::Marker { color, symbol, .. } => StyleSection::Marker { color, symbol },
            RenderStyle::Path {
                stroke,
                weight,
                opacity,
                fill,
                fill_opacity,
            } => StyleSection::Path {
                stroke,
                width: weight,
                opacity,
                fill,
                fill_opacity,
            },
        };
        Self {
            feature: feature.id(),
            data,
            style,
        }
    }

    pub fn feature(&self) -> FeatureId {
        self.feature
    }

    pub fn data(&self) -> &[(String, String)] {
        &self.data
    }

    pub fn style(&self) -> &StyleSection {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut StyleSection {
        &mut self.style
    }

    /// Stage a new value for an existing data field.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.data.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => {
                entry.1 = value.into();
                true
            }
            None => false,
        }
    }

    /// Add an empty data field.
    ///
    /// Blank names, duplicates, and reserved style names are rejected.
    pub fn add_field(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || is_style_key(name) || self.data.iter().any(|(k, _)| k == name) {
            return false;
        }
        self.data.push((name.to_string(), String::new()));
        true
    }

    /// Collapse the form into one attribute mapping: data fields first, in
    /// form order, then the style keys for this geometry.
    pub fn to_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        for (key, value) in &self.data {
            attributes.insert(key.clone(), parse_value(value));
        }
        match &self.style {
            StyleSection::Marker { color, symbol } => {
                attributes.insert("marker-color", AttrValue::from(color.clone()));
                attributes.insert("marker-symbol", AttrValue::from(symbol.clone()));
            }
            StyleSection::Path {
                stroke,
                width,
                opacity,
                fill,
                fill_opacity,
            } => {
                attributes.insert("stroke", AttrValue::from(stroke.clone()));
                attributes.insert("stroke-width", AttrValue::from(*width));
                attributes.insert("stroke-opacity", AttrValue::from(*opacity));
                attributes.insert("fill", AttrValue::from(fill.clone()));
                attributes.insert("fill-opacity", AttrValue::from(*fill_opacity));
            }
        }
        attributes
    }
}

/// Parse user-typed text into an attribute value.
///
/// Anything that reads as a finite number becomes one; everything else stays
/// text, untrimmed.
pub fn parse_value(text: &str) -> AttrValue {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => AttrValue::Number(n),
        _ => AttrValue::Text(text.to_string()),
    }
}
