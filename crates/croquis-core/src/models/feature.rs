//! The canonical feature: one geometry plus an ordered attribute mapping.

use std::fmt;

use geojson::JsonObject;
use serde::{Deserialize, Serialize};

use super::geometry::{Bounds, GeometryKind};

/// Unique identifier for an editable feature.
///
/// Minted and owned by the store. It is the join key between the geometry
/// layer, the inspector, and the attribute table, and never changes for the
/// lifetime of the feature. Collaborator-internal layer ids are treated as
/// opaque handles and are never used as this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar attribute value.
///
/// Attribute values form a closed set: free-form text or a number. Imported
/// data with richer JSON types is coerced to text so every view can render and
/// edit any value the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }

    /// Convert a JSON value into the closed scalar set.
    ///
    /// Strings and numbers map directly; booleans and composite values are
    /// coerced to their text form; nulls carry no information and map to
    /// `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<AttrValue> {
        match value {
            serde_json::Value::String(s) => Some(AttrValue::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(AttrValue::Number),
            serde_json::Value::Bool(b) => Some(AttrValue::Text(b.to_string())),
            serde_json::Value::Null => None,
            other => Some(AttrValue::Text(other.to_string())),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Text(s) => serde_json::Value::String(s.clone()),
            AttrValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{s}"),
            AttrValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

/// Ordered mapping from user-defined keys to scalar values.
///
/// Keys keep their insertion order so forms and table columns stay stable
/// across renders. Lookups are linear; features carry a handful of attributes,
/// not thousands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, AttrValue)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a single key, leaving every other entry untouched.
    /// Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Merge another set of fields into this one. Only the given keys change.
    pub fn merge<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, AttrValue)>,
    {
        for (key, value) in fields {
            self.insert(key, value);
        }
    }

    /// Build from a GeoJSON properties object, preserving key order.
    pub fn from_json_object(object: &JsonObject) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in object {
            if let Some(value) = AttrValue::from_json(value) {
                attributes.insert(key.clone(), value);
            }
        }
        attributes
    }

    /// Serialize into a GeoJSON properties object, preserving key order.
    pub fn to_json_object(&self) -> JsonObject {
        let mut object = JsonObject::new();
        for (key, value) in &self.entries {
            object.insert(key.clone(), value.to_json());
        }
        object
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

/// One drawable geographic entity: a geometry plus its attribute mapping.
///
/// The geometry's coordinate data is owned by the rendering collaborator; the
/// core treats it opaquely except for bounding-box queries.
#[derive(Debug, Clone)]
pub struct Feature {
    id: FeatureId,
    kind: GeometryKind,
    pub geometry: geojson::Geometry,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(
        id: FeatureId,
        kind: GeometryKind,
        geometry: geojson::Geometry,
        attributes: Attributes,
    ) -> Self {
        Self {
            id,
            kind,
            geometry,
            attributes,
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_geometry(&self.geometry)
    }
}
