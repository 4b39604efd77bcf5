//! The feature store: single source of truth for both views.
//!
//! Two disjoint collections live here. The editable collection is the user's
//! own drawing, ordered by insertion and exportable. Reference layers are
//! imported read-only overlays, removable only wholesale. A feature belongs to
//! exactly one collection for its whole lifetime.
//!
//! Every mutation is synchronous and immediately observable; mutating methods
//! hand back a [`StoreEvent`] the session republishes to whichever views are
//! open, so there is never an eventual-consistency window.

use chrono::Utc;
use geojson::{FeatureCollection, GeoJson};
use rand::Rng;

use crate::error::{CroquisError, Result};
use crate::models::{AttrValue, Attributes, Bounds, Feature, FeatureId, GeometryKind};

/// Change notification republished to open views.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    EditableAdded(FeatureId),
    EditableChanged(FeatureId),
    EditableRemoved(FeatureId),
    ReferenceAdded(String),
    ReferenceRemoved(String),
}

/// A serialized drawing ready to hand to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

/// An autocomplete hit inside a reference layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub feature_index: usize,
    pub label: String,
    /// `key: value` of the matching field when it is not the label itself.
    pub context: Option<String>,
}

const SUGGESTION_LIMIT: usize = 10;

/// An imported, read-only overlay: a named feature set plus a display color.
#[derive(Debug, Clone)]
pub struct ReferenceLayer {
    name: String,
    color: String,
    collection: FeatureCollection,
}

impl ReferenceLayer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn feature_count(&self) -> usize {
        self.collection.features.len()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_collection(&self.collection)
    }

    pub fn feature_bounds(&self, index: usize) -> Option<Bounds> {
        self.collection
            .features
            .get(index)
            .and_then(|f| f.geometry.as_ref())
            .and_then(Bounds::of_geometry)
    }

    /// First feature whose attribute values contain the query,
    /// case-insensitively.
    pub fn find(&self, query: &str) -> Option<usize> {
        let query = query.to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.collection.features.iter().position(|feature| {
            feature.properties.as_ref().is_some_and(|props| {
                props
                    .values()
                    .any(|value| value_text(value).to_lowercase().contains(&query))
            })
        })
    }

    /// Up to ten matches for the layer's search box.
    ///
    /// The label prefers a `name`/`nombre`/`id` property; when the match sits
    /// in some other field that field is carried along as context.
    pub fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        let query = query.to_lowercase();
        if query.len() < 2 {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for (index, feature) in self.collection.features.iter().enumerate() {
            if matches.len() >= SUGGESTION_LIMIT {
                break;
            }
            let Some(props) = feature.properties.as_ref() else {
                continue;
            };

            let label = ["name", "nombre", "id"]
                .iter()
                .find_map(|key| props.get(*key).map(value_text))
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| "Unnamed element".to_string());

            let hit = props.iter().find_map(|(key, value)| {
                let text = value_text(value);
                text.to_lowercase()
                    .contains(&query)
                    .then(|| (key.clone(), text))
            });

            if let Some((key, text)) = hit {
                let context = (text != label).then(|| format!("{key}: {text}"));
                matches.push(Suggestion {
                    feature_index: index,
                    label,
                    context,
                });
            }
        }
        matches
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The authoritative collection of features.
#[derive(Debug, Default)]
pub struct FeatureStore {
    editable: Vec<Feature>,
    references: Vec<ReferenceLayer>,
    next_id: u64,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&mut self) -> FeatureId {
        self.next_id += 1;
        FeatureId(self.next_id)
    }

    // --- editable collection ---

    /// Append a feature to the editable collection.
    ///
    /// A feature drawn without attributes gets the default pair
    /// `{id: <creation unix-millis>, name: "New Element"}`.
    pub fn add_editable(
        &mut self,
        kind: GeometryKind,
        geometry: geojson::Geometry,
        mut attributes: Attributes,
    ) -> FeatureId {
        if attributes.is_empty() {
            attributes.insert("id", AttrValue::Number(Utc::now().timestamp_millis() as f64));
            attributes.insert("name", AttrValue::from("New Element"));
        }
        let id = self.mint_id();
        self.editable.push(Feature::new(id, kind, geometry, attributes));
        id
    }

    /// Merge a GeoJSON feature collection into the editable collection.
    ///
    /// Features without geometry are dropped; ids are minted per feature.
    pub fn import_editable(&mut self, collection: FeatureCollection) -> Vec<FeatureId> {
        let mut added = Vec::new();
        for feature in collection.features {
            let Some(geometry) = feature.geometry else {
                continue;
            };
            let attributes = feature
                .properties
                .as_ref()
                .map(Attributes::from_json_object)
                .unwrap_or_default();
            let kind = GeometryKind::of_geometry(&geometry);
            added.push(self.add_editable(kind, geometry, attributes));
        }
        added
    }

    pub fn editable(&self) -> &[Feature] {
        &self.editable
    }

    pub fn editable_count(&self) -> usize {
        self.editable.len()
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.editable.iter().find(|f| f.id() == id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.feature(id).is_some()
    }

    pub fn feature_bounds(&self, id: FeatureId) -> Option<Bounds> {
        self.feature(id).and_then(Feature::bounds)
    }

    /// Bounding box of the whole editable collection.
    pub fn editable_bounds(&self) -> Option<Bounds> {
        self.editable
            .iter()
            .filter_map(Feature::bounds)
            .reduce(Bounds::union)
    }

    /// Merge fields into a feature's attributes; untouched keys survive.
    pub fn merge_attributes<I>(&mut self, id: FeatureId, fields: I) -> Result<StoreEvent>
    where
        I: IntoIterator<Item = (String, AttrValue)>,
    {
        let feature = self
            .editable
            .iter_mut()
            .find(|f| f.id() == id)
            .ok_or(CroquisError::UnknownFeature { id })?;
        feature.attributes.merge(fields);
        Ok(StoreEvent::EditableChanged(id))
    }

    /// Replace a feature's whole attribute mapping in one write.
    ///
    /// This is the inspector's save path: data fields and style fields land
    /// together, never partially.
    pub fn replace_attributes(&mut self, id: FeatureId, attributes: Attributes) -> Result<StoreEvent> {
        let feature = self
            .editable
            .iter_mut()
            .find(|f| f.id() == id)
            .ok_or(CroquisError::UnknownFeature { id })?;
        feature.attributes = attributes;
        Ok(StoreEvent::EditableChanged(id))
    }

    pub fn remove_editable(&mut self, id: FeatureId) -> Option<StoreEvent> {
        let index = self.editable.iter().position(|f| f.id() == id)?;
        self.editable.remove(index);
        Some(StoreEvent::EditableRemoved(id))
    }

    /// Serialize the editable collection as a GeoJSON FeatureCollection.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .editable
            .iter()
            .map(|feature| geojson::Feature {
                bbox: None,
                geometry: Some(feature.geometry.clone()),
                id: None,
                properties: Some(feature.attributes.to_json_object()),
                foreign_members: None,
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Export the current drawing.
    ///
    /// Fails with [`CroquisError::EmptyStore`] when nothing is drawn; callers
    /// surface that as a warning, not a crash.
    pub fn export(&self, filename_prefix: &str) -> Result<ExportFile> {
        if self.editable.is_empty() {
            return Err(CroquisError::EmptyStore);
        }
        let collection = self.to_feature_collection();
        let contents = serde_json::to_string_pretty(&GeoJson::from(collection))
            .map_err(|e| CroquisError::Serialization(e.to_string()))?;
        let filename = format!(
            "{filename_prefix}_{}.geojson",
            Utc::now().timestamp_millis()
        );
        Ok(ExportFile { filename, contents })
    }

    // --- reference collection ---

    /// Store an imported feature set as a named read-only overlay.
    ///
    /// A missing display color is replaced with a random one. A layer with the
    /// same name is overwritten in place, last write wins.
    pub fn add_reference(
        &mut self,
        name: impl Into<String>,
        collection: FeatureCollection,
        color: Option<String>,
    ) -> StoreEvent {
        let name = name.into();
        let color = color.unwrap_or_else(random_color);
        let layer = ReferenceLayer {
            name: name.clone(),
            color,
            collection,
        };
        match self.references.iter_mut().find(|l| l.name == name) {
            Some(existing) => *existing = layer,
            None => self.references.push(layer),
        }
        StoreEvent::ReferenceAdded(name)
    }

    pub fn references(&self) -> &[ReferenceLayer] {
        &self.references
    }

    pub fn reference(&self, name: &str) -> Option<&ReferenceLayer> {
        self.references.iter().find(|l| l.name == name)
    }

    /// Remove the named layer; a no-op when absent.
    pub fn remove_reference(&mut self, name: &str) -> Option<StoreEvent> {
        let index = self.references.iter().position(|l| l.name == name)?;
        self.references.remove(index);
        Some(StoreEvent::ReferenceRemoved(name.to_string()))
    }

    pub fn set_reference_color(&mut self, name: &str, color: impl Into<String>) -> Result<()> {
        let layer = self
            .references
            .iter_mut()
            .find(|l| l.name == name)
            .ok_or_else(|| CroquisError::UnknownLayer {
                name: name.to_string(),
            })?;
        layer.color = color.into();
        Ok(())
    }
}

fn random_color() -> String {
    let mut rng = rand::thread_rng();
    format!("#{:06X}", rng.gen_range(0..0x100_0000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, Value};

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::new(Value::Point(vec![x, y]))
    }

    fn named_collection(names: &[&str]) -> FeatureCollection {
        let features = names
            .iter()
            .enumerate()
            .map(|(i, name)| geojson::Feature {
                bbox: None,
                geometry: Some(point(i as f64, i as f64)),
                id: None,
                properties: Some(
                    [("name".to_string(), serde_json::json!(name))]
                        .into_iter()
                        .collect(),
                ),
                foreign_members: None,
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    #[test]
    fn test_add_editable_seeds_default_attributes() {
        let mut store = FeatureStore::new();
        let id = store.add_editable(GeometryKind::Point, point(0.0, 0.0), Attributes::new());
        let feature = store.feature(id).unwrap();
        assert!(feature.attributes.get("id").is_some());
        assert_eq!(
            feature.attributes.get("name").and_then(AttrValue::as_text),
            Some("New Element")
        );
    }

    #[test]
    fn test_add_editable_keeps_existing_attributes() {
        let mut store = FeatureStore::new();
        let attrs: Attributes = [("name".to_string(), AttrValue::from("Plaza"))]
            .into_iter()
            .collect();
        let id = store.add_editable(GeometryKind::Point, point(0.0, 0.0), attrs);
        let feature = store.feature(id).unwrap();
        assert_eq!(
            feature.attributes.get("name").and_then(AttrValue::as_text),
            Some("Plaza")
        );
        assert!(feature.attributes.get("id").is_none());
    }

    #[test]
    fn test_ids_are_unique_and_stable() {
        let mut store = FeatureStore::new();
        let a = store.add_editable(GeometryKind::Point, point(0.0, 0.0), Attributes::new());
        let b = store.add_editable(GeometryKind::Point, point(1.0, 1.0), Attributes::new());
        assert_ne!(a, b);
        store.remove_editable(a);
        let c = store.add_editable(GeometryKind::Point, point(2.0, 2.0), Attributes::new());
        assert_ne!(b, c);
    }

    #[test]
    fn test_merge_preserves_other_keys() {
        let mut store = FeatureStore::new();
        let attrs: Attributes = [
            ("name".to_string(), AttrValue::from("Lot 1")),
            ("stroke".to_string(), AttrValue::from("#ff0000")),
        ]
        .into_iter()
        .collect();
        let id = store.add_editable(GeometryKind::Polygon, point(0.0, 0.0), attrs);

        store
            .merge_attributes(id, [("name".to_string(), AttrValue::from("Lot 12"))])
            .unwrap();

        let feature = store.feature(id).unwrap();
        assert_eq!(
            feature.attributes.get("name").and_then(AttrValue::as_text),
            Some("Lot 12")
        );
        assert_eq!(
            feature.attributes.get("stroke").and_then(AttrValue::as_text),
            Some("#ff0000")
        );
    }

    #[test]
    fn test_export_empty_store_is_a_warning() {
        let store = FeatureStore::new();
        assert!(matches!(
            store.export("drawing"),
            Err(CroquisError::EmptyStore)
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut store = FeatureStore::new();
        let attrs: Attributes = [
            ("name".to_string(), AttrValue::from("Plaza")),
            ("floors".to_string(), AttrValue::from(3.0)),
            ("stroke".to_string(), AttrValue::from("#aa00aa")),
        ]
        .into_iter()
        .collect();
        store.add_editable(GeometryKind::Polygon, point(1.5, -2.5), attrs.clone());

        let exported = store.export("drawing").unwrap();
        assert!(exported.filename.starts_with("drawing_"));
        assert!(exported.filename.ends_with(".geojson"));

        let geojson: GeoJson = exported.contents.parse().unwrap();
        let GeoJson::FeatureCollection(collection) = geojson else {
            panic!("expected a feature collection");
        };

        let mut reimported = FeatureStore::new();
        let ids = reimported.import_editable(collection);
        assert_eq!(ids.len(), 1);
        assert_eq!(reimported.feature(ids[0]).unwrap().attributes, attrs);
    }

    #[test]
    fn test_reference_last_write_wins() {
        let mut store = FeatureStore::new();
        store.add_reference("town", named_collection(&["a"]), Some("#111111".to_string()));
        store.add_reference("town", named_collection(&["b", "c"]), Some("#222222".to_string()));
        assert_eq!(store.references().len(), 1);
        let layer = store.reference("town").unwrap();
        assert_eq!(layer.feature_count(), 2);
        assert_eq!(layer.color(), "#222222");
    }

    #[test]
    fn test_remove_reference_noop_when_absent() {
        let mut store = FeatureStore::new();
        assert!(store.remove_reference("ghost").is_none());
    }

    #[test]
    fn test_random_reference_color_shape() {
        let mut store = FeatureStore::new();
        store.add_reference("town", named_collection(&["a"]), None);
        let color = store.reference("town").unwrap().color().to_string();
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));
        assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reference_search_and_suggestions() {
        let mut store = FeatureStore::new();
        store.add_reference(
            "town",
            named_collection(&["Plaza Italia", "Estadio", "Plaza Egaña"]),
            None,
        );
        let layer = store.reference("town").unwrap();

        assert_eq!(layer.find("estadio"), Some(1));
        assert_eq!(layer.find("nowhere"), None);

        let suggestions = layer.suggestions("plaza");
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].label, "Plaza Italia");
        // The match is the label itself, so no extra context line.
        assert!(suggestions[0].context.is_none());

        // Below the two-character threshold nothing is suggested.
        assert!(layer.suggestions("p").is_empty());
    }

    #[test]
    fn test_editable_bounds_union() {
        let mut store = FeatureStore::new();
        store.add_editable(GeometryKind::Point, point(0.0, 0.0), Attributes::new());
        store.add_editable(GeometryKind::Point, point(4.0, -2.0), Attributes::new());
        let bounds = store.editable_bounds().unwrap();
        assert_eq!(
            (bounds.west, bounds.south, bounds.east, bounds.north),
            (0.0, -2.0, 4.0, 0.0)
        );
    }
}
