//! End-to-end editor flows over the session facade, with a recording map
//! double standing in for the rendering collaborator.

use std::collections::HashMap;

use croquis_core::config::CroquisConfig;
use croquis_core::formats::FilePayload;
use croquis_core::models::{AttrValue, Bounds, FeatureId, GeometryKind, RenderStyle};
use croquis_core::ports::{MapView, Padding, SilentNotifier};
use croquis_core::store::StoreEvent;
use croquis_ui::{EditorSession, StyleSection, TableColumn};
use geojson::{FeatureCollection, Geometry, Value};

#[derive(Default)]
struct RecordingMap {
    styles: HashMap<FeatureId, RenderStyle>,
    tooltips: HashMap<FeatureId, Option<String>>,
    removed: Vec<FeatureId>,
    reference_layers: HashMap<String, String>,
    flights: Vec<(Bounds, Padding, u8)>,
    fitted: Vec<Bounds>,
}

impl MapView for RecordingMap {
    fn apply_style(&mut self, id: FeatureId, style: &RenderStyle) {
        self.styles.insert(id, style.clone());
    }
    fn set_tooltip(&mut self, id: FeatureId, text: Option<String>) {
        self.tooltips.insert(id, text);
    }
    fn remove_feature(&mut self, id: FeatureId) {
        self.styles.remove(&id);
        self.tooltips.remove(&id);
        self.removed.push(id);
    }
    fn add_reference_layer(&mut self, name: &str, color: &str, _collection: &FeatureCollection) {
        self.reference_layers
            .insert(name.to_string(), color.to_string());
    }
    fn remove_reference_layer(&mut self, name: &str) {
        self.reference_layers.remove(name);
    }
    fn set_reference_color(&mut self, name: &str, color: &str) {
        if let Some(existing) = self.reference_layers.get_mut(name) {
            *existing = color.to_string();
        }
    }
    fn fit_bounds(&mut self, bounds: Bounds) {
        self.fitted.push(bounds);
    }
    fn fly_to_bounds(&mut self, bounds: Bounds, padding: Padding, max_zoom: u8) {
        self.flights.push((bounds, padding, max_zoom));
    }
}

fn polygon() -> Geometry {
    Geometry::new(Value::Polygon(vec![vec![
        vec![-70.70, -33.50],
        vec![-70.60, -33.50],
        vec![-70.60, -33.40],
        vec![-70.70, -33.50],
    ]]))
}

fn session() -> EditorSession {
    EditorSession::new(&CroquisConfig::with_defaults())
}

#[test]
fn cell_edit_reaches_tooltip_inspector_and_table() {
    let mut session = session();
    let mut map = RecordingMap::default();
    let id = session.create_feature(&mut map, GeometryKind::Polygon, polygon());
    session.click_feature(&mut map, id);
    session.drain_events();

    session.edit_cell(&mut map, id, "name", "Plaza Norte").unwrap();

    // Store, tooltip, open inspector, and table all show the new value.
    let attrs = &session.store().feature(id).unwrap().attributes;
    assert_eq!(
        attrs.get("name").and_then(AttrValue::as_text),
        Some("Plaza Norte")
    );
    assert_eq!(
        map.tooltips[&id].as_deref(),
        Some("name: Plaza Norte")
    );
    let form = session.inspector().unwrap();
    assert!(form
        .data()
        .iter()
        .any(|(k, v)| k == "name" && v == "Plaza Norte"));
    let model = session.table_model();
    let name_pos = model.field_keys().iter().position(|k| *k == "name").unwrap();
    assert_eq!(model.row(id).unwrap().cells[name_pos], "Plaza Norte");

    assert_eq!(session.drain_events(), vec![StoreEvent::EditableChanged(id)]);
}

#[test]
fn style_edit_keeps_highlight_while_selected() {
    let mut session = session();
    let mut map = RecordingMap::default();
    let id = session.create_feature(&mut map, GeometryKind::Polygon, polygon());
    session.click_feature(&mut map, id);

    let form = session.inspector_mut().unwrap();
    if let StyleSection::Path { stroke, .. } = form.style_mut() {
        *stroke = "#00ff00".to_string();
    }
    session.submit_inspector(&mut map, &SilentNotifier);

    // Still selected, so the map shows the highlight, not the new stroke.
    match &map.styles[&id] {
        RenderStyle::Path { stroke, .. } => assert_eq!(stroke, "#f59e0b"),
        other => panic!("expected path style, got {other:?}"),
    }

    // Deselecting restores the saved stroke.
    session.click_empty_map(&mut map);
    match &map.styles[&id] {
        RenderStyle::Path { stroke, .. } => assert_eq!(stroke, "#00ff00"),
        other => panic!("expected path style, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_clears_every_surface() {
    let mut session = session();
    let mut map = RecordingMap::default();
    let keep = session.create_feature(&mut map, GeometryKind::Polygon, polygon());
    let gone = session.create_feature(&mut map, GeometryKind::Polygon, polygon());
    session.click_feature(&mut map, gone);
    session.drain_events();

    assert!(session.delete_feature(&mut map, &SilentNotifier, gone).await);

    assert_eq!(map.removed, vec![gone]);
    assert!(!map.styles.contains_key(&gone));
    assert!(session.store().feature(gone).is_none());
    assert_eq!(session.selected(), None);
    assert!(session.inspector().is_none());
    assert!(session.table_model().row(gone).is_none());
    assert!(session.table_model().row(keep).is_some());
    assert_eq!(
        session.drain_events(),
        vec![StoreEvent::EditableRemoved(gone)]
    );
}

#[tokio::test]
async fn imported_drawing_is_immediately_editable() {
    let mut session = session();
    let mut map = RecordingMap::default();

    let geojson = r##"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-70.65, -33.45] },
                "properties": { "id": 111, "name": "Kiosk", "marker-color": "#10b981" }
            }
        ]
    }"##;
    let report = session
        .import(
            &mut map,
            &SilentNotifier,
            vec![FilePayload::new("drawing.geojson", geojson.as_bytes().to_vec())],
        )
        .await;
    assert!(report.fully_successful());
    // The viewport moved to the merged drawing.
    assert!(!map.fitted.is_empty());

    let id = session.store().editable()[0].id();
    // Imported marker styling is applied on arrival.
    match &map.styles[&id] {
        RenderStyle::Marker { color, custom, .. } => {
            assert_eq!(color, "#10b981");
            assert!(*custom);
        }
        other => panic!("expected marker style, got {other:?}"),
    }
    assert_eq!(
        session.drain_events(),
        vec![
            StoreEvent::EditableAdded(id),
        ]
    );

    // And the feature behaves like any drawn one.
    assert!(session.click_feature(&mut map, id));
    session.edit_cell(&mut map, id, "name", "Kiosco").unwrap();
    assert_eq!(map.tooltips[&id].as_deref(), Some("name: Kiosco"));
}

#[tokio::test]
async fn reference_layer_lifecycle() {
    let mut session = session();
    let mut map = RecordingMap::default();

    let kml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Plaza Italia</name>
      <Point><coordinates>-70.63,-33.44,0</coordinates></Point>
    </Placemark>
    <Placemark>
      <name>Estadio</name>
      <Point><coordinates>-70.61,-33.46,0</coordinates></Point>
    </Placemark>
  </Document>
</kml>"#;
    session
        .import(
            &mut map,
            &SilentNotifier,
            vec![FilePayload::new("sites.kml", kml.as_bytes().to_vec())],
        )
        .await;

    assert!(map.reference_layers.contains_key("sites"));
    assert_eq!(
        session.drain_events(),
        vec![StoreEvent::ReferenceAdded("sites".to_string())]
    );

    session.recolor_reference(&mut map, "sites", "#123456").unwrap();
    assert_eq!(map.reference_layers["sites"], "#123456");

    // Search flies to the match without adding it to the drawing.
    let hit = session.search_reference(&mut map, "sites", "estadio");
    assert_eq!(hit, Some(1));
    assert_eq!(map.flights.len(), 1);
    assert_eq!(session.store().editable_count(), 0);

    let suggestions = session.reference_suggestions("sites", "plaza");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].label, "Plaza Italia");

    assert!(session.remove_reference(&mut map, "sites"));
    assert!(!map.reference_layers.contains_key("sites"));
    assert_eq!(
        session.drain_events(),
        vec![StoreEvent::ReferenceRemoved("sites".to_string())]
    );
}

#[test]
fn locate_selects_and_uses_table_aware_padding() {
    let mut session = session();
    let mut map = RecordingMap::default();
    let id = session.create_feature(&mut map, GeometryKind::Polygon, polygon());
    let other = session.create_feature(&mut map, GeometryKind::Polygon, polygon());
    session.click_feature(&mut map, other);
    session.toggle_table();

    assert!(session.locate(&mut map, id, 900.0));

    // Locating is a selection gesture.
    assert_eq!(session.selected(), Some(id));
    assert_eq!(session.inspector().map(|f| f.feature()), Some(id));
    match &map.styles[&id] {
        RenderStyle::Path { stroke, .. } => assert_eq!(stroke, "#f59e0b"),
        other => panic!("expected path style, got {other:?}"),
    }

    let (_, padding, max_zoom) = map.flights[0];
    assert_eq!(padding.top_left, (80.0, 80.0));
    assert_eq!(padding.bottom_right, (80.0, 900.0 * 0.35 + 50.0));
    assert_eq!(max_zoom, 18);
}

#[test]
fn table_columns_skip_style_keys() {
    let mut session = session();
    let mut map = RecordingMap::default();
    let id = session.create_feature(&mut map, GeometryKind::Polygon, polygon());
    session.edit_cell(&mut map, id, "zone", "4").unwrap();
    session.click_feature(&mut map, id);
    session.submit_inspector(&mut map, &SilentNotifier);

    let model = session.table_model();
    assert!(model
        .columns
        .iter()
        .all(|c| !matches!(c, TableColumn::Field(k) if k == "stroke")));
    assert!(model.field_keys().contains(&"zone"));
}
