//! The editor session: one facade for every user gesture.
//!
//! All mutations flow through here in one direction: gesture, store write,
//! event, view refresh. The session owns the store, the selection machine, and
//! the open-panel state; the map and the notifier arrive per call so adapters
//! keep ownership of their widgets.

use croquis_core::config::CroquisConfig;
use croquis_core::formats::FilePayload;
use croquis_core::ingest::{IngestReport, Ingestor};
use croquis_core::models::{
    computed_style, highlight_style, tooltip_text, FeatureId, GeometryKind, StyleDefaults,
};
use croquis_core::ports::{MapView, Notifier, ToastLevel};
use croquis_core::store::{ExportFile, FeatureStore, StoreEvent, Suggestion};
use croquis_core::Result;
use tracing::debug;

use crate::inspector::{parse_value, InspectorForm};
use crate::table::{locate_padding, TableModel};

const LOCATE_MAX_ZOOM: u8 = 18;

pub struct EditorSession {
    store: FeatureStore,
    selection: croquis_core::selection::SelectionController,
    ingestor: Ingestor,
    defaults: StyleDefaults,
    export_prefix: String,
    inspector: Option<InspectorForm>,
    table_open: bool,
    events: Vec<StoreEvent>,
}

impl EditorSession {
    pub fn new(config: &CroquisConfig) -> Self {
        let defaults = config.style_defaults();
        Self {
            store: FeatureStore::new(),
            selection: croquis_core::selection::SelectionController::new(defaults.clone()),
            ingestor: Ingestor::new(defaults.clone()),
            defaults,
            export_prefix: config.export_prefix().to_string(),
            inspector: None,
            table_open: false,
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn selected(&self) -> Option<FeatureId> {
        self.selection.active()
    }

    /// Events accumulated since the last drain, oldest first. View adapters
    /// poll this after each gesture to refresh whatever panels are open.
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    fn publish(&mut self, event: StoreEvent) {
        debug!(?event, "store event");
        self.events.push(event);
    }

    // --- drawing ---

    /// A drawing gesture finished: register the new feature, paint it, and
    /// make it the active selection.
    pub fn create_feature(
        &mut self,
        map: &mut dyn MapView,
        kind: GeometryKind,
        geometry: geojson::Geometry,
    ) -> FeatureId {
        let id = self
            .store
            .add_editable(kind, geometry, Default::default());
        self.selection.select(&self.store, map, id);
        self.refresh_feature(map, id);
        self.publish(StoreEvent::EditableAdded(id));
        id
    }

    /// The feature's geometry was edited in place on the map side.
    /// Attributes and identity are untouched; views only need the event.
    pub fn geometry_edited(&mut self, id: FeatureId) {
        if self.store.contains(id) {
            self.publish(StoreEvent::EditableChanged(id));
        }
    }

    // --- selection and inspector ---

    /// Click on a feature: select it and open its inspector.
    pub fn click_feature(&mut self, map: &mut dyn MapView, id: FeatureId) -> bool {
        if !self.selection.select(&self.store, map, id) {
            return false;
        }
        if let Some(feature) = self.store.feature(id) {
            self.inspector = Some(InspectorForm::for_feature(feature, &self.defaults));
        }
        true
    }

    /// Click on empty map: clear the selection and close the inspector.
    pub fn click_empty_map(&mut self, map: &mut dyn MapView) {
        self.selection.deselect(&self.store, map);
        self.inspector = None;
    }

    pub fn inspector(&self) -> Option<&InspectorForm> {
        self.inspector.as_ref()
    }

    pub fn inspector_mut(&mut self) -> Option<&mut InspectorForm> {
        self.inspector.as_mut()
    }

    /// Close the inspector without saving. Closing deselects.
    pub fn close_inspector(&mut self, map: &mut dyn MapView) {
        self.inspector = None;
        self.selection.deselect(&self.store, map);
    }

    /// Add a data field to the open inspector, prompting for its name.
    pub async fn add_inspector_field(&mut self, notifier: &dyn Notifier) {
        let Some(form) = self.inspector.as_mut() else {
            return;
        };
        let Some(name) = notifier.prompt_text("Field name").await else {
            return;
        };
        if !form.add_field(&name) {
            notifier.toast(
                ToastLevel::Warning,
                &format!("'{}' is not usable as a field name", name.trim()),
            );
        }
    }

    /// Save the open inspector: every staged field lands in one write.
    pub fn submit_inspector(&mut self, map: &mut dyn MapView, notifier: &dyn Notifier) -> bool {
        let Some(form) = self.inspector.take() else {
            return false;
        };
        let id = form.feature();
        match self.store.replace_attributes(id, form.to_attributes()) {
            Ok(event) => {
                self.refresh_feature(map, id);
                self.publish(event);
                notifier.toast(ToastLevel::Success, "Changes saved");
                true
            }
            Err(error) => {
                notifier.toast(ToastLevel::Error, &error.to_string());
                false
            }
        }
    }

    // --- table ---

    pub fn toggle_table(&mut self) -> bool {
        self.table_open = !self.table_open;
        self.table_open
    }

    pub fn table_open(&self) -> bool {
        self.table_open
    }

    pub fn table_model(&self) -> TableModel {
        TableModel::build(&self.store)
    }

    /// Commit an in-cell edit. Only the edited key changes.
    pub fn edit_cell(
        &mut self,
        map: &mut dyn MapView,
        id: FeatureId,
        key: &str,
        raw: &str,
    ) -> Result<()> {
        let event = self
            .store
            .merge_attributes(id, [(key.to_string(), parse_value(raw))])?;
        self.refresh_feature(map, id);
        // An open inspector on the same feature re-reads the store.
        if self.inspector.as_ref().map(InspectorForm::feature) == Some(id) {
            if let Some(feature) = self.store.feature(id) {
                self.inspector = Some(InspectorForm::for_feature(feature, &self.defaults));
            }
        }
        self.publish(event);
        Ok(())
    }

    /// Zoom the map to a feature from its table row, keeping it clear of the
    /// table panel. Locating is a selection gesture: the feature is
    /// highlighted and its inspector opens, same as a map click.
    pub fn locate(&mut self, map: &mut dyn MapView, id: FeatureId, viewport_height: f64) -> bool {
        let Some(bounds) = self.store.feature_bounds(id) else {
            return false;
        };
        self.click_feature(map, id);
        map.fly_to_bounds(bounds, locate_padding(viewport_height), LOCATE_MAX_ZOOM);
        true
    }

    /// Delete a feature after confirmation. Removal reaches the map, the
    /// selection, the inspector, and the table in the same call.
    pub async fn delete_feature(
        &mut self,
        map: &mut dyn MapView,
        notifier: &dyn Notifier,
        id: FeatureId,
    ) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        if !notifier.confirm("Delete this element?").await {
            return false;
        }
        let Some(event) = self.store.remove_editable(id) else {
            return false;
        };
        map.remove_feature(id);
        self.selection.forget_removed(id);
        if self.inspector.as_ref().map(InspectorForm::feature) == Some(id) {
            self.inspector = None;
        }
        self.publish(event);
        notifier.toast(ToastLevel::Success, "Element deleted");
        true
    }

    // --- import and export ---

    pub async fn import(
        &mut self,
        map: &mut dyn MapView,
        notifier: &dyn Notifier,
        files: Vec<FilePayload>,
    ) -> IngestReport {
        let before = self.store.editable_count();
        let report = self
            .ingestor
            .ingest(&mut self.store, map, notifier, files)
            .await;
        let added: Vec<FeatureId> = self.store.editable()[before..]
            .iter()
            .map(|f| f.id())
            .collect();
        for id in added {
            self.publish(StoreEvent::EditableAdded(id));
        }
        for layer in &report.layers {
            if layer.destination == croquis_core::formats::Destination::Reference {
                self.publish(StoreEvent::ReferenceAdded(layer.name.clone()));
            }
        }
        report
    }

    pub fn export(&self, notifier: &dyn Notifier) -> Result<ExportFile> {
        match self.store.export(&self.export_prefix) {
            Ok(file) => {
                notifier.toast(ToastLevel::Success, &format!("Exported {}", file.filename));
                Ok(file)
            }
            Err(error) => {
                notifier.toast(ToastLevel::Warning, "Nothing to export");
                Err(error)
            }
        }
    }

    // --- reference layers ---

    pub fn remove_reference(&mut self, map: &mut dyn MapView, name: &str) -> bool {
        match self.store.remove_reference(name) {
            Some(event) => {
                map.remove_reference_layer(name);
                self.publish(event);
                true
            }
            None => false,
        }
    }

    pub fn recolor_reference(
        &mut self,
        map: &mut dyn MapView,
        name: &str,
        color: &str,
    ) -> Result<()> {
        self.store.set_reference_color(name, color)?;
        map.set_reference_color(name, color);
        Ok(())
    }

    pub fn zoom_to_reference(&self, map: &mut dyn MapView, name: &str) -> bool {
        match self.store.reference(name).and_then(|l| l.bounds()) {
            Some(bounds) => {
                map.fit_bounds(bounds);
                true
            }
            None => false,
        }
    }

    /// Fly to the first feature of a reference layer matching the query.
    pub fn search_reference(
        &self,
        map: &mut dyn MapView,
        name: &str,
        query: &str,
    ) -> Option<usize> {
        let layer = self.store.reference(name)?;
        let index = layer.find(query)?;
        if let Some(bounds) = layer.feature_bounds(index) {
            map.fly_to_bounds(
                bounds,
                croquis_core::ports::Padding::uniform(80.0),
                LOCATE_MAX_ZOOM,
            );
        }
        Some(index)
    }

    pub fn reference_suggestions(&self, name: &str, query: &str) -> Vec<Suggestion> {
        self.store
            .reference(name)
            .map(|layer| layer.suggestions(query))
            .unwrap_or_default()
    }

    /// Repaint one feature: style (highlighted when selected) and tooltip.
    fn refresh_feature(&mut self, map: &mut dyn MapView, id: FeatureId) {
        let Some(feature) = self.store.feature(id) else {
            return;
        };
        let style = if self.selection.is_active(id) {
            highlight_style(feature, &self.defaults)
        } else {
            computed_style(feature, &self.defaults)
        };
        map.apply_style(id, &style);
        map.set_tooltip(id, tooltip_text(&feature.attributes));
    }
}
