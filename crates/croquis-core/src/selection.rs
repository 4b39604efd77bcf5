//! Selection state machine: at most one feature is active at a time.
//!
//! Two states, `Idle` and `Active(id)`, with `Idle` initial. Activating a new
//! feature restores the previous one's computed style first, so the highlight
//! is exclusive by construction.

use crate::models::{computed_style, highlight_style, FeatureId, StyleDefaults};
use crate::ports::MapView;
use crate::store::FeatureStore;

#[derive(Debug, Default)]
pub struct SelectionController {
    active: Option<FeatureId>,
    defaults: StyleDefaults,
}

impl SelectionController {
    pub fn new(defaults: StyleDefaults) -> Self {
        Self {
            active: None,
            defaults,
        }
    }

    pub fn active(&self) -> Option<FeatureId> {
        self.active
    }

    pub fn is_active(&self, id: FeatureId) -> bool {
        self.active == Some(id)
    }

    /// `Idle -> Active(id)` or `Active(f) -> Active(id)`.
    ///
    /// The previous feature (if any, and if it still exists) gets its computed
    /// style back before the new one is highlighted.
    pub fn select(&mut self, store: &FeatureStore, map: &mut dyn MapView, id: FeatureId) -> bool {
        let Some(feature) = store.feature(id) else {
            return false;
        };
        if let Some(previous) = self.active.take() {
            if previous != id {
                self.restore(store, map, previous);
            }
        }
        map.apply_style(id, &highlight_style(feature, &self.defaults));
        self.active = Some(id);
        true
    }

    /// `Active(f) -> Idle`; a no-op when already idle.
    pub fn deselect(&mut self, store: &FeatureStore, map: &mut dyn MapView) {
        if let Some(previous) = self.active.take() {
            self.restore(store, map, previous);
        }
    }

    /// The active feature was deleted; there is nothing left to restore.
    pub fn forget_removed(&mut self, id: FeatureId) -> bool {
        if self.active == Some(id) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Re-apply a feature's computed style after its attributes changed.
    pub fn reapply(&self, store: &FeatureStore, map: &mut dyn MapView, id: FeatureId) {
        if let Some(feature) = store.feature(id) {
            map.apply_style(id, &computed_style(feature, &self.defaults));
        }
    }

    pub fn defaults(&self) -> &StyleDefaults {
        &self.defaults
    }

    fn restore(&self, store: &FeatureStore, map: &mut dyn MapView, id: FeatureId) {
        if let Some(feature) = store.feature(id) {
            map.apply_style(id, &computed_style(feature, &self.defaults));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attributes, GeometryKind, RenderStyle};
    use crate::models::style::HIGHLIGHT_COLOR;
    use crate::ports::Padding;
    use geojson::{Geometry, Value};
    use std::collections::HashMap;

    /// Map double remembering the last style applied per feature.
    #[derive(Default)]
    struct StyleBoard {
        styles: HashMap<FeatureId, RenderStyle>,
    }

    impl MapView for StyleBoard {
        fn apply_style(&mut self, id: FeatureId, style: &RenderStyle) {
            self.styles.insert(id, style.clone());
        }
        fn set_tooltip(&mut self, _id: FeatureId, _text: Option<String>) {}
        fn remove_feature(&mut self, id: FeatureId) {
            self.styles.remove(&id);
        }
        fn add_reference_layer(
            &mut self,
            _name: &str,
            _color: &str,
            _collection: &geojson::FeatureCollection,
        ) {
        }
        fn remove_reference_layer(&mut self, _name: &str) {}
        fn set_reference_color(&mut self, _name: &str, _color: &str) {}
        fn fit_bounds(&mut self, _bounds: crate::models::Bounds) {}
        fn fly_to_bounds(
            &mut self,
            _bounds: crate::models::Bounds,
            _padding: Padding,
            _max_zoom: u8,
        ) {
        }
    }

    fn is_highlighted(style: &RenderStyle) -> bool {
        matches!(style, RenderStyle::Path { stroke, .. } if stroke == HIGHLIGHT_COLOR)
    }

    fn polygon() -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]))
    }

    fn two_polygons() -> (FeatureStore, FeatureId, FeatureId) {
        let mut store = FeatureStore::new();
        let a = store.add_editable(GeometryKind::Polygon, polygon(), Attributes::new());
        let b = store.add_editable(GeometryKind::Polygon, polygon(), Attributes::new());
        (store, a, b)
    }

    #[test]
    fn test_selection_is_exclusive() {
        let (store, a, b) = two_polygons();
        let mut map = StyleBoard::default();
        let mut selection = SelectionController::default();

        assert!(selection.select(&store, &mut map, a));
        assert!(is_highlighted(&map.styles[&a]));

        assert!(selection.select(&store, &mut map, b));
        assert!(is_highlighted(&map.styles[&b]));
        assert!(!is_highlighted(&map.styles[&a]));
        assert_eq!(selection.active(), Some(b));
    }

    #[test]
    fn test_deselect_restores_computed_style() {
        let (store, a, _) = two_polygons();
        let mut map = StyleBoard::default();
        let mut selection = SelectionController::default();

        selection.select(&store, &mut map, a);
        selection.deselect(&store, &mut map);

        assert!(!is_highlighted(&map.styles[&a]));
        assert_eq!(selection.active(), None);
    }

    #[test]
    fn test_select_unknown_feature_is_rejected() {
        let (store, a, _) = two_polygons();
        let mut map = StyleBoard::default();
        let mut selection = SelectionController::default();

        selection.select(&store, &mut map, a);
        assert!(!selection.select(&store, &mut map, FeatureId(999)));
        // The previous selection stays in place.
        assert_eq!(selection.active(), Some(a));
    }

    #[test]
    fn test_forget_removed_clears_without_touching_map() {
        let (mut store, a, _) = two_polygons();
        let mut map = StyleBoard::default();
        let mut selection = SelectionController::default();

        selection.select(&store, &mut map, a);
        store.remove_editable(a);
        assert!(selection.forget_removed(a));
        assert_eq!(selection.active(), None);
        // Deselect after removal must not panic or resurrect the style.
        selection.deselect(&store, &mut map);
    }

    #[test]
    fn test_reselecting_active_keeps_highlight() {
        let (store, a, _) = two_polygons();
        let mut map = StyleBoard::default();
        let mut selection = SelectionController::default();

        selection.select(&store, &mut map, a);
        selection.select(&store, &mut map, a);
        assert!(is_highlighted(&map.styles[&a]));
        assert_eq!(selection.active(), Some(a));
    }
}
