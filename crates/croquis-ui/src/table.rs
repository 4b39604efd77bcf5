//! Attribute table model.
//!
//! A widget-agnostic snapshot of the editable collection: one row per feature,
//! one column per distinct data key, plus the two action columns the table
//! widget renders as buttons. Style keys never become columns.

use croquis_core::models::{is_style_key, FeatureId};
use croquis_core::ports::Padding;
use croquis_core::store::FeatureStore;

/// One column of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableColumn {
    /// Zoom-to-feature action button.
    Locate,
    /// Editable attribute column.
    Field(String),
    /// Delete action button.
    Delete,
}

impl TableColumn {
    /// Header text, capitalized the way the table widget shows it.
    pub fn title(&self) -> String {
        match self {
            TableColumn::Locate => "Locate".to_string(),
            TableColumn::Delete => "Delete".to_string(),
            TableColumn::Field(key) => {
                let mut chars = key.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        }
    }
}

/// One row: the owning feature plus one cell per field column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub feature: FeatureId,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
}

impl TableModel {
    /// Snapshot the editable collection.
    ///
    /// Field columns are the union of data keys across all features: `id`
    /// first, then first-seen order. Features missing a key get an empty cell.
    pub fn build(store: &FeatureStore) -> Self {
        let mut keys: Vec<String> = vec!["id".to_string()];
        for feature in store.editable() {
            for key in feature.attributes.keys() {
                if !is_style_key(key) && !keys.iter().any(|k| k == key) {
                    keys.push(key.to_string());
                }
            }
        }

        let rows = store
            .editable()
            .iter()
            .map(|feature| TableRow {
                feature: feature.id(),
                cells: keys
                    .iter()
                    .map(|key| {
                        feature
                            .attributes
                            .get(key)
                            .map(|v| v.to_string())
                            .unwrap_or_default()
                    })
                    .collect(),
            })
            .collect();

        let mut columns = vec![TableColumn::Locate];
        columns.extend(keys.into_iter().map(TableColumn::Field));
        columns.push(TableColumn::Delete);
        TableModel { columns, rows }
    }

    /// The field keys, in column order.
    pub fn field_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                TableColumn::Field(key) => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn row(&self, feature: FeatureId) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.feature == feature)
    }
}

/// Viewport padding for the locate action while the table panel is open.
///
/// The panel covers the bottom 35% of the viewport, so the bottom padding
/// grows with the viewport height to keep the target visible above it.
pub fn locate_padding(viewport_height: f64) -> Padding {
    Padding {
        top_left: (80.0, 80.0),
        bottom_right: (80.0, viewport_height * 0.35 + 50.0),
    }
}
