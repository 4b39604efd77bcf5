//! Croquis UI models - inspector form, attribute table, and editor session
//!
//! These are the presentation-side models of the editor: widget-agnostic
//! descriptions of what the inspector popup and the attribute table show, and
//! the [`session::EditorSession`] facade that routes every user gesture
//! through the store so all surfaces stay in sync.

pub mod inspector;
pub mod session;
pub mod table;

pub use inspector::{parse_value, InspectorForm, StyleSection, MARKER_SYMBOLS};
pub use session::EditorSession;
pub use table::{locate_padding, TableColumn, TableModel, TableRow};
