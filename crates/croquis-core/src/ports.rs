//! Ports to the external collaborators.
//!
//! The editor core never renders, snaps, or draws dialogs itself. The map
//! toolkit, the table widget, and the alert library sit behind these traits;
//! adapters implement them per runtime (browser shell, headless CLI, tests).

use async_trait::async_trait;
use geojson::FeatureCollection;

use crate::models::{Bounds, FeatureId, RenderStyle};

/// Viewport padding in screen pixels, `(x, y)` per corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top_left: (f64, f64),
    pub bottom_right: (f64, f64),
}

impl Padding {
    pub fn uniform(px: f64) -> Padding {
        Padding {
            top_left: (px, px),
            bottom_right: (px, px),
        }
    }
}

/// Rendering/drawing collaborator.
///
/// The core pushes style and tooltip updates keyed by [`FeatureId`] and asks
/// the view to move; geometry editing gestures happen on the collaborator's
/// side and come back through session calls.
pub trait MapView {
    fn apply_style(&mut self, id: FeatureId, style: &RenderStyle);
    fn set_tooltip(&mut self, id: FeatureId, text: Option<String>);
    fn remove_feature(&mut self, id: FeatureId);

    fn add_reference_layer(&mut self, name: &str, color: &str, collection: &FeatureCollection);
    fn remove_reference_layer(&mut self, name: &str);
    fn set_reference_color(&mut self, name: &str, color: &str);

    fn fit_bounds(&mut self, bounds: Bounds);
    fn fly_to_bounds(&mut self, bounds: Bounds, padding: Padding, max_zoom: u8);
}

/// A map view that ignores everything. Used by headless adapters.
#[derive(Debug, Default)]
pub struct NoopMapView;

impl MapView for NoopMapView {
    fn apply_style(&mut self, _id: FeatureId, _style: &RenderStyle) {}
    fn set_tooltip(&mut self, _id: FeatureId, _text: Option<String>) {}
    fn remove_feature(&mut self, _id: FeatureId) {}
    fn add_reference_layer(&mut self, _name: &str, _color: &str, _collection: &FeatureCollection) {}
    fn remove_reference_layer(&mut self, _name: &str) {}
    fn set_reference_color(&mut self, _name: &str, _color: &str) {}
    fn fit_bounds(&mut self, _bounds: Bounds) {}
    fn fly_to_bounds(&mut self, _bounds: Bounds, _padding: Padding, _max_zoom: u8) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Alert/notification collaborator.
///
/// Toasts are fire-and-forget; confirmations and prompts block the user but
/// not the event loop, hence the async signatures.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn toast(&self, level: ToastLevel, message: &str);

    async fn confirm(&self, message: &str) -> bool;

    /// Ask the user for a line of text; `None` on cancel.
    async fn prompt_text(&self, label: &str) -> Option<String>;
}

/// A notifier that swallows toasts and answers yes to everything.
#[derive(Debug, Default)]
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    fn toast(&self, _level: ToastLevel, _message: &str) {}

    async fn confirm(&self, _message: &str) -> bool {
        true
    }

    async fn prompt_text(&self, _label: &str) -> Option<String> {
        None
    }
}
