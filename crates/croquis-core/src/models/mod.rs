pub mod feature;
pub mod geometry;
pub mod style;

pub use feature::{AttrValue, Attributes, Feature, FeatureId};
pub use geometry::{Bounds, GeometryKind};
pub use style::{
    computed_style, highlight_style, is_style_key, tooltip_text, RenderStyle, StyleDefaults,
    STYLE_KEYS,
};
