//! Geometry kind classification and bounding-box queries.
//!
//! The core never interprets coordinate data beyond what is needed to fit the
//! view to a feature or a layer; everything else is the rendering
//! collaborator's job.

use geojson::{Geometry, Value};
use serde::{Deserialize, Serialize};

/// What kind of drawable entity a geometry is.
///
/// Rectangles arrive from the drawing collaborator (GeoJSON cannot tell them
/// apart from polygons) and are styled like polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    Rectangle,
    /// Imported multi-part or collection geometries.
    Other,
}

impl GeometryKind {
    /// Classify a GeoJSON geometry.
    pub fn of_geometry(geometry: &Geometry) -> GeometryKind {
        match &geometry.value {
            Value::Point(_) => GeometryKind::Point,
            Value::LineString(_) | Value::MultiLineString(_) => GeometryKind::LineString,
            Value::Polygon(_) | Value::MultiPolygon(_) => GeometryKind::Polygon,
            Value::MultiPoint(_) | Value::GeometryCollection(_) => GeometryKind::Other,
        }
    }

    /// Whether the feature renders as a marker rather than a path.
    pub fn is_point(&self) -> bool {
        matches!(self, GeometryKind::Point)
    }
}

/// Axis-aligned bounding box in lon/lat order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn of_position(position: &[f64]) -> Option<Bounds> {
        match position {
            [x, y, ..] => Some(Bounds {
                west: *x,
                south: *y,
                east: *x,
                north: *y,
            }),
            _ => None,
        }
    }

    pub fn of_geometry(geometry: &Geometry) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        each_position(&geometry.value, &mut |position| {
            if let Some(point) = Bounds::of_position(position) {
                bounds = Some(match bounds {
                    Some(current) => current.union(point),
                    None => point,
                });
            }
        });
        bounds
    }

    /// Bounding box of a whole feature collection.
    pub fn of_collection(collection: &geojson::FeatureCollection) -> Option<Bounds> {
        collection
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(Bounds::of_geometry))
            .reduce(Bounds::union)
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.west + self.east) / 2.0, (self.south + self.north) / 2.0)
    }
}

fn each_position(value: &Value, visit: &mut impl FnMut(&[f64])) {
    match value {
        Value::Point(position) => visit(position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter().for_each(|p| visit(p));
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(|p| visit(p));
        }
        Value::MultiPolygon(polygons) => {
            polygons.iter().flatten().flatten().for_each(|p| visit(p));
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                each_position(&geometry.value, visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon() -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![-70.7, -33.5],
            vec![-70.6, -33.5],
            vec![-70.6, -33.4],
            vec![-70.7, -33.4],
            vec![-70.7, -33.5],
        ]]))
    }

    #[test]
    fn test_bounds_of_polygon() {
        let bounds = Bounds::of_geometry(&polygon()).unwrap();
        assert_eq!(bounds.west, -70.7);
        assert_eq!(bounds.south, -33.5);
        assert_eq!(bounds.east, -70.6);
        assert_eq!(bounds.north, -33.4);
    }

    #[test]
    fn test_bounds_of_point_is_degenerate() {
        let geometry = Geometry::new(Value::Point(vec![-70.65, -33.45]));
        let bounds = Bounds::of_geometry(&geometry).unwrap();
        assert_eq!(bounds.west, bounds.east);
        assert_eq!(bounds.center(), (-70.65, -33.45));
    }

    #[test]
    fn test_union() {
        let a = Bounds::of_position(&[0.0, 0.0]).unwrap();
        let b = Bounds::of_position(&[2.0, -1.0]).unwrap();
        let u = a.union(b);
        assert_eq!((u.west, u.south, u.east, u.north), (0.0, -1.0, 2.0, 0.0));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(GeometryKind::of_geometry(&polygon()), GeometryKind::Polygon);
        let point = Geometry::new(Value::Point(vec![0.0, 0.0]));
        assert!(GeometryKind::of_geometry(&point).is_point());
    }
}
