//! KML format decoder.
//!
//! KML documents nest placemarks inside folders and documents arbitrarily
//! deep; the walk flattens them into one feature collection, keeping the
//! folder path as a property.

use async_trait::async_trait;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use kml::Kml;

use crate::error::{CroquisError, Result};
use crate::formats::{DecodedCollection, Destination, FilePayload, FormatDecoder};

pub struct KmlDecoder;

#[async_trait]
impl FormatDecoder for KmlDecoder {
    async fn decode(&self, payload: &FilePayload) -> Result<DecodedCollection> {
        let collection = collection_from_kml_text(&payload.name, payload.text()?)?;
        Ok(DecodedCollection {
            name: payload.name.clone(),
            collection,
            destination: Destination::Reference,
            warnings: Vec::new(),
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["kml"]
    }

    fn format_name(&self) -> &str {
        "KML"
    }
}

/// Parse KML markup into the canonical collection.
///
/// Shared with the KMZ decoder, which extracts the markup from an archive
/// first. Fails when the markup is invalid or yields zero features.
pub(crate) fn collection_from_kml_text(name: &str, text: &str) -> Result<FeatureCollection> {
    let kml: Kml = text.parse().map_err(|e: kml::Error| CroquisError::MalformedFile {
        format: "KML",
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let mut features = Vec::new();
    extract_features(&kml, &mut features, Vec::new())?;

    if features.is_empty() {
        return Err(CroquisError::EmptyKml {
            name: name.to_string(),
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Recursively extract placemarks, carrying the folder hierarchy.
fn extract_features(kml: &Kml, features: &mut Vec<Feature>, folder_path: Vec<String>) -> Result<()> {
    match kml {
        Kml::KmlDocument(doc) => {
            for element in &doc.elements {
                extract_features(element, features, folder_path.clone())?;
            }
        }
        Kml::Folder { attrs, elements } => {
            // The folder's <name> surfaces as a child element, not an attr.
            let name = attrs.get("name").cloned().or_else(|| {
                elements.iter().find_map(|element| match element {
                    Kml::Element(e) if e.name == "name" => e.content.clone(),
                    _ => None,
                })
            });
            let mut new_path = folder_path.clone();
            if let Some(name) = name {
                new_path.push(name);
            }
            for element in elements {
                extract_features(element, features, new_path.clone())?;
            }
        }
        Kml::Document { attrs: _, elements } => {
            for element in elements {
                extract_features(element, features, folder_path.clone())?;
            }
        }
        Kml::Placemark(placemark) => {
            if let Some(feature) = convert_placemark(placemark, &folder_path)? {
                features.push(feature);
            }
        }
        _ => {
            // NetworkLink, GroundOverlay and friends carry no drawable feature.
        }
    }
    Ok(())
}

fn convert_placemark(
    placemark: &kml::types::Placemark,
    folder_path: &[String],
) -> Result<Option<Feature>> {
    // Placemarks without geometry have nothing to draw.
    let Some(geometry) = &placemark.geometry else {
        return Ok(None);
    };
    let value = convert_geometry(geometry)?;

    let mut properties = JsonObject::new();
    if let Some(name) = &placemark.name {
        properties.insert("name".to_string(), serde_json::json!(name));
    }
    if let Some(description) = &placemark.description {
        properties.insert("description".to_string(), serde_json::json!(description));
    }
    if !folder_path.is_empty() {
        properties.insert(
            "folder_path".to_string(),
            serde_json::json!(folder_path.join("/")),
        );
    }
    // ExtendedData style children expose their payloads as attributes.
    for child in &placemark.children {
        for (key, value) in &child.attrs {
            properties.insert(key.clone(), serde_json::json!(value));
        }
    }

    Ok(Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }))
}

fn convert_geometry(geometry: &kml::types::Geometry) -> Result<Value> {
    match geometry {
        kml::types::Geometry::Point(point) => Ok(Value::Point(convert_coord(&point.coord))),
        kml::types::Geometry::LineString(line) => {
            Ok(Value::LineString(convert_coords(&line.coords)))
        }
        // A linear ring is a closed line string.
        kml::types::Geometry::LinearRing(ring) => {
            Ok(Value::LineString(convert_coords(&ring.coords)))
        }
        kml::types::Geometry::Polygon(polygon) => {
            let mut rings = vec![convert_coords(&polygon.outer.coords)];
            for inner in &polygon.inner {
                rings.push(convert_coords(&inner.coords));
            }
            Ok(Value::Polygon(rings))
        }
        kml::types::Geometry::MultiGeometry(multi) => {
            let geometries = multi
                .geometries
                .iter()
                .map(|g| convert_geometry(g).map(Geometry::new))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::GeometryCollection(geometries))
        }
        _ => Err(CroquisError::MalformedFile {
            format: "KML",
            name: String::new(),
            reason: "unsupported geometry type".to_string(),
        }),
    }
}

fn convert_coord(coord: &kml::types::Coord) -> Vec<f64> {
    match coord.z {
        Some(z) => vec![coord.x, coord.y, z],
        None => vec![coord.x, coord.y],
    }
}

fn convert_coords(coords: &[kml::types::Coord]) -> Vec<Vec<f64>> {
    let has_altitude = coords.iter().any(|c| c.z.is_some());
    coords
        .iter()
        .map(|c| {
            if has_altitude {
                vec![c.x, c.y, c.z.unwrap_or(0.0)]
            } else {
                vec![c.x, c.y]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINT_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Test Point</name>
      <description>A test point</description>
      <Point>
        <coordinates>-70.6693,-33.4489,0</coordinates>
      </Point>
    </Placemark>
  </Document>
</kml>"#;

    #[tokio::test]
    async fn test_point_placemark() {
        let payload = FilePayload::new("test.kml", POINT_KML.as_bytes().to_vec());
        let decoded = KmlDecoder.decode(&payload).await.unwrap();

        assert_eq!(decoded.destination, Destination::Reference);
        assert_eq!(decoded.collection.features.len(), 1);

        let feature = &decoded.collection.features[0];
        assert!(matches!(
            feature.geometry.as_ref().map(|g| &g.value),
            Some(Value::Point(_))
        ));
        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["name"], serde_json::json!("Test Point"));
        assert_eq!(props["description"], serde_json::json!("A test point"));
    }

    #[tokio::test]
    async fn test_polygon_placemark() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Test Polygon</name>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>
              -70.70,-33.50,0
              -70.60,-33.50,0
              -70.60,-33.40,0
              -70.70,-33.50,0
            </coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>
  </Document>
</kml>"#;
        let payload = FilePayload::new("poly.kml", content.as_bytes().to_vec());
        let decoded = KmlDecoder.decode(&payload).await.unwrap();

        let geometry = decoded.collection.features[0].geometry.as_ref().unwrap();
        match &geometry.value {
            Value::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 4);
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nested_folders_keep_path() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Folder>
      <name>Parent</name>
      <Folder>
        <name>Child</name>
        <Placemark>
          <name>Nested Point</name>
          <Point>
            <coordinates>-70.6693,-33.4489,0</coordinates>
          </Point>
        </Placemark>
      </Folder>
    </Folder>
  </Document>
</kml>"#;
        let payload = FilePayload::new("nested.kml", content.as_bytes().to_vec());
        let decoded = KmlDecoder.decode(&payload).await.unwrap();

        assert_eq!(decoded.collection.features.len(), 1);
        let props = decoded.collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props["folder_path"], serde_json::json!("Parent/Child"));
    }

    #[tokio::test]
    async fn test_empty_kml_is_an_error() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
  </Document>
</kml>"#;
        let payload = FilePayload::new("empty.kml", content.as_bytes().to_vec());
        let err = KmlDecoder.decode(&payload).await.unwrap_err();
        assert!(matches!(err, CroquisError::EmptyKml { .. }));
    }

    #[tokio::test]
    async fn test_malformed_markup_is_recoverable() {
        let payload = FilePayload::new("bad.kml", b"not xml at all".to_vec());
        let err = KmlDecoder.decode(&payload).await.unwrap_err();
        assert!(matches!(err, CroquisError::MalformedFile { format: "KML", .. }));
    }
}
