//! Shapefile decoding from in-memory component bundles.
//!
//! Shapefiles arrive in two shapes: a group of sibling component files
//! (`.shp`, `.dbf`, `.shx`, `.prj`, `.cpg`) selected together, or a pre-zipped
//! archive containing the same members. Both are normalized into a
//! [`ShapefileBundle`] and decoded without touching the filesystem.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use shapefile::dbase::FieldValue as DbaseFieldValue;
use shapefile::Shape;

use crate::error::{CroquisError, Result};
use crate::formats::{DecodedCollection, Destination, FilePayload, FormatDecoder};

/// Extensions treated as shapefile components when grouping an upload batch.
pub const COMPONENT_EXTENSIONS: [&str; 5] = ["shp", "dbf", "shx", "prj", "cpg"];

/// The raw members of one shapefile, keyed by role.
#[derive(Debug, Default)]
pub struct ShapefileBundle {
    pub base: String,
    shp: Vec<u8>,
    shx: Option<Vec<u8>>,
    dbf: Option<Vec<u8>>,
    prj: Option<String>,
}

impl ShapefileBundle {
    /// Bundle a group of sibling component files sharing a base name.
    pub fn from_group(base: &str, files: &[FilePayload]) -> Result<Self> {
        let mut bundle = ShapefileBundle {
            base: base.to_string(),
            ..Default::default()
        };
        let mut has_shp = false;
        for file in files {
            has_shp |= bundle.accept(&file.extension(), file.bytes.clone());
        }
        if !has_shp {
            return Err(CroquisError::ShapefileGroupIncomplete {
                base: base.to_string(),
            });
        }
        Ok(bundle)
    }

    /// Bundle the members of a zipped shapefile archive.
    pub fn from_zip(name: &str, bytes: &[u8]) -> Result<Self> {
        let malformed = |reason: String| CroquisError::MalformedFile {
            format: "Shapefile",
            name: name.to_string(),
            reason,
        };

        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| malformed(e.to_string()))?;

        let mut bundle = ShapefileBundle {
            base: name.to_string(),
            ..Default::default()
        };
        let mut has_shp = false;
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(|e| malformed(e.to_string()))?;
            let entry_name = file.name().to_lowercase();
            let Some(extension) = entry_name.rsplit_once('.').map(|(_, e)| e.to_string()) else {
                continue;
            };
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| malformed(e.to_string()))?;
            has_shp |= bundle.accept(&extension, data);
        }
        if !has_shp {
            return Err(malformed("archive contains no .shp member".to_string()));
        }
        Ok(bundle)
    }

    fn accept(&mut self, extension: &str, data: Vec<u8>) -> bool {
        match extension {
            "shp" => {
                self.shp = data;
                return true;
            }
            "shx" => self.shx = Some(data),
            "dbf" => self.dbf = Some(data),
            "prj" => self.prj = String::from_utf8(data).ok(),
            _ => {}
        }
        false
    }

    /// Decode the bundle into the canonical collection.
    ///
    /// The second element collects non-fatal observations, currently a note
    /// when the `.prj` member declares a CRS other than WGS84.
    pub fn decode(self) -> Result<(FeatureCollection, Vec<String>)> {
        let malformed = |reason: String| CroquisError::MalformedFile {
            format: "Shapefile",
            name: self.base.clone(),
            reason,
        };

        let mut warnings = Vec::new();
        if let Some(epsg) = self.prj.as_deref().and_then(sniff_epsg) {
            if epsg != 4326 {
                warnings.push(format!(
                    "'{}' declares EPSG:{epsg}; coordinates are used as-is",
                    self.base
                ));
            }
        }

        let shape_reader = match &self.shx {
            Some(shx) => shapefile::ShapeReader::with_shx(
                Cursor::new(self.shp.clone()),
                Cursor::new(shx.clone()),
            ),
            None => shapefile::ShapeReader::new(Cursor::new(self.shp.clone())),
        }
        .map_err(|e| malformed(e.to_string()))?;

        let mut features = Vec::new();
        match &self.dbf {
            Some(dbf) => {
                let dbase_reader = shapefile::dbase::Reader::new(Cursor::new(dbf.clone()))
                    .map_err(|e| malformed(e.to_string()))?;
                let mut reader = shapefile::Reader::new(shape_reader, dbase_reader);
                for result in reader.iter_shapes_and_records() {
                    let (shape, record) = result.map_err(|e| malformed(e.to_string()))?;
                    if let Some(value) = shape_to_value(&shape, &malformed)? {
                        features.push(make_feature(value, record_properties(record)));
                    }
                }
            }
            None => {
                let shapes: Vec<Shape> = shape_reader.read().map_err(|e| malformed(e.to_string()))?;
                for shape in shapes {
                    if let Some(value) = shape_to_value(&shape, &malformed)? {
                        features.push(make_feature(value, JsonObject::new()));
                    }
                }
            }
        }

        Ok((
            FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
            warnings,
        ))
    }
}

/// Decoder for pre-zipped shapefile archives (`.zip` uploads).
pub struct ZippedShapefileDecoder;

#[async_trait]
impl FormatDecoder for ZippedShapefileDecoder {
    async fn decode(&self, payload: &FilePayload) -> Result<DecodedCollection> {
        let bundle = ShapefileBundle::from_zip(&payload.name, &payload.bytes)?;
        let (collection, warnings) = bundle.decode()?;
        Ok(DecodedCollection {
            name: payload.name.clone(),
            collection,
            destination: Destination::Reference,
            warnings,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["zip"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }
}

fn make_feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Extract the EPSG code from a `.prj` WKT string.
///
/// Looks for `AUTHORITY["EPSG","<code>"]` or a bare `EPSG:<code>`.
fn sniff_epsg(wkt: &str) -> Option<u32> {
    if let Some(start) = wkt.rfind("AUTHORITY[\"EPSG\",\"") {
        let code_start = start + "AUTHORITY[\"EPSG\",\"".len();
        let digits: String = wkt[code_start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse() {
            return Some(code);
        }
    }
    if let Some(start) = wkt.find("EPSG:") {
        let digits: String = wkt[start + 5..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse() {
            return Some(code);
        }
    }
    None
}

/// Convert a shapefile shape into a GeoJSON geometry value.
///
/// `None` for null shapes. Rings of a polygon shape land in a single Polygon,
/// holes included, matching how the drawing side re-imports them.
fn shape_to_value(
    shape: &Shape,
    malformed: &impl Fn(String) -> CroquisError,
) -> Result<Option<Value>> {
    let value = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Value::Point(vec![p.x, p.y]),
        Shape::PointM(p) => Value::Point(vec![p.x, p.y]),
        Shape::PointZ(p) => Value::Point(vec![p.x, p.y, p.z]),
        Shape::Polyline(line) => {
            lines_value(line.parts().iter().map(|part| {
                part.iter().map(|p| vec![p.x, p.y]).collect()
            }))
        }
        Shape::PolylineM(line) => {
            lines_value(line.parts().iter().map(|part| {
                part.iter().map(|p| vec![p.x, p.y]).collect()
            }))
        }
        Shape::PolylineZ(line) => {
            lines_value(line.parts().iter().map(|part| {
                part.iter().map(|p| vec![p.x, p.y, p.z]).collect()
            }))
        }
        Shape::Polygon(polygon) => Value::Polygon(
            polygon
                .rings()
                .iter()
                .map(|ring| ring.points().iter().map(|p| vec![p.x, p.y]).collect())
                .collect(),
        ),
        Shape::PolygonM(polygon) => Value::Polygon(
            polygon
                .rings()
                .iter()
                .map(|ring| ring.points().iter().map(|p| vec![p.x, p.y]).collect())
                .collect(),
        ),
        Shape::PolygonZ(polygon) => Value::Polygon(
            polygon
                .rings()
                .iter()
                .map(|ring| ring.points().iter().map(|p| vec![p.x, p.y, p.z]).collect())
                .collect(),
        ),
        Shape::Multipoint(points) => {
            Value::MultiPoint(points.points().iter().map(|p| vec![p.x, p.y]).collect())
        }
        Shape::MultipointM(points) => {
            Value::MultiPoint(points.points().iter().map(|p| vec![p.x, p.y]).collect())
        }
        Shape::MultipointZ(points) => {
            Value::MultiPoint(points.points().iter().map(|p| vec![p.x, p.y, p.z]).collect())
        }
        Shape::Multipatch(_) => {
            return Err(malformed("Multipatch geometry is not supported".to_string()))
        }
    };
    Ok(Some(value))
}

fn lines_value(parts: impl Iterator<Item = Vec<Vec<f64>>>) -> Value {
    let mut lines: Vec<Vec<Vec<f64>>> = parts.collect();
    if lines.len() == 1 {
        Value::LineString(lines.remove(0))
    } else {
        Value::MultiLineString(lines)
    }
}

/// Map a dBase record into GeoJSON properties. Null fields are dropped.
fn record_properties(record: shapefile::dbase::Record) -> JsonObject {
    let mut properties = JsonObject::new();
    for (name, value) in record {
        let json_value = match value {
            DbaseFieldValue::Character(Some(s)) => serde_json::Value::String(s),
            DbaseFieldValue::Memo(s) => serde_json::Value::String(s),
            DbaseFieldValue::Numeric(Some(n)) => number(n),
            DbaseFieldValue::Float(Some(f)) => number(f as f64),
            DbaseFieldValue::Double(d) => number(d),
            DbaseFieldValue::Currency(c) => number(c),
            DbaseFieldValue::Integer(i) => serde_json::Value::Number(i.into()),
            DbaseFieldValue::Logical(Some(b)) => serde_json::Value::Bool(b),
            DbaseFieldValue::Date(Some(date)) => serde_json::Value::String(format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                date.month(),
                date.day()
            )),
            DbaseFieldValue::DateTime(dt) => serde_json::Value::String(format!(
                "{:04}-{:02}-{:02}",
                dt.date().year(),
                dt.date().month(),
                dt.date().day()
            )),
            _ => continue,
        };
        properties.insert(name, json_value);
    }
    properties
}

fn number(n: f64) -> serde_json::Value {
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
