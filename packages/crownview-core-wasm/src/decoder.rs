use dbase::FieldValue;
use shapefile::{Shape, ShapeReader};
use std::io::Cursor;

use crate::console::Diagnostics;
use crate::error::DecodeError;
use crate::models::{AttributeValue, Attributes, RawFeature, Ring};

// Outer and inner rings alike, as plain [x, y] loops; Z and M are dropped
macro_rules! xy_rings {
    ($polygon:expr) => {
        $polygon
            .rings()
            .iter()
            .map(|ring| ring.points().iter().map(|p| [p.x, p.y]).collect())
            .collect()
    };
}

/// Every record of a shapefile, in file order, including null and non-polygon shapes.
pub fn read_shapes(geometry: &[u8]) -> Result<Vec<Shape>, DecodeError> {
    let reader = ShapeReader::new(Cursor::new(geometry))?;
    Ok(reader.read()?)
}

/// Every row of a dBASE table, in file order, as attribute maps.
pub fn read_rows(table: &[u8]) -> Result<Vec<Attributes>, DecodeError> {
    let mut reader = dbase::Reader::new(Cursor::new(table))?;
    let records = reader.read()?;
    Ok(records
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .map(|(name, value)| (name, attribute_value(value)))
                .collect()
        })
        .collect())
}

/// Rings of a polygon shape; `None` for every other shape type.
pub fn polygon_rings(shape: Shape) -> Option<Vec<Ring>> {
    match shape {
        Shape::Polygon(polygon) => Some(xy_rings!(polygon)),
        Shape::PolygonM(polygon) => Some(xy_rings!(polygon)),
        Shape::PolygonZ(polygon) => Some(xy_rings!(polygon)),
        _ => None,
    }
}

fn text_value(text: String) -> AttributeValue {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        AttributeValue::Null
    } else {
        AttributeValue::Text(trimmed.to_string())
    }
}

pub fn attribute_value(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(text)) => text_value(text),
        FieldValue::Numeric(Some(n)) => AttributeValue::Number(n),
        FieldValue::Float(Some(n)) => AttributeValue::Number(n as f64),
        FieldValue::Integer(n) => AttributeValue::Number(n as f64),
        FieldValue::Double(n) | FieldValue::Currency(n) => AttributeValue::Number(n),
        FieldValue::Logical(Some(flag)) => AttributeValue::Bool(flag),
        FieldValue::Date(Some(date)) => AttributeValue::Text(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        _ => AttributeValue::Null,
    }
}

/// Decode a shapefile and, when available, its attribute table into polygon features.
///
/// Geometry errors abort decoding. Attribute errors are reported through
/// `diagnostics` and decoding continues in geometry-only mode, with every
/// feature carrying an empty attribute map.
///
/// The n-th geometry record pairs with the n-th table row. Non-polygon and
/// null records are dropped after pairing, so they never shift the rows of the
/// records that follow them. Geometries past the end of a short table get an
/// empty attribute map.
pub fn decode_features(
    geometry: &[u8],
    attributes: Option<&[u8]>,
    diagnostics: &dyn Diagnostics,
) -> Result<Vec<RawFeature>, DecodeError> {
    let shapes = read_shapes(geometry)?;

    let rows = match attributes.map(read_rows) {
        Some(Ok(rows)) => Some(rows),
        Some(Err(e)) => {
            diagnostics.warn(&format!(
                "Attribute table unreadable, continuing without attributes: {}",
                e
            ));
            None
        }
        None => None,
    };

    if let Some(rows) = &rows {
        if rows.len() != shapes.len() {
            diagnostics.warn(&format!(
                "Record count mismatch: {} geometries but {} attribute rows",
                shapes.len(),
                rows.len()
            ));
        }
    }

    let shape_count = shapes.len();
    let mut rows = rows.unwrap_or_default().into_iter();
    let mut features = Vec::new();
    for shape in shapes {
        let attributes = rows.next().unwrap_or_default();
        if let Some(rings) = polygon_rings(shape) {
            features.push(RawFeature { rings, attributes });
        }
    }

    diagnostics.info(&format!(
        "Decoded {} polygon features ({} non-polygon records skipped)",
        features.len(),
        shape_count - features.len()
    ));

    Ok(features)
}
