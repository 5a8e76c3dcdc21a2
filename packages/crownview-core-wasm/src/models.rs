// This is the models module containing shared data structures
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::BoundsError;

/// A `[x, y]` pair; `[lon, lat]` in geographic space, `[px, py]` in pixel space.
pub type Point = [f64; 2];

/// Ordered, implicitly closed loop of points.
pub type Ring = Vec<Point>;

/// Rectangle in longitude/latitude space.
///
/// `min_x`/`max_x` is the longitude range and `min_y`/`max_y` the latitude
/// range. The configuration document lists corners as `[lat, lon]`; use
/// [`GeographicBounds::from_lat_lon_corners`] for that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl GeographicBounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, BoundsError> {
        let bounds = GeographicBounds { min_x, min_y, max_x, max_y };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Build from `[[minLat, minLon], [maxLat, maxLon]]`.
    pub fn from_lat_lon_corners(corners: [[f64; 2]; 2]) -> Result<Self, BoundsError> {
        let [[min_lat, min_lon], [max_lat, max_lon]] = corners;
        Self::new(min_lon, min_lat, max_lon, max_lat)
    }

    pub fn validate(&self) -> Result<(), BoundsError> {
        let values = [self.min_x, self.min_y, self.max_x, self.max_y];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BoundsError::NonFinite);
        }
        if self.min_x > self.max_x {
            return Err(BoundsError::Inverted { min: self.min_x, max: self.max_x });
        }
        if self.min_y > self.max_y {
            return Err(BoundsError::Inverted { min: self.min_y, max: self.max_y });
        }
        Ok(())
    }

    pub fn contains(&self, point: &Point) -> bool {
        point[0] >= self.min_x
            && point[0] <= self.max_x
            && point[1] >= self.min_y
            && point[1] <= self.max_y
    }
}

/// Scalar attribute value read from the dBASE table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// Decoded polygon feature before clipping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub rings: Vec<Ring>,
    pub attributes: Attributes,
}

/// A clipped crown outline in geographic space.
///
/// Serialises in GeoJSON geometry shape with the attribute map attached:
/// `{"type": "Polygon", "coordinates": [...], "properties": {...}}`.
/// The first ring is the outer boundary; later rings are drawn as independent
/// closed loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrownPolygon {
    r#type: String,
    coordinates: Vec<Ring>,
    #[serde(default)]
    properties: Attributes,
}

impl CrownPolygon {
    pub const TYPE: &'static str = "Polygon";

    pub fn new(coordinates: Vec<Ring>, properties: Attributes) -> Self {
        CrownPolygon {
            r#type: Self::TYPE.to_string(),
            coordinates,
            properties,
        }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.coordinates
    }

    pub fn properties(&self) -> &Attributes {
        &self.properties
    }
}

/// Displayed size of the image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

/// A crown projected into pixel space for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCrown {
    pub rings: Vec<Ring>,
    pub properties: Attributes,
}
