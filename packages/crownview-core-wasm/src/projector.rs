// Map geographic coordinates onto the displayed image.
//
// x grows with longitude; y is flipped because pixel rows grow downward
// while latitude grows northward.

use crate::error::ProjectionError;
use crate::models::{CrownPolygon, GeographicBounds, ImageSize, Point, ProjectedCrown, Ring};

/// Precomputed linear mapping for one bounds/size pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelProjection {
    min_lon: f64,
    max_lat: f64,
    lon_span: f64,
    lat_span: f64,
    size: ImageSize,
}

impl PixelProjection {
    pub fn new(bounds: &GeographicBounds, size: ImageSize) -> Result<Self, ProjectionError> {
        let lon_span = bounds.max_x - bounds.min_x;
        let lat_span = bounds.max_y - bounds.min_y;
        if lon_span == 0.0 {
            return Err(ProjectionError::DegenerateBounds { axis: "longitude" });
        }
        if lat_span == 0.0 {
            return Err(ProjectionError::DegenerateBounds { axis: "latitude" });
        }
        Ok(PixelProjection {
            min_lon: bounds.min_x,
            max_lat: bounds.max_y,
            lon_span,
            lat_span,
            size,
        })
    }

    /// `[lon, lat]` to `[x, y]` pixels.
    pub fn project_point(&self, point: &Point) -> Point {
        [
            (point[0] - self.min_lon) / self.lon_span * self.size.width,
            (self.max_lat - point[1]) / self.lat_span * self.size.height,
        ]
    }

    pub fn project_ring(&self, ring: &[Point]) -> Ring {
        ring.iter().map(|p| self.project_point(p)).collect()
    }

    pub fn project_crown(&self, crown: &CrownPolygon) -> ProjectedCrown {
        ProjectedCrown {
            rings: crown.rings().iter().map(|ring| self.project_ring(ring)).collect(),
            properties: crown.properties().clone(),
        }
    }
}

pub fn project_crowns(
    crowns: &[CrownPolygon],
    bounds: &GeographicBounds,
    size: ImageSize,
) -> Result<Vec<ProjectedCrown>, ProjectionError> {
    let projection = PixelProjection::new(bounds, size)?;
    Ok(crowns.iter().map(|crown| projection.project_crown(crown)).collect())
}

/// Format a pixel ring as an SVG `points` attribute: `"x1,y1 x2,y2 ..."`.
pub fn svg_points(ring: &[Point]) -> String {
    ring.iter()
        .map(|p| format!("{:.2},{:.2}", p[0], p[1]))
        .collect::<Vec<_>>()
        .join(" ")
}
