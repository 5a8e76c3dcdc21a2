// Clip polygon rings to a geographic bounding box (Sutherland–Hodgman).

use crate::models::{CrownPolygon, GeographicBounds, Point, RawFeature, Ring};

// Rings with fewer vertices than this enclose no area
const MIN_RING_VERTICES: usize = 3;

#[derive(Debug, Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl Edge {
    fn inside(&self, p: &Point) -> bool {
        match *self {
            Edge::Left(x) => p[0] >= x,
            Edge::Right(x) => p[0] <= x,
            Edge::Bottom(y) => p[1] >= y,
            Edge::Top(y) => p[1] <= y,
        }
    }

    // Only called for segments that straddle the edge, so the divisor is never zero.
    fn intersection(&self, a: &Point, b: &Point) -> Point {
        match *self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a[0]) / (b[0] - a[0]);
                [x, a[1] + t * (b[1] - a[1])]
            }
            Edge::Bottom(y) | Edge::Top(y) => {
                let t = (y - a[1]) / (b[1] - a[1]);
                [a[0] + t * (b[0] - a[0]), y]
            }
        }
    }
}

// One half-plane pass: keep inside vertices, insert crossings, preserve order.
fn clip_against_edge(ring: &[Point], edge: Edge) -> Ring {
    let mut output = Vec::with_capacity(ring.len() + 2);
    let Some(mut prev) = ring.last() else {
        return output;
    };

    for current in ring {
        let current_inside = edge.inside(current);
        let prev_inside = edge.inside(prev);
        if current_inside {
            if !prev_inside {
                output.push(edge.intersection(prev, current));
            }
            output.push(*current);
        } else if prev_inside {
            output.push(edge.intersection(prev, current));
        }
        prev = current;
    }

    output
}

/// Clip one ring to `bounds`. The result may have fewer than three vertices
/// (or none at all) when the ring lies outside the box.
pub fn clip_ring(ring: &[Point], bounds: &GeographicBounds) -> Ring {
    let edges = [
        Edge::Left(bounds.min_x),
        Edge::Right(bounds.max_x),
        Edge::Bottom(bounds.min_y),
        Edge::Top(bounds.max_y),
    ];

    let mut clipped = ring.to_vec();
    for edge in edges {
        clipped = clip_against_edge(&clipped, edge);
    }
    clipped
}

/// Clip every ring of a feature. Returns `None` when no ring keeps at least three vertices.
pub fn clip_feature(feature: RawFeature, bounds: &GeographicBounds) -> Option<CrownPolygon> {
    let rings: Vec<Ring> = feature
        .rings
        .iter()
        .map(|ring| clip_ring(ring, bounds))
        .filter(|ring| ring.len() >= MIN_RING_VERTICES)
        .collect();

    if rings.is_empty() {
        return None;
    }
    Some(CrownPolygon::new(rings, feature.attributes))
}

pub fn clip_features(features: Vec<RawFeature>, bounds: &GeographicBounds) -> Vec<CrownPolygon> {
    features
        .into_iter()
        .filter_map(|feature| clip_feature(feature, bounds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeValue, Attributes};

    const EPS: f64 = 1e-9;

    fn bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> GeographicBounds {
        GeographicBounds::new(min_x, min_y, max_x, max_y).unwrap()
    }

    fn assert_ring_approx(actual: &[Point], expected: &[Point]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            let close = (a[0] - e[0]).abs() < EPS && (a[1] - e[1]).abs() < EPS;
            assert!(close, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn contained_square_is_unchanged() {
        let ring = vec![[1.0, 1.0], [1.0, 2.0], [2.0, 2.0], [2.0, 1.0]];
        let clipped = clip_ring(&ring, &bounds(0.0, 0.0, 5.0, 5.0));
        assert_eq!(clipped, ring);
    }

    #[test]
    fn overlapping_square_is_cut_at_the_corner() {
        let ring = vec![[-1.0, -1.0], [-1.0, 1.0], [1.0, 1.0], [1.0, -1.0]];
        let clipped = clip_ring(&ring, &bounds(0.0, 0.0, 5.0, 5.0));
        assert_ring_approx(&clipped, &[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn empty_and_outside_rings_clip_to_nothing() {
        let b = bounds(0.0, 0.0, 5.0, 5.0);
        assert!(clip_ring(&[], &b).is_empty());

        let outside = vec![[10.0, 10.0], [10.0, 11.0], [11.0, 11.0], [11.0, 10.0]];
        assert!(clip_ring(&outside, &b).is_empty());
    }

    #[test]
    fn interpolates_along_slanted_edges() {
        // Triangle poking out of the right edge at x = 2
        let ring = vec![[0.0, 0.0], [4.0, 2.0], [0.0, 4.0]];
        let clipped = clip_ring(&ring, &bounds(0.0, 0.0, 2.0, 4.0));
        assert_ring_approx(&clipped, &[[0.0, 0.0], [2.0, 1.0], [2.0, 3.0], [0.0, 4.0]]);
    }

    #[test]
    fn box_inside_a_large_ring_becomes_the_box() {
        let ring = vec![[-10.0, -10.0], [-10.0, 10.0], [10.0, 10.0], [10.0, -10.0]];
        let b = bounds(0.0, 0.0, 1.0, 1.0);
        let clipped = clip_ring(&ring, &b);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|p| b.contains(p)));
    }

    #[test]
    fn clipped_vertices_stay_inside_bounds() {
        let ring = vec![
            [-3.0, 2.5],
            [2.0, 7.5],
            [8.0, 3.0],
            [4.5, -4.0],
            [1.0, 1.0],
            [-2.0, -1.0],
        ];
        let b = bounds(0.0, 0.0, 5.0, 5.0);
        let clipped = clip_ring(&ring, &b);
        assert!(clipped.len() >= 3);
        for p in &clipped {
            assert!(p[0] >= b.min_x - EPS && p[0] <= b.max_x + EPS);
            assert!(p[1] >= b.min_y - EPS && p[1] <= b.max_y + EPS);
        }
    }

    #[test]
    fn surviving_vertices_keep_input_order() {
        // Points 1, 2 and 4 are inside; the clipped ring must list them in that order.
        let ring = vec![[-1.0, 1.0], [1.0, 1.0], [2.0, 2.0], [6.0, 2.0], [2.0, 4.0]];
        let clipped = clip_ring(&ring, &bounds(0.0, 0.0, 5.0, 5.0));
        let kept: Vec<Point> = clipped
            .into_iter()
            .filter(|p| ring.contains(p))
            .collect();
        assert_eq!(kept, vec![[1.0, 1.0], [2.0, 2.0], [2.0, 4.0]]);
    }

    #[test]
    fn feature_keeps_surviving_rings_in_order_with_attributes() {
        let mut attributes = Attributes::new();
        attributes.insert("species".into(), AttributeValue::Text("oak".into()));
        let feature = RawFeature {
            rings: vec![
                vec![[1.0, 1.0], [1.0, 2.0], [2.0, 2.0]],
                vec![[20.0, 20.0], [20.0, 21.0], [21.0, 21.0]],
                vec![[3.0, 3.0], [3.0, 4.0], [4.0, 4.0]],
            ],
            attributes: attributes.clone(),
        };

        let crown = clip_feature(feature, &bounds(0.0, 0.0, 5.0, 5.0)).unwrap();
        assert_eq!(crown.rings().len(), 2);
        assert_eq!(crown.rings()[0][0], [1.0, 1.0]);
        assert_eq!(crown.rings()[1][0], [3.0, 3.0]);
        assert_eq!(crown.properties(), &attributes);
        assert_eq!(serde_json::to_value(&crown).unwrap()["type"], "Polygon");
    }

    #[test]
    fn feature_with_only_slivers_is_dropped() {
        let b = bounds(0.0, 0.0, 5.0, 5.0);
        let outside = RawFeature {
            rings: vec![vec![[7.0, 7.0], [7.0, 8.0], [8.0, 8.0]]],
            attributes: Attributes::new(),
        };
        let degenerate = RawFeature {
            rings: vec![vec![[1.0, 1.0], [2.0, 2.0]]],
            attributes: Attributes::new(),
        };
        assert!(clip_features(vec![outside, degenerate], &b).is_empty());
    }

    #[test]
    fn every_output_ring_has_three_vertices() {
        let b = bounds(0.0, 0.0, 5.0, 5.0);
        let features = (0..20)
            .map(|i| {
                let o = i as f64 * 0.5 - 3.0;
                RawFeature {
                    rings: vec![vec![[o, o], [o, o + 2.0], [o + 2.0, o + 2.0], [o + 2.0, o]]],
                    attributes: Attributes::new(),
                }
            })
            .collect();
        let crowns = clip_features(features, &b);
        assert!(!crowns.is_empty());
        assert!(crowns.iter().flat_map(|c| c.rings()).all(|r| r.len() >= 3));
    }
}
