//! Point/segment distance queries used by the attractor index.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One edge of an attractor outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Segment {
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            p1: self.p1 + offset,
            p2: self.p2 + offset,
        }
    }
}

/// Closest point found by a distance query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    pub distance: f32,
    pub point: Vec2,
}

/// Project `p` onto the segment, clamping to its endpoints.
///
/// A degenerate segment (`p1 == p2`) is treated as the single point `p1`.
pub fn nearest_point_on_segment(p: Vec2, segment: &Segment) -> NearestPoint {
    let edge = segment.p2 - segment.p1;
    let len_sq = edge.length_squared();
    let point = if len_sq == 0.0 {
        segment.p1
    } else {
        let t = ((p - segment.p1).dot(edge) / len_sq).clamp(0.0, 1.0);
        segment.p1 + edge * t
    };
    NearestPoint {
        distance: p.distance(point),
        point,
    }
}

/// Segments of a closed polyline: consecutive pairs plus last → first.
/// Fewer than two points yields nothing.
pub fn closed_polyline_segments(points: &[Vec2]) -> Vec<Segment> {
    if points.len() < 2 {
        return Vec::new();
    }
    let mut out: Vec<Segment> = points
        .windows(2)
        .map(|w| Segment::new(w[0], w[1]))
        .collect();
    out.push(Segment::new(points[points.len() - 1], points[0]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::rng::Rng;

    #[test]
    fn projects_onto_interior() {
        let seg = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let hit = nearest_point_on_segment(Vec2::new(4.0, 3.0), &seg);
        assert_eq!(hit.point, Vec2::new(4.0, 0.0));
        assert!((hit.distance - 3.0).abs() < 1e-6);
    }

    #[test]
    fn clamps_past_endpoints() {
        let seg = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let before = nearest_point_on_segment(Vec2::new(-3.0, 4.0), &seg);
        assert_eq!(before.point, Vec2::ZERO);
        assert!((before.distance - 5.0).abs() < 1e-6);

        let after = nearest_point_on_segment(Vec2::new(13.0, 4.0), &seg);
        assert_eq!(after.point, Vec2::new(10.0, 0.0));
        assert!((after.distance - 5.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_segment_is_a_point() {
        let seg = Segment::new(Vec2::new(2.0, 2.0), Vec2::new(2.0, 2.0));
        let hit = nearest_point_on_segment(Vec2::new(5.0, 6.0), &seg);
        assert_eq!(hit.point, Vec2::new(2.0, 2.0));
        assert!((hit.distance - 5.0).abs() < 1e-6);
        assert!(hit.distance.is_finite());
    }

    #[test]
    fn result_lies_on_segment_and_matches_distance() {
        let mut rng = Rng::new(11);
        for _ in 0..2000 {
            let p1 = Vec2::new(rng.range(-500.0, 500.0), rng.range(-500.0, 500.0));
            let p2 = Vec2::new(rng.range(-500.0, 500.0), rng.range(-500.0, 500.0));
            if p1 == p2 {
                continue;
            }
            let p = Vec2::new(rng.range(-800.0, 800.0), rng.range(-800.0, 800.0));
            let seg = Segment::new(p1, p2);
            let hit = nearest_point_on_segment(p, &seg);

            // Collinear with the segment and between its endpoints.
            let edge = p2 - p1;
            let t = (hit.point - p1).dot(edge) / edge.length_squared();
            assert!((-1e-4..=1.0 + 1e-4).contains(&t), "t = {}", t);
            let cross = edge.perp_dot(hit.point - p1).abs() / edge.length();
            assert!(cross < 1e-2, "off-line by {}", cross);

            assert!((hit.distance - p.distance(hit.point)).abs() < 1e-3);
        }
    }

    #[test]
    fn closed_polyline_wraps_around() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let segs = closed_polyline_segments(&square);
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[3], Segment::new(Vec2::new(0.0, 1.0), Vec2::new(0.0, 0.0)));
        assert!(closed_polyline_segments(&square[..1]).is_empty());
    }
}
