//! Vector outlines (paths with curves) flattened into closed polylines.

use std::collections::HashMap;

use glam::Vec2;
use lyon::path::iterator::PathIterator;
use lyon::path::{Path, PathEvent};

use super::source::{Polyline, ShapeSource};
use crate::api::error::ShapeError;

/// Flatten every sub-path of `path` into a polyline. Curves are
/// approximated within `tolerance`. Sub-paths are treated as closed
/// whether or not they were explicitly closed.
pub fn flatten_path(path: &Path, tolerance: f32) -> Vec<Polyline> {
    let mut out = Vec::new();
    let mut current: Polyline = Vec::new();
    for event in path.iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => {
                current.clear();
                current.push(Vec2::new(at.x, at.y));
            }
            PathEvent::Line { to, .. } => current.push(Vec2::new(to.x, to.y)),
            PathEvent::End { .. } => {
                // A closing edge back to the start is implied by the outline.
                if current.len() > 2 && current.first() == current.last() {
                    current.pop();
                }
                if current.len() >= 2 {
                    out.push(std::mem::take(&mut current));
                }
                current.clear();
            }
            // `flattened` only emits lines.
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }
    out
}

/// Shape source backed by vector paths, flattened on load.
#[derive(Debug, Clone)]
pub struct PathShapes {
    paths: HashMap<String, Vec<Path>>,
    tolerance: f32,
}

impl PathShapes {
    pub fn new(tolerance: f32) -> Self {
        Self {
            paths: HashMap::new(),
            tolerance: tolerance.max(1e-3),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, paths: Vec<Path>) {
        self.paths.insert(key.into(), paths);
    }
}

impl ShapeSource for PathShapes {
    fn load_shape(&self, key: &str) -> Result<Vec<Polyline>, ShapeError> {
        let paths = self
            .paths
            .get(key)
            .ok_or_else(|| ShapeError::NotFound(key.to_string()))?;
        let outlines: Vec<Polyline> = paths
            .iter()
            .flat_map(|p| flatten_path(p, self.tolerance))
            .collect();
        if outlines.is_empty() {
            return Err(ShapeError::Empty(key.to_string()));
        }
        Ok(outlines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    fn square() -> Path {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(10.0, 0.0));
        builder.line_to(point(10.0, 10.0));
        builder.line_to(point(0.0, 10.0));
        builder.end(true);
        builder.build()
    }

    fn arc() -> Path {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.quadratic_bezier_to(point(50.0, 100.0), point(100.0, 0.0));
        builder.end(false);
        builder.build()
    }

    #[test]
    fn straight_outline_keeps_its_corners() {
        let outlines = flatten_path(&square(), 0.1);
        assert_eq!(outlines.len(), 1);
        assert_eq!(outlines[0].len(), 4);
        assert_eq!(outlines[0][2], Vec2::new(10.0, 10.0));
    }

    #[test]
    fn curves_are_subdivided_within_tolerance() {
        let coarse = flatten_path(&arc(), 5.0);
        let fine = flatten_path(&arc(), 0.05);
        assert!(fine[0].len() > coarse[0].len());
        let last = *fine[0].last().expect("points");
        assert!((last - Vec2::new(100.0, 0.0)).length() < 1e-3);
        // Apex of the quadratic sits at (50, 50).
        let top = fine[0].iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!(top <= 50.0 + 1e-3 && top > 49.5, "apex {top}");
    }

    #[test]
    fn path_shapes_serve_flattened_outlines() {
        let mut shapes = PathShapes::new(0.5);
        shapes.insert("0", vec![square(), arc()]);
        let outlines = shapes.load_shape("0").expect("shape");
        assert_eq!(outlines.len(), 2);
        assert!(matches!(shapes.load_shape("1"), Err(ShapeError::NotFound(_))));
        shapes.insert("empty", Vec::new());
        assert!(matches!(shapes.load_shape("empty"), Err(ShapeError::Empty(_))));
    }
}
