//! Attractor index: target shapes particles are steered toward.
//!
//! Targets are grouped into partitions keyed by [`GroupKey`]. Queries either
//! scan one partition or, without a key, all of them. The active partition
//! map is swapped wholesale on rebuild and never mutated in place, so any
//! snapshot taken by a reader is always fully formed.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec2;

use super::geometry::{closed_polyline_segments, nearest_point_on_segment, NearestPoint, Segment};
use crate::api::types::GroupKey;

/// A single attraction target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Segment(Segment),
    Point(Vec2),
}

impl Target {
    fn nearest(&self, p: Vec2) -> NearestPoint {
        match self {
            Target::Segment(s) => nearest_point_on_segment(p, s),
            Target::Point(q) => NearestPoint {
                distance: p.distance(*q),
                point: *q,
            },
        }
    }
}

/// Flat collection of targets, scanned linearly.
#[derive(Debug, Clone, Default)]
pub struct AttractorSet {
    targets: Vec<Target>,
}

impl AttractorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            targets: segments.into_iter().map(Target::Segment).collect(),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        Self {
            targets: points.into_iter().map(Target::Point).collect(),
        }
    }

    pub fn push(&mut self, target: Target) {
        self.targets.push(target);
    }

    /// Add the edges of a closed outline, shifted by `offset`.
    pub fn add_closed_polyline(&mut self, points: &[Vec2], offset: Vec2) {
        self.targets.extend(
            closed_polyline_segments(points)
                .into_iter()
                .map(|s| Target::Segment(s.translated(offset))),
        );
    }

    /// Global nearest target, or `None` when the set is empty.
    pub fn nearest(&self, p: Vec2) -> Option<NearestPoint> {
        self.targets
            .iter()
            .map(|t| t.nearest(p))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.targets.iter().filter_map(|t| match t {
            Target::Segment(s) => Some(s),
            Target::Point(_) => None,
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Attractor sets partitioned by group key.
#[derive(Debug, Clone, Default)]
pub struct AttractorPartitions {
    groups: BTreeMap<GroupKey, AttractorSet>,
}

impl AttractorPartitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single unpartitioned set stored under group 0.
    pub fn single(set: AttractorSet) -> Self {
        let mut parts = Self::new();
        parts.insert(GroupKey(0), set);
        parts
    }

    /// `count` point targets spaced evenly on a circle, one per group,
    /// starting at `start_angle` and going clockwise in Y-down space.
    pub fn ring(center: Vec2, radius: f32, count: u8, start_angle: f32) -> Self {
        let mut parts = Self::new();
        if count == 0 {
            return parts;
        }
        let step = std::f32::consts::TAU / count as f32;
        for i in 0..count {
            let angle = start_angle + step * i as f32;
            let target = center + Vec2::from_angle(angle) * radius;
            parts.insert(GroupKey(i), AttractorSet::from_points([target]));
        }
        parts
    }

    /// A `ring` of `count` groups plus one more group, keyed `count`,
    /// holding only the centre point.
    pub fn ring_with_center(center: Vec2, radius: f32, count: u8, start_angle: f32) -> Self {
        let mut parts = Self::ring(center, radius, count, start_angle);
        parts.insert(GroupKey(count), AttractorSet::from_points([center]));
        parts
    }

    /// Replace the set stored under `key`.
    pub fn insert(&mut self, key: GroupKey, set: AttractorSet) {
        self.groups.insert(key, set);
    }

    /// Mutable access to the set under `key`, creating it if absent.
    pub fn group_mut(&mut self, key: GroupKey) -> &mut AttractorSet {
        self.groups.entry(key).or_default()
    }

    pub fn group(&self, key: GroupKey) -> Option<&AttractorSet> {
        self.groups.get(&key)
    }

    /// Nearest target in the partition `group`, or across all partitions
    /// when `group` is `None`.
    pub fn nearest(&self, p: Vec2, group: Option<GroupKey>) -> Option<NearestPoint> {
        match group {
            Some(key) => self.groups.get(&key)?.nearest(p),
            None => self
                .groups
                .values()
                .filter_map(|set| set.nearest(p))
                .min_by(|a, b| a.distance.total_cmp(&b.distance)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &AttractorSet)> {
        self.groups.iter()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.groups.values().flat_map(|set| set.segments())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn target_count(&self) -> usize {
        self.groups.values().map(AttractorSet::len).sum()
    }

    /// True when no partition holds a target.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(AttractorSet::is_empty)
    }
}

/// The active attractor partitions, replaced atomically on rebuild.
#[derive(Debug, Clone, Default)]
pub struct AttractorIndex {
    active: Arc<AttractorPartitions>,
    generation: u64,
}

impl AttractorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a fully built set of partitions. Snapshots handed out
    /// earlier keep seeing the previous partitions.
    pub fn rebuild(&mut self, partitions: AttractorPartitions) {
        self.active = Arc::new(partitions);
        self.generation += 1;
    }

    /// Drop every target.
    pub fn clear(&mut self) {
        self.rebuild(AttractorPartitions::new());
    }

    /// Shared handle to the current partitions.
    pub fn snapshot(&self) -> Arc<AttractorPartitions> {
        Arc::clone(&self.active)
    }

    pub fn partitions(&self) -> &AttractorPartitions {
        &self.active
    }

    /// Nearest target for a particle at `p`. `None` means no force this frame.
    pub fn nearest_target(&self, p: Vec2, group: Option<GroupKey>) -> Option<NearestPoint> {
        self.active.nearest(p, group)
    }

    /// Incremented on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::rng::Rng;

    fn square(offset: Vec2, size: f32) -> AttractorSet {
        let mut set = AttractorSet::new();
        set.add_closed_polyline(
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(size, 0.0),
                Vec2::new(size, size),
                Vec2::new(0.0, size),
            ],
            offset,
        );
        set
    }

    #[test]
    fn empty_set_yields_none() {
        assert!(AttractorSet::new().nearest(Vec2::ZERO).is_none());
        let index = AttractorIndex::new();
        assert!(index.nearest_target(Vec2::new(5.0, 5.0), None).is_none());
        assert!(index.nearest_target(Vec2::new(5.0, 5.0), Some(GroupKey(2))).is_none());
    }

    #[test]
    fn nearest_is_global_minimum() {
        let mut rng = Rng::new(5);
        let segments: Vec<Segment> = (0..200)
            .map(|_| {
                Segment::new(
                    Vec2::new(rng.range(0.0, 960.0), rng.range(0.0, 960.0)),
                    Vec2::new(rng.range(0.0, 960.0), rng.range(0.0, 960.0)),
                )
            })
            .collect();
        let set = AttractorSet::from_segments(segments.clone());

        for _ in 0..200 {
            let p = Vec2::new(rng.range(-100.0, 1060.0), rng.range(-100.0, 1060.0));
            let best = set.nearest(p).expect("non-empty set");
            for s in &segments {
                let d = nearest_point_on_segment(p, s).distance;
                assert!(best.distance <= d + 1e-5, "{} > {}", best.distance, d);
            }
        }
    }

    #[test]
    fn point_targets_mix_with_segments() {
        let mut set = AttractorSet::from_points([Vec2::new(100.0, 100.0)]);
        set.push(Target::Segment(Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))));
        let hit = set.nearest(Vec2::new(95.0, 100.0)).expect("hit");
        assert_eq!(hit.point, Vec2::new(100.0, 100.0));
        assert_eq!(set.segments().count(), 1);
    }

    #[test]
    fn partition_query_only_scans_its_group() {
        let mut parts = AttractorPartitions::new();
        parts.insert(GroupKey(0), square(Vec2::ZERO, 100.0));
        parts.insert(GroupKey(1), square(Vec2::new(480.0, 0.0), 100.0));

        let p = Vec2::new(50.0, 50.0);
        let own = parts.nearest(p, Some(GroupKey(1))).expect("group 1");
        assert!(own.point.x >= 480.0);
        let global = parts.nearest(p, None).expect("global");
        assert!((global.distance - 50.0).abs() < 1e-5);
        assert!(parts.nearest(p, Some(GroupKey(3))).is_none());
    }

    #[test]
    fn rebuild_swaps_atomically() {
        let mut index = AttractorIndex::new();
        index.rebuild(AttractorPartitions::single(square(Vec2::ZERO, 10.0)));
        let before = index.snapshot();
        let generation = index.generation();

        index.rebuild(AttractorPartitions::single(square(Vec2::new(500.0, 500.0), 10.0)));

        assert_eq!(index.generation(), generation + 1);
        // The old snapshot is untouched and complete.
        assert_eq!(before.target_count(), 4);
        let old = before.nearest(Vec2::ZERO, None).expect("old");
        assert!(old.distance < 1e-6);
        let new = index.nearest_target(Vec2::ZERO, None).expect("new");
        assert!(new.distance > 600.0);

        index.clear();
        assert!(index.is_empty());
    }

    #[test]
    fn ring_places_one_point_per_group() {
        let ring = AttractorPartitions::ring(
            Vec2::new(480.0, 480.0),
            300.0,
            4,
            -std::f32::consts::FRAC_PI_2,
        );
        assert_eq!(ring.group_count(), 4);
        let top = ring.nearest(Vec2::new(480.0, 0.0), Some(GroupKey(0))).expect("top");
        assert!((top.point - Vec2::new(480.0, 180.0)).length() < 1e-3);
        let right = ring.nearest(Vec2::new(480.0, 0.0), Some(GroupKey(1))).expect("right");
        assert!((right.point - Vec2::new(780.0, 480.0)).length() < 1e-3);
        assert!(AttractorPartitions::ring(Vec2::ZERO, 1.0, 0, 0.0).is_empty());
    }

    #[test]
    fn ring_center_gets_its_own_group() {
        let center = Vec2::new(480.0, 480.0);
        let ring = AttractorPartitions::ring_with_center(center, 300.0, 10, 0.0);
        assert_eq!(ring.group_count(), 11);
        let hit = ring.nearest(Vec2::new(900.0, 900.0), Some(GroupKey(10))).expect("centre");
        assert_eq!(hit.point, center);
        // The global search still prefers the closest ring point.
        let any = ring.nearest(Vec2::new(790.0, 480.0), None).expect("ring");
        assert!((any.point - Vec2::new(780.0, 480.0)).length() < 1e-3);
    }
}
