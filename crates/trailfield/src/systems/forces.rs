//! Attraction force law and its per-frame application.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::attractor::AttractorIndex;
use super::geometry::NearestPoint;
use super::particle::Particle;
use crate::core::physics::PhysicsBackend;
use crate::core::time::REFERENCE_FPS;

/// Below this distance a particle counts as sitting on its target.
const MIN_DISTANCE: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractionParams {
    /// Peak force magnitude, in mass·px/s².
    pub base_strength: f32,
    /// Distance at which the force saturates. `None` applies
    /// `base_strength` at every distance.
    pub falloff_radius: Option<f32>,
    /// Speeds (px/s) above this get damped before the force is applied.
    pub damping_speed: f32,
    pub damping_factor: f32,
}

impl Default for AttractionParams {
    fn default() -> Self {
        Self {
            // 0.001 px/frame² per unit mass.
            base_strength: 0.001 * REFERENCE_FPS * REFERENCE_FPS,
            falloff_radius: Some(100.0),
            damping_speed: 2.0 * REFERENCE_FPS,
            damping_factor: 0.95,
        }
    }
}

impl AttractionParams {
    /// Force magnitude at `distance`: grows linearly up to the falloff
    /// radius, then stays at `base_strength`.
    pub fn magnitude(&self, distance: f32) -> f32 {
        match self.falloff_radius {
            Some(radius) if radius > 0.0 => self.base_strength * (distance / radius).min(1.0),
            _ => self.base_strength,
        }
    }
}

/// Steering force from `position` toward `target`, or `None` when the
/// particle already sits on it.
pub fn attraction_force(position: Vec2, target: &NearestPoint, params: &AttractionParams) -> Option<Vec2> {
    if target.distance <= MIN_DISTANCE {
        return None;
    }
    let dir = (target.point - position).try_normalize()?;
    Some(dir * params.magnitude(target.distance))
}

/// Apply one frame of attraction to the given attraction-eligible particles.
///
/// A particle with a group only scans that partition; one without scans
/// them all. Particles without a body or without any target are left
/// alone. Returns how many forces were applied.
pub fn apply_attraction<'a, P, I>(
    world: &mut P,
    particles: I,
    index: &AttractorIndex,
    params: &AttractionParams,
) -> usize
where
    P: PhysicsBackend + 'a,
    I: IntoIterator<Item = &'a mut Particle<P::Body>>,
{
    let partitions = index.snapshot();
    let mut applied = 0;
    for p in particles {
        let Some(body) = p.body().copied() else { continue };
        let Some(target) = partitions.nearest(p.position, p.group) else {
            continue;
        };

        let velocity = world.velocity(&body);
        if velocity.length() > params.damping_speed {
            p.set_velocity(world, velocity * params.damping_factor);
        }

        if let Some(force) = attraction_force(p.position, &target, params) {
            world.apply_force(&body, p.position, force);
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Category, GroupKey, ParticleId, Rgb};
    use crate::core::physics::test_world::TestWorld;
    use crate::core::physics::ColliderMaterial;
    use crate::systems::attractor::{AttractorPartitions, AttractorSet};
    use crate::systems::geometry::Segment;

    /// Strength 0.001 with falloff 100.
    fn unit_params() -> AttractionParams {
        AttractionParams {
            base_strength: 0.001,
            falloff_radius: Some(100.0),
            ..Default::default()
        }
    }

    #[test]
    fn force_at_half_falloff() {
        // Stationary particle 50 units from a target with falloff 100.
        let params = unit_params();
        let position = Vec2::new(100.0, 100.0);
        let target = NearestPoint {
            distance: 50.0,
            point: Vec2::new(130.0, 140.0),
        };
        let force = attraction_force(position, &target, &params).expect("force");
        assert!((force.length() - 0.0005).abs() < 1e-9);
        let dir = force.normalize();
        assert!((dir - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn force_saturates_beyond_falloff() {
        let params = unit_params();
        assert_eq!(params.magnitude(100.0), 0.001);
        assert_eq!(params.magnitude(5000.0), 0.001);
        assert!(params.magnitude(10.0) < params.magnitude(20.0));
    }

    #[test]
    fn constant_law_ignores_distance() {
        let params = AttractionParams {
            falloff_radius: None,
            base_strength: 0.002,
            ..Default::default()
        };
        assert_eq!(params.magnitude(1.0), 0.002);
        assert_eq!(params.magnitude(900.0), 0.002);
    }

    #[test]
    fn no_force_on_target() {
        let params = AttractionParams::default();
        let p = Vec2::new(3.0, 4.0);
        let on = NearestPoint { distance: 0.0, point: p };
        assert!(attraction_force(p, &on, &params).is_none());
    }

    fn enabled(world: &mut TestWorld, id: u32, pos: Vec2, group: Option<GroupKey>) -> Particle<u32> {
        let mut p = Particle::new(ParticleId(id), Category::Drift, pos, 3.0, Rgb::WHITE);
        p.group = group;
        p.enable_physics(world, ColliderMaterial::default());
        p
    }

    #[test]
    fn applies_only_where_a_target_exists() {
        let mut world = TestWorld::new();
        let mut index = AttractorIndex::new();
        index.rebuild(AttractorPartitions::single(AttractorSet::from_segments([Segment::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
        )])));

        let kinematic = Particle::new(ParticleId(9), Category::Minute, Vec2::new(50.0, 50.0), 3.0, Rgb::WHITE)
            .with_group(GroupKey(0));
        let mut particles = vec![
            enabled(&mut world, 0, Vec2::new(50.0, 50.0), Some(GroupKey(0))),
            enabled(&mut world, 1, Vec2::new(50.0, 50.0), Some(GroupKey(3))),
            enabled(&mut world, 2, Vec2::new(50.0, 150.0), None),
            kinematic,
        ];

        let applied = apply_attraction(&mut world, particles.iter_mut(), &index, &unit_params());
        assert_eq!(applied, 2);
        assert_eq!(world.forces.len(), 2);
        let (body, force) = world.forces[0];
        assert_eq!(Some(&body), particles[0].body());
        assert!((force - Vec2::new(0.0, -0.0005)).length() < 1e-9);
        // No group: nearest across every partition, saturated at 150 away.
        let (body, force) = world.forces[1];
        assert_eq!(Some(&body), particles[2].body());
        assert!((force - Vec2::new(0.0, -0.001)).length() < 1e-9);
    }

    #[test]
    fn empty_index_applies_nothing() {
        let mut world = TestWorld::new();
        let index = AttractorIndex::new();
        let mut particles = vec![enabled(&mut world, 0, Vec2::new(5.0, 5.0), Some(GroupKey(0)))];
        let applied = apply_attraction(&mut world, particles.iter_mut(), &index, &AttractionParams::default());
        assert_eq!(applied, 0);
        assert!(world.forces.is_empty());
    }

    #[test]
    fn fast_particles_are_damped() {
        let mut world = TestWorld::new();
        let mut index = AttractorIndex::new();
        index.rebuild(AttractorPartitions::single(AttractorSet::from_points([Vec2::new(500.0, 0.0)])));
        let mut p = enabled(&mut world, 0, Vec2::ZERO, Some(GroupKey(0)));
        // Threshold is 120 px/s.
        p.set_velocity(&mut world, Vec2::new(600.0, 0.0));
        let slow_body = {
            let mut q = enabled(&mut world, 1, Vec2::ZERO, Some(GroupKey(0)));
            q.set_velocity(&mut world, Vec2::new(60.0, 0.0));
            q
        };
        let mut particles = vec![p, slow_body];

        apply_attraction(&mut world, particles.iter_mut(), &index, &AttractionParams::default());

        let fast = particles[0].body().copied().expect("body");
        let slow = particles[1].body().copied().expect("body");
        assert!((world.velocity(&fast).x - 570.0).abs() < 1e-3);
        assert_eq!(world.velocity(&slow).x, 60.0);
    }
}
