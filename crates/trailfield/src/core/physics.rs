//! Physics collaborator contract and its Rapier2D implementation.
//!
//! The particle core never talks to an engine directly: it goes through
//! [`PhysicsBackend`]. `PhysicsWorld` (feature `physics`) wraps the Rapier
//! boilerplate behind that contract.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::time::REFERENCE_FPS;

// ---------------------------------------------------------------------------
// Backend-agnostic descriptions
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

/// Physical material properties for a particle body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    /// Velocity decay per second ("air friction"). Each step scales the
    /// velocity by `1 / (1 + dt * linear_damping)`.
    pub linear_damping: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.7,
            friction: 0.005,
            density: 0.001,
            // Keeps 98% of the velocity per 60 Hz frame.
            linear_damping: (1.0 / 0.98 - 1.0) * REFERENCE_FPS,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    pub collider: ColliderDesc,
    /// Opaque tag stored on the body (particle id for particle bodies).
    pub user_data: u128,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            fixed_rotation: false,
            collider,
            user_data: 0,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            gravity_scale: 0.0,
            fixed_rotation: true,
            collider,
            user_data: 0,
        }
    }

    /// A round particle body: dynamic ball with rotation locked.
    pub fn particle(position: Vec2, radius: f32) -> Self {
        Self::dynamic(ColliderDesc::Ball { radius: radius.max(0.01) })
            .with_position(position)
            .with_fixed_rotation(true)
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn with_user_data(mut self, data: u128) -> Self {
        self.user_data = data;
        self
    }
}

/// The contract the particle core consumes from a rigid-body engine.
///
/// Creating a body adds it to the world; removing it detaches it. Every
/// `create_body` must eventually be paired with a `remove_body`, otherwise the
/// world's body count grows without bound.
pub trait PhysicsBackend {
    /// Handle referencing a body inside the backend.
    type Body: Copy + std::fmt::Debug;

    /// Create a body and add it to the world.
    fn create_body(&mut self, desc: &BodyDesc, material: ColliderMaterial) -> Self::Body;

    /// Remove a body (and its colliders) from the world.
    fn remove_body(&mut self, body: &Self::Body);

    fn set_velocity(&mut self, body: &Self::Body, vel: Vec2);

    fn velocity(&self, body: &Self::Body) -> Vec2;

    /// Teleport a body, keeping its velocity.
    fn set_position(&mut self, body: &Self::Body, pos: Vec2);

    fn position(&self, body: &Self::Body) -> Vec2;

    /// Apply `force` at world-space `point`. Forces last for one `step`.
    fn apply_force(&mut self, body: &Self::Body, point: Vec2, force: Vec2);

    fn set_gravity(&mut self, gravity: Vec2);

    /// Advance the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Number of bodies currently in the world.
    fn body_count(&self) -> usize;
}

/// Add four static walls just outside a `width` x `height` area.
pub fn add_boundary_walls<P: PhysicsBackend>(
    world: &mut P,
    width: f32,
    height: f32,
    thickness: f32,
) -> Vec<P::Body> {
    let half = thickness / 2.0;
    let walls = [
        (Vec2::new(width / 2.0, -half), width / 2.0, half),
        (Vec2::new(width / 2.0, height + half), width / 2.0, half),
        (Vec2::new(-half, height / 2.0), half, height / 2.0),
        (Vec2::new(width + half, height / 2.0), half, height / 2.0),
    ];
    walls
        .iter()
        .map(|&(pos, half_width, half_height)| {
            let desc = BodyDesc::fixed(ColliderDesc::Cuboid { half_width, half_height })
                .with_position(pos);
            let material = ColliderMaterial {
                restitution: 0.5,
                friction: 0.1,
                density: 1.0,
                linear_damping: 0.0,
            };
            world.create_body(&desc, material)
        })
        .collect()
}

/// Minimal explicit-Euler backend for unit tests that must not depend on
/// Rapier's solver.
#[cfg(test)]
pub(crate) mod test_world {
    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct PointBody {
        position: Vec2,
        velocity: Vec2,
        force: Vec2,
        mass: f32,
    }

    #[derive(Debug, Default)]
    pub struct TestWorld {
        bodies: HashMap<u32, PointBody>,
        next: u32,
        gravity: Vec2,
        /// Every force applied since creation, in order.
        pub forces: Vec<(u32, Vec2)>,
    }

    impl TestWorld {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl PhysicsBackend for TestWorld {
        type Body = u32;

        fn create_body(&mut self, desc: &BodyDesc, material: ColliderMaterial) -> u32 {
            let id = self.next;
            self.next += 1;
            let mass = match desc.collider {
                ColliderDesc::Ball { radius } => std::f32::consts::PI * radius * radius,
                ColliderDesc::Cuboid { half_width, half_height } => 4.0 * half_width * half_height,
            } * material.density;
            self.bodies.insert(
                id,
                PointBody {
                    position: desc.position,
                    velocity: desc.velocity,
                    force: Vec2::ZERO,
                    mass: mass.max(f32::EPSILON),
                },
            );
            id
        }

        fn remove_body(&mut self, body: &u32) {
            self.bodies.remove(body);
        }

        fn set_velocity(&mut self, body: &u32, vel: Vec2) {
            if let Some(b) = self.bodies.get_mut(body) {
                b.velocity = vel;
            }
        }

        fn velocity(&self, body: &u32) -> Vec2 {
            self.bodies.get(body).map(|b| b.velocity).unwrap_or(Vec2::ZERO)
        }

        fn set_position(&mut self, body: &u32, pos: Vec2) {
            if let Some(b) = self.bodies.get_mut(body) {
                b.position = pos;
            }
        }

        fn position(&self, body: &u32) -> Vec2 {
            self.bodies.get(body).map(|b| b.position).unwrap_or(Vec2::ZERO)
        }

        fn apply_force(&mut self, body: &u32, _point: Vec2, force: Vec2) {
            if let Some(b) = self.bodies.get_mut(body) {
                b.force += force;
                self.forces.push((*body, force));
            }
        }

        fn set_gravity(&mut self, gravity: Vec2) {
            self.gravity = gravity;
        }

        fn step(&mut self, dt: f32) {
            for b in self.bodies.values_mut() {
                b.velocity += (b.force / b.mass + self.gravity) * dt;
                b.position += b.velocity * dt;
                b.force = Vec2::ZERO;
            }
        }

        fn body_count(&self) -> usize {
            self.bodies.len()
        }
    }
}

#[cfg(feature = "physics")]
pub use rapier_world::{PhysicsBody, PhysicsWorld};

#[cfg(feature = "physics")]
mod rapier_world {
    use super::*;
    use super::ColliderMaterial;
    use rapier2d::prelude::*;

    // -----------------------------------------------------------------------
    // Conversion helpers (private): glam to nalgebra and back
    // -----------------------------------------------------------------------

    fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
        nalgebra::Vector2::new(v.x, v.y)
    }

    fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
        Vec2::new(v.x, v.y)
    }

    impl BodyType {
        fn to_rapier(self) -> RigidBodyType {
            match self {
                BodyType::Dynamic => RigidBodyType::Dynamic,
                BodyType::Fixed => RigidBodyType::Fixed,
            }
        }
    }

    impl ColliderDesc {
        fn build_collider(&self) -> ColliderBuilder {
            match *self {
                ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
                ColliderDesc::Cuboid { half_width, half_height } => {
                    ColliderBuilder::cuboid(half_width, half_height)
                }
            }
        }
    }

    /// Handle pair referencing Rapier internals.
    #[derive(Debug, Clone, Copy)]
    pub struct PhysicsBody {
        pub body_handle: RigidBodyHandle,
        pub collider_handle: ColliderHandle,
    }

    /// Wraps all Rapier2D boilerplate into a single struct implementing
    /// [`PhysicsBackend`].
    pub struct PhysicsWorld {
        gravity: nalgebra::Vector2<f32>,
        integration_parameters: IntegrationParameters,
        physics_pipeline: PhysicsPipeline,
        island_manager: IslandManager,
        broad_phase: DefaultBroadPhase,
        narrow_phase: NarrowPhase,
        bodies: RigidBodySet,
        colliders: ColliderSet,
        impulse_joints: ImpulseJointSet,
        multibody_joints: MultibodyJointSet,
        ccd_solver: CCDSolver,
        query_pipeline: QueryPipeline,
    }

    impl PhysicsWorld {
        /// Create a new physics world with the given gravity vector.
        /// Y points down, so positive Y gravity pulls toward the bottom edge.
        pub fn new(gravity: Vec2) -> Self {
            Self {
                gravity: vec2_to_na(gravity),
                integration_parameters: IntegrationParameters::default(),
                physics_pipeline: PhysicsPipeline::new(),
                island_manager: IslandManager::new(),
                broad_phase: DefaultBroadPhase::new(),
                narrow_phase: NarrowPhase::new(),
                bodies: RigidBodySet::new(),
                colliders: ColliderSet::new(),
                impulse_joints: ImpulseJointSet::new(),
                multibody_joints: MultibodyJointSet::new(),
                ccd_solver: CCDSolver::new(),
                query_pipeline: QueryPipeline::new(),
            }
        }

        /// Tag stored on a body at creation.
        pub fn user_data(&self, body: &PhysicsBody) -> Option<u128> {
            self.bodies.get(body.body_handle).map(|rb| rb.user_data)
        }
    }

    impl Default for PhysicsWorld {
        fn default() -> Self {
            Self::new(Vec2::ZERO)
        }
    }

    impl PhysicsBackend for PhysicsWorld {
        type Body = PhysicsBody;

        fn create_body(&mut self, desc: &BodyDesc, material: ColliderMaterial) -> PhysicsBody {
            let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
                .translation(vec2_to_na(desc.position))
                .linvel(vec2_to_na(desc.velocity))
                .gravity_scale(desc.gravity_scale)
                .locked_axes(if desc.fixed_rotation {
                    LockedAxes::ROTATION_LOCKED
                } else {
                    LockedAxes::empty()
                })
                .linear_damping(material.linear_damping)
                .user_data(desc.user_data)
                .build();

            let body_handle = self.bodies.insert(rb);

            let collider = desc
                .collider
                .build_collider()
                .restitution(material.restitution)
                .friction(material.friction)
                .density(material.density)
                .build();

            let collider_handle =
                self.colliders
                    .insert_with_parent(collider, body_handle, &mut self.bodies);

            PhysicsBody {
                body_handle,
                collider_handle,
            }
        }

        fn remove_body(&mut self, body: &PhysicsBody) {
            self.bodies.remove(
                body.body_handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }

        fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
            if let Some(rb) = self.bodies.get_mut(body.body_handle) {
                rb.set_linvel(vec2_to_na(vel), true);
            }
        }

        fn velocity(&self, body: &PhysicsBody) -> Vec2 {
            self.bodies
                .get(body.body_handle)
                .map(|rb| na_to_vec2(rb.linvel()))
                .unwrap_or(Vec2::ZERO)
        }

        fn set_position(&mut self, body: &PhysicsBody, pos: Vec2) {
            if let Some(rb) = self.bodies.get_mut(body.body_handle) {
                rb.set_translation(vec2_to_na(pos), true);
            }
        }

        fn position(&self, body: &PhysicsBody) -> Vec2 {
            self.bodies
                .get(body.body_handle)
                .map(|rb| na_to_vec2(rb.translation()))
                .unwrap_or(Vec2::ZERO)
        }

        fn apply_force(&mut self, body: &PhysicsBody, point: Vec2, force: Vec2) {
            if let Some(rb) = self.bodies.get_mut(body.body_handle) {
                rb.add_force_at_point(
                    vec2_to_na(force),
                    nalgebra::Point2::new(point.x, point.y),
                    true,
                );
            }
        }

        fn set_gravity(&mut self, gravity: Vec2) {
            self.gravity = vec2_to_na(gravity);
        }

        fn step(&mut self, dt: f32) {
            self.integration_parameters.dt = dt;
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );

            // Rapier keeps user forces until reset; ours last a single step.
            for (_, rb) in self.bodies.iter_mut() {
                rb.reset_forces(false);
            }
        }

        fn body_count(&self) -> usize {
            self.bodies.len()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn create_and_remove_body() {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let body = world.create_body(
                &BodyDesc::particle(Vec2::new(10.0, 10.0), 5.0),
                ColliderMaterial::default(),
            );
            assert_eq!(world.body_count(), 1);
            world.remove_body(&body);
            assert_eq!(world.body_count(), 0);
        }

        #[test]
        fn set_velocity_directly() {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let body = world.create_body(
                &BodyDesc::particle(Vec2::ZERO, 5.0),
                ColliderMaterial::default(),
            );

            world.set_velocity(&body, Vec2::new(50.0, -30.0));
            let vel = world.velocity(&body);
            assert!((vel.x - 50.0).abs() < 0.001);
            assert!((vel.y - (-30.0)).abs() < 0.001);
        }

        #[test]
        fn air_friction_bleeds_a_second_of_speed() {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let body = world.create_body(
                &BodyDesc::particle(Vec2::ZERO, 5.0).with_velocity(Vec2::new(600.0, 0.0)),
                ColliderMaterial::default(),
            );
            for _ in 0..60 {
                world.step(1.0 / REFERENCE_FPS);
            }
            // 0.98^60 of the launch speed.
            let speed = world.velocity(&body).length();
            assert!(speed > 120.0 && speed < 260.0, "speed after 1 s: {speed}");
            assert!(world.position(&body).x > 250.0);
        }

        #[test]
        fn force_moves_body_for_one_step_only() {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let mut material = ColliderMaterial::default();
            material.linear_damping = 0.0;
            let body = world.create_body(&BodyDesc::particle(Vec2::ZERO, 5.0), material);

            world.apply_force(&body, Vec2::ZERO, Vec2::new(1.0, 0.0));
            world.step(1.0 / 60.0);
            let after_push = world.velocity(&body);
            assert!(after_push.x > 0.0, "force should accelerate: {:?}", after_push);

            world.step(1.0 / 60.0);
            let after_coast = world.velocity(&body);
            assert!(
                (after_coast.x - after_push.x).abs() < 1e-4,
                "force must not persist: {} vs {}",
                after_push.x,
                after_coast.x
            );
        }

        #[test]
        fn gravity_affects_dynamic_body() {
            let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
            let body = world.create_body(
                &BodyDesc::particle(Vec2::ZERO, 5.0),
                ColliderMaterial::default(),
            );
            for _ in 0..10 {
                world.step(1.0 / 60.0);
            }
            assert!(world.position(&body).y > 0.0);
        }

        #[test]
        fn fixed_body_does_not_move() {
            let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
            let body = world.create_body(
                &BodyDesc::fixed(ColliderDesc::Cuboid { half_width: 100.0, half_height: 10.0 })
                    .with_position(Vec2::new(0.0, 500.0)),
                ColliderMaterial::default(),
            );
            for _ in 0..10 {
                world.step(1.0 / 60.0);
            }
            assert!((world.position(&body).y - 500.0).abs() < 0.001);
        }

        #[test]
        fn set_position_teleports() {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let body = world.create_body(
                &BodyDesc::particle(Vec2::ZERO, 5.0),
                ColliderMaterial::default(),
            );
            world.set_position(&body, Vec2::new(300.0, -10.0));
            let pos = world.position(&body);
            assert!((pos.x - 300.0).abs() < 0.001);
            assert!((pos.y + 10.0).abs() < 0.001);
        }

        #[test]
        fn boundary_walls_are_four_fixed_bodies() {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let walls = add_boundary_walls(&mut world, 960.0, 960.0, 50.0);
            assert_eq!(walls.len(), 4);
            assert_eq!(world.body_count(), 4);
            let top = world.position(&walls[0]);
            assert!((top.y + 25.0).abs() < 0.001);
        }

        #[test]
        fn user_data_round_trips() {
            let mut world = PhysicsWorld::new(Vec2::ZERO);
            let body = world.create_body(
                &BodyDesc::particle(Vec2::ZERO, 5.0).with_user_data(77),
                ColliderMaterial::default(),
            );
            assert_eq!(world.user_data(&body), Some(77));
        }
    }
}
