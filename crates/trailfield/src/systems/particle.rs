//! A single point-mass with a one-way kinematic → physics lifecycle.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{Category, GroupKey, ParticleId, Phase, Rgb};
use crate::core::physics::{BodyDesc, ColliderMaterial, PhysicsBackend};

/// Per-frame decay factors and removal thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayProfile {
    /// Radius multiplier per frame while kinematic.
    pub kinematic_radius: f32,
    /// Opacity multiplier per frame while kinematic.
    pub kinematic_opacity: f32,
    /// Radius multiplier per frame once physics-driven.
    pub physics_radius: f32,
    /// Particles smaller than this are removed.
    pub min_radius: f32,
    /// Kinematic particles fainter than this are removed.
    pub min_opacity: f32,
}

impl Default for DecayProfile {
    fn default() -> Self {
        Self {
            kinematic_radius: 0.99,
            kinematic_opacity: 0.998,
            physics_radius: 0.998,
            min_radius: 1.0,
            min_opacity: 1.0,
        }
    }
}

impl DecayProfile {
    /// No decay at all; for particles that live until recycled.
    pub fn none() -> Self {
        Self {
            kinematic_radius: 1.0,
            kinematic_opacity: 1.0,
            physics_radius: 1.0,
            min_radius: 0.0,
            min_opacity: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Particle<B> {
    pub id: ParticleId,
    pub category: Category,
    /// Attractor partition this particle seeks, if any.
    pub group: Option<GroupKey>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Rgb,
    /// Opacity in [0, 255].
    pub opacity: f32,
    /// Frames left once physics-driven; `None` never expires.
    pub lifetime: Option<i32>,
    pub decay: DecayProfile,
    phase: Phase,
    body: Option<B>,
}

impl<B: Copy + std::fmt::Debug> Particle<B> {
    pub const DEFAULT_OPACITY: f32 = 220.0;
    pub const DEFAULT_LIFETIME: i32 = 300;

    pub fn new(id: ParticleId, category: Category, position: Vec2, radius: f32, color: Rgb) -> Self {
        Self {
            id,
            category,
            group: None,
            position,
            velocity: Vec2::ZERO,
            radius,
            color,
            opacity: Self::DEFAULT_OPACITY,
            lifetime: Some(Self::DEFAULT_LIFETIME),
            decay: DecayProfile::default(),
            phase: Phase::Kinematic,
            body: None,
        }
    }

    // -- Builder pattern --

    pub fn with_group(mut self, group: GroupKey) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 255.0);
        self
    }

    pub fn with_lifetime(mut self, lifetime: Option<i32>) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_decay(mut self, decay: DecayProfile) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_physics_enabled(&self) -> bool {
        self.phase == Phase::PhysicsEnabled
    }

    pub fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Hand the particle over to the physics engine. Creates a body at the
    /// current position and radius carrying the current velocity.
    /// Returns `false` if the particle was already physics-driven.
    pub fn enable_physics<P>(&mut self, world: &mut P, material: ColliderMaterial) -> bool
    where
        P: PhysicsBackend<Body = B>,
    {
        if self.phase == Phase::PhysicsEnabled {
            return false;
        }
        let desc = BodyDesc::particle(self.position, self.radius)
            .with_velocity(self.velocity)
            .with_user_data(self.id.0 as u128);
        self.body = Some(world.create_body(&desc, material));
        self.phase = Phase::PhysicsEnabled;
        true
    }

    /// Overwrite the velocity, on the body as well when there is one.
    pub fn set_velocity<P>(&mut self, world: &mut P, velocity: Vec2)
    where
        P: PhysicsBackend<Body = B>,
    {
        self.velocity = velocity;
        if let Some(body) = &self.body {
            world.set_velocity(body, velocity);
        }
    }

    /// Per-frame update: sync from the body and decay.
    pub fn update<P>(&mut self, world: &P)
    where
        P: PhysicsBackend<Body = B>,
    {
        match self.phase {
            Phase::Kinematic => {
                self.radius *= self.decay.kinematic_radius;
                self.opacity *= self.decay.kinematic_opacity;
            }
            Phase::PhysicsEnabled => {
                if let Some(body) = &self.body {
                    self.position = world.position(body);
                    self.velocity = world.velocity(body);
                }
                if let Some(lifetime) = self.lifetime.as_mut() {
                    *lifetime -= 1;
                }
                // Opacity stays put here: the fade comes from the lifetime.
                self.radius *= self.decay.physics_radius;
            }
        }
    }

    pub fn should_remove(&self) -> bool {
        if self.radius < self.decay.min_radius {
            return true;
        }
        match self.phase {
            Phase::Kinematic => self.opacity < self.decay.min_opacity,
            Phase::PhysicsEnabled => self.lifetime.is_some_and(|l| l < 0),
        }
    }

    /// Remove the body from the world, if any. Must run before the particle
    /// is dropped.
    pub fn detach<P>(&mut self, world: &mut P)
    where
        P: PhysicsBackend<Body = B>,
    {
        if let Some(body) = self.body.take() {
            world.remove_body(&body);
        }
    }

    /// Alpha the renderer should use, in [0, 255].
    pub fn render_alpha(&self) -> f32 {
        let alpha = match (self.phase, self.lifetime) {
            (Phase::PhysicsEnabled, Some(lifetime)) => self.opacity.min(lifetime as f32),
            _ => self.opacity,
        };
        alpha.clamp(0.0, 255.0)
    }
}
