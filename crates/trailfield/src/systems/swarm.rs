//! Free-drifting physics particles for the digit-magnet scenes.
//!
//! Attractable particles are spread round-robin over the attractor groups
//! and seek their digit while attraction is on. Drifting particles are
//! injected in batches and never attracted. Both kinds are immortal and
//! recycled to the top band when they leave the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::particle::{DecayProfile, Particle};
use super::rng::Rng;
use crate::api::types::{Category, GroupKey, ParticleId, Rgb};
use crate::core::physics::{ColliderMaterial, PhysicsBackend};
use crate::core::time::REFERENCE_FPS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmParams {
    /// Attractable particles seeded at start. Zero disables the swarm.
    pub count: usize,
    /// Number of attractor groups the attractable particles are spread over.
    pub groups: u8,
    pub radius: f32,
    pub color: Rgb,
    pub opacity: f32,
    /// Height of the band new and recycled particles appear in.
    pub spawn_y: f32,
    /// Horizontal spawn speed is drawn from `[-spread / 2, spread / 2]`.
    pub spawn_spread_x: f32,
    /// Vertical spawn speed is drawn from `[0, fall]`.
    pub spawn_fall_y: f32,
    /// Horizontal speed spread given to recycled particles.
    pub recycle_spread_x: f32,
    /// Speed energy maintenance restores slow particles to.
    pub initial_speed: f32,
    /// How far past the sides and top a particle may drift before recycling.
    pub recycle_margin: f32,
    /// How far past the bottom a particle may fall before recycling.
    pub recycle_margin_bottom: f32,
    /// Period of energy maintenance; `None` disables it.
    pub energy_period_ms: Option<f64>,
    pub inject_interval_ms: f64,
    pub inject_batch: usize,
    /// Injection stops once this many drifting particles exist.
    pub inject_cap: usize,
    /// Horizontal scatter speed half-range when attraction turns off.
    pub scatter_x: f32,
    /// Upward scatter speed range when attraction turns off.
    pub scatter_up: (f32, f32),
    pub material: ColliderMaterial,
}

impl Default for SwarmParams {
    fn default() -> Self {
        Self {
            count: 0,
            groups: 4,
            radius: 3.0,
            color: Rgb::new(200.0, 220.0, 255.0),
            opacity: 204.0,
            spawn_y: -10.0,
            spawn_spread_x: 0.5 * REFERENCE_FPS,
            spawn_fall_y: REFERENCE_FPS,
            recycle_spread_x: REFERENCE_FPS,
            initial_speed: 2.0 * REFERENCE_FPS,
            recycle_margin: 100.0,
            recycle_margin_bottom: 50.0,
            energy_period_ms: Some(500.0),
            inject_interval_ms: 200.0,
            inject_batch: 10,
            inject_cap: 2000,
            scatter_x: 1.5 * REFERENCE_FPS,
            scatter_up: (2.0 * REFERENCE_FPS, 8.0 * REFERENCE_FPS),
            material: ColliderMaterial {
                restitution: 0.5,
                ..ColliderMaterial::default()
            },
        }
    }
}

#[derive(Debug)]
pub struct Swarm<B> {
    params: SwarmParams,
    attractable: Vec<Particle<B>>,
    drifting: Vec<Particle<B>>,
    last_energy_ms: f64,
}

impl<B: Copy + std::fmt::Debug> Swarm<B> {
    pub fn new(params: SwarmParams) -> Self {
        Self {
            params,
            attractable: Vec::with_capacity(params.count),
            drifting: Vec::new(),
            last_energy_ms: 0.0,
        }
    }

    pub fn params(&self) -> &SwarmParams {
        &self.params
    }

    fn make<P>(
        &self,
        world: &mut P,
        rng: &mut Rng,
        width: f32,
        id: ParticleId,
        group: Option<GroupKey>,
    ) -> Particle<B>
    where
        P: PhysicsBackend<Body = B>,
    {
        let position = Vec2::new(rng.next_f32() * width, self.params.spawn_y);
        let spread = self.params.spawn_spread_x / 2.0;
        let velocity = Vec2::new(rng.range(-spread, spread), rng.range(0.0, self.params.spawn_fall_y));
        let mut p = Particle::new(id, Category::Drift, position, self.params.radius, self.params.color)
            .with_opacity(self.params.opacity)
            .with_lifetime(None)
            .with_decay(DecayProfile::none())
            .with_velocity(velocity);
        p.group = group;
        p.enable_physics(world, self.params.material);
        p
    }

    /// Create the attractable particles, assigning groups round-robin.
    pub fn seed<P>(
        &mut self,
        world: &mut P,
        rng: &mut Rng,
        width: f32,
        ids: &mut impl FnMut() -> ParticleId,
    ) where
        P: PhysicsBackend<Body = B>,
    {
        let groups = self.params.groups.max(1);
        for i in 0..self.params.count {
            let group = GroupKey((i % groups as usize) as u8);
            let p = self.make(world, rng, width, ids(), Some(group));
            self.attractable.push(p);
        }
    }

    /// Add one batch of drifting particles, up to the injection cap.
    /// Returns how many were added.
    pub fn inject<P>(
        &mut self,
        world: &mut P,
        rng: &mut Rng,
        width: f32,
        ids: &mut impl FnMut() -> ParticleId,
    ) -> usize
    where
        P: PhysicsBackend<Body = B>,
    {
        let room = self.params.inject_cap.saturating_sub(self.drifting.len());
        let n = self.params.inject_batch.min(room);
        for _ in 0..n {
            let p = self.make(world, rng, width, ids(), None);
            self.drifting.push(p);
        }
        n
    }

    /// Sync every particle from its body.
    pub fn update<P>(&mut self, world: &P)
    where
        P: PhysicsBackend<Body = B>,
    {
        for p in self.attractable.iter_mut().chain(self.drifting.iter_mut()) {
            p.update(world);
        }
    }

    /// Move particles that left the world back to the top band with a fresh
    /// random velocity. Returns how many were recycled.
    pub fn recycle<P>(&mut self, world: &mut P, rng: &mut Rng, width: f32, height: f32) -> usize
    where
        P: PhysicsBackend<Body = B>,
    {
        let params = self.params;
        let mut recycled = 0;
        for p in self.attractable.iter_mut().chain(self.drifting.iter_mut()) {
            let pos = p.position;
            let out = pos.y > height + params.recycle_margin_bottom
                || pos.y < -params.recycle_margin
                || pos.x < -params.recycle_margin
                || pos.x > width + params.recycle_margin;
            if !out {
                continue;
            }
            let fresh = Vec2::new(rng.next_f32() * width, params.spawn_y);
            let spread = params.recycle_spread_x / 2.0;
            let velocity = Vec2::new(rng.range(-spread, spread), rng.range(0.0, params.spawn_fall_y));
            if let Some(body) = p.body().copied() {
                world.set_position(&body, fresh);
            }
            p.position = fresh;
            p.set_velocity(world, velocity);
            recycled += 1;
        }
        recycled
    }

    /// Every energy period, bring moving particles slower than the initial
    /// speed back up to it. Returns whether maintenance ran.
    pub fn maintain_energy<P>(&mut self, world: &mut P, now_ms: f64) -> bool
    where
        P: PhysicsBackend<Body = B>,
    {
        let Some(period) = self.params.energy_period_ms else {
            return false;
        };
        if now_ms - self.last_energy_ms < period {
            return false;
        }
        self.last_energy_ms = now_ms;
        let target = self.params.initial_speed;
        for p in self.attractable.iter_mut().chain(self.drifting.iter_mut()) {
            let Some(body) = p.body().copied() else { continue };
            let v = world.velocity(&body);
            let speed = v.length();
            if speed > 0.0 && speed < target {
                p.set_velocity(world, v * (target / speed));
            }
        }
        true
    }

    /// Fling attractable particles upward, used when attraction turns off.
    pub fn scatter<P>(&mut self, world: &mut P, rng: &mut Rng)
    where
        P: PhysicsBackend<Body = B>,
    {
        let (up_min, up_max) = self.params.scatter_up;
        for p in self.attractable.iter_mut() {
            let v = Vec2::new(
                rng.range(-self.params.scatter_x, self.params.scatter_x),
                -rng.range(up_min, up_max),
            );
            p.set_velocity(world, v);
        }
    }

    /// Detach and drop every particle.
    pub fn clear<P>(&mut self, world: &mut P)
    where
        P: PhysicsBackend<Body = B>,
    {
        for mut p in self.attractable.drain(..).chain(self.drifting.drain(..)) {
            p.detach(world);
        }
        self.last_energy_ms = 0.0;
    }

    pub fn attractable_mut(&mut self) -> impl Iterator<Item = &mut Particle<B>> {
        self.attractable.iter_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle<B>> {
        self.attractable.iter().chain(self.drifting.iter())
    }

    pub fn attractable_len(&self) -> usize {
        self.attractable.len()
    }

    pub fn drifting_len(&self) -> usize {
        self.drifting.len()
    }

    pub fn len(&self) -> usize {
        self.attractable.len() + self.drifting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
