//! Capacity-bounded, time-ordered particle streams.

use std::collections::VecDeque;

use glam::Vec2;

use super::particle::Particle;
use crate::api::types::Category;
use crate::core::physics::PhysicsBackend;

/// One visual stream (a clock hand, a second-hand ball slot, ...).
///
/// Oldest particle at the front. `len() <= capacity()` holds after every
/// public operation: appends past the cap evict the oldest entry.
#[derive(Debug)]
pub struct Trail<B> {
    category: Category,
    capacity: usize,
    spawn_interval_ms: f64,
    last_spawn_ms: f64,
    particles: VecDeque<Particle<B>>,
}

impl<B: Copy + std::fmt::Debug> Trail<B> {
    pub fn new(category: Category, capacity: usize, spawn_interval_ms: f64) -> Self {
        Self {
            category,
            capacity,
            spawn_interval_ms,
            last_spawn_ms: 0.0,
            particles: VecDeque::with_capacity(capacity),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn spawn_interval_ms(&self) -> f64 {
        self.spawn_interval_ms
    }

    pub fn last_spawn_ms(&self) -> f64 {
        self.last_spawn_ms
    }

    /// Throttled spawn, called once per frame.
    ///
    /// Appends `make(position())` when more than the spawn interval has passed
    /// since the last spawn and the trail has room. The placement is sampled
    /// at spawn time only. Returns whether a particle was added.
    pub fn spawn(
        &mut self,
        now_ms: f64,
        position: impl FnOnce() -> Vec2,
        make: impl FnOnce(Vec2) -> Particle<B>,
    ) -> bool {
        if now_ms - self.last_spawn_ms <= self.spawn_interval_ms {
            return false;
        }
        if self.particles.len() >= self.capacity {
            return false;
        }
        self.particles.push_back(make(position()));
        self.last_spawn_ms = now_ms;
        true
    }

    /// Append regardless of the schedule, evicting the oldest particles to
    /// stay within capacity. Returns how many were evicted.
    pub fn push_evicting<P>(&mut self, world: &mut P, mut particle: Particle<B>) -> usize
    where
        P: PhysicsBackend<Body = B>,
    {
        if self.capacity == 0 {
            particle.detach(world);
            return 0;
        }
        let mut evicted = 0;
        while self.particles.len() >= self.capacity {
            if let Some(mut oldest) = self.particles.pop_front() {
                oldest.detach(world);
                evicted += 1;
            }
        }
        self.particles.push_back(particle);
        evicted
    }

    /// Per-frame decay and body sync for every particle.
    pub fn update<P>(&mut self, world: &P)
    where
        P: PhysicsBackend<Body = B>,
    {
        for p in self.particles.iter_mut() {
            p.update(world);
        }
    }

    /// Remove (and detach) every particle meeting its removal criteria, then
    /// evict oldest entries beyond capacity. Returns how many were removed.
    pub fn prune<P>(&mut self, world: &mut P) -> usize
    where
        P: PhysicsBackend<Body = B>,
    {
        let before = self.particles.len();
        self.particles.retain_mut(|p| {
            if p.should_remove() {
                p.detach(world);
                false
            } else {
                true
            }
        });
        while self.particles.len() > self.capacity {
            if let Some(mut oldest) = self.particles.pop_front() {
                oldest.detach(world);
            }
        }
        before - self.particles.len()
    }

    /// Detach and drop every particle. The spawn timestamp is kept.
    pub fn clear<P>(&mut self, world: &mut P)
    where
        P: PhysicsBackend<Body = B>,
    {
        for mut p in self.particles.drain(..) {
            p.detach(world);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle<B>> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle<B>> {
        self.particles.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
