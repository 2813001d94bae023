//! Explosion triggers: the one-time radial launch that hands particles over
//! to physics, the staged slot-by-slot schedule and the secondary burst.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::particle::Particle;
use super::rng::Rng;
use crate::core::physics::{ColliderMaterial, PhysicsBackend};
use crate::core::schedule::{ScheduledEvent, Scheduler};
use crate::core::time::REFERENCE_FPS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionParams {
    /// Delay between consecutive second-hand slot launches.
    pub slot_interval_ms: f64,
    /// Delay from the trigger to the secondary burst.
    pub secondary_delay_ms: f64,
    /// Launch speed ranges, in px/s.
    pub slot_speed: (f32, f32),
    pub hand_speed: (f32, f32),
    pub secondary_speed: (f32, f32),
    /// Children spawned per re-launched parent.
    pub children: u32,
    pub child_radius_scale: f32,
    pub child_speed_scale: f32,
    /// Children leave at the parent's angle plus up to this many radians.
    pub child_angle_jitter: f32,
}

impl Default for ExplosionParams {
    fn default() -> Self {
        Self {
            slot_interval_ms: 150.0,
            secondary_delay_ms: 2000.0,
            slot_speed: (8.0 * REFERENCE_FPS, 12.0 * REFERENCE_FPS),
            hand_speed: (10.0 * REFERENCE_FPS, 15.0 * REFERENCE_FPS),
            secondary_speed: (12.0 * REFERENCE_FPS, 18.0 * REFERENCE_FPS),
            children: 3,
            child_radius_scale: 0.6,
            child_speed_scale: 0.7,
            child_angle_jitter: 0.5,
        }
    }
}

/// Direction and speed of a launch, kept so children can follow it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub angle: f32,
    pub speed: f32,
}

impl Launch {
    pub fn random(rng: &mut Rng, speed: (f32, f32)) -> Self {
        let speed = rng.range(speed.0, speed.1);
        Self {
            angle: rng.angle(),
            speed,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_angle(self.angle) * self.speed
    }
}

/// Hand `particle` over to physics with a random radial velocity drawn from
/// `speed`. A particle that is already physics-driven is simply re-launched.
pub fn explode<P>(
    particle: &mut Particle<P::Body>,
    world: &mut P,
    rng: &mut Rng,
    speed: (f32, f32),
    material: ColliderMaterial,
) -> Launch
where
    P: PhysicsBackend,
{
    let launch = Launch::random(rng, speed);
    particle.velocity = launch.velocity();
    if !particle.enable_physics(world, material) {
        particle.set_velocity(world, launch.velocity());
    }
    launch
}

/// `count` physics-enabled children following `launch` out of `parent`'s
/// position.
///
/// `make(position, radius)` builds each child; its velocity is the launch
/// angle plus jitter at a reduced speed.
pub fn spawn_children<P>(
    parent: &Particle<P::Body>,
    launch: Launch,
    count: u32,
    params: &ExplosionParams,
    world: &mut P,
    rng: &mut Rng,
    material: ColliderMaterial,
    mut make: impl FnMut(Vec2, f32) -> Particle<P::Body>,
) -> Vec<Particle<P::Body>>
where
    P: PhysicsBackend,
{
    (0..count)
        .map(|_| {
            let jitter = rng.range(-params.child_angle_jitter, params.child_angle_jitter);
            let child_launch = Launch {
                angle: launch.angle + jitter,
                speed: launch.speed * params.child_speed_scale,
            };
            let mut child = make(parent.position, parent.radius * params.child_radius_scale)
                .with_velocity(child_launch.velocity());
            child.enable_physics(world, material);
            child
        })
        .collect()
}

/// Queue the staged explosion triggered at `trigger_ms`.
///
/// Slots launch from the outermost (`slots - 1`) inward, one per interval
/// starting one interval after the trigger; the hands follow one interval
/// after slot 0. The secondary burst is relative to the trigger.
pub fn schedule_staged(scheduler: &mut Scheduler, trigger_ms: f64, slots: u8, params: &ExplosionParams) {
    let interval = params.slot_interval_ms;
    let mut at = trigger_ms;
    for slot in (0..slots).rev() {
        at += interval;
        scheduler.push_at(at, ScheduledEvent::ExplodeSlot(slot));
    }
    scheduler.push_at(at + interval, ScheduledEvent::ExplodeHands);
    scheduler.push_at(trigger_ms + params.secondary_delay_ms, ScheduledEvent::SecondaryExplosion);
}
