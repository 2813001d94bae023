use std::sync::Arc;
use std::time::Duration;

use super::config::SimulationConfig;
use super::error::ConfigError;
use super::types::{Category, GroupKey, ParticleId};
use crate::components::placement::{slot_fraction, Hand, Placement};
use crate::core::physics::{add_boundary_walls, PhysicsBackend};
use crate::core::schedule::{ScheduledEvent, Scheduler};
use crate::core::time::{ClockReading, FixedTimestep};
use crate::renderer::instance::{FrameBuffer, ParticleInstance, SegmentInstance};
use crate::shapes::digits::DigitMagnet;
use crate::shapes::source::{ShapeLoader, ShapeSource};
use crate::systems::attractor::{AttractorIndex, AttractorPartitions};
use crate::systems::explosion::{explode, schedule_staged, spawn_children};
use crate::systems::forces::apply_attraction;
use crate::systems::particle::Particle;
use crate::systems::rng::Rng;
use crate::systems::swarm::Swarm;
use crate::systems::trail::Trail;

#[cfg(feature = "physics")]
use crate::core::physics::PhysicsWorld;

fn take_id(next: &mut u32) -> ParticleId {
    let id = ParticleId(*next);
    *next += 1;
    id
}

/// Owns the physics world, every trail, the swarm and the active attractor
/// index. All mutation happens inside `step`, in a fixed order:
///
/// 1. finished shape loads replace the attractor index
/// 2. the digit magnet requests new shapes if the time changed
/// 3. due scheduled events fire
/// 4. attraction forces are applied
/// 5. the physics world steps
/// 6. particles sync and decay, dead ones are pruned, the swarm is recycled
/// 7. clock trails spawn (until the explosion is triggered)
pub struct SimulationContext<P: PhysicsBackend> {
    config: SimulationConfig,
    physics: P,
    walls: Vec<P::Body>,
    hour: Trail<P::Body>,
    minute: Trail<P::Body>,
    slots: Vec<Trail<P::Body>>,
    swarm: Swarm<P::Body>,
    attractors: AttractorIndex,
    scheduler: Scheduler,
    timestep: FixedTimestep,
    rng: Rng,
    loader: Option<ShapeLoader>,
    magnet: DigitMagnet,
    next_id: u32,
    now_ms: f64,
    exploded: bool,
    attraction_on: bool,
}

impl<P: PhysicsBackend> SimulationContext<P> {
    pub fn new(config: SimulationConfig, mut physics: P) -> Result<Self, ConfigError> {
        config.validate()?;

        let world = config.world;
        physics.set_gravity(world.idle_gravity);
        let walls = if world.walls {
            add_boundary_walls(&mut physics, world.width, world.height, world.wall_thickness)
        } else {
            Vec::new()
        };

        let cats = config.categories;
        let slots = (0..config.clock.second_slots)
            .map(|i| {
                Trail::new(
                    Category::SecondBall(i),
                    cats.second_ball.capacity,
                    cats.second_ball.spawn_interval_ms,
                )
            })
            .collect();

        let mut ctx = Self {
            hour: Trail::new(Category::Hour, cats.hour.capacity, cats.hour.spawn_interval_ms),
            minute: Trail::new(Category::Minute, cats.minute.capacity, cats.minute.spawn_interval_ms),
            slots,
            swarm: Swarm::new(config.swarm),
            attractors: AttractorIndex::new(),
            scheduler: Scheduler::new(),
            timestep: FixedTimestep::new(world.fixed_step_ms),
            rng: Rng::new(config.seed),
            loader: None,
            magnet: DigitMagnet::new(config.digits),
            next_id: 1,
            now_ms: 0.0,
            exploded: false,
            attraction_on: false,
            walls,
            physics,
            config,
        };
        ctx.seed_swarm();

        log::info!(
            "simulation ready: {}x{} world, {} walls, {} second slots, {} swarm particles",
            world.width,
            world.height,
            ctx.walls.len(),
            ctx.slots.len(),
            ctx.swarm.len()
        );
        Ok(ctx)
    }

    /// Attach a shape source; the digit magnet loads from it in the
    /// background while attraction is on.
    pub fn with_shape_source(mut self, source: Arc<dyn ShapeSource>) -> Self {
        self.loader = Some(ShapeLoader::spawn(source));
        self
    }

    fn seed_swarm(&mut self) {
        let next_id = &mut self.next_id;
        let mut ids = || take_id(next_id);
        self.swarm
            .seed(&mut self.physics, &mut self.rng, self.config.world.width, &mut ids);
    }

    // -- Frame loop --

    /// Run whole fixed steps for `frame_ms` of wall time. Returns how many
    /// steps ran.
    pub fn advance(&mut self, frame_ms: f64, clock: &ClockReading) -> u32 {
        let steps = self.timestep.accumulate(frame_ms);
        let dt = self.timestep.dt_ms();
        for _ in 0..steps {
            self.step(dt, clock);
        }
        steps
    }

    /// Advance the simulation by `dt_ms` with the given wall-clock reading.
    pub fn step(&mut self, dt_ms: f64, clock: &ClockReading) {
        self.now_ms += dt_ms.max(0.0);

        self.poll_shapes();
        if self.attraction_on {
            self.refresh_magnet(clock);
        }
        for event in self.scheduler.drain_due(self.now_ms) {
            self.handle(event);
        }
        if self.attraction_on {
            self.attract();
        }

        self.physics.step((dt_ms.max(0.0) / 1000.0) as f32);

        self.update_particles();
        if !self.exploded {
            self.spawn_trails(clock);
        }
    }

    fn poll_shapes(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        match loader.poll() {
            Some(Ok(partitions)) => self.install(partitions),
            Some(Err(err)) => log::warn!("shape load failed, keeping previous attractors: {err}"),
            None => {}
        }
    }

    fn install(&mut self, partitions: AttractorPartitions) {
        log::info!(
            "attractors rebuilt: {} groups, {} targets",
            partitions.group_count(),
            partitions.target_count()
        );
        self.attractors.rebuild(partitions);
    }

    fn refresh_magnet(&mut self, clock: &ClockReading) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        if let Err(err) = self.magnet.update(loader, clock.digits()) {
            log::warn!("digit magnet request failed: {err}");
        }
    }

    fn handle(&mut self, event: ScheduledEvent) {
        let cats = self.config.categories;
        let params = self.config.explosion;
        match event {
            ScheduledEvent::ExplodeSlot(slot) => {
                let Some(trail) = self.slots.get_mut(slot as usize) else {
                    return;
                };
                for p in trail.iter_mut() {
                    explode(p, &mut self.physics, &mut self.rng, params.slot_speed, cats.second_ball.material);
                }
                log::debug!("slot {slot} exploded ({} particles)", trail.len());
            }
            ScheduledEvent::ExplodeHands => {
                for (trail, row) in [(&mut self.hour, cats.hour), (&mut self.minute, cats.minute)] {
                    for p in trail.iter_mut() {
                        explode(p, &mut self.physics, &mut self.rng, params.hand_speed, row.material);
                    }
                }
                log::info!("hands exploded");
            }
            ScheduledEvent::SecondaryExplosion => {
                let theme = self.config.clock.theme;
                let mut spawned = 0;
                for (trail, row) in [(&mut self.hour, cats.hour), (&mut self.minute, cats.minute)] {
                    let color = row.color_at(theme, 0.0);
                    // Children only fill the room left under the cap, shared
                    // evenly, so no re-launched parent is evicted.
                    let parents = trail.iter().filter(|p| p.is_physics_enabled()).count();
                    let mut room = trail.capacity().saturating_sub(trail.len());
                    let mut children = Vec::new();
                    for (i, p) in trail.iter_mut().filter(|p| p.is_physics_enabled()).enumerate() {
                        let launch = explode(p, &mut self.physics, &mut self.rng, params.secondary_speed, row.material);
                        let share = (room / (parents - i)).min(params.children as usize);
                        if share == 0 {
                            continue;
                        }
                        room -= share;
                        let category = p.category;
                        let next_id = &mut self.next_id;
                        children.extend(spawn_children(
                            &*p,
                            launch,
                            share as u32,
                            &params,
                            &mut self.physics,
                            &mut self.rng,
                            row.material,
                            |pos, radius| row.particle(take_id(next_id), category, pos, radius, color),
                        ));
                    }
                    spawned += children.len();
                    for child in children {
                        trail.push_evicting(&mut self.physics, child);
                    }
                }
                log::info!("secondary explosion: {spawned} children");
            }
            ScheduledEvent::InjectDrift => {
                if !self.attraction_on || !self.swarm_enabled() {
                    return;
                }
                let next_id = &mut self.next_id;
                let mut ids = || take_id(next_id);
                let added = self
                    .swarm
                    .inject(&mut self.physics, &mut self.rng, self.config.world.width, &mut ids);
                log::debug!("injected {added} drift particles");
                self.scheduler.push_at(
                    self.now_ms + self.config.swarm.inject_interval_ms,
                    ScheduledEvent::InjectDrift,
                );
            }
        }
    }

    fn attract(&mut self) {
        let cats = self.config.categories;
        let params = self.config.attraction;
        let index = &self.attractors;
        let world = &mut self.physics;

        let mut applied = apply_attraction(world, self.swarm.attractable_mut(), index, &params);
        if cats.hour.attractable {
            applied += apply_attraction(world, self.hour.iter_mut(), index, &params);
        }
        if cats.minute.attractable {
            applied += apply_attraction(world, self.minute.iter_mut(), index, &params);
        }
        if cats.second_ball.attractable {
            for trail in self.slots.iter_mut() {
                applied += apply_attraction(world, trail.iter_mut(), index, &params);
            }
        }
        log::trace!("attraction applied to {applied} particles");
    }

    fn update_particles(&mut self) {
        let world = &mut self.physics;
        for trail in [&mut self.hour, &mut self.minute].into_iter().chain(self.slots.iter_mut()) {
            trail.update(&*world);
            trail.prune(world);
        }

        if !self.swarm.is_empty() {
            self.swarm.update(&*world);
            let w = self.config.world;
            self.swarm.recycle(world, &mut self.rng, w.width, w.height);
            self.swarm.maintain_energy(world, self.now_ms);
        }
    }

    fn spawn_trails(&mut self, clock: &ClockReading) {
        let now = self.now_ms;
        let face = self.config.clock;
        let cats = self.config.categories;
        let next_id = &mut self.next_id;

        let hands = [
            (&mut self.hour, cats.hour, Hand::Hour, face.hour_length),
            (&mut self.minute, cats.minute, Hand::Minute, face.minute_length),
        ];
        for (trail, row, hand, length) in hands {
            let place = Placement::ClockHand {
                center: face.center,
                length,
                hand,
            };
            let category = trail.category();
            trail.spawn(
                now,
                || place.resolve(clock),
                |pos| row.particle(take_id(next_id), category, pos, row.radius_at(0.0), row.color_at(face.theme, 0.0)),
            );
        }

        let row = cats.second_ball;
        for (i, trail) in self.slots.iter_mut().enumerate() {
            let slot = i as u8;
            let t = slot_fraction(slot, face.second_slots);
            let place = Placement::second_slot(face.center, face.second_length, slot, face.second_slots);
            trail.spawn(
                now,
                || place.resolve(clock),
                |pos| {
                    let p = row.particle(
                        take_id(next_id),
                        Category::SecondBall(slot),
                        pos,
                        row.radius_at(t),
                        row.color_at(face.theme, t),
                    );
                    if row.attractable {
                        p.with_group(GroupKey(slot))
                    } else {
                        p
                    }
                },
            );
        }
    }

    // -- Triggers --

    /// Start the staged explosion. Only the first call has any effect.
    pub fn trigger_explosion(&mut self) -> bool {
        if self.exploded {
            return false;
        }
        self.exploded = true;
        schedule_staged(
            &mut self.scheduler,
            self.now_ms,
            self.config.clock.second_slots,
            &self.config.explosion,
        );
        log::info!("explosion triggered at {:.0} ms", self.now_ms);
        true
    }

    pub fn enable_attraction(&mut self) -> bool {
        if self.attraction_on {
            return false;
        }
        self.attraction_on = true;
        self.physics.set_gravity(self.config.world.active_gravity);
        self.magnet.reset();
        if self.swarm_enabled() {
            self.scheduler.push_at(
                self.now_ms + self.config.swarm.inject_interval_ms,
                ScheduledEvent::InjectDrift,
            );
        }
        log::info!("attraction on");
        true
    }

    /// Turn attraction off: pending injections and shape loads are dropped,
    /// loaded digit outlines are cleared, swarm particles scatter and idle
    /// gravity returns.
    pub fn disable_attraction(&mut self) -> bool {
        if !self.attraction_on {
            return false;
        }
        self.attraction_on = false;
        self.physics.set_gravity(self.config.world.idle_gravity);
        let cancelled = self
            .scheduler
            .cancel_where(|e| *e == ScheduledEvent::InjectDrift);
        if let Some(loader) = self.loader.as_mut() {
            loader.cancel();
            self.attractors.clear();
        }
        self.magnet.reset();
        self.swarm.scatter(&mut self.physics, &mut self.rng);
        log::info!("attraction off ({cancelled} pending injections cancelled)");
        true
    }

    /// Flip attraction. Returns the new state.
    pub fn toggle_attraction(&mut self) -> bool {
        if self.attraction_on {
            self.disable_attraction();
        } else {
            self.enable_attraction();
        }
        self.attraction_on
    }

    /// Replace the attractor index wholesale.
    pub fn set_attractors(&mut self, partitions: AttractorPartitions) {
        self.install(partitions);
    }

    /// Wait up to `timeout` for an in-flight shape load and install it.
    /// Returns whether the attractors were rebuilt.
    pub fn wait_for_shapes(&mut self, timeout: Duration) -> bool {
        let Some(loader) = self.loader.as_mut() else {
            return false;
        };
        match loader.poll_blocking(timeout) {
            Some(Ok(partitions)) => {
                self.install(partitions);
                true
            }
            Some(Err(err)) => {
                log::warn!("shape load failed, keeping previous attractors: {err}");
                false
            }
            None => false,
        }
    }

    /// Drop every particle (detaching its body), every pending event and
    /// load, and the attractors; then reseed the swarm.
    pub fn reset(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        if let Some(loader) = self.loader.as_mut() {
            loader.cancel();
        }
        self.magnet.reset();

        let world = &mut self.physics;
        for trail in [&mut self.hour, &mut self.minute].into_iter().chain(self.slots.iter_mut()) {
            trail.clear(world);
        }
        self.swarm.clear(world);

        self.attractors.clear();
        self.exploded = false;
        self.attraction_on = false;
        self.physics.set_gravity(self.config.world.idle_gravity);
        self.seed_swarm();
        log::info!("simulation reset ({cancelled} scheduled events dropped)");
    }

    // -- Output --

    /// Fill `buf` with this frame's particles, plus attractor segments when
    /// `debug_segments` is set.
    pub fn frame(&self, buf: &mut FrameBuffer, debug_segments: bool) {
        buf.clear();
        for p in self.particles() {
            buf.push(ParticleInstance::from_particle(p));
        }
        if debug_segments {
            for s in self.attractors.partitions().segments() {
                buf.push_segment(SegmentInstance::from(s));
            }
        }
    }

    // -- Accessors --

    pub fn particles(&self) -> impl Iterator<Item = &Particle<P::Body>> {
        self.hour
            .iter()
            .chain(self.minute.iter())
            .chain(self.slots.iter().flat_map(|t| t.iter()))
            .chain(self.swarm.iter())
    }

    pub fn particle_count(&self) -> usize {
        self.particles().count()
    }

    /// Live particles that own a physics body.
    pub fn physics_particle_count(&self) -> usize {
        self.particles().filter(|p| p.is_physics_enabled()).count()
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn hour_trail(&self) -> &Trail<P::Body> {
        &self.hour
    }

    pub fn minute_trail(&self) -> &Trail<P::Body> {
        &self.minute
    }

    pub fn slot_trails(&self) -> &[Trail<P::Body>] {
        &self.slots
    }

    pub fn swarm(&self) -> &Swarm<P::Body> {
        &self.swarm
    }

    pub fn attractors(&self) -> &AttractorIndex {
        &self.attractors
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn is_exploded(&self) -> bool {
        self.exploded
    }

    pub fn is_attraction_on(&self) -> bool {
        self.attraction_on
    }

    fn swarm_enabled(&self) -> bool {
        self.config.swarm.count > 0
    }
}

#[cfg(feature = "physics")]
pub type RapierSimulation = SimulationContext<PhysicsWorld>;

#[cfg(feature = "physics")]
impl SimulationContext<PhysicsWorld> {
    /// A simulation on a fresh Rapier world.
    pub fn with_rapier(config: SimulationConfig) -> Result<Self, ConfigError> {
        let gravity = config.world.idle_gravity;
        Self::new(config, PhysicsWorld::new(gravity))
    }
}
