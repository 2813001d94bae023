use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::types::{Category, ParticleId, Rgb};
use crate::core::physics::ColliderMaterial;
use crate::shapes::digits::DigitLayout;
use crate::systems::explosion::ExplosionParams;
use crate::systems::forces::AttractionParams;
use crate::systems::particle::{DecayProfile, Particle};
use crate::systems::swarm::SwarmParams;

/// Everything a [`SimulationContext`](super::simulation::SimulationContext)
/// needs, loaded from JSON. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub clock: ClockFaceConfig,
    pub categories: CategoryTable,
    pub attraction: AttractionParams,
    pub explosion: ExplosionParams,
    pub swarm: SwarmParams,
    pub digits: DigitLayout,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Surround the world with four static walls.
    pub walls: bool,
    pub wall_thickness: f32,
    /// Gravity while attraction is off.
    pub idle_gravity: Vec2,
    /// Gravity while attraction is on.
    pub active_gravity: Vec2,
    /// Simulation step used by `advance`, in milliseconds.
    pub fixed_step_ms: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 960.0,
            walls: true,
            wall_thickness: 50.0,
            idle_gravity: Vec2::ZERO,
            active_gravity: Vec2::ZERO,
            fixed_step_ms: 1000.0 / 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockFaceConfig {
    pub center: Vec2,
    pub hour_length: f32,
    pub minute_length: f32,
    pub second_length: f32,
    /// Number of ball trails along the second hand.
    pub second_slots: u8,
    /// Colour used by categories without their own.
    pub theme: Rgb,
}

impl Default for ClockFaceConfig {
    fn default() -> Self {
        Self {
            center: Vec2::new(480.0, 480.0),
            hour_length: 180.0,
            minute_length: 280.0,
            second_length: 400.0,
            second_slots: 10,
            theme: Rgb::new(50.0, 200.0, 220.0),
        }
    }
}

/// Per-category spawn, look and physics settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Most particles one trail of this category holds.
    pub capacity: usize,
    pub spawn_interval_ms: f64,
    /// `None` uses the clock theme colour.
    pub color: Option<Rgb>,
    /// Colour at the far end of a slot curve.
    pub color_end: Option<Rgb>,
    pub radius: f32,
    /// Radius at the far end of a slot curve.
    pub radius_end: Option<f32>,
    pub opacity: f32,
    /// Frames a physics-driven particle lives; `None` never expires.
    pub lifetime: Option<i32>,
    pub decay: DecayProfile,
    pub material: ColliderMaterial,
    /// Whether physics-driven particles of this category seek attractors.
    pub attractable: bool,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            capacity: 30,
            spawn_interval_ms: 200.0,
            color: None,
            color_end: None,
            radius: 15.0,
            radius_end: None,
            opacity: 220.0,
            lifetime: Some(Particle::<()>::DEFAULT_LIFETIME),
            decay: DecayProfile::default(),
            material: ColliderMaterial::default(),
            attractable: false,
        }
    }
}

impl CategoryConfig {
    /// Radius at position `t` in [0, 1] along the slot curve.
    pub fn radius_at(&self, t: f32) -> f32 {
        match self.radius_end {
            Some(end) => self.radius + (end - self.radius) * t.clamp(0.0, 1.0),
            None => self.radius,
        }
    }

    pub fn color_at(&self, theme: Rgb, t: f32) -> Rgb {
        let start = self.color.unwrap_or(theme);
        match self.color_end {
            Some(end) => start.lerp(end, t),
            None => start,
        }
    }

    /// A fresh kinematic particle of this category.
    pub fn particle<B: Copy + std::fmt::Debug>(
        &self,
        id: ParticleId,
        category: Category,
        position: Vec2,
        radius: f32,
        color: Rgb,
    ) -> Particle<B> {
        Particle::new(id, category, position, radius, color)
            .with_opacity(self.opacity)
            .with_lifetime(self.lifetime)
            .with_decay(self.decay)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.radius > 0.0) || self.radius_end.is_some_and(|r| !(r > 0.0)) {
            return Err(ConfigError::Invalid(format!("{name}: radius must be positive")));
        }
        if self.spawn_interval_ms < 0.0 {
            return Err(ConfigError::Invalid(format!("{name}: negative spawn interval")));
        }
        let d = &self.decay;
        for factor in [d.kinematic_radius, d.kinematic_opacity, d.physics_radius] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name}: decay factor {factor} outside (0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// The per-category configuration rows. Drift particles are configured by
/// the swarm section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTable {
    pub hour: CategoryConfig,
    pub minute: CategoryConfig,
    pub second_ball: CategoryConfig,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            hour: CategoryConfig {
                capacity: 20,
                spawn_interval_ms: 300.0,
                radius: 21.0,
                ..CategoryConfig::default()
            },
            minute: CategoryConfig {
                capacity: 30,
                spawn_interval_ms: 200.0,
                radius: 15.0,
                ..CategoryConfig::default()
            },
            second_ball: CategoryConfig {
                capacity: 30,
                spawn_interval_ms: 100.0,
                radius: 18.0,
                radius_end: Some(6.0),
                ..CategoryConfig::default()
            },
        }
    }
}

impl CategoryTable {
    pub fn get(&self, category: Category) -> Option<&CategoryConfig> {
        match category {
            Category::Hour => Some(&self.hour),
            Category::Minute => Some(&self.minute),
            Category::SecondBall(_) => Some(&self.second_ball),
            Category::Drift => None,
        }
    }
}

fn check_speed(name: &str, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    if min < 0.0 || min > max {
        return Err(ConfigError::Invalid(format!("{name}: bad speed range ({min}, {max})")));
    }
    Ok(())
}

impl SimulationConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        if !(w.width > 0.0 && w.height > 0.0) {
            return Err(ConfigError::Invalid("world size must be positive".into()));
        }
        if !(w.fixed_step_ms > 0.0) {
            return Err(ConfigError::Invalid("fixed_step_ms must be positive".into()));
        }
        if w.walls && !(w.wall_thickness > 0.0) {
            return Err(ConfigError::Invalid("wall_thickness must be positive".into()));
        }

        self.categories.hour.validate("hour")?;
        self.categories.minute.validate("minute")?;
        self.categories.second_ball.validate("second_ball")?;

        let a = &self.attraction;
        if a.base_strength < 0.0 {
            return Err(ConfigError::Invalid("attraction strength must not be negative".into()));
        }
        if a.falloff_radius.is_some_and(|r| !(r > 0.0)) {
            return Err(ConfigError::Invalid("falloff_radius must be positive".into()));
        }

        let e = &self.explosion;
        check_speed("slot_speed", e.slot_speed)?;
        check_speed("hand_speed", e.hand_speed)?;
        check_speed("secondary_speed", e.secondary_speed)?;
        if e.slot_interval_ms < 0.0 || e.secondary_delay_ms < 0.0 {
            return Err(ConfigError::Invalid("explosion delays must not be negative".into()));
        }

        let s = &self.swarm;
        if s.count > 0 && s.groups == 0 {
            return Err(ConfigError::Invalid("swarm needs at least one group".into()));
        }
        if s.count > 0 && !(s.inject_interval_ms > 0.0) {
            return Err(ConfigError::Invalid("inject_interval_ms must be positive".into()));
        }
        if !(s.radius > 0.0) {
            return Err(ConfigError::Invalid("swarm radius must be positive".into()));
        }
        Ok(())
    }
}
