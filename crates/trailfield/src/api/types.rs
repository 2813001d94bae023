use serde::{Deserialize, Serialize};

/// Unique identifier for a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u32);

/// Partition key of the attractor index (digit slot, ring slot, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey(pub u8);

/// What a particle represents. Drives its configuration row and its
/// eligibility for attraction and explosion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Hour,
    Minute,
    /// Ball `n` along the second hand, counted from the centre.
    SecondBall(u8),
    /// Free-floating swarm particle.
    Drift,
}

/// Motion ownership of a particle. The only transition is
/// `Kinematic -> PhysicsEnabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Position scripted by the emitter, no engine body.
    Kinematic,
    /// Position read back from an engine body every frame.
    PhysicsEnabled,
}

/// RGB colour with channels in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Linear blend toward `other` by `t` in [0, 1].
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}
