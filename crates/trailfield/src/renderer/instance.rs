use bytemuck::{Pod, Zeroable};

use crate::api::types::{Phase, Rgb};
use crate::systems::geometry::Segment;
use crate::systems::particle::Particle;

/// Per-particle render data handed to the host each frame.
/// 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    /// Alpha in [0, 255].
    pub alpha: f32,
    /// 0.0 = kinematic, 1.0 = physics-driven.
    pub phase: f32,
}

impl ParticleInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn from_particle<B: Copy + std::fmt::Debug>(p: &Particle<B>) -> Self {
        let Rgb { r, g, b } = p.color;
        Self {
            x: p.position.x,
            y: p.position.y,
            radius: p.radius,
            r,
            g,
            b,
            alpha: p.render_alpha(),
            phase: match p.phase() {
                Phase::Kinematic => 0.0,
                Phase::PhysicsEnabled => 1.0,
            },
        }
    }
}

/// An attractor segment for debug drawing. 4 floats = 16 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SegmentInstance {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl SegmentInstance {
    pub const FLOATS: usize = 4;
}

impl From<&Segment> for SegmentInstance {
    fn from(s: &Segment) -> Self {
        Self {
            x1: s.p1.x,
            y1: s.p1.y,
            x2: s.p2.x,
            y2: s.p2.y,
        }
    }
}

/// Everything the renderer needs for one frame: live particles, plus the
/// active attractor segments when debug output is wanted.
pub struct FrameBuffer {
    pub particles: Vec<ParticleInstance>,
    pub segments: Vec<SegmentInstance>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            particles: Vec::with_capacity(1024),
            segments: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.segments.clear();
    }

    pub fn push(&mut self, instance: ParticleInstance) {
        self.particles.push(instance);
    }

    pub fn push_segment(&mut self, segment: SegmentInstance) {
        self.segments.push(segment);
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    pub fn segment_count(&self) -> u32 {
        self.segments.len() as u32
    }

    /// Particle data as a flat float slice.
    pub fn particle_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.particles)
    }

    pub fn segment_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.segments)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Category, ParticleId};
    use glam::Vec2;

    #[test]
    fn particle_instance_is_8_floats() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
        assert_eq!(ParticleInstance::FLOATS, 8);
        assert_eq!(std::mem::size_of::<SegmentInstance>(), 16);
    }

    #[test]
    fn instance_mirrors_particle() {
        let p: Particle<u32> = Particle::new(
            ParticleId(4),
            Category::Hour,
            Vec2::new(12.0, 34.0),
            21.0,
            Rgb::new(80.0, 200.0, 255.0),
        );
        let inst = ParticleInstance::from_particle(&p);
        assert_eq!(inst.x, 12.0);
        assert_eq!(inst.y, 34.0);
        assert_eq!(inst.radius, 21.0);
        assert_eq!(inst.g, 200.0);
        assert_eq!(inst.alpha, 220.0);
        assert_eq!(inst.phase, 0.0);
    }

    #[test]
    fn flat_floats_follow_push_order() {
        let mut buf = FrameBuffer::new();
        buf.push(ParticleInstance { x: 1.0, ..Default::default() });
        buf.push(ParticleInstance { x: 2.0, ..Default::default() });
        buf.push_segment(SegmentInstance::from(&Segment::new(Vec2::ZERO, Vec2::new(3.0, 4.0))));

        assert_eq!(buf.particle_count(), 2);
        let floats = buf.particle_floats();
        assert_eq!(floats.len(), 16);
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[8], 2.0);
        assert_eq!(buf.segment_floats(), &[0.0, 0.0, 3.0, 4.0]);

        buf.clear();
        assert_eq!(buf.particle_count(), 0);
        assert_eq!(buf.segment_count(), 0);
    }
}
