pub mod instance;

pub use instance::{FrameBuffer, ParticleInstance, SegmentInstance};
