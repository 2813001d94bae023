pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod shapes;

// Re-export key types at crate root for convenience
pub use api::config::{CategoryConfig, CategoryTable, ClockFaceConfig, SimulationConfig, WorldConfig};
pub use api::error::{ConfigError, ShapeError};
pub use api::simulation::SimulationContext;
pub use api::types::{Category, GroupKey, ParticleId, Phase, Rgb};
pub use components::placement::{Hand, Placement};
pub use crate::core::physics::{BodyDesc, BodyType, ColliderDesc, ColliderMaterial, PhysicsBackend};
pub use crate::core::schedule::{ScheduledEvent, Scheduler};
pub use crate::core::time::{ClockReading, FixedTimestep};
pub use renderer::instance::{FrameBuffer, ParticleInstance, SegmentInstance};
pub use shapes::{DigitLayout, DigitMagnet, ShapeLoader, ShapePlacement, ShapeSource, StaticShapes};
pub use systems::attractor::{AttractorIndex, AttractorPartitions, AttractorSet, Target};
pub use systems::explosion::ExplosionParams;
pub use systems::forces::AttractionParams;
pub use systems::geometry::{NearestPoint, Segment};
pub use systems::particle::{DecayProfile, Particle};
pub use systems::rng::Rng;
pub use systems::swarm::{Swarm, SwarmParams};
pub use systems::trail::Trail;

#[cfg(feature = "physics")]
pub use api::simulation::RapierSimulation;
#[cfg(feature = "physics")]
pub use crate::core::physics::{PhysicsBody, PhysicsWorld};

#[cfg(feature = "vectors")]
pub use shapes::PathShapes;
