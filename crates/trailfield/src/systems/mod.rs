pub mod attractor;
pub mod explosion;
pub mod forces;
pub mod geometry;
pub mod particle;
pub mod rng;
pub mod swarm;
pub mod trail;
