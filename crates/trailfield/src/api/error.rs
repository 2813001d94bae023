use thiserror::Error;

/// Failure loading or validating a [`SimulationConfig`](super::config::SimulationConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure producing the outline for a shape key.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("no shape for key {0:?}")]
    NotFound(String),
    #[error("shape {0:?} has no usable outline")]
    Empty(String),
    #[error("shape loader is no longer running")]
    Disconnected,
    #[error("shape data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
