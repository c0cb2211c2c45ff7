//! Error types for the balancer service

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BalancerError {
    #[error("unknown topology: {name}")]
    UnknownTopology { name: String },

    #[error("speed {speed} out of range [{min}, {max}]")]
    SpeedOutOfRange { speed: f64, min: f64, max: f64 },

    #[error("unknown traffic pattern: {pattern}")]
    UnknownPattern { pattern: String },

    #[error("traffic simulator is not enabled")]
    SimulatorDisabled,

    #[error("actuator timed out after {timeout_secs}s")]
    ActuatorTimeout { timeout_secs: u64 },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("connection limit reached ({max})")]
    ConnectionLimit { max: usize },

    #[error("actuator failed: {message}")]
    ActuatorFailed { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BalancerError>;
