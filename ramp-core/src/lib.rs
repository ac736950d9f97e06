//! Ramp Experiment Core Library
//!
//! Shared types for the ramp experiment: the configuration schema, ramp
//! geometry and the MQTT payload encodings. Used by the hardware crate and
//! the daemon.

pub mod config;
pub mod error;
pub mod geometry;
pub mod mqtt;

// Re-export commonly used types
pub use config::{default_config_path, Direction, StaticConfig, ValidationError};
pub use error::*;
pub use geometry::RampGeometry;
pub use mqtt::Status;
