//! Configuration types for the ramp experiment
//!
//! The configuration is a single TOML file with one table per concern:
//! `[mqtt]`, `[logging]`, `[driver]`, `[motor]`, `[ramp]`, `[landing_zone]`,
//! `[elevator]` and `[topics]`. It is read once at startup.

mod paths;
mod static_config;
mod validation;

pub use paths::default_config_path;
pub use static_config::{
    Direction, DriverConfig, ElevatorConfig, LandingZoneConfig, LogLevel, LoggingConfig,
    MotorConfig, MqttConfig, QoS, RampConfig, StaticConfig, TopicsConfig,
};
pub use validation::ValidationError;
