//! Error types for the ramp experiment

use thiserror::Error;

use crate::config::ValidationError;

/// Core error type for ramp experiment operations
#[derive(Error, Debug)]
pub enum RampError {
    /// Configuration could not be read, written or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration parsed but violates an invariant
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// GPIO access failed
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// GPIO pin is already exported by another program
    #[error("GPIO {0} is busy")]
    GpioBusy(u32),

    /// Target position outside of the motor limits (in steps)
    #[error("step count {steps} exceeds limits of {lower} (lower) and {upper} (upper)")]
    OutOfRange { steps: i64, lower: i64, upper: i64 },

    /// Malformed MQTT payload
    #[error("Invalid payload: {0}")]
    Payload(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ramp experiment operations
pub type Result<T> = std::result::Result<T, RampError>;
