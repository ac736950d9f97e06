//! MQTT payload encodings
//!
//! - status: one unsigned byte
//! - angle: radians as an IEEE-754 double, network byte order
//! - timestamp: unix time in seconds, same encoding as the angle

use crate::{RampError, Result};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Size of an encoded angle or timestamp
pub const DOUBLE_LEN: usize = 8;

/// State of the experiment as published on the status topic
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Ready to process targets
    Ready = 0,
    /// Processing a target
    Busy = 1,
    /// Landing zone timeout expired
    Error = 2,
    /// Server offline or crashed
    Offline = 3,
}

impl Status {
    pub fn to_bytes(self) -> [u8; 1] {
        [self as u8]
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match data {
            [value] => Self::try_from(*value),
            _ => Err(RampError::Payload(format!(
                "status must be 1 byte, got {}",
                data.len()
            ))),
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = RampError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Status::Ready),
            1 => Ok(Status::Busy),
            2 => Ok(Status::Error),
            3 => Ok(Status::Offline),
            other => Err(RampError::Payload(format!("unknown status {}", other))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ready => "ready",
            Status::Busy => "busy",
            Status::Error => "error",
            Status::Offline => "offline",
        };
        f.write_str(name)
    }
}

fn decode_double(data: &[u8], what: &str) -> Result<f64> {
    let bytes: [u8; DOUBLE_LEN] = data.try_into().map_err(|_| {
        RampError::Payload(format!(
            "{} must be {} bytes, got {}",
            what,
            DOUBLE_LEN,
            data.len()
        ))
    })?;
    Ok(f64::from_be_bytes(bytes))
}

pub fn encode_angle(radians: f64) -> [u8; DOUBLE_LEN] {
    radians.to_be_bytes()
}

pub fn decode_angle(data: &[u8]) -> Result<f64> {
    decode_double(data, "angle")
}

pub fn encode_timestamp(seconds: f64) -> [u8; DOUBLE_LEN] {
    seconds.to_be_bytes()
}

pub fn decode_timestamp(data: &[u8]) -> Result<f64> {
    decode_double(data, "timestamp")
}

/// Seconds since the unix epoch, as carried by the timestamp topic
pub fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}

/// Inverse of [`unix_seconds`]
///
/// Negative, non-finite and unrepresentable values are rejected.
pub fn system_time(seconds: f64) -> Result<SystemTime> {
    Duration::try_from_secs_f64(seconds)
        .ok()
        .and_then(|offset| UNIX_EPOCH.checked_add(offset))
        .ok_or_else(|| RampError::Payload(format!("invalid timestamp {}", seconds)))
}
