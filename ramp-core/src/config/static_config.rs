//! Static configuration loaded once at startup
//!
//! Units follow the configuration file header: distances in millimeters,
//! angles in radians and times in seconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// MQTT quality of service level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(format!("invalid qos {}, expected 0, 1 or 2", other)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        qos as u8
    }
}

/// Log verbosity, named after the levels of the original server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Name used in filter directives
    ///
    /// `critical` has no tracing counterpart and maps to `error`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(format!(
                "invalid log level '{}', expected debug, info, warning, error or critical",
                s
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        };
        f.write_str(name)
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    // `Self::Error` would be ambiguous with the `Error` variant
    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

/// Level of the A4988 DIR pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    Low = 0,
    High = 1,
}

impl Direction {
    /// The other direction
    pub fn reversed(self) -> Self {
        match self {
            Direction::Low => Direction::High,
            Direction::High => Direction::Low,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Low),
            1 => Ok(Direction::High),
            other => Err(format!("invalid direction {}, expected 0 or 1", other)),
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction as u8
    }
}

/// MQTT broker connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttConfig {
    /// Client id
    pub id: String,
    pub clean_session: bool,
    pub host: String,
    pub port: u16,
    pub qos: QoS,
    pub tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            id: "ramp_experiment".to_string(),
            clean_session: true,
            host: "localhost".to_string(),
            port: 1883,
            qos: QoS::ExactlyOnce,
            tls: false,
            username: None,
            password: None,
        }
    }
}

/// Log verbosity and destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub server_level: LogLevel,
    pub mqtt_level: LogLevel,
    /// Log file, stderr when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            server_level: LogLevel::Info,
            mqtt_level: LogLevel::Warning,
            file: None,
        }
    }
}

/// GPIO pins wired to the A4988
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    pub enable: u32,
    pub sleep: u32,
    pub step: u32,
    pub dir: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            enable: 0,
            sleep: 1,
            step: 19,
            dir: 18,
        }
    }
}

/// Motion parameters of the worm motor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotorConfig {
    /// DIR level which increases the position
    pub direction: Direction,
    /// Distance travelled per step
    pub step_width: f64,
    /// Pulses per second
    pub pps: u32,
    pub limit_lower: f64,
    pub limit_upper: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Low,
            step_width: 0.025,
            pps: 200,
            limit_lower: 0.0,
            limit_upper: 80.0,
        }
    }
}

/// Ramp geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RampConfig {
    /// Length of the side adjacent to the ramp angle
    pub base_length: f64,
    /// Angle of the ramp at motor position zero
    pub offset: f64,
    /// Angle travelled between progress updates
    pub step_size: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            base_length: 70.0,
            offset: 0.0,
            step_size: 0.0174533,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandingZoneConfig {
    /// Sensor input pin
    pub gpio: u32,
    pub timeout: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_time: Option<f64>,
}

impl Default for LandingZoneConfig {
    fn default() -> Self {
        Self {
            gpio: 2,
            timeout: 10.0,
            swing_time: Some(2.0),
        }
    }
}

/// PWM output driving the elevator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElevatorConfig {
    pub channel: u32,
    pub chip: u32,
    /// Hz
    pub frequency: f64,
    /// Percent of the period
    pub duty_cycle: f64,
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            chip: 0,
            frequency: 50.0,
            duty_cycle: 7.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicsConfig {
    pub status: String,
    pub target: String,
    pub current: String,
    pub timestamp: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            status: "/ramp_experiment/status".to_string(),
            target: "/ramp_experiment/target".to_string(),
            current: "/ramp_experiment/current".to_string(),
            timestamp: "/ramp_experiment/timestamp".to_string(),
        }
    }
}

/// Static configuration of the ramp experiment.
///
/// Loaded once at startup and immutable afterwards.
/// Located at `~/.config/ramp_experiment/config.toml` by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    pub mqtt: MqttConfig,
    pub logging: LoggingConfig,
    pub driver: DriverConfig,
    pub motor: MotorConfig,
    pub ramp: RampConfig,
    pub landing_zone: LandingZoneConfig,
    pub elevator: ElevatorConfig,
    pub topics: TopicsConfig,
}

impl StaticConfig {
    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize StaticConfig to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
