//! Configuration loading
//!
//! Reads the TOML configuration file, creating it from the commented default
//! when missing, and validates it before anything touches the hardware.

use ramp_core::{RampError, Result, StaticConfig};
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Commented configuration written when no file exists yet
pub(crate) const DEFAULT_CONFIG: &str = include_str!("../../../config/ramp_experiment.toml");

/// Load and validate the configuration at `path`.
///
/// If the file doesn't exist, it is created with the default content.
pub(crate) async fn load(path: &Path) -> Result<StaticConfig> {
    let content = if path.exists() {
        fs::read_to_string(path)
            .await
            .map_err(|e| RampError::Config(format!("Failed to read config file: {}", e)))?
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                RampError::Config(format!(
                    "Failed to create config directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        fs::write(path, DEFAULT_CONFIG)
            .await
            .map_err(|e| RampError::Config(format!("Failed to write config file: {}", e)))?;
        DEFAULT_CONFIG.to_string()
    };

    let config = StaticConfig::from_toml(&content)
        .map_err(|e| RampError::Config(format!("Failed to parse config file: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// Log what the daemon is about to use
pub(crate) fn log_summary(config: &StaticConfig) {
    let mqtt = &config.mqtt;
    info!(
        "  MQTT: {}:{} as '{}' (qos {}, tls {}, clean session {})",
        mqtt.host,
        mqtt.port,
        mqtt.id,
        u8::from(mqtt.qos),
        mqtt.tls,
        mqtt.clean_session
    );
    info!(
        "  Driver pins: enable={} sleep={} step={} dir={}",
        config.driver.enable, config.driver.sleep, config.driver.step, config.driver.dir
    );
    info!(
        "  Motor: {} mm/step, {} pps, {} to {} mm",
        config.motor.step_width,
        config.motor.pps,
        config.motor.limit_lower,
        config.motor.limit_upper
    );
    info!(
        "  Ramp: base {} mm, offset {} rad, step size {} rad",
        config.ramp.base_length, config.ramp.offset, config.ramp.step_size
    );
    info!(
        "  Landing zone: GPIO {}, timeout {} s",
        config.landing_zone.gpio, config.landing_zone.timeout
    );
    info!(
        "  Elevator: pwmchip{} channel {}, {} Hz at {}%",
        config.elevator.chip,
        config.elevator.channel,
        config.elevator.frequency,
        config.elevator.duty_cycle
    );
    info!("  Status topic: {}", config.topics.status);
}
