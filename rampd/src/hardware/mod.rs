//! Hardware setup for the daemon
//!
//! Builds the ramp from the configuration, either on sysfs GPIO or on mock
//! pins when running without hardware.

use ramp_core::{Result, StaticConfig};
use ramp_hardware::{A4988Pins, MockPin, OutputPin, Ramp, SysfsPin, WormMotor, A4988};
use std::path::Path;
use tracing::info;

/// Open the `[driver]` pins below `gpio_root` and build the ramp on them
pub(crate) async fn open_ramp(
    config: &StaticConfig,
    gpio_root: &Path,
    ignore_busy: bool,
) -> Result<Ramp<SysfsPin>> {
    info!(
        "Opening A4988 on GPIO {}/{}/{}/{} (enable/sleep/step/dir) below {}",
        config.driver.enable,
        config.driver.sleep,
        config.driver.step,
        config.driver.dir,
        gpio_root.display()
    );
    let driver = A4988::open_sysfs(gpio_root, &config.driver, ignore_busy).await?;
    build_ramp(driver, config).await
}

/// Build the ramp on pins that only record what is written to them
pub(crate) async fn mock_ramp(config: &StaticConfig) -> Result<Ramp<MockPin>> {
    info!("Mock mode: driving in-memory pins");
    let driver = A4988::new(A4988Pins {
        enable: MockPin::new(config.driver.enable),
        sleep: MockPin::new(config.driver.sleep),
        step: MockPin::new(config.driver.step),
        dir: MockPin::new(config.driver.dir),
    })
    .await?;
    build_ramp(driver, config).await
}

async fn build_ramp<P: OutputPin>(driver: A4988<P>, config: &StaticConfig) -> Result<Ramp<P>> {
    let motor = WormMotor::new(driver, &config.motor, true).await?;
    let (lower, upper) = motor.limits();
    info!("Motor ready, travel {} to {} steps", lower, upper);
    Ok(Ramp::new(motor, &config.ramp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mock_ramp_starts_at_lower_limit() {
        let config = StaticConfig::default();
        let ramp = mock_ramp(&config).await.unwrap();

        assert_eq!(ramp.motor().limits(), (0, 3200));
        assert_eq!(ramp.motor().steps(), 0);
        assert_eq!(ramp.angle(), 0.0);
    }

    #[tokio::test]
    async fn test_open_ramp_on_fake_sysfs() {
        let temp_dir = TempDir::new().unwrap();
        let config = StaticConfig::default();
        for pin in [0, 1, 19, 18] {
            std::fs::create_dir(temp_dir.path().join(format!("gpio{}", pin))).unwrap();
        }

        let ramp = open_ramp(&config, temp_dir.path(), true).await.unwrap();

        // driver asleep but enabled, waiting for the first move
        let read = |file: &str| std::fs::read_to_string(temp_dir.path().join(file)).unwrap();
        assert_eq!(read("gpio1/value"), "0");
        assert_eq!(read("gpio0/value"), "0");

        ramp.shutdown().await.unwrap();
        assert_eq!(read("gpio0/value"), "1");
    }

    #[tokio::test]
    async fn test_open_ramp_busy_pins() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("gpio0")).unwrap();

        let result = open_ramp(&StaticConfig::default(), temp_dir.path(), false).await;

        assert!(matches!(
            result.unwrap_err(),
            ramp_core::RampError::GpioBusy(0)
        ));
    }
}
