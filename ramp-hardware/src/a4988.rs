//! A4988 stepper motor driver
//!
//! Datasheet: <https://www.pololu.com/file/0J450/a4988_DMOS_microstepping_driver_with_translator.pdf>
//!
//! ENABLE and SLEEP are active low. Every rising edge on STEP advances the
//! motor by one (micro)step in the direction selected by DIR.

use crate::gpio::{Level, OutputPin, SysfsPin};
use ramp_core::config::DriverConfig;
use ramp_core::{Direction, RampError, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Time the charge pump needs after leaving sleep mode
pub const WAKE_DELAY: Duration = Duration::from_millis(1);

/// The four pins wired to the driver
#[derive(Debug)]
pub struct A4988Pins<P> {
    pub enable: P,
    pub sleep: P,
    pub step: P,
    pub dir: P,
}

/// A4988 driver interface
///
/// Generic over the pin type, allowing sysfs GPIO (`SysfsPin`) or mock pins
/// for testing.
#[derive(Debug)]
pub struct A4988<P: OutputPin> {
    enable: P,
    sleep: P,
    step: P,
    dir: P,
}

impl A4988<SysfsPin> {
    /// Open the pins listed in `[driver]` through sysfs.
    ///
    /// Pins opened before a failure are released again.
    pub async fn open_sysfs(root: &Path, config: &DriverConfig, ignore_busy: bool) -> Result<Self> {
        let mut opened = Vec::with_capacity(4);
        for (number, initial) in [
            (config.enable, Level::High),
            (config.sleep, Level::High),
            (config.step, Level::Low),
            (config.dir, Level::Low),
        ] {
            match SysfsPin::open(root, number, initial, ignore_busy).await {
                Ok(pin) => opened.push(pin),
                Err(e) => {
                    for pin in &mut opened {
                        if let Err(release_err) = pin.release().await {
                            warn!("Failed to release GPIO {}: {}", pin.number(), release_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        let [enable, sleep, step, dir]: [SysfsPin; 4] = opened
            .try_into()
            .map_err(|_| RampError::Gpio("expected four driver pins".to_string()))?;
        Self::new(A4988Pins {
            enable,
            sleep,
            step,
            dir,
        })
        .await
    }
}

impl<P: OutputPin> A4988<P> {
    /// Take control of the pins: driver disabled, awake, STEP and DIR low.
    pub async fn new(pins: A4988Pins<P>) -> Result<Self> {
        let mut driver = Self {
            enable: pins.enable,
            sleep: pins.sleep,
            step: pins.step,
            dir: pins.dir,
        };
        driver.enable.set_level(Level::High).await?;
        driver.sleep.set_level(Level::High).await?;
        driver.step.set_level(Level::Low).await?;
        driver.dir.set_level(Level::Low).await?;
        debug!("A4988 initialized");
        Ok(driver)
    }

    pub async fn enable(&mut self) -> Result<()> {
        self.enable.set_level(Level::Low).await
    }

    pub async fn disable(&mut self) -> Result<()> {
        self.enable.set_level(Level::High).await
    }

    pub async fn is_enabled(&mut self) -> Result<bool> {
        Ok(self.enable.level().await? == Level::Low)
    }

    /// Enter sleep mode to save energy
    pub async fn sleep(&mut self) -> Result<()> {
        self.sleep.set_level(Level::Low).await
    }

    /// Leave sleep mode and wait until the driver is operational
    pub async fn wake(&mut self) -> Result<()> {
        self.sleep.set_level(Level::High).await?;
        tokio::time::sleep(WAKE_DELAY).await;
        Ok(())
    }

    pub async fn is_sleeping(&mut self) -> Result<bool> {
        Ok(self.sleep.level().await? == Level::Low)
    }

    pub async fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.dir.set_level(direction.into()).await
    }

    pub async fn direction(&mut self) -> Result<Direction> {
        Ok(self.dir.level().await?.into())
    }

    /// Emit a single STEP pulse
    ///
    /// The A4988 needs at least 1 µs high time; a pin write takes longer.
    pub async fn step(&mut self) -> Result<()> {
        self.step.set_level(Level::High).await?;
        self.step.set_level(Level::Low).await
    }

    /// Put the driver to sleep, disable it and release all pins.
    ///
    /// Every step is attempted; the first error is returned.
    pub async fn shutdown(mut self) -> Result<()> {
        let results = [
            self.sleep().await,
            self.disable().await,
            self.enable.release().await,
            self.sleep.release().await,
            self.step.release().await,
            self.dir.release().await,
        ];
        debug!("A4988 shut down");
        results.into_iter().collect()
    }
}
