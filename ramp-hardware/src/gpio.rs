//! GPIO output pins
//!
//! Provides the [`OutputPin`] abstraction used by the A4988 driver and a Linux
//! sysfs backend (`/sys/class/gpio`).

use async_trait::async_trait;
use ramp_core::{Direction, RampError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Default sysfs GPIO directory
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    fn as_value(self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }

    fn as_direction(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::High => "high",
        }
    }
}

impl From<Direction> for Level {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Low => Level::Low,
            Direction::High => Level::High,
        }
    }
}

impl From<Level> for Direction {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => Direction::Low,
            Level::High => Direction::High,
        }
    }
}

/// Trait for output pin abstraction
///
/// This trait enables testing of the driver and motor without real hardware
/// by allowing mock implementations.
#[async_trait]
pub trait OutputPin: Send {
    /// Drive the pin to `level`
    async fn set_level(&mut self, level: Level) -> Result<()>;

    /// Read back the current level
    async fn level(&mut self) -> Result<Level>;

    /// Give the pin back to the system
    async fn release(&mut self) -> Result<()>;
}

/// Output pin backed by the sysfs GPIO interface
#[derive(Debug)]
pub struct SysfsPin {
    root: PathBuf,
    number: u32,
    released: bool,
}

impl SysfsPin {
    /// Export `number` below `root` and configure it as an output at `initial`.
    ///
    /// A pin which is already exported is considered in use by another
    /// program and rejected unless `ignore_busy` is set.
    pub async fn open(
        root: impl Into<PathBuf>,
        number: u32,
        initial: Level,
        ignore_busy: bool,
    ) -> Result<Self> {
        let root = root.into();
        let pin = Self {
            root,
            number,
            released: false,
        };

        let pin_dir = pin.pin_dir();
        let busy = fs::try_exists(&pin_dir).await.map_err(|e| {
            RampError::Gpio(format!("Failed to check '{}': {}", pin_dir.display(), e))
        })?;

        let exported = if busy {
            if !ignore_busy {
                return Err(RampError::GpioBusy(number));
            }
            warn!("GPIO {} already exported, using it anyway", number);
            false
        } else {
            debug!("Exporting GPIO {}", number);
            write_file(&pin.root.join("export"), &number.to_string()).await?;
            true
        };

        // "high"/"low" switch to output with the given initial level
        if let Err(e) = write_file(&pin_dir.join("direction"), initial.as_direction()).await {
            if exported {
                if let Err(unexport_err) =
                    write_file(&pin.root.join("unexport"), &number.to_string()).await
                {
                    warn!("Failed to unexport GPIO {}: {}", number, unexport_err);
                }
            }
            return Err(e);
        }

        Ok(pin)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.number))
    }
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|e| RampError::Gpio(format!("Failed to write '{}': {}", path.display(), e)))
}

#[async_trait]
impl OutputPin for SysfsPin {
    async fn set_level(&mut self, level: Level) -> Result<()> {
        write_file(&self.pin_dir().join("value"), level.as_value()).await
    }

    async fn level(&mut self) -> Result<Level> {
        let path = self.pin_dir().join("value");
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| RampError::Gpio(format!("Failed to read '{}': {}", path.display(), e)))?;

        match content.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(RampError::Gpio(format!(
                "Unexpected value '{}' for GPIO {}",
                other, self.number
            ))),
        }
    }

    async fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        debug!("Unexporting GPIO {}", self.number);
        write_file(&self.root.join("unexport"), &self.number.to_string()).await?;
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Fake sysfs tree where `pins` are already exported
    fn fake_sysfs(pins: &[u32]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for pin in pins {
            std::fs::create_dir(dir.path().join(format!("gpio{}", pin))).unwrap();
        }
        dir
    }

    fn read(dir: &TempDir, file: &str) -> String {
        std::fs::read_to_string(dir.path().join(file)).unwrap()
    }

    #[tokio::test]
    async fn test_open_exports_pin() {
        let dir = fake_sysfs(&[]);
        // export only records the pin number; the directory is what the kernel would create
        let result = SysfsPin::open(dir.path(), 19, Level::Low, false).await;

        assert_eq!(read(&dir, "export"), "19");
        // no gpio19 directory in the fake tree, so configuring the direction fails
        assert!(matches!(result.unwrap_err(), RampError::Gpio(_)));
        // and the pin is handed back instead of staying exported
        assert_eq!(read(&dir, "unexport"), "19");
    }

    #[tokio::test]
    async fn test_failed_busy_pin_not_unexported() {
        let dir = fake_sysfs(&[]);
        // a file where the pin directory should be breaks the direction write
        std::fs::write(dir.path().join("gpio4"), "").unwrap();

        let result = SysfsPin::open(dir.path(), 4, Level::Low, true).await;

        assert!(matches!(result.unwrap_err(), RampError::Gpio(_)));
        assert!(!dir.path().join("unexport").exists());
    }

    #[tokio::test]
    async fn test_open_unreadable_root() {
        let dir = fake_sysfs(&[]);
        let root = dir.path().join("not_a_dir");
        std::fs::write(&root, "").unwrap();

        let err = SysfsPin::open(&root, 3, Level::Low, false).await.unwrap_err();

        assert!(err.to_string().contains("Failed to check"));
        assert!(!dir.path().join("export").exists());
    }

    #[tokio::test]
    async fn test_open_busy_pin_rejected() {
        let dir = fake_sysfs(&[18]);
        let result = SysfsPin::open(dir.path(), 18, Level::Low, false).await;

        assert!(matches!(result.unwrap_err(), RampError::GpioBusy(18)));
        assert!(!dir.path().join("export").exists());
    }

    #[tokio::test]
    async fn test_open_busy_pin_ignored() {
        let dir = fake_sysfs(&[0]);
        let pin = SysfsPin::open(dir.path(), 0, Level::High, true).await.unwrap();

        assert_eq!(pin.number(), 0);
        assert_eq!(read(&dir, "gpio0/direction"), "high");
        assert!(!dir.path().join("export").exists());
    }

    #[tokio::test]
    async fn test_set_and_read_level() {
        let dir = fake_sysfs(&[1]);
        let mut pin = SysfsPin::open(dir.path(), 1, Level::Low, true).await.unwrap();

        pin.set_level(Level::High).await.unwrap();
        assert_eq!(read(&dir, "gpio1/value"), "1");
        assert_eq!(pin.level().await.unwrap(), Level::High);

        pin.set_level(Level::Low).await.unwrap();
        assert_eq!(pin.level().await.unwrap(), Level::Low);
    }

    #[tokio::test]
    async fn test_level_tolerates_trailing_newline() {
        let dir = fake_sysfs(&[5]);
        let mut pin = SysfsPin::open(dir.path(), 5, Level::Low, true).await.unwrap();
        std::fs::write(dir.path().join("gpio5/value"), "1\n").unwrap();

        assert_eq!(pin.level().await.unwrap(), Level::High);
    }

    #[tokio::test]
    async fn test_level_rejects_garbage() {
        let dir = fake_sysfs(&[5]);
        let mut pin = SysfsPin::open(dir.path(), 5, Level::Low, true).await.unwrap();
        std::fs::write(dir.path().join("gpio5/value"), "x").unwrap();

        assert!(matches!(pin.level().await.unwrap_err(), RampError::Gpio(_)));
    }

    #[tokio::test]
    async fn test_release_unexports_once() {
        let dir = fake_sysfs(&[7]);
        let mut pin = SysfsPin::open(dir.path(), 7, Level::Low, true).await.unwrap();

        pin.release().await.unwrap();
        assert_eq!(read(&dir, "unexport"), "7");

        std::fs::remove_file(dir.path().join("unexport")).unwrap();
        pin.release().await.unwrap();
        assert!(!dir.path().join("unexport").exists());
    }

    #[test]
    fn test_level_direction_conversion() {
        assert_eq!(Level::from(Direction::High), Level::High);
        assert_eq!(Direction::from(Level::Low), Direction::Low);
    }
}
