//! Stepper motor moving a worm gear
//!
//! Positions are tracked in steps. Conversions from millimeters truncate
//! towards zero, so a position always maps to a whole step.

use crate::a4988::A4988;
use crate::gpio::OutputPin;
use ramp_core::config::MotorConfig;
use ramp_core::{Direction, RampError, Result};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Worm gear motor driven by an A4988
#[derive(Debug)]
pub struct WormMotor<P: OutputPin> {
    driver: A4988<P>,
    /// DIR level which increases the position
    direction: Direction,
    step_width: f64,
    pulse_period: Duration,
    limit_lower: i64,
    limit_upper: i64,
    steps: i64,
    starting_steps: i64,
    reset_on_shutdown: bool,
}

impl<P: OutputPin> WormMotor<P> {
    /// Take over `driver`, which is put to sleep and enabled so that waking
    /// it is enough to move.
    ///
    /// The motor is assumed to stand at `limit_lower`.
    pub async fn new(
        mut driver: A4988<P>,
        config: &MotorConfig,
        reset_on_shutdown: bool,
    ) -> Result<Self> {
        if config.step_width.is_nan() || config.step_width <= 0.0 {
            return Err(RampError::InvalidInput(format!(
                "step width must be positive, got {}",
                config.step_width
            )));
        }
        if config.pps == 0 {
            return Err(RampError::InvalidInput(
                "pulses per second must be positive".to_string(),
            ));
        }

        driver.sleep().await?;
        driver.enable().await?;

        let to_steps = |mm: f64| (mm / config.step_width) as i64;
        let limit_lower = to_steps(config.limit_lower);
        let limit_upper = to_steps(config.limit_upper);
        debug!(
            "Motor limits: {} to {} steps, {} pps",
            limit_lower, limit_upper, config.pps
        );

        Ok(Self {
            driver,
            direction: config.direction,
            step_width: config.step_width,
            pulse_period: Duration::from_secs_f64(1.0 / f64::from(config.pps)),
            limit_lower,
            limit_upper,
            steps: limit_lower,
            starting_steps: limit_lower,
            reset_on_shutdown,
        })
    }

    pub fn steps(&self) -> i64 {
        self.steps
    }

    pub fn limits(&self) -> (i64, i64) {
        (self.limit_lower, self.limit_upper)
    }

    /// Current position in millimeters
    pub fn position(&self) -> f64 {
        self.steps as f64 * self.step_width
    }

    fn position_to_steps(&self, position: f64) -> i64 {
        (position / self.step_width) as i64
    }

    fn check_range(&self, steps: i64) -> Result<()> {
        if steps < self.limit_lower || steps > self.limit_upper {
            return Err(RampError::OutOfRange {
                steps,
                lower: self.limit_lower,
                upper: self.limit_upper,
            });
        }
        Ok(())
    }

    /// Move to an absolute step count
    pub async fn set_steps(&mut self, steps: i64) -> Result<()> {
        self.check_range(steps)?;

        let diff = steps - self.steps;
        if diff > 0 {
            self.move_steps(diff.unsigned_abs(), self.direction).await
        } else if diff < 0 {
            self.move_steps(diff.unsigned_abs(), self.direction.reversed())
                .await
        } else {
            Ok(())
        }
    }

    /// Move to an absolute position in millimeters
    pub async fn set_position(&mut self, position: f64) -> Result<()> {
        self.set_steps(self.position_to_steps(position)).await
    }

    /// Move towards `position` in chunks of `chunk` millimeters.
    ///
    /// The target is checked against the limits before anything moves.
    pub fn walk_to(&mut self, position: f64, chunk: f64) -> Result<Walk<'_, P>> {
        let target = self.position_to_steps(position);
        self.check_range(target)?;
        let chunk = self.position_to_steps(chunk).max(1);
        Ok(Walk {
            motor: self,
            target,
            chunk,
        })
    }

    async fn move_steps(&mut self, amount: u64, direction: Direction) -> Result<()> {
        debug!("Moving {} steps with DIR {:?}", amount, direction);
        self.driver.set_direction(direction).await?;
        self.driver.wake().await?;

        let moved = self.pulse(amount, direction).await;

        // sleep even if stepping failed to prevent overheating
        let slept = self.driver.sleep().await;
        if let Err(ref e) = moved {
            warn!("Movement aborted at step {}: {}", self.steps, e);
        }
        moved.and(slept)
    }

    async fn pulse(&mut self, amount: u64, direction: Direction) -> Result<()> {
        let delta = if direction == self.direction { 1 } else { -1 };
        let mut ticker = interval(self.pulse_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for _ in 0..amount {
            ticker.tick().await;
            self.driver.step().await?;
            self.steps += delta;
        }
        Ok(())
    }

    /// Return to the starting position if requested, then shut the driver down.
    pub async fn shutdown(mut self) -> Result<()> {
        let reset = if self.reset_on_shutdown {
            info!("Returning motor to step {}", self.starting_steps);
            self.set_steps(self.starting_steps).await
        } else {
            Ok(())
        };
        let shutdown = self.driver.shutdown().await;
        reset.and(shutdown)
    }
}

/// Incremental move started by [`WormMotor::walk_to`]
#[derive(Debug)]
pub struct Walk<'a, P: OutputPin> {
    motor: &'a mut WormMotor<P>,
    target: i64,
    chunk: i64,
}

impl<P: OutputPin> Walk<'_, P> {
    /// Move the next chunk, returning the position reached.
    ///
    /// Returns `None` once the target has been reached.
    pub async fn advance(&mut self) -> Result<Option<f64>> {
        let current = self.motor.steps;
        let next = match current.cmp(&self.target) {
            std::cmp::Ordering::Equal => return Ok(None),
            std::cmp::Ordering::Less => (current + self.chunk).min(self.target),
            std::cmp::Ordering::Greater => (current - self.chunk).max(self.target),
        };
        self.motor.set_steps(next).await?;
        Ok(Some(self.motor.position()))
    }
}
