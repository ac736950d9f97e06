//! Ramp whose angle is set by a worm motor

use crate::gpio::OutputPin;
use crate::motor::{Walk, WormMotor};
use ramp_core::config::RampConfig;
use ramp_core::{RampGeometry, Result};
use tracing::debug;

/// Adjustable ramp
#[derive(Debug)]
pub struct Ramp<P: OutputPin> {
    motor: WormMotor<P>,
    geometry: RampGeometry,
    step_size: f64,
}

impl<P: OutputPin> Ramp<P> {
    pub fn new(motor: WormMotor<P>, config: &RampConfig) -> Self {
        Self {
            motor,
            geometry: RampGeometry::from(config),
            step_size: config.step_size,
        }
    }

    pub fn motor(&self) -> &WormMotor<P> {
        &self.motor
    }

    /// Move to `radians`
    pub async fn set_angle(&mut self, radians: f64) -> Result<()> {
        let position = self.geometry.position_for(radians);
        debug!("Angle {} rad -> position {} mm", radians, position);
        self.motor.set_position(position).await
    }

    /// Current angle in radians
    pub fn angle(&self) -> f64 {
        self.geometry.angle_for(self.motor.position())
    }

    /// Move to `radians`, stopping after every `step_size` of travel
    pub fn walk_angle(&mut self, radians: f64) -> Result<AngleWalk<'_, P>> {
        let position = self.geometry.position_for(radians);
        let chunk = self.geometry.distance_for(self.step_size);
        Ok(AngleWalk {
            walk: self.motor.walk_to(position, chunk)?,
            geometry: self.geometry,
        })
    }

    /// Park the motor and release the driver
    pub async fn shutdown(self) -> Result<()> {
        self.motor.shutdown().await
    }
}

/// Incremental move started by [`Ramp::walk_angle`]
#[derive(Debug)]
pub struct AngleWalk<'a, P: OutputPin> {
    walk: Walk<'a, P>,
    geometry: RampGeometry,
}

impl<P: OutputPin> AngleWalk<'_, P> {
    /// Move the next increment, returning the angle reached.
    pub async fn advance(&mut self) -> Result<Option<f64>> {
        Ok(self
            .walk
            .advance()
            .await?
            .map(|position| self.geometry.angle_for(position)))
    }
}
