//! Interactive ramp control
//!
//! Reads one target angle in degrees per line and moves the ramp there in
//! `ramp.step_size` increments. A shutdown request is honored between lines
//! and between increments, never in the middle of one.

use crate::mqtt::Records;
use ramp_core::{RampError, Result, Status};
use ramp_hardware::{OutputPin, Ramp};
use std::time::SystemTime;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    /// Input was closed
    EndOfInput,
    /// Shutdown was requested
    Shutdown,
}

/// Parse a target angle given in degrees
pub(crate) fn parse_degrees(input: &str) -> Result<f64> {
    let degrees: f64 = input
        .trim()
        .parse()
        .map_err(|_| RampError::InvalidInput(format!("'{}' is not an angle", input.trim())))?;
    if !degrees.is_finite() {
        return Err(RampError::InvalidInput(format!(
            "'{}' is not a finite angle",
            input.trim()
        )));
    }
    Ok(degrees)
}

pub(crate) struct Session<'a, P: OutputPin, W> {
    ramp: &'a mut Ramp<P>,
    records: &'a Records,
    output: W,
    shutdown: watch::Receiver<bool>,
}

impl<'a, P: OutputPin, W: AsyncWrite + Unpin> Session<'a, P, W> {
    pub fn new(
        ramp: &'a mut Ramp<P>,
        records: &'a Records,
        output: W,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            ramp,
            records,
            output,
            shutdown,
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Process lines from `input` until it closes or shutdown is requested.
    ///
    /// Invalid angles and targets outside the motor limits are reported and
    /// skipped; hardware errors end the session.
    pub async fn run(mut self, mut input: mpsc::Receiver<String>) -> Result<Exit> {
        self.records.emit(&self.records.status(Status::Ready));
        self.write("Enter angles in degrees\n").await?;

        loop {
            if self.shutdown_requested() {
                return Ok(Exit::Shutdown);
            }
            self.write(">>> ").await?;

            let line = tokio::select! {
                line = input.recv() => line,
                changed = self.shutdown.changed() => match changed {
                    Ok(()) => continue,
                    // sender gone, nobody can request shutdown anymore
                    Err(_) => input.recv().await,
                },
            };
            let Some(line) = line else {
                self.write("\n").await?;
                return Ok(Exit::EndOfInput);
            };
            if line.trim().is_empty() {
                continue;
            }

            let reply = match self.handle_line(&line).await {
                Ok(degrees) => format!("{:.2}\n", degrees),
                Err(e @ (RampError::InvalidInput(_) | RampError::OutOfRange { .. })) => {
                    warn!("Rejected target '{}': {}", line.trim(), e);
                    format!("error: {}\n", e)
                }
                Err(e) => return Err(e),
            };
            self.write(&reply).await?;
        }
    }

    /// Move to the angle on `line`, returning the reached angle in degrees
    async fn handle_line(&mut self, line: &str) -> Result<f64> {
        let target = parse_degrees(line)?.to_radians();
        let records = self.records;

        let mut walk = self.ramp.walk_angle(target)?;
        info!("Moving ramp to {} rad", target);
        records.emit(&records.status(Status::Busy));

        while let Some(angle) = walk.advance().await? {
            debug!("Ramp at {} rad", angle);
            records.emit(&records.current(angle));
            if *self.shutdown.borrow() {
                info!("Shutdown requested, stopping at {} rad", angle);
                break;
            }
        }

        let angle = self.ramp.angle();
        records.emit(&records.current(angle));
        records.emit(&records.timestamp(SystemTime::now()));
        records.emit(&records.status(Status::Ready));
        Ok(angle.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramp_core::config::{MotorConfig, MqttConfig, RampConfig, TopicsConfig};
    use ramp_core::Direction;
    use ramp_hardware::{A4988Pins, MockPin, MockPinHandle, WormMotor, A4988};

    async fn mock_ramp() -> (Ramp<MockPin>, MockPinHandle) {
        let pins = A4988Pins {
            enable: MockPin::new(0),
            sleep: MockPin::new(1),
            step: MockPin::new(19),
            dir: MockPin::new(18),
        };
        let step = pins.step.handle();
        let motor_config = MotorConfig {
            direction: Direction::Low,
            step_width: 0.25,
            pps: 1000,
            limit_lower: 0.0,
            limit_upper: 80.0,
        };
        let driver = A4988::new(pins).await.unwrap();
        let motor = WormMotor::new(driver, &motor_config, true).await.unwrap();
        let ramp_config = RampConfig {
            base_length: 70.0,
            offset: 0.0,
            step_size: 0.05,
        };
        (Ramp::new(motor, &ramp_config), step)
    }

    fn records() -> Records {
        Records::new(&MqttConfig::default(), &TopicsConfig::default())
    }

    async fn run_lines(ramp: &mut Ramp<MockPin>, lines: &[&str]) -> (Result<Exit>, String) {
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            tx.send(line.to_string()).await.unwrap();
        }
        drop(tx);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let records = records();
        let mut output = Vec::new();
        let exit = Session::new(ramp, &records, &mut output, shutdown_rx)
            .run(rx)
            .await;
        (exit, String::from_utf8(output).unwrap())
    }

    /// Angles printed after each prompt
    fn replies(output: &str) -> Vec<f64> {
        output
            .split(">>> ")
            .filter_map(|chunk| chunk.trim().parse().ok())
            .collect()
    }

    #[test]
    fn test_parse_degrees() {
        assert_eq!(parse_degrees("20").unwrap(), 20.0);
        assert_eq!(parse_degrees(" 12.5\n").unwrap(), 12.5);
        assert!(matches!(
            parse_degrees("steep").unwrap_err(),
            RampError::InvalidInput(_)
        ));
        assert!(parse_degrees("inf").is_err());
        assert!(parse_degrees("NaN").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_moves_to_each_angle() {
        let (mut ramp, step) = mock_ramp().await;

        let (exit, output) = run_lines(&mut ramp, &["20", "10"]).await;

        assert_eq!(exit.unwrap(), Exit::EndOfInput);
        assert!(output.starts_with("Enter angles in degrees\n>>> "));
        // a step of 0.25 mm on a 70 mm base is about 0.2 degrees
        let replies = replies(&output);
        assert_eq!(replies.len(), 2);
        assert!((replies[0] - 20.0).abs() < 0.25);
        assert!((replies[1] - 10.0).abs() < 0.25);
        assert!(step.high_writes() > 0);
        assert!((ramp.angle().to_degrees() - 10.0).abs() < 0.25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_and_out_of_range_input_continue() {
        let (mut ramp, step) = mock_ramp().await;

        let (exit, output) = run_lines(&mut ramp, &["up", "", "60", "5"]).await;

        assert_eq!(exit.unwrap(), Exit::EndOfInput);
        assert!(output.contains("error: Invalid input: 'up' is not an angle"));
        assert!(output.contains("error: step count"));
        let replies = replies(&output);
        assert_eq!(replies.len(), 1);
        assert!((replies[0] - 5.0).abs() < 0.25);
        assert!(step.high_writes() > 0);
    }

    #[tokio::test]
    async fn test_shutdown_before_input() {
        let (mut ramp, step) = mock_ramp().await;
        let (_tx, rx) = mpsc::channel::<String>(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let records = records();
        let mut output = Vec::new();
        let exit = Session::new(&mut ramp, &records, &mut output, shutdown_rx)
            .run(rx)
            .await
            .unwrap();

        assert_eq!(exit, Exit::Shutdown);
        assert_eq!(step.high_writes(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_while_waiting_for_input() {
        let (mut ramp, _step) = mock_ramp().await;
        let (_tx, rx) = mpsc::channel::<String>(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let records = records();
        let mut output = Vec::new();
        let session = Session::new(&mut ramp, &records, &mut output, shutdown_rx).run(rx);
        let trigger = async {
            tokio::task::yield_now().await;
            shutdown_tx.send(true).unwrap();
        };
        let (exit, ()) = tokio::join!(session, trigger);

        assert_eq!(exit.unwrap(), Exit::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hardware_error_ends_session() {
        let pins = A4988Pins {
            enable: MockPin::new(0),
            sleep: MockPin::new(1),
            step: MockPin::failing_after(19, 3),
            dir: MockPin::new(18),
        };
        let driver = A4988::new(pins).await.unwrap();
        let motor = WormMotor::new(driver, &MotorConfig::default(), false)
            .await
            .unwrap();
        let mut ramp = Ramp::new(motor, &RampConfig::default());

        let (exit, _output) = run_lines(&mut ramp, &["30"]).await;

        assert!(matches!(exit.unwrap_err(), RampError::Gpio(_)));
    }
}
