//! In-memory output pins
//!
//! Used by `rampd --mock` to run without hardware and by the tests to
//! inspect what the driver wrote.

use crate::gpio::{Level, OutputPin};
use async_trait::async_trait;
use ramp_core::{RampError, Result};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct PinState {
    level: Level,
    history: Vec<Level>,
    released: bool,
    /// Remaining writes before `set_level` starts failing
    fail_after: Option<usize>,
}

/// Output pin which only records the levels written to it
#[derive(Debug)]
pub struct MockPin {
    number: u32,
    state: Arc<Mutex<PinState>>,
}

/// Inspection handle sharing the state of a [`MockPin`]
#[derive(Debug, Clone)]
pub struct MockPinHandle {
    state: Arc<Mutex<PinState>>,
}

impl MockPin {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            state: Arc::new(Mutex::new(PinState {
                level: Level::Low,
                history: Vec::new(),
                released: false,
                fail_after: None,
            })),
        }
    }

    /// Pin whose writes fail once `writes` writes went through
    pub fn failing_after(number: u32, writes: usize) -> Self {
        let pin = Self::new(number);
        pin.lock().fail_after = Some(writes);
        pin
    }

    pub fn handle(&self) -> MockPinHandle {
        MockPinHandle {
            state: self.state.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PinState> {
        // a poisoned lock only means a test panicked while holding it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MockPinHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, PinState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current level
    pub fn level(&self) -> Level {
        self.lock().level
    }

    /// Every level written so far, in order
    pub fn history(&self) -> Vec<Level> {
        self.lock().history.clone()
    }

    /// Number of writes driving the pin high
    pub fn high_writes(&self) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|level| **level == Level::High)
            .count()
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }
}

#[async_trait]
impl OutputPin for MockPin {
    async fn set_level(&mut self, level: Level) -> Result<()> {
        let number = self.number;
        let mut state = self.lock();
        if state.released {
            return Err(RampError::Gpio(format!("GPIO {} already released", number)));
        }
        match state.fail_after {
            Some(0) => {
                return Err(RampError::Gpio(format!("GPIO {} write failed", number)));
            }
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }
        state.level = level;
        state.history.push(level);
        Ok(())
    }

    async fn level(&mut self) -> Result<Level> {
        Ok(self.lock().level)
    }

    async fn release(&mut self) -> Result<()> {
        self.lock().released = true;
        Ok(())
    }
}
