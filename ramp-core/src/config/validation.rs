//! Invariant checks on a parsed configuration

use super::StaticConfig;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("motor.limit_lower ({lower}) must be below motor.limit_upper ({upper})")]
    LimitOrder { lower: f64, upper: f64 },

    #[error("ramp.step_size must be below pi/2 (got {0})")]
    StepSize(f64),

    #[error("elevator.duty_cycle must be at most 100 percent (got {0})")]
    DutyCycle(f64),

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("driver.{first} and driver.{second} both use GPIO {pin}")]
    PinConflict {
        first: &'static str,
        second: &'static str,
        pin: u32,
    },

    #[error("mqtt.password requires mqtt.username")]
    PasswordWithoutUsername,
}

impl StaticConfig {
    /// Check the invariants the hardware and the MQTT side rely on.
    ///
    /// Reports the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut floats = vec![
            ("motor.step_width", self.motor.step_width),
            ("motor.limit_lower", self.motor.limit_lower),
            ("motor.limit_upper", self.motor.limit_upper),
            ("ramp.base_length", self.ramp.base_length),
            ("ramp.offset", self.ramp.offset),
            ("ramp.step_size", self.ramp.step_size),
            ("landing_zone.timeout", self.landing_zone.timeout),
            ("elevator.frequency", self.elevator.frequency),
            ("elevator.duty_cycle", self.elevator.duty_cycle),
        ];
        if let Some(swing_time) = self.landing_zone.swing_time {
            floats.push(("landing_zone.swing_time", swing_time));
        }

        for (field, value) in floats {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
            if value < 0.0 {
                return Err(ValidationError::Negative { field, value });
            }
        }

        for (field, value) in [
            ("motor.step_width", self.motor.step_width),
            ("motor.pps", f64::from(self.motor.pps)),
            ("ramp.base_length", self.ramp.base_length),
            ("landing_zone.timeout", self.landing_zone.timeout),
            ("elevator.frequency", self.elevator.frequency),
        ] {
            if value <= 0.0 {
                return Err(ValidationError::NotPositive { field, value });
            }
        }

        if self.motor.limit_lower >= self.motor.limit_upper {
            return Err(ValidationError::LimitOrder {
                lower: self.motor.limit_lower,
                upper: self.motor.limit_upper,
            });
        }

        // tan() turns negative from pi/2 onwards
        if self.ramp.step_size >= std::f64::consts::FRAC_PI_2 {
            return Err(ValidationError::StepSize(self.ramp.step_size));
        }

        if self.elevator.duty_cycle > 100.0 {
            return Err(ValidationError::DutyCycle(self.elevator.duty_cycle));
        }

        for (field, value) in [
            ("mqtt.id", &self.mqtt.id),
            ("mqtt.host", &self.mqtt.host),
            ("topics.status", &self.topics.status),
            ("topics.target", &self.topics.target),
            ("topics.current", &self.topics.current),
            ("topics.timestamp", &self.topics.timestamp),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::Empty { field });
            }
        }

        if self.mqtt.password.is_some() && self.mqtt.username.is_none() {
            return Err(ValidationError::PasswordWithoutUsername);
        }

        let pins = [
            ("enable", self.driver.enable),
            ("sleep", self.driver.sleep),
            ("step", self.driver.step),
            ("dir", self.driver.dir),
        ];
        for (i, &(first, pin)) in pins.iter().enumerate() {
            if let Some(&(second, _)) = pins[i + 1..].iter().find(|(_, other)| *other == pin) {
                return Err(ValidationError::PinConflict { first, second, pin });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(StaticConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_limit_order() {
        let mut config = StaticConfig::default();
        config.motor.limit_lower = 80.0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::LimitOrder {
                lower: 80.0,
                upper: 80.0
            })
        );
    }

    #[test]
    fn test_negative_value() {
        let mut config = StaticConfig::default();
        config.ramp.offset = -0.1;
        assert_eq!(
            config.validate(),
            Err(ValidationError::Negative {
                field: "ramp.offset",
                value: -0.1
            })
        );
    }

    #[test]
    fn test_negative_swing_time() {
        let mut config = StaticConfig::default();
        config.landing_zone.swing_time = Some(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Negative {
                field: "landing_zone.swing_time",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_rejected() {
        let mut config = StaticConfig::default();
        config.motor.step_width = f64::NAN;
        assert_eq!(
            config.validate(),
            Err(ValidationError::NotFinite {
                field: "motor.step_width"
            })
        );
    }

    #[test]
    fn test_zero_step_width() {
        let mut config = StaticConfig::default();
        config.motor.step_width = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NotPositive {
                field: "motor.step_width",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_pps() {
        let mut config = StaticConfig::default();
        config.motor.pps = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NotPositive {
                field: "motor.pps",
                ..
            })
        ));
    }

    #[test]
    fn test_duty_cycle_above_hundred() {
        let mut config = StaticConfig::default();
        config.elevator.duty_cycle = 120.0;
        assert_eq!(config.validate(), Err(ValidationError::DutyCycle(120.0)));
    }

    #[test]
    fn test_step_size_of_quarter_turn() {
        let mut config = StaticConfig::default();
        config.ramp.step_size = std::f64::consts::FRAC_PI_2;
        assert_eq!(
            config.validate(),
            Err(ValidationError::StepSize(std::f64::consts::FRAC_PI_2))
        );

        config.ramp.step_size = 2.0;
        assert_eq!(config.validate(), Err(ValidationError::StepSize(2.0)));

        config.ramp.step_size = 1.5;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_empty_topic() {
        let mut config = StaticConfig::default();
        config.topics.current = "  ".to_string();
        assert_eq!(
            config.validate(),
            Err(ValidationError::Empty {
                field: "topics.current"
            })
        );
    }

    #[test]
    fn test_password_without_username() {
        let mut config = StaticConfig::default();
        config.mqtt.password = Some("secret".to_string());
        assert_eq!(
            config.validate(),
            Err(ValidationError::PasswordWithoutUsername)
        );

        config.mqtt.username = Some("ramp".to_string());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_pin_conflict() {
        let mut config = StaticConfig::default();
        config.driver.dir = config.driver.step;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::PinConflict {
                first: "step",
                second: "dir",
                pin: 19
            }
        );
        assert_eq!(err.to_string(), "driver.step and driver.dir both use GPIO 19");
    }
}
