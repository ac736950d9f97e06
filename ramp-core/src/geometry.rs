//! Conversion between ramp angles and motor positions
//!
//! The motor moves the side of the ramp opposite to the angle, so
//! `tan(angle) = position / base_length`.

use crate::config::RampConfig;

/// Ramp geometry in millimeters and radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampGeometry {
    base_length: f64,
    /// Angle offset stored as a position, since tan(a + b) != tan(a) + tan(b)
    offset_position: f64,
}

impl RampGeometry {
    pub fn new(base_length: f64, offset: f64) -> Self {
        Self {
            base_length,
            offset_position: offset.tan() * base_length,
        }
    }

    /// Motor position that results in `angle`
    pub fn position_for(&self, angle: f64) -> f64 {
        angle.tan() * self.base_length - self.offset_position
    }

    /// Ramp angle at motor position `position`
    pub fn angle_for(&self, position: f64) -> f64 {
        ((position + self.offset_position) / self.base_length).atan()
    }

    /// Motor travel corresponding to an angle increment starting at zero
    pub fn distance_for(&self, angle: f64) -> f64 {
        angle.tan() * self.base_length
    }
}

impl From<&RampConfig> for RampGeometry {
    fn from(config: &RampConfig) -> Self {
        Self::new(config.base_length, config.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_forty_five_degrees_is_base_length() {
        let geometry = RampGeometry::new(70.0, 0.0);
        assert!((geometry.position_for(FRAC_PI_4) - 70.0).abs() < EPSILON);
        assert!((geometry.angle_for(70.0) - FRAC_PI_4).abs() < EPSILON);
    }

    #[test]
    fn test_flat_ramp_at_zero() {
        let geometry = RampGeometry::new(70.0, 0.0);
        assert_eq!(geometry.position_for(0.0), 0.0);
        assert_eq!(geometry.angle_for(0.0), 0.0);
    }

    #[test]
    fn test_offset_shifts_position() {
        let offset: f64 = 0.1;
        let geometry = RampGeometry::new(70.0, offset);

        // position zero already corresponds to the offset angle
        assert!((geometry.angle_for(0.0) - offset).abs() < EPSILON);
        assert!(geometry.position_for(offset).abs() < EPSILON);

        let angle: f64 = 0.3;
        let expected = angle.tan() * 70.0 - offset.tan() * 70.0;
        assert!((geometry.position_for(angle) - expected).abs() < EPSILON);
    }

    #[test]
    fn test_angle_position_roundtrip() {
        let geometry = RampGeometry::new(70.0, 0.05);
        for degrees in [1.0_f64, 10.0, 25.0, 40.0] {
            let angle = degrees.to_radians();
            let back = geometry.angle_for(geometry.position_for(angle));
            assert!((back - angle).abs() < EPSILON, "{} degrees", degrees);
        }
    }

    #[test]
    fn test_distance_for_step_size() {
        let geometry = RampGeometry::from(&RampConfig::default());
        let distance = geometry.distance_for(0.0174533);
        assert!((distance - 1.2218).abs() < 1e-3);
    }
}
