//! Servo motor configuration.
//!
//! This module provides the [`ServoConfig`] struct for configuring servo motors,
//! including frequency, pulse width range and pre-configured settings for
//! common servo models like SG90 and MG995.

use crate::utils;
use core::ops::Range;

/// Configuration for a servo motor.
///
/// This struct contains all the parameters needed to drive a servo motor,
/// including frequency and pulse width range. The PWM channel
/// itself must already run at [`frequency_hz`](Self::frequency_hz).
#[derive(Debug, Clone, PartialEq)]
pub struct ServoConfig {
    /// Max angle that servo can be turned, mostly 180, 360.
    pub max_angle: f32,
    /// What frequency expect servo (ex. 50Hz for SG90).
    pub frequency_hz: u32,
    /// What pulse width in nanos servo supports (ex. 500000-2400000ns for SG90).
    pub pulse_width_ns: Range<u32>,
}

impl ServoConfig {
    /// Default servo configuration with 50Hz frequency and
    /// pulse width range of 500000-2500000 ns (0.5-2.5ms).
    pub fn default_servo(max_angle: f32) -> Self {
        ServoConfig {
            max_angle,
            frequency_hz: 50,
            // Standard servo pulse width range: 500-2500 us
            pulse_width_ns: 500_000..2_500_000,
        }
    }

    /// Generic hobby servo as driven by the Arduino `Servo` library:
    /// 544-2400 us over 180 degrees.
    pub fn hobby() -> Self {
        Self {
            pulse_width_ns: 544_000..2_400_000,
            ..Self::default_servo(180.0)
        }
    }

    /// Config for [SG90](https://www.friendlywire.com/projects/ne555-servo-safe/SG90-datasheet.pdf).
    /// Can be used for SG90s as well.
    pub fn sg90() -> Self {
        Self {
            pulse_width_ns: 500_000..2_400_000,
            ..Self::default_servo(180.0)
        }
    }

    /// Config for [MG995](https://www.electronicoscaldas.com/datasheet/MG995_Tower-Pro.pdf).
    /// High-torque servo motor with metal gears.
    /// Can be used for MG996, MG996R as well.
    pub fn mg995() -> Self {
        Self::default_servo(180.0)
    }

    /// Calculates duty range in absolute values for this servo configuration.
    /// Returns absolute duty values (0..max_duty), not percentages.
    pub fn calc_duty_range(&self, max_duty: f32) -> Range<f32> {
        utils::calc_duty_range(
            self.pulse_width_ns.clone(),
            self.frequency_hz as f32,
            max_duty,
        )
    }

    /// Transforms absolute duty value to angle in degrees.
    /// Returns angle in degrees (0.0..max_angle).
    pub fn duty_to_angle(&self, duty: f32, duty_range: &Range<f32>) -> f32 {
        utils::duty_to_angle(duty, self.max_angle, duty_range)
    }

    /// Transforms angle in degrees to absolute duty value.
    pub fn angle_to_duty(&self, angle: f32, duty_range: &Range<f32>) -> f32 {
        utils::angle_to_duty(angle, self.max_angle, duty_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_run_at_50hz() {
        for config in [
            ServoConfig::hobby(),
            ServoConfig::sg90(),
            ServoConfig::mg995(),
        ] {
            assert_eq!(config.frequency_hz, 50);
            assert_eq!(config.max_angle, 180.0);
        }
    }

    #[test]
    fn hobby_duty_range_for_16_bit_channel() {
        let config = ServoConfig::hobby();
        let range = config.calc_duty_range(65535.0);
        // 544us / 20ms and 2400us / 20ms of full scale
        assert!((range.start - 1782.5).abs() < 1.0);
        assert!((range.end - 7864.2).abs() < 1.0);
    }
}
