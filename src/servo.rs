//! Servo motor driver implementation.
//!
//! This module provides the [`Servo`] struct for controlling servo motors
//! through any [`SetDutyCycle`] PWM channel and the [`ServoWrite`] trait the
//! polling loop writes through.

use crate::{servo_config::ServoConfig, utils};
use core::ops::Range;
use embedded_hal::pwm::SetDutyCycle;
use log::{info, trace};

/// Error returned by the PWM channel driving the servo.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: core::fmt::Debug> {
    #[error("pwm channel error: {0:?}")]
    Pwm(E),
}

/// Single-byte position write, the only thing the serial bridge needs from a servo.
pub trait ServoWrite {
    type Error: core::fmt::Debug;

    /// Moves the servo to `position`, the raw value received from the host.
    fn write(&mut self, position: u8) -> Result<(), Self::Error>;
}

/// Servo motor driver instance.
///
/// This struct represents a servo motor connected to a PWM channel that already
/// runs at the frequency from [`ServoConfig`]. Position is controlled by angle.
pub struct Servo<P: SetDutyCycle> {
    name: &'static str,
    pwm: P,
    /// Valid duty cycle range in absolute values (e.g., 1782..7864 for a hobby servo on a 16-bit channel).
    /// This corresponds to the pulse width range of the servo.
    pub duty_range: Range<f32>,
    config: ServoConfig,
    /// Cached max duty value for further calculations.
    max_duty: f32,
    /// Current duty in absolute value (0..max_duty).
    current_duty: f32,
}

impl<P: SetDutyCycle> Servo<P> {
    /// Attaches servo driver to a PWM channel and moves it to the center position.
    ///
    /// # Arguments
    ///
    /// * `name` - Name identifier for the servo (for logging)
    /// * `config` - Servo configuration
    /// * `pwm` - PWM channel configured for `config.frequency_hz`
    pub fn new(name: &'static str, config: ServoConfig, mut pwm: P) -> Result<Self, Error<P::Error>> {
        let max_duty = pwm.max_duty_cycle() as f32;
        let duty_range = config.calc_duty_range(max_duty);

        let center_duty = duty_range.start + (duty_range.end - duty_range.start) / 2.0;
        pwm.set_duty_cycle(center_duty as u16).map_err(Error::Pwm)?;

        info!(
            "{name} servo: duty_range={duty_range:?}, center_duty={center_duty}",
            name = name,
            duty_range = duty_range,
            center_duty = center_duty,
        );

        Ok(Servo {
            name,
            pwm,
            duty_range,
            config,
            current_duty: center_duty,
            max_duty,
        })
    }

    /// Sets servo to specified angle in degrees.
    /// Angles outside `0..=max_angle` are constrained to the nearest bound.
    /// Returns true if angle was changed, false if already at that position.
    pub fn set_angle(&mut self, angle: f32) -> Result<bool, Error<P::Error>> {
        let new_duty = self.config.angle_to_duty(angle, &self.duty_range);
        if utils::approx_eq(new_duty, self.current_duty) {
            return Ok(false);
        }

        self.pwm.set_duty_cycle(new_duty as u16).map_err(Error::Pwm)?;
        self.current_duty = new_duty;
        trace!(
            "{} servo angle({}) to duty={}/{}",
            &self.name, angle, new_duty, self.max_duty
        );
        Ok(true)
    }

    /// Returns current angle value in degrees.
    pub fn get_angle(&self) -> f32 {
        self.config.duty_to_angle(self.current_duty, &self.duty_range)
    }

    /// Returns the size of the duty range (difference between max and min duty values).
    pub fn duty_range(&self) -> f32 {
        self.duty_range.end - self.duty_range.start
    }

    /// Detaches the driver and gives the PWM channel back.
    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> ServoWrite for Servo<P> {
    type Error = Error<P::Error>;

    /// Interprets `position` as degrees. Anything past `max_angle` ends up at `max_angle`.
    fn write(&mut self, position: u8) -> Result<(), Self::Error> {
        let moved = self.set_angle(position as f32)?;
        trace!("{} servo write({}) moved={}", self.name, position, moved);
        Ok(())
    }
}
