//! Serial-to-servo bridge: every byte received over a serial port is written,
//! unmodified, as the position of a hobby servo.
//!
//! The crate is HAL-agnostic. Serial input is anything implementing
//! [`embedded_io::Read`] + [`embedded_io::ReadReady`], the servo runs on any
//! [`embedded_hal::pwm::SetDutyCycle`] channel. Board wiring lives in the `demos` package.
//!
//! # Example
//!
//! ```no_run
//! # fn example<U, P>(uart: U, pwm: P) -> Result<(), serial_servo::servo::Error<P::Error>>
//! # where
//! #     U: embedded_io::Read + embedded_io::ReadReady,
//! #     P: embedded_hal::pwm::SetDutyCycle,
//! # {
//! use serial_servo::{Bridge, Servo, ServoConfig};
//!
//! // pwm must already run at 50Hz, uart at serial_servo::BAUD_RATE
//! let servo = Servo::new("servo", ServoConfig::hobby(), pwm)?;
//! let mut bridge = Bridge::new(uart, servo);
//! bridge.run()
//! # }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod intensity;
pub mod serial;
pub mod servo;
pub mod servo_config;
pub mod utils;

pub use bridge::Bridge;
pub use intensity::{IntensityConfig, IntensityEstimator, intensity_to_angle};
pub use serial::{BAUD_RATE, SerialInput};
pub use servo::{Servo, ServoWrite};
pub use servo_config::ServoConfig;
