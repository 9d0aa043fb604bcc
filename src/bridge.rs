//! Polling loop forwarding serial bytes to a servo.
//!
//! # Example
//!
//! ```no_run
//! # fn example<S: serial_servo::SerialInput, W: serial_servo::ServoWrite>(uart: S, servo: W) -> ! {
//! use serial_servo::Bridge;
//!
//! // uart and servo are created by the board setup
//! let mut bridge = Bridge::new(uart, servo);
//! bridge.run()
//! # }
//! ```

use crate::{serial::SerialInput, servo::ServoWrite};
use log::{trace, warn};

/// Failure of a single [`Bridge::poll`] iteration.
#[derive(Debug, thiserror::Error)]
pub enum Error<S: core::fmt::Debug, W: core::fmt::Debug> {
    #[error("serial input failed: {0:?}")]
    Serial(S),
    #[error("servo write of {position} failed: {err:?}")]
    Servo { position: u8, err: W },
}

/// Owns the serial input and the servo and shuttles bytes between them.
pub struct Bridge<S: SerialInput, W: ServoWrite> {
    serial: S,
    servo: W,
}

impl<S: SerialInput, W: ServoWrite> Bridge<S, W> {
    pub fn new(serial: S, servo: W) -> Self {
        Self { serial, servo }
    }

    /// One loop iteration.
    ///
    /// If a byte is available it is consumed and written to the servo exactly once,
    /// unmodified, and returned. Returns `Ok(None)` without touching the servo otherwise.
    pub fn poll(&mut self) -> Result<Option<u8>, Error<S::Error, W::Error>> {
        if !self.serial.available().map_err(Error::Serial)? {
            return Ok(None);
        }

        let position = self.serial.read_byte().map_err(Error::Serial)?;
        self.servo
            .write(position)
            .map_err(|err| Error::Servo { position, err })?;
        trace!("forwarded {}", position);
        Ok(Some(position))
    }

    /// Polls forever without sleeping. Failed iterations are logged and skipped.
    pub fn run(&mut self) -> ! {
        loop {
            if let Err(err) = self.poll() {
                warn!("{}", err);
            }
        }
    }

    /// Gives back the serial port and the servo.
    pub fn release(self) -> (S, W) {
        (self.serial, self.servo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{
        ReadError,
        tests::{MockSerial, MockSerialError},
    };
    use crate::servo::{Servo, tests::MockPwm};
    use crate::ServoConfig;

    /// Records every position it is asked to write.
    #[derive(Default)]
    struct RecordingServo {
        writes: Vec<u8>,
        fail: bool,
    }

    impl ServoWrite for RecordingServo {
        type Error = &'static str;

        fn write(&mut self, position: u8) -> Result<(), Self::Error> {
            if self.fail {
                return Err("stalled");
            }
            self.writes.push(position);
            Ok(())
        }
    }

    fn bridge(bytes: &[u8]) -> Bridge<MockSerial, RecordingServo> {
        Bridge::new(MockSerial::with_bytes(bytes), RecordingServo::default())
    }

    #[test]
    fn every_byte_is_forwarded_unmodified() {
        for b in 0..=u8::MAX {
            let mut bridge = bridge(&[b]);
            assert_eq!(bridge.poll().unwrap(), Some(b));
            let (_, servo) = bridge.release();
            assert_eq!(servo.writes, vec![b]);
        }
    }

    #[test]
    fn single_byte_scenario() {
        let mut bridge = bridge(&[0x5A]);
        bridge.poll().unwrap();
        assert_eq!(bridge.release().1.writes, vec![90]);
    }

    #[test]
    fn bytes_are_written_in_order_one_per_poll() {
        let mut bridge = bridge(&[0x0A, 0xB4]);

        assert_eq!(bridge.poll().unwrap(), Some(10));
        assert_eq!(bridge.serial.rx.len(), 1);
        assert_eq!(bridge.servo.writes, vec![10]);

        assert_eq!(bridge.poll().unwrap(), Some(180));
        assert_eq!(bridge.servo.writes, vec![10, 180]);
        assert_eq!(bridge.serial.reads, 2);
    }

    #[test]
    fn idle_port_never_writes() {
        let mut bridge = bridge(&[]);
        for _ in 0..1000 {
            assert_eq!(bridge.poll().unwrap(), None);
        }
        let (serial, servo) = bridge.release();
        assert!(servo.writes.is_empty());
        assert_eq!(serial.reads, 0);
    }

    #[test]
    fn serial_failure_skips_write() {
        let mut bridge = bridge(&[1]);
        bridge.serial.fail = true;
        assert!(matches!(bridge.poll(), Err(Error::Serial(_))));
        assert!(bridge.servo.writes.is_empty());

        bridge.serial.fail = false;
        assert_eq!(bridge.poll().unwrap(), Some(1));
    }

    #[test]
    fn failed_read_skips_write() {
        let mut bridge = bridge(&[7]);
        bridge.serial.fail_read = true;
        assert!(matches!(
            bridge.poll(),
            Err(Error::Serial(ReadError::Io(MockSerialError)))
        ));
        assert!(bridge.servo.writes.is_empty());

        bridge.serial.fail_read = false;
        assert_eq!(bridge.poll().unwrap(), Some(7));
    }

    #[test]
    fn servo_failure_reports_position() {
        let mut bridge = bridge(&[42]);
        bridge.servo.fail = true;
        assert!(matches!(
            bridge.poll(),
            Err(Error::Servo {
                position: 42,
                err: "stalled"
            })
        ));
        // the byte was consumed
        assert!(bridge.serial.rx.is_empty());
    }

    #[test]
    fn drives_real_servo() {
        let servo = Servo::new("bridge", ServoConfig::hobby(), MockPwm::default()).unwrap();
        let mut bridge = Bridge::new(MockSerial::with_bytes(&[0x0A, 0xB4]), servo);
        while bridge.poll().unwrap().is_some() {}

        let (_, servo) = bridge.release();
        assert!((servo.get_angle() - 180.0).abs() < 0.01);
        // center, 10 degrees, 180 degrees
        assert_eq!(servo.release().duties.len(), 3);
    }
}
