//! Serial input side of the bridge.
//!
//! [`SerialInput`] is implemented for every [`embedded_io`] reader that can
//! report readiness, which covers HAL UARTs and USB CDC-ACM ports alike.

use embedded_io::{Read, ReadReady};

/// Baud rate the host writes at.
pub const BAUD_RATE: u32 = 9600;

/// Error returned by [`SerialInput::read_byte`].
#[derive(Debug, thiserror::Error)]
pub enum ReadError<E: core::fmt::Debug> {
    #[error("serial port error: {0:?}")]
    Io(E),
    /// Port reported data but returned nothing.
    #[error("serial port returned no data")]
    UnexpectedEof,
}

/// Non-blocking byte source.
pub trait SerialInput {
    type Error: core::fmt::Debug;

    /// Returns true if at least one byte can be read without blocking.
    fn available(&mut self) -> Result<bool, Self::Error>;

    /// Consumes exactly one byte. Call only after [`available`](Self::available) returned true,
    /// otherwise the underlying reader may block.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

impl<T: Read + ReadReady> SerialInput for T {
    type Error = ReadError<T::Error>;

    fn available(&mut self) -> Result<bool, Self::Error> {
        self.read_ready().map_err(ReadError::Io)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf).map_err(ReadError::Io)? {
            0 => Err(ReadError::UnexpectedEof),
            _ => Ok(buf[0]),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct MockSerialError;

    impl embedded_io::Error for MockSerialError {
        fn kind(&self) -> embedded_io::ErrorKind {
            embedded_io::ErrorKind::Other
        }
    }

    /// In-memory port. `reads` counts read calls so tests can check nothing was over-consumed.
    #[derive(Default)]
    pub struct MockSerial {
        pub rx: VecDeque<u8>,
        pub reads: usize,
        pub fail: bool,
        /// Reports data but fails on read.
        pub fail_read: bool,
        /// Claims readiness but hands back zero bytes.
        pub lying: bool,
    }

    impl MockSerial {
        pub fn with_bytes(bytes: &[u8]) -> Self {
            Self {
                rx: bytes.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl embedded_io::ErrorType for MockSerial {
        type Error = MockSerialError;
    }

    impl ReadReady for MockSerial {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            if self.fail {
                return Err(MockSerialError);
            }
            Ok(self.lying || self.fail_read || !self.rx.is_empty())
        }
    }

    impl Read for MockSerial {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            self.reads += 1;
            if self.fail_read {
                return Err(MockSerialError);
            }
            if self.lying {
                return Ok(0);
            }
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    #[test]
    fn reads_one_byte_at_a_time() {
        let mut port = MockSerial::with_bytes(&[0x0A, 0xB4]);
        assert!(port.available().unwrap());
        assert_eq!(port.read_byte().unwrap(), 0x0A);
        assert_eq!(port.rx.len(), 1);
        assert_eq!(port.read_byte().unwrap(), 0xB4);
        assert!(!port.available().unwrap());
    }

    #[test]
    fn empty_read_is_an_error() {
        let mut port = MockSerial {
            lying: true,
            ..Default::default()
        };
        assert!(port.available().unwrap());
        assert!(matches!(port.read_byte(), Err(ReadError::UnexpectedEof)));
    }

    #[test]
    fn port_errors_are_wrapped() {
        let mut port = MockSerial {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            port.available(),
            Err(ReadError::Io(MockSerialError))
        ));
    }

    #[test]
    fn read_errors_are_wrapped() {
        let mut port = MockSerial {
            rx: [0x5A].into_iter().collect(),
            fail_read: true,
            ..Default::default()
        };
        assert!(port.available().unwrap());
        assert!(matches!(
            port.read_byte(),
            Err(ReadError::Io(MockSerialError))
        ));
        assert_eq!(port.reads, 1);
        assert_eq!(port.rx.len(), 1);
    }
}
