//! Where intensities end up: one angle byte per value on the servo's serial port.

use crate::error::Result;
use serial_servo::intensity_to_angle;
use std::io::Write;
use std::time::Duration;

pub trait IntensitySink: Send {
    /// Sends `intensity` to the servo. Returns the angle byte that was written.
    fn set_intensity(&mut self, intensity: f32) -> Result<u8>;
}

pub struct SerialSink<W: Write + Send> {
    writer: W,
    max_degrees: u8,
}

impl<W: Write + Send> SerialSink<W> {
    pub fn new(writer: W, max_degrees: u8) -> Self {
        Self {
            writer,
            max_degrees,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> IntensitySink for SerialSink<W> {
    fn set_intensity(&mut self, intensity: f32) -> Result<u8> {
        let angle = intensity_to_angle(intensity, self.max_degrees);
        self.writer.write_all(&[angle])?;
        self.writer.flush()?;
        tracing::debug!("intensity {intensity:.2} -> angle {angle}");
        Ok(angle)
    }
}

/// Opens the firmware's serial port (8N1, no flow control).
pub fn open_serial(
    path: &str,
    baud_rate: u32,
    max_degrees: u8,
) -> Result<SerialSink<Box<dyn serialport::SerialPort>>> {
    let port = serialport::new(path, baud_rate)
        .timeout(Duration::from_secs(1))
        .open()?;
    Ok(SerialSink::new(port, max_degrees))
}
