//! Host side of the serial servo bridge.
//!
//! Speaks a small subset of the Buttplug v2 device protocol over WebSocket,
//! estimates an intensity from the incoming `VibrateCmd` speeds and writes one
//! angle byte per estimate to the servo firmware's serial port.

pub mod config;
pub mod error;
pub mod logger;
pub mod protocol;
pub mod server;
pub mod sink;

pub use config::HostConfig;
pub use error::{HostError, Result};
pub use protocol::{Reply, Session};
pub use server::{SharedSink, serve};
pub use sink::{IntensitySink, SerialSink};
