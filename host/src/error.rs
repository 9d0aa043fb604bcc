use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Serial sink lock poisoned")]
    SinkPoisoned,
}

pub type Result<T> = std::result::Result<T, HostError>;
