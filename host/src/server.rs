//! WebSocket accept loop and per-client message pump.

use crate::error::{HostError, Result};
use crate::protocol::Session;
use crate::sink::IntensitySink;
use futures_util::{SinkExt, StreamExt};
use serial_servo::IntensityConfig;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

/// Serial sink shared by all connected clients.
pub type SharedSink = Arc<Mutex<Box<dyn IntensitySink>>>;

/// Accepts clients forever. Each one gets its own session and estimator.
pub async fn serve(listener: TcpListener, config: IntensityConfig, sink: SharedSink) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let config = config.clone();
        let sink = sink.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, config, sink).await {
                warn!("client {peer} dropped: {e}");
            }
        });
    }
}

pub async fn handle_client(stream: TcpStream, config: IntensityConfig, sink: SharedSink) -> Result<()> {
    let mut ws = tokio_tungstenite::accept_async(stream).await?;
    info!("Client connected!");

    let connected_at = Instant::now();
    let mut session = Session::new(config);

    loop {
        let next = match session.idle_timeout() {
            Some(limit) => match tokio::time::timeout(limit, ws.next()).await {
                Ok(next) => next,
                Err(_) => {
                    info!("Stop by timeout");
                    let intensity = session.on_idle();
                    apply(&sink, intensity)?;
                    continue;
                }
            },
            None => ws.next().await,
        };

        let text = match next {
            None | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => break,
            Some(Err(e)) => return Err(e.into()),
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) => break,
            Some(Ok(_)) => continue,
        };
        debug!("< {}", text.as_str());

        let now_ms = connected_at.elapsed().as_millis() as u32;
        let reply = session.handle_text(text.as_str(), now_ms);
        if let Some(intensity) = reply.intensity {
            apply(&sink, intensity)?;
        }

        let response = reply.response.to_string();
        debug!("> {response}");
        ws.send(Message::text(response)).await?;
    }

    info!("Client disconnected");
    Ok(())
}

fn apply(sink: &SharedSink, intensity: f32) -> Result<()> {
    let mut sink = sink.lock().map_err(|_| HostError::SinkPoisoned)?;
    sink.set_intensity(intensity)?;
    Ok(())
}
