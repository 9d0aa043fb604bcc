use anyhow::Context;
use clap::Parser;
use serial_servo_host::{HostConfig, IntensitySink, SharedSink, logger, serve, sink};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HostConfig::parse();
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting serial-servo-host");
    if config.verbose {
        tracing::debug!("Host config: {:?}", config);
    }

    let mut serial = sink::open_serial(&config.serial_port, config.baud_rate, config.servo_max_degrees)
        .with_context(|| format!("failed to open {}", config.serial_port))?;
    // park the servo until a client starts vibrating
    serial.set_intensity(0.0)?;
    let serial: Box<dyn IntensitySink> = Box::new(serial);
    let sink: SharedSink = Arc::new(Mutex::new(serial));

    let listener = TcpListener::bind(("localhost", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!("Listening on ws://localhost:{}", config.port);

    serve(listener, config.intensity_config(), sink).await?;
    Ok(())
}
