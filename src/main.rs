//! # BMV Reader
//!
//! Polls a Victron BMV 600/602 battery monitor over VE.Direct and publishes
//! each reading to the ingress API.

use anyhow::{Context, Result};
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use bmv_reader::bmv::{BmvModel, BmvReader};
use bmv_reader::config::Config;
use bmv_reader::error::BmvError;
use bmv_reader::publisher::Publisher;
use bmv_reader::serial::BmvSerial;

/// Main entry point for BMV Reader
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration from the TOML file given as first argument,
///      or from environment variables
///
/// 2. **Main Loop**
///    - Every `fetch_interval_s` seconds read one frame and publish it
///    - Frame and publishing failures are logged; the next interval retries
///    - Transport faults drop the serial port, which is reopened next interval
///
/// 3. **Graceful Shutdown**
///    - Ctrl+C stops the loop, also in the middle of a cycle
///
/// # Examples
///
/// ```bash
/// BMV_MODEL=602 DEVICE_TOKEN=... cargo run --release
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("BMV Reader v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("Failed to load {}", path))?,
        None => Config::from_env().context("Failed to read configuration from environment")?,
    };
    let model = config.model()?;
    let publisher = Publisher::new(&config.publisher)?;

    info!(
        "Reading {} on {} every {}s, publishing to {}",
        model,
        config.serial.port,
        config.publisher.fetch_interval_s,
        publisher.url()
    );

    // First cycle after one full interval, like every later cycle
    let period = Duration::from_secs(config.publisher.fetch_interval_s);
    let mut poll = interval_at(Instant::now() + period, period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut reader: Option<BmvReader<BmvSerial>> = None;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = poll.tick() => {}
            _ = &mut shutdown => break,
        }

        // A cycle blocked on the serial port or the ingress API must not delay shutdown
        let outcome = tokio::select! {
            result = read_and_publish(&mut reader, &config, model, &publisher) => Some(result),
            _ = &mut shutdown => None,
        };

        match outcome {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                report(&e);
                if e.is_transport_fault() {
                    reader = None;
                }
            }
            None => break,
        }
    }

    info!("Received Ctrl+C, shutting down...");
    Ok(())
}

/// One polling cycle: make sure the port is open, read, publish
async fn read_and_publish(
    reader: &mut Option<BmvReader<BmvSerial>>,
    config: &Config,
    model: BmvModel,
    publisher: &Publisher,
) -> Result<(), BmvError> {
    let reader = match reader {
        Some(reader) => reader,
        slot @ None => slot.insert(BmvReader::new(BmvSerial::open(&config.serial)?, model)),
    };

    info!("Reading values from BMV ...");
    let reading = reader.get_reading().await?;
    publisher.publish(&reading).await?;
    Ok(())
}

/// How a failed cycle is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// No usable frame this interval
    Frame,
    /// The device sent something the parser does not expect
    Protocol,
    /// Serial port gone; reopened next interval
    Transport,
    /// Anything else, usually publishing
    Cycle,
}

fn classify(e: &BmvError) -> Failure {
    match e {
        e if e.is_frame_error() => Failure::Frame,
        BmvError::Format { .. } => Failure::Protocol,
        e if e.is_transport_fault() => Failure::Transport,
        _ => Failure::Cycle,
    }
}

fn report(e: &BmvError) {
    match classify(e) {
        Failure::Frame => warn!("No reading this interval: {}", e),
        Failure::Protocol => error!("Unexpected value from BMV, protocol assumptions violated: {}", e),
        Failure::Transport => error!("Serial transport failed, reopening next interval: {}", e),
        Failure::Cycle => error!("Read-and-publish cycle failed: {}", e),
    }
}
