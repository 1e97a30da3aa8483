pub mod config; // Configuration loading and validation
pub mod error; // Domain error kinds
pub mod lxp; // Dongle protocol: frames, codec and transport
pub mod options; // Command line options parsing
pub mod poller; // Per-dongle polling state machine
pub mod prelude; // Common imports and types
pub mod sensors; // Field -> sink registry
pub mod snapshot_writer; // JSON-lines snapshot output
pub mod telemetry; // Telemetry fields and snapshots
pub mod utils; // Utility functions

// Get the package version from Cargo.toml
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;

use crate::lxp::dongle::TcpTransport;
use crate::options::Options;
use crate::poller::Poller;
use crate::sensors::SensorRegistry;
use crate::snapshot_writer::SnapshotWriter;
use std::io::Write;

/// Install the global logger. `RUST_LOG` wins over `level`.
///
/// Returns false if a logger was already installed.
pub fn init_logging(level: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
        .is_ok()
}

pub fn print_fields() {
    println!("{:<40} {:<8} CATEGORY", "FIELD", "KIND");
    for field in Field::ALL {
        println!(
            "{:<40} {:<8} {:?}",
            field.name(),
            format!("{:?}", field.kind()),
            field.category()
        );
    }
}

/// Main application entry point
///
/// Loads the configuration, then runs one poller (plus its sensor registry and,
/// if configured, a snapshot writer) per enabled dongle until Ctrl+C or the
/// runtime limit.
pub async fn app(options: Options) -> Result<()> {
    let config = Config::new(options.config_file.clone())?;

    init_logging(config.loglevel());
    info!(
        "luxpower-poller {} starting with config file: {}",
        CARGO_PKG_VERSION, options.config_file
    );
    config.log_summary();

    let writer = match config.snapshot_file() {
        Some(path) => Some(SnapshotWriter::new(path)?),
        None => None,
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Ctrl+C received, shutting down");
        let _ = tx.send(());
    });

    if let Some(secs) = options.runtime {
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
            info!("runtime limit of {}s reached, shutting down", secs);
            let _ = tx.send(());
        });
    }

    let mut handles = Vec::new();
    for dongle in config.enabled_dongles() {
        let datalog = dongle.dongle_serial();
        let inverter = dongle.inverter_serial();

        let mut registry = SensorRegistry::from_config(&dongle)?;
        let transport = TcpTransport::from_config(&dongle);
        let (mut poller, reader) = Poller::new(dongle, transport);

        info!(
            "  Starting poller for dongle {} (inverter {}, {} sensors)",
            datalog,
            inverter,
            registry.len()
        );

        let shutdown = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move { poller.run(shutdown).await }));

        let shutdown = shutdown_tx.subscribe();
        let sensor_reader = reader.clone();
        handles.push(tokio::spawn(async move {
            registry.run(sensor_reader, shutdown).await
        }));

        if let Some(writer) = writer.clone() {
            let shutdown = shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                writer.run(datalog, inverter, reader, shutdown).await
            }));
        }
    }

    if handles.is_empty() {
        warn!("no enabled dongles, nothing to do");
        return Ok(());
    }

    for result in futures::future::join_all(handles).await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("task failed: {}", e),
            Err(e) => error!("Error waiting for task: {}", e),
        }
    }

    info!("Application shutdown complete");
    Ok(())
}
