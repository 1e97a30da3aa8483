use crate::prelude::*;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Appends every published snapshot to a JSON-lines file.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    file: Arc<Mutex<std::fs::File>>,
    path: String,
    snapshots_written: Arc<Mutex<u64>>,
}

impl SnapshotWriter {
    pub fn new(path: &str) -> Result<Self> {
        info!("Opening snapshot file at {}", path);

        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to open snapshot file {}: {}", path, e);
                return Err(e.into());
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)) {
                error!("Failed to set permissions on snapshot file {}: {}", path, e);
                return Err(e.into());
            }
        }

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path: path.to_string(),
            snapshots_written: Arc::new(Mutex::new(0)),
        })
    }

    pub fn write_snapshot(
        &self,
        datalog: Serial,
        inverter: Serial,
        snapshot: &TelemetrySnapshot,
    ) -> Result<()> {
        let timestamp = snapshot
            .updated_at
            .unwrap_or_else(chrono::Utc::now)
            .timestamp();

        let json = serde_json::json!({
            "utc_timestamp": timestamp,
            "datalog": datalog,
            "serial": inverter,
            "values": snapshot.values,
        });
        let json_string = serde_json::to_string(&json)?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("Failed to lock snapshot file"))?;
        if let Err(e) = writeln!(file, "{}", json_string).and_then(|_| file.flush()) {
            error!("Failed to write to snapshot file {}: {}", self.path, e);
            return Err(e.into());
        }

        let mut written = self
            .snapshots_written
            .lock()
            .map_err(|_| anyhow!("Failed to lock snapshot counter"))?;
        *written += 1;
        debug!("{}: {} snapshots written", self.path, *written);

        Ok(())
    }

    /// Write each snapshot the poller publishes until shutdown.
    pub async fn run(
        &self,
        datalog: Serial,
        inverter: Serial,
        mut reader: SnapshotReader,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                snapshot = reader.changed() => match snapshot {
                    Ok(snapshot) => {
                        if let Err(e) = self.write_snapshot(datalog, inverter, &snapshot) {
                            warn!("snapshot {}: {}", datalog, e);
                        }
                    }
                    Err(e) => {
                        debug!("snapshot writer stopping: {}", e);
                        break;
                    }
                },
                _ = shutdown.recv() => break,
            }
        }

        Ok(())
    }
}
