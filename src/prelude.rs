pub use anyhow::{anyhow, bail, Result};
pub use log::{debug, error, info, trace, warn};
pub use std::str::FromStr;
pub use tokio::sync::{broadcast, watch};

pub use crate::config::{self, Config};
pub use crate::error::Error;
pub use crate::lxp;
pub use crate::lxp::dongle::Serial;
pub use crate::lxp::packet::{Packet, PacketCommon};
pub use crate::telemetry::{Field, FieldKind, SnapshotReader, TelemetrySnapshot, Value};
pub use crate::utils::Utils;
