use crate::prelude::*;

use crate::lxp::codec::Command;
use crate::lxp::packet::INPUT_BANKS;

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use std::net::Ipv4Addr;
use std::time::Duration;

pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 3600);

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub dongles: Vec<Dongle>,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    /// Optional path to write each published snapshot to, as JSON lines
    pub snapshot_file: Option<String>,
}

// Dongle {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Dongle {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub host: String,
    pub port: u16,
    #[serde(deserialize_with = "de_serial")]
    pub dongle_serial: Serial,
    #[serde(deserialize_with = "de_serial")]
    pub inverter_serial_number: Serial,

    #[serde(
        default = "Config::default_update_interval",
        deserialize_with = "de_duration"
    )]
    pub update_interval: Duration,
    #[serde(
        default = "Config::default_read_timeout",
        deserialize_with = "de_duration"
    )]
    pub read_timeout: Duration,
    #[serde(
        default = "Config::default_connect_timeout",
        deserialize_with = "de_duration"
    )]
    pub connect_timeout: Duration,

    /// Read these 40-register banks one request each instead of the single
    /// 127-register read
    pub banks: Option<Vec<u16>>,

    pub heartbeats: Option<bool>,
    pub use_tcp_nodelay: Option<bool>,

    #[serde_as(as = "Option<Vec<DisplayFromStr>>")]
    pub sensors: Option<Vec<Field>>,
}
impl Dongle {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn dongle_serial(&self) -> Serial {
        self.dongle_serial
    }

    pub fn inverter_serial(&self) -> Serial {
        self.inverter_serial_number
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn banks(&self) -> Option<&[u16]> {
        self.banks.as_deref()
    }

    /// Requests making up one poll cycle.
    pub fn commands(&self) -> Vec<Command> {
        match &self.banks {
            Some(banks) => banks.iter().map(|b| Command::read_bank(*b)).collect(),
            None => vec![Command::read_all()],
        }
    }

    pub fn heartbeats(&self) -> bool {
        self.heartbeats == Some(true)
    }

    pub fn use_tcp_nodelay(&self) -> bool {
        self.use_tcp_nodelay.unwrap_or(true)
    }

    /// Fields to hand to the sensor registry; everything unless configured.
    pub fn sensors(&self) -> Vec<Field> {
        match &self.sensors {
            Some(sensors) => sensors.clone(),
            None => Field::ALL.to_vec(),
        }
    }

    fn validate(&self, i: usize) -> Result<(), Error> {
        if self.port == 0 {
            return Err(Error::config(format!(
                "dongles[{}].port must be between 1 and 65535",
                i
            )));
        }
        if !valid_host(&self.host) {
            return Err(Error::config(format!(
                "dongles[{}].host '{}' is not an IPv4 address or hostname",
                i, self.host
            )));
        }
        if self.update_interval < MIN_UPDATE_INTERVAL {
            return Err(Error::config(format!(
                "dongles[{}].update_interval {:?} is below the minimum of {:?}",
                i, self.update_interval, MIN_UPDATE_INTERVAL
            )));
        }
        if self.update_interval > MAX_UPDATE_INTERVAL {
            return Err(Error::config(format!(
                "dongles[{}].update_interval {:?} is above the maximum of {:?}",
                i, self.update_interval, MAX_UPDATE_INTERVAL
            )));
        }
        if self.read_timeout.is_zero() || self.read_timeout >= self.update_interval {
            return Err(Error::config(format!(
                "dongles[{}].read_timeout {:?} must be non-zero and shorter than update_interval {:?}",
                i, self.read_timeout, self.update_interval
            )));
        }
        if self.connect_timeout.is_zero() || self.connect_timeout > self.update_interval {
            return Err(Error::config(format!(
                "dongles[{}].connect_timeout {:?} must be non-zero and no longer than update_interval {:?}",
                i, self.connect_timeout, self.update_interval
            )));
        }

        let Some(banks) = &self.banks else {
            return Ok(());
        };
        if banks.is_empty() {
            return Err(Error::config(format!("dongles[{}].banks cannot be empty", i)));
        }
        for (n, bank) in banks.iter().enumerate() {
            if !INPUT_BANKS.contains(bank) {
                return Err(Error::config(format!(
                    "dongles[{}].banks: {} is not one of {:?}",
                    i, bank, INPUT_BANKS
                )));
            }
            if banks[..n].contains(bank) {
                return Err(Error::config(format!(
                    "dongles[{}].banks: {} listed twice",
                    i, bank
                )));
            }
        }

        Ok(())
    }
} // }}}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        info!("Reading configuration from {}", file);
        let content = std::fs::read_to_string(&file)
            .map_err(|err| Error::config(format!("error reading {}: {}", file, err)))?;

        Ok(Self::from_yaml_str(&content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, Error> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|err| Error::config(err.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn enabled_dongles(&self) -> Vec<Dongle> {
        self.dongles.iter().filter(|d| d.enabled).cloned().collect()
    }

    pub fn loglevel(&self) -> &str {
        &self.loglevel
    }

    pub fn snapshot_file(&self) -> Option<&str> {
        self.snapshot_file.as_deref()
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded successfully:");
        info!(
            "  Dongles: {} configured, {} enabled",
            self.dongles.len(),
            self.dongles.iter().filter(|d| d.enabled).count()
        );
        for (i, dongle) in self.dongles.iter().enumerate() {
            info!("    Dongle[{}]:", i);
            info!("      Enabled: {}", dongle.enabled);
            info!("      Address: {}:{}", dongle.host, dongle.port);
            info!("      Dongle Serial: {}", dongle.dongle_serial);
            info!("      Inverter Serial: {}", dongle.inverter_serial_number);
            info!("      Update Interval: {:?}", dongle.update_interval);
            info!("      Read Timeout: {:?}", dongle.read_timeout);
            match &dongle.banks {
                Some(banks) => info!("      Banks: {:?}", banks),
                None => info!("      Banks: all inputs in one read"),
            }
            info!("      Heartbeats: {}", dongle.heartbeats());
            info!("      TCP NoDelay: {}", dongle.use_tcp_nodelay());
            match &dongle.sensors {
                Some(sensors) => info!("      Sensors: {}", sensors.len()),
                None => info!("      Sensors: all ({})", Field::ALL.len()),
            }
        }
        info!(
            "  Snapshot File: {}",
            self.snapshot_file.as_deref().unwrap_or("disabled")
        );
        info!("  Log Level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<(), Error> {
        if self.dongles.is_empty() {
            return Err(Error::config("no dongles configured"));
        }

        if log::LevelFilter::from_str(&self.loglevel).is_err() {
            return Err(Error::config(format!(
                "invalid loglevel '{}'",
                self.loglevel
            )));
        }

        for (i, dongle) in self.dongles.iter().enumerate() {
            dongle.validate(i)?;
        }

        Ok(())
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_update_interval() -> Duration {
        Duration::from_secs(20)
    }

    fn default_read_timeout() -> Duration {
        Duration::from_secs(5)
    }

    fn default_connect_timeout() -> Duration {
        Duration::from_secs(5)
    }
}

fn valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    // anything that looks like a dotted quad has to be a real one
    if host.split('.').all(|l| l.chars().all(|c| c.is_ascii_digit())) {
        return host.parse::<Ipv4Addr>().is_ok();
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn de_serial<'de, D>(deserializer: D) -> Result<Serial, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Serial::from_str(&s).map_err(serde::de::Error::custom)
}

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => Utils::parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
