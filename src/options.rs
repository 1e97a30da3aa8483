use clap::Parser;

/// luxpower-poller - polls Luxpower inverters through their WiFi dongle
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Optional runtime limit in seconds
    #[clap(short = 't', long = "time")]
    pub runtime: Option<u64>,

    /// Print the telemetry field table and exit
    #[clap(long = "list-fields")]
    pub list_fields: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}
