use std::time::Duration;

/// Error kinds surfaced by the dongle client.
///
/// `Config` is fatal to setup. Everything else is recoverable: the poller logs it,
/// discards the current cycle and tries again on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("timed out after {0:?} waiting for a reply")]
    Timeout(Duration),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Timeouts are handled exactly like undecodable replies.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Timeout(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
