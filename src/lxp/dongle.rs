use crate::prelude::*;

use crate::lxp::packet_decoder::PacketDecoder;

use {
    async_trait::async_trait,
    bytes::BytesMut,
    net2::TcpStreamExt,
    serde::{Serialize, Serializer},
    std::time::Duration,
    tokio::io::{AsyncReadExt, AsyncWriteExt},
    tokio::net::TcpStream,
    tokio::time::Instant,
    tokio_util::codec::Decoder,
};

// Serial {{{
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Serial([u8; 10]);

impl Serial {
    pub fn new(input: &[u8]) -> Result<Self, Error> {
        let r: [u8; 10] = input.try_into().map_err(|_| {
            Error::decode(format!("serial must be 10 bytes, got {}", input.len()))
        })?;
        Ok(Self(r))
    }

    pub fn data(&self) -> [u8; 10] {
        self.0
    }
}

impl Serialize for Serial {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl std::str::FromStr for Serial {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 {
            return Err(Error::config(format!(
                "serial '{}' must be exactly 10 characters (got {})",
                s,
                s.len()
            )));
        }
        if !s.is_ascii() {
            return Err(Error::config(format!("serial '{}' must be ASCII", s)));
        }

        let mut r: [u8; 10] = Default::default();
        r.copy_from_slice(s.as_bytes());
        Ok(Self(r))
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl std::fmt::Debug for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
} // }}}

// Backoff {{{
const BACKOFF_BASE_SECS: u64 = 5;
const BACKOFF_MAX_SECS: u64 = 300;

/// Reconnect throttle. After `n` consecutive failed connects, further attempts are
/// refused until `min(base * 2^(n-1), max)` has passed.
#[derive(Clone, Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
    next_attempt: Option<Instant>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(BACKOFF_BASE_SECS),
            Duration::from_secs(BACKOFF_MAX_SECS),
        )
    }
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
            next_attempt: None,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn delay(&self) -> Duration {
        if self.failures == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(self.failures - 1);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        self.next_attempt = Some(Instant::now() + self.delay());
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.next_attempt = None;
    }

    /// Time left before another attempt is allowed, if any.
    pub fn retry_in(&self) -> Option<Duration> {
        self.next_attempt
            .map(|at| at.saturating_duration_since(Instant::now()))
            .filter(|d| !d.is_zero())
    }
} // }}}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// A bidirectional frame pipe to one dongle.
#[async_trait]
pub trait Transport: Send {
    async fn connect(&mut self) -> Result<(), Error>;

    async fn send(&mut self, frame: &[u8]) -> Result<(), Error>;

    /// Next complete frame from the dongle, raw and unvalidated.
    async fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, Error>;

    fn is_connected(&self) -> bool;

    async fn disconnect(&mut self);
}

const TCP_KEEPALIVE_SECS: u64 = 60; // TCP keepalive interval
const WRITE_TIMEOUT_SECS: u64 = 5; // Timeout for write operations
const MAX_BUFFER_SIZE: usize = 65536;

pub struct TcpTransport {
    host: String,
    port: u16,
    connect_timeout: Duration,
    use_tcp_nodelay: bool,
    stream: Option<TcpStream>,
    state: ConnectionState,
    buf: BytesMut,
    decoder: PacketDecoder,
    backoff: Backoff,
}

impl TcpTransport {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_owned(),
            port,
            connect_timeout: Duration::from_secs(5),
            use_tcp_nodelay: true,
            stream: None,
            state: ConnectionState::Disconnected,
            buf: BytesMut::with_capacity(1024),
            decoder: PacketDecoder::new(),
            backoff: Backoff::default(),
        }
    }

    pub fn from_config(dongle: &config::Dongle) -> Self {
        Self::new(dongle.host(), dongle.port())
            .with_connect_timeout(dongle.connect_timeout())
            .with_nodelay(dongle.use_tcp_nodelay())
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_nodelay(mut self, use_tcp_nodelay: bool) -> Self {
        self.use_tcp_nodelay = use_tcp_nodelay;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn open(&self) -> Result<TcpStream, Error> {
        let stream = match tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(Error::connection(format!(
                    "failed to connect to {}: {}",
                    self.addr(),
                    e
                )))
            }
            Err(_) => {
                return Err(Error::connection(format!(
                    "connect to {} timed out after {:?}",
                    self.addr(),
                    self.connect_timeout
                )))
            }
        };

        // Configure TCP socket
        let std_stream = stream
            .into_std()
            .map_err(|e| Error::connection(e.to_string()))?;
        if let Err(e) = std_stream.set_keepalive(Some(Duration::new(TCP_KEEPALIVE_SECS, 0))) {
            warn!("Failed to set TCP keepalive: {}", e);
        }
        let stream =
            TcpStream::from_std(std_stream).map_err(|e| Error::connection(e.to_string()))?;

        if self.use_tcp_nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY: {}", e);
            }
        }

        Ok(stream)
    }

    // a drop of an established link is not a failed connect, so no backoff
    fn dropped(&mut self, reason: String) -> Error {
        warn!("{}: connection lost: {}", self.addr(), reason);
        self.stream = None;
        self.state = ConnectionState::Disconnected;
        self.buf.clear();
        Error::connection(reason)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.is_connected() {
            return Ok(());
        }

        if let Some(wait) = self.backoff.retry_in() {
            return Err(Error::connection(format!(
                "{}: backing off after {} failed attempts, next attempt in {:?}",
                self.addr(),
                self.backoff.failures(),
                wait
            )));
        }

        info!("connecting to dongle at {}", self.addr());

        match self.open().await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                self.buf.clear();
                self.backoff.reset();
                info!("{}: connected!", self.addr());
                Ok(())
            }
            Err(e) => {
                self.backoff.record_failure();
                debug!(
                    "{}: connect failed, retry allowed in {:?}",
                    self.addr(),
                    self.backoff.delay()
                );
                Err(e)
            }
        }
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), Error> {
        let addr = self.addr();
        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::connection(format!("{}: not connected", addr)));
        };

        debug!("{}: TX {}", addr, Utils::hex(frame));

        let result = match tokio::time::timeout(
            Duration::from_secs(WRITE_TIMEOUT_SECS),
            stream.write_all(frame),
        )
        .await
        {
            Ok(Ok(())) => stream.flush().await.map_err(|e| e.to_string()),
            Ok(Err(e)) => Err(format!("failed to write packet: {}", e)),
            Err(_) => Err(format!(
                "write timed out after {} seconds",
                WRITE_TIMEOUT_SECS
            )),
        };

        result.map_err(|reason| self.dropped(reason))
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, Error> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.decoder.decode(&mut self.buf) {
                Ok(Some(frame)) => {
                    debug!("{}: RX {}", self.addr(), Utils::hex(&frame));
                    return Ok(frame.to_vec());
                }
                Ok(None) => {}
                Err(e) => return Err(Error::decode(e.to_string())),
            }

            if self.buf.len() >= MAX_BUFFER_SIZE {
                self.buf.clear();
                return Err(Error::decode(format!(
                    "receive buffer exceeded {} bytes without a frame",
                    MAX_BUFFER_SIZE
                )));
            }

            let addr = self.addr();
            let Some(stream) = self.stream.as_mut() else {
                return Err(Error::connection(format!("{}: not connected", addr)));
            };

            let read = tokio::time::timeout_at(deadline, stream.read_buf(&mut self.buf)).await;
            match read {
                Err(_) => return Err(Error::Timeout(timeout)),
                Ok(Ok(0)) => return Err(self.dropped("connection closed by peer".to_owned())),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(self.dropped(format!("read error: {}", e))),
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            info!("{}: disconnected", self.addr());
        }
        self.state = ConnectionState::Disconnected;
        self.buf.clear();
    }
}
