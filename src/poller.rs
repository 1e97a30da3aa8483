use crate::prelude::*;

use crate::lxp::codec::{RequestFrame, ResponseFrame};
use crate::lxp::dongle::Transport;
use crate::lxp::packet::{Parser, TcpFrameFactory};

use chrono::{DateTime, Utc};
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PollState {
    Idle,
    Requesting,
    AwaitingResponse,
    Updating,
}

#[derive(Clone, Debug, Default)]
pub struct PollStats {
    pub cycles: u64,
    pub successes: u64,
    pub failures: u64,
    // failure breakdown
    pub connection_errors: u64,
    pub decode_errors: u64,
    pub timeouts: u64,
    // frames
    pub frames_sent: u64,
    pub frames_received: u64,
    pub heartbeats: u64,
    pub serial_mismatches: u64,
    pub foreign_frames: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl PollStats {
    pub fn print_summary(&self, datalog: Serial) {
        info!("Poll Statistics for {}:", datalog);
        info!("  Cycles: {}", self.cycles);
        info!("  Successful: {}", self.successes);
        info!("  Failed: {}", self.failures);
        info!("    Connection errors: {}", self.connection_errors);
        info!("    Decode errors: {}", self.decode_errors);
        info!("    Timeouts: {}", self.timeouts);
        info!("  Frames sent: {}", self.frames_sent);
        info!("  Frames received: {}", self.frames_received);
        info!("    Heartbeats: {}", self.heartbeats);
        info!("    Serial mismatches: {}", self.serial_mismatches);
        info!("    Foreign frames: {}", self.foreign_frames);
        if let Some(at) = self.last_success {
            info!("  Last success: {}", at.to_rfc3339());
        }
        if let Some(err) = &self.last_error {
            info!("  Last error: {}", err);
        }
    }

    fn record_error(&mut self, err: &Error) {
        self.failures += 1;
        match err {
            Error::Connection(_) => self.connection_errors += 1,
            Error::Decode(_) => self.decode_errors += 1,
            Error::Timeout(_) => self.timeouts += 1,
            Error::Config(_) => {}
        }
        self.last_error = Some(err.to_string());
    }
}

/// Drives one dongle: reads the configured input banks every `update_interval` and
/// publishes the decoded telemetry.
///
/// A cycle is all-or-nothing. If any bank fails the previous snapshot stays in
/// place and only the counters move.
pub struct Poller<T: Transport> {
    dongle: config::Dongle,
    transport: T,
    state: PollState,
    stats: PollStats,
    tx: watch::Sender<TelemetrySnapshot>,
}

impl<T: Transport> Poller<T> {
    pub fn new(dongle: config::Dongle, transport: T) -> (Self, SnapshotReader) {
        let (tx, rx) = watch::channel(TelemetrySnapshot::default());

        let poller = Self {
            dongle,
            transport,
            state: PollState::Idle,
            stats: PollStats::default(),
            tx,
        };

        (poller, SnapshotReader::new(rx))
    }

    pub fn subscribe(&self) -> SnapshotReader {
        SnapshotReader::new(self.tx.subscribe())
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let datalog = self.dongle.dongle_serial();
        let mut interval = tokio::time::interval(self.dongle.update_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "{}: polling every {:?}",
            datalog,
            self.dongle.update_interval()
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tokio::select! {
                        // failures are logged and counted by poll_once
                        _ = self.poll_once() => {}
                        _ = shutdown.recv() => {
                            info!("{}: received shutdown signal mid-cycle", datalog);
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("{}: received shutdown signal", datalog);
                    break;
                }
            }
        }

        self.set_state(PollState::Idle);
        self.transport.disconnect().await;
        self.stats.print_summary(datalog);

        Ok(())
    }

    /// Run a single cycle now.
    pub async fn poll_once(&mut self) -> Result<(), Error> {
        self.stats.cycles += 1;

        let result = self.cycle().await;

        if let Err(err) = &result {
            warn!("{}: poll failed: {}", self.dongle.dongle_serial(), err);
            self.stats.record_error(err);
            if err.is_connection() {
                self.transport.disconnect().await;
            }
        }

        self.set_state(PollState::Idle);
        result
    }

    async fn cycle(&mut self) -> Result<(), Error> {
        if !self.transport.is_connected() {
            self.transport.connect().await?;
        }

        let read_timeout = self.dongle.read_timeout();
        let deadline = Instant::now() + read_timeout;

        let snapshot = match tokio::time::timeout_at(deadline, self.exchange(deadline)).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout(read_timeout)),
        };

        self.set_state(PollState::Updating);
        self.publish(snapshot);

        Ok(())
    }

    async fn exchange(&mut self, deadline: Instant) -> Result<TelemetrySnapshot, Error> {
        let mut snapshot = TelemetrySnapshot::default();
        for command in self.dongle.commands() {
            let request = RequestFrame::from_serials(
                self.dongle.dongle_serial(),
                self.dongle.inverter_serial(),
                command,
            )?;

            self.set_state(PollState::Requesting);
            self.transport.send(&request.encode()).await?;
            self.stats.frames_sent += 1;

            self.set_state(PollState::AwaitingResponse);
            let reply = self.await_reply(&request, deadline).await?;
            snapshot.merge(reply.telemetry()?);
        }

        Ok(snapshot)
    }

    async fn await_reply(
        &mut self,
        request: &RequestFrame,
        deadline: Instant,
    ) -> Result<ResponseFrame, Error> {
        let read_timeout = self.dongle.read_timeout();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout(read_timeout));
            }

            let raw = match self.transport.receive(remaining).await {
                Ok(raw) => raw,
                Err(Error::Timeout(_)) => return Err(Error::Timeout(read_timeout)),
                Err(err) => return Err(err),
            };
            self.stats.frames_received += 1;

            if !Parser::is_supported(&raw) {
                warn!(
                    "{}: skipping frame with unhandled tcp function {:?}",
                    request.dongle_serial(),
                    raw.get(7)
                );
                self.stats.foreign_frames += 1;
                continue;
            }

            let frame = ResponseFrame::parse(&raw)?;

            if frame.packet.datalog() != request.dongle_serial() {
                warn!(
                    "datalog serial mismatch found; packet={}, config={} - please check config!",
                    frame.packet.datalog(),
                    request.dongle_serial()
                );
                self.stats.serial_mismatches += 1;
                continue;
            }

            match &frame.packet {
                Packet::Heartbeat(_) => {
                    self.stats.heartbeats += 1;
                    if self.dongle.heartbeats() {
                        debug!("{}: echoing heartbeat", request.dongle_serial());
                        self.transport
                            .send(&TcpFrameFactory::build(&frame.packet))
                            .await?;
                        self.stats.frames_sent += 1;
                    }
                }
                Packet::TranslatedData(td) => {
                    if !request.matches(td) {
                        debug!(
                            "{}: skipping {:?} register {} from {:?} while waiting for register {}",
                            request.dongle_serial(),
                            td.device_function,
                            td.register,
                            td.source,
                            request.command().register()
                        );
                        continue;
                    }

                    if td.inverter != request.inverter_serial() {
                        warn!(
                            "inverter serial mismatch found; packet={}, config={} - please check config!",
                            td.inverter,
                            request.inverter_serial()
                        );
                        self.stats.serial_mismatches += 1;
                        continue;
                    }

                    return Ok(frame);
                }
            }
        }
    }

    fn publish(&mut self, mut snapshot: TelemetrySnapshot) {
        let now = Utc::now();
        snapshot.updated_at = Some(now);

        info!(
            "{}: published {} telemetry values",
            self.dongle.dongle_serial(),
            snapshot.len()
        );

        self.tx.send_replace(snapshot);
        self.stats.successes += 1;
        self.stats.last_success = Some(now);
    }

    fn set_state(&mut self, state: PollState) {
        if self.state != state {
            debug!(
                "{}: {:?} -> {:?}",
                self.dongle.dongle_serial(),
                self.state,
                state
            );
            self.state = state;
        }
    }
}
