use crate::prelude::*;

use std::collections::BTreeMap;

pub trait NumericSink: Send {
    fn publish_number(&mut self, field: Field, value: f64);
}

pub trait TextSink: Send {
    fn publish_text(&mut self, field: Field, value: &str);
}

pub enum Sink {
    Numeric(Box<dyn NumericSink>),
    Text(Box<dyn TextSink>),
}

impl Sink {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Numeric(_) => FieldKind::Numeric,
            Self::Text(_) => FieldKind::Text,
        }
    }
}

/// Logs every value it is handed at info level.
#[derive(Clone, Debug)]
pub struct LogSink {
    prefix: String,
}

impl LogSink {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
        }
    }
}

impl NumericSink for LogSink {
    fn publish_number(&mut self, field: Field, value: f64) {
        info!("{}: {} = {}", self.prefix, field, value);
    }
}

impl TextSink for LogSink {
    fn publish_text(&mut self, field: Field, value: &str) {
        info!("{}: {} = {:?}", self.prefix, field, value);
    }
}

/// Explicit table of telemetry field -> output sinks.
///
/// Registration checks the sink kind against the field kind, so a text field can
/// never end up in a numeric sink. Fields missing from a snapshot are left alone.
#[derive(Default)]
pub struct SensorRegistry {
    sinks: BTreeMap<Field, Vec<Sink>>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One `LogSink` per sensor the dongle is configured to expose.
    pub fn from_config(dongle: &config::Dongle) -> Result<Self, Error> {
        let mut registry = Self::new();
        let prefix = dongle.inverter_serial().to_string();

        for field in dongle.sensors() {
            let sink = match field.kind() {
                FieldKind::Numeric => Sink::Numeric(Box::new(LogSink::new(&prefix))),
                FieldKind::Text => Sink::Text(Box::new(LogSink::new(&prefix))),
            };
            registry.register(field, sink)?;
        }

        Ok(registry)
    }

    pub fn register(&mut self, field: Field, sink: Sink) -> Result<(), Error> {
        if sink.kind() != field.kind() {
            return Err(Error::config(format!(
                "sensor {} is {:?} but a {:?} sink was registered for it",
                field,
                field.kind(),
                sink.kind()
            )));
        }

        self.sinks.entry(field).or_default().push(sink);
        Ok(())
    }

    pub fn register_numeric<S: NumericSink + 'static>(
        &mut self,
        field: Field,
        sink: S,
    ) -> Result<(), Error> {
        self.register(field, Sink::Numeric(Box::new(sink)))
    }

    pub fn register_text<S: TextSink + 'static>(
        &mut self,
        field: Field,
        sink: S,
    ) -> Result<(), Error> {
        self.register(field, Sink::Text(Box::new(sink)))
    }

    pub fn fields(&self) -> Vec<Field> {
        self.sinks.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Push the registered fields of `snapshot` to their sinks. Returns how many
    /// values were delivered.
    pub fn publish(&mut self, snapshot: &TelemetrySnapshot) -> usize {
        let mut published = 0;

        for (field, sinks) in self.sinks.iter_mut() {
            let Some(value) = snapshot.get(*field) else {
                continue;
            };

            for sink in sinks.iter_mut() {
                match (sink, value) {
                    (Sink::Numeric(s), Value::Number(n)) => s.publish_number(*field, *n),
                    (Sink::Text(s), Value::Text(t)) => s.publish_text(*field, t),
                    (_, value) => {
                        warn!("{}: value {} does not match its sink, skipped", field, value);
                        continue;
                    }
                }
                published += 1;
            }
        }

        published
    }

    /// Feed every snapshot the poller publishes to the sinks until shutdown.
    pub async fn run(
        &mut self,
        mut reader: SnapshotReader,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                snapshot = reader.changed() => match snapshot {
                    Ok(snapshot) => {
                        let n = self.publish(&snapshot);
                        debug!("published {} sensor values", n);
                    }
                    Err(e) => {
                        debug!("sensor registry stopping: {}", e);
                        break;
                    }
                },
                _ = shutdown.recv() => break,
            }
        }

        Ok(())
    }
}
