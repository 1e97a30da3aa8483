use crate::prelude::*;

use crate::lxp::packet::{
    DeviceFunction, PacketSource, Parser, TcpFrameFactory, TranslatedData, BANK_SIZE,
};

// most registers the dongle will return for a single read
pub const MAX_READ_COUNT: u16 = 127;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    ReadInput { register: u16, count: u16 },
}

impl Command {
    /// Registers 0-126 in one request: banks 0, 40 and 80 plus the generator
    /// registers at the start of bank 120.
    pub fn read_all() -> Self {
        Self::ReadInput {
            register: 0,
            count: MAX_READ_COUNT,
        }
    }

    /// Read one whole input bank starting at `register`.
    pub fn read_bank(register: u16) -> Self {
        Self::ReadInput {
            register,
            count: BANK_SIZE,
        }
    }

    pub fn register(&self) -> u16 {
        match self {
            Self::ReadInput { register, .. } => *register,
        }
    }

    pub fn count(&self) -> u16 {
        match self {
            Self::ReadInput { count, .. } => *count,
        }
    }

    pub fn device_function(&self) -> DeviceFunction {
        match self {
            Self::ReadInput { .. } => DeviceFunction::ReadInput,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestFrame {
    dongle_serial: Serial,
    inverter_serial: Serial,
    command: Command,
}

impl RequestFrame {
    /// Serials are checked here so a malformed request never reaches the wire.
    pub fn new(dongle_serial: &str, inverter_serial: &str, command: Command) -> Result<Self, Error> {
        Self::from_serials(dongle_serial.parse()?, inverter_serial.parse()?, command)
    }

    pub fn from_serials(
        dongle_serial: Serial,
        inverter_serial: Serial,
        command: Command,
    ) -> Result<Self, Error> {
        match command {
            Command::ReadInput { count, .. } if count == 0 || count > MAX_READ_COUNT => {
                return Err(Error::config(format!(
                    "register count {} out of range 1..={}",
                    count, MAX_READ_COUNT
                )));
            }
            _ => {}
        }

        Ok(Self {
            dongle_serial,
            inverter_serial,
            command,
        })
    }

    pub fn dongle_serial(&self) -> Serial {
        self.dongle_serial
    }

    pub fn inverter_serial(&self) -> Serial {
        self.inverter_serial
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn to_packet(&self) -> Packet {
        let Command::ReadInput { register, count } = self.command;

        Packet::TranslatedData(TranslatedData {
            datalog: self.dongle_serial,
            source: PacketSource::Client,
            device_function: self.command.device_function(),
            inverter: self.inverter_serial,
            register,
            values: count.to_le_bytes().to_vec(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        TcpFrameFactory::build(&self.to_packet())
    }

    /// Whether `td` is the inverter's answer to this request.
    pub fn matches(&self, td: &TranslatedData) -> bool {
        td.source == PacketSource::Inverter
            && td.device_function == self.command.device_function()
            && td.register == self.command.register()
            && td.values.len() == usize::from(self.command.count()) * 2
    }
}

pub fn encode_request(
    dongle_serial: &str,
    inverter_serial: &str,
    command: Command,
) -> Result<Vec<u8>, Error> {
    Ok(RequestFrame::new(dongle_serial, inverter_serial, command)?.encode())
}

pub fn decode_request(bytes: &[u8]) -> Result<RequestFrame, Error> {
    let td = match Parser::parse(bytes)? {
        Packet::TranslatedData(td) => td,
        Packet::Heartbeat(_) => return Err(Error::decode("expected a request, got a heartbeat")),
    };

    if td.source != PacketSource::Client {
        return Err(Error::decode("expected a client request, got an inverter reply"));
    }

    let command = match td.device_function {
        DeviceFunction::ReadInput => Command::ReadInput {
            register: td.register,
            count: Utils::u16ify(&td.values, 0),
        },
        other => {
            return Err(Error::decode(format!(
                "unsupported request function {:?}",
                other
            )))
        }
    };

    RequestFrame::from_serials(td.datalog, td.inverter, command)
        .map_err(|err| Error::decode(err.to_string()))
}

/// One frame as received from the dongle.
#[derive(Clone, Debug)]
pub struct ResponseFrame {
    pub packet: Packet,
}

impl ResponseFrame {
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        let packet = Parser::parse(raw)?;
        Ok(Self { packet })
    }

    pub fn translated_data(&self) -> Option<&TranslatedData> {
        match &self.packet {
            Packet::TranslatedData(td) => Some(td),
            Packet::Heartbeat(_) => None,
        }
    }

    /// Decode the register values of an input-bank reply into telemetry.
    pub fn telemetry(&self) -> Result<TelemetrySnapshot, Error> {
        let td = self
            .translated_data()
            .ok_or_else(|| Error::decode("expected a read input reply, got a heartbeat"))?;

        if td.source != PacketSource::Inverter || td.device_function != DeviceFunction::ReadInput {
            return Err(Error::decode(format!(
                "expected a read input reply, got {:?} from {:?}",
                td.device_function, td.source
            )));
        }

        let input = td.read_input()?;
        Ok(TelemetrySnapshot::from_values(input.telemetry()))
    }
}

pub fn decode_response(bytes: &[u8]) -> Result<TelemetrySnapshot, Error> {
    ResponseFrame::parse(bytes)?.telemetry()
}
