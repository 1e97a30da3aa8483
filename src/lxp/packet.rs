use crate::prelude::*;

use enum_dispatch::*;
use nom_derive::{Nom, Parse};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

pub const PREFIX: [u8; 2] = [0xA1, 0x1A];
pub const HEADER_LEN: usize = 18;

// registers per input bank; one bank is one request
pub const BANK_SIZE: u16 = 40;
pub const INPUT_BANKS: [u16; 4] = [0, 40, 80, 120];

#[derive(Clone, Debug)]
pub enum ReadInput {
    ReadInputAll(Box<ReadInputAll>),
    ReadInput1(ReadInput1),
    ReadInput2(ReadInput2),
    ReadInput3(ReadInput3),
    ReadInput4(ReadInput4),
}

// {{{ ReadInputAll
/// Registers 0-126 from a single 127-register read. Bank 120 is cut short after
/// the generator registers, so only those are taken from `generator`.
#[derive(Clone, Debug)]
pub struct ReadInputAll {
    pub input1: ReadInput1,
    pub input2: ReadInput2,
    pub input3: ReadInput3,
    pub generator: ReadInput4,
}
// }}}

// {{{ ReadInput1
/// Input registers 0-39: live power flow and today's energy.
#[derive(Clone, Debug, Default, Serialize, Nom)]
#[nom(LittleEndian)]
pub struct ReadInput1 {
    pub status: u16,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_pv_1: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_pv_2: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_pv_3: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_bat: f64,

    // register 5 packs SOC in the low byte and SOH in the high byte
    pub soc: u8,
    pub soh: u8,

    pub internal_fault: u16,

    #[nom(Ignore)]
    pub p_pv: u16,
    pub p_pv_1: u16,
    pub p_pv_2: u16,
    pub p_pv_3: u16,
    #[nom(Ignore)]
    pub p_battery: i32,
    pub p_charge: u16,
    pub p_discharge: u16,

    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_ac_r: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_ac_s: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_ac_t: f64,
    #[nom(Parse = "Utils::le_u16_div100")]
    pub f_ac: f64,

    pub p_inv: u16,
    pub p_rec: u16,

    #[nom(Parse = "Utils::le_u16_div100")]
    pub i_inv_rms: f64,
    #[nom(Parse = "Utils::le_u16_power_factor")]
    pub pf: f64,

    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_eps_r: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_eps_s: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_eps_t: f64,
    #[nom(Parse = "Utils::le_u16_div100")]
    pub f_eps: f64,
    pub p_eps: u16,
    pub s_eps: u16,
    #[nom(Ignore)]
    pub p_grid: i32,
    pub p_to_grid: u16,
    pub p_to_user: u16,

    #[nom(Ignore)]
    pub e_pv_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_pv_day_1: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_pv_day_2: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_pv_day_3: f64,

    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_inv_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_rec_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_chg_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_dischg_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_eps_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_to_grid_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_to_user_day: f64,

    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_bus_1: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_bus_2: f64,
}

impl ReadInput1 {
    pub fn calculate_derived_values(&mut self) -> Result<()> {
        self.p_pv = self
            .p_pv_1
            .checked_add(self.p_pv_2)
            .and_then(|sum| sum.checked_add(self.p_pv_3))
            .ok_or_else(|| anyhow!("Power value overflow in p_pv calculation"))?;

        self.p_battery = i32::from(self.p_charge) - i32::from(self.p_discharge);
        self.p_grid = i32::from(self.p_to_user) - i32::from(self.p_to_grid);

        self.e_pv_day = Utils::round(self.e_pv_day_1 + self.e_pv_day_2 + self.e_pv_day_3, 1);

        Ok(())
    }
}
// }}}

// {{{ ReadInput2
/// Input registers 40-79: lifetime energy, fault/warning codes, temperatures.
#[derive(Clone, Debug, Default, Serialize, Nom)]
#[nom(LittleEndian)]
pub struct ReadInput2 {
    #[nom(Ignore)]
    pub e_pv_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_pv_all_1: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_pv_all_2: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_pv_all_3: f64,

    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_inv_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_rec_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_chg_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_dischg_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_eps_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_to_grid_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_to_user_all: f64,

    pub fault_code: u32,
    pub warning_code: u32,

    pub t_inner: i16,
    pub t_rad_1: i16,
    pub t_rad_2: i16,
    pub t_bat: i16,

    #[nom(SkipBefore(2))] // reserved
    pub runtime: u32,
    // 71-79 are auto-test state, not decoded
}

impl ReadInput2 {
    pub fn calculate_derived_values(&mut self) -> Result<()> {
        self.e_pv_all = Utils::round(self.e_pv_all_1 + self.e_pv_all_2 + self.e_pv_all_3, 1);
        Ok(())
    }
}
// }}}

// {{{ ReadInput3
/// Input registers 80-119: battery and BMS.
#[derive(Clone, Debug, Default, Serialize, Nom)]
#[nom(LittleEndian)]
pub struct ReadInput3 {
    #[nom(SkipBefore(2))] // bat_brand, bat_com_type
    #[nom(Parse = "Utils::le_u16_div100")]
    pub max_chg_curr: f64,
    #[nom(Parse = "Utils::le_u16_div100")]
    pub max_dischg_curr: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub charge_volt_ref: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub dischg_cut_volt: f64,

    #[nom(SkipBefore(22))] // bat_status_0..9, bat_status_inv
    pub bat_count: u16,
    pub bat_capacity: u16,

    #[nom(Parse = "Utils::le_i16_div100")]
    pub bat_current: f64,

    pub bms_event_1: u16, // FaultCode_BMS
    pub bms_event_2: u16, // WarningCode_BMS

    #[nom(Parse = "Utils::le_u16_div1000")]
    pub max_cell_voltage: f64,
    #[nom(Parse = "Utils::le_u16_div1000")]
    pub min_cell_voltage: f64,
    #[nom(Parse = "Utils::le_i16_div10")]
    pub max_cell_temp: f64,
    #[nom(Parse = "Utils::le_i16_div10")]
    pub min_cell_temp: f64,

    pub bms_fw_update_state: u16,

    pub cycle_count: u16,

    #[nom(Parse = "Utils::le_u16_div10")]
    pub vbat_inv: f64,
}
// }}}

// {{{ ReadInput4
/// Input registers 120-159: generator and split-phase EPS.
#[derive(Clone, Debug, Default, Serialize, Nom)]
#[nom(LittleEndian)]
pub struct ReadInput4 {
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_bus_half: f64,

    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_gen: f64,
    #[nom(Parse = "Utils::le_u16_div100")]
    pub f_gen: f64,
    pub p_gen: u16,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_gen_day: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_gen_all: f64,

    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_eps_l1: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub v_eps_l2: f64,
    pub p_eps_l1: u16,
    pub p_eps_l2: u16,
    pub s_eps_l1: u16,
    pub s_eps_l2: u16,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_eps_l1_day: f64,
    #[nom(Parse = "Utils::le_u16_div10")]
    pub e_eps_l2_day: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_eps_l1_all: f64,
    #[nom(Parse = "Utils::le_u32_div10")]
    pub e_eps_l2_all: f64,
}
// }}}

// {{{ TcpFunction
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TcpFunction {
    Heartbeat = 193,
    TranslatedData = 194,
}
// }}}

// {{{ DeviceFunction
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DeviceFunction {
    ReadHold = 3,
    ReadInput = 4,
    WriteSingle = 6,
    WriteMulti = 16,
}
// }}}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketSource {
    Inverter,
    Client,
}

#[enum_dispatch]
pub trait PacketCommon {
    fn datalog(&self) -> Serial;
    fn protocol(&self) -> u16;
    fn tcp_function(&self) -> TcpFunction;
    fn bytes(&self) -> Vec<u8>;
}

pub struct TcpFrameFactory;
impl TcpFrameFactory {
    pub fn build(data: &Packet) -> Vec<u8> {
        let data_bytes = data.bytes();
        let frame_length = HEADER_LEN + data_bytes.len();

        let mut r = vec![0; frame_length];

        r[0..2].copy_from_slice(&PREFIX);
        r[2..4].copy_from_slice(&data.protocol().to_le_bytes());
        r[4..6].copy_from_slice(&((frame_length - 6) as u16).to_le_bytes());
        r[6] = 1; // unsure what this is, always seems to be 1
        r[7] = data.tcp_function() as u8;
        r[8..18].copy_from_slice(&data.datalog().data());
        r[18..].copy_from_slice(&data_bytes);

        r
    }
}

#[enum_dispatch(PacketCommon)]
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Packet {
    Heartbeat(Heartbeat),
    TranslatedData(TranslatedData),
}

/////////////
//
// HEARTBEATS
//
/////////////

#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Heartbeat {
    pub datalog: Serial,
}
impl Heartbeat {
    fn decode(input: &[u8]) -> Result<Self, Error> {
        if input.len() < HEADER_LEN + 1 {
            return Err(Error::decode("heartbeat packet too short"));
        }

        // 0 data bytes follow the length byte
        if input[18] != 0 {
            return Err(Error::decode(format!(
                "heartbeat with non-zero ({}) length byte",
                input[18]
            )));
        }

        let datalog = Serial::new(&input[8..18])?;

        Ok(Self { datalog })
    }
}

impl PacketCommon for Heartbeat {
    fn protocol(&self) -> u16 {
        2
    }

    fn datalog(&self) -> Serial {
        self.datalog
    }

    fn tcp_function(&self) -> TcpFunction {
        TcpFunction::Heartbeat
    }

    fn bytes(&self) -> Vec<u8> {
        vec![0]
    }
}

/////////////
//
// TRANSLATED DATA
//
/////////////

// header + data length + address/function/serial/register + checksum
const MIN_TRANSLATED_LEN: usize = HEADER_LEN + 2 + 14 + 2;

#[derive(Eq, PartialEq, Clone, Debug)]
pub struct TranslatedData {
    pub datalog: Serial,
    pub source: PacketSource,
    pub device_function: DeviceFunction, // ReadHold or ReadInput etc..
    pub inverter: Serial,                // inverter serial
    pub register: u16,                   // first register of values
    pub values: Vec<u8>,                 // undecoded; register count on read requests
}
impl TranslatedData {
    pub fn read_input(&self) -> Result<ReadInput, Error> {
        match (self.register, self.values.len()) {
            (0, 254) => Ok(ReadInput::ReadInputAll(Box::new(self.read_input_all()?))),
            (0, 80) => Ok(ReadInput::ReadInput1(Self::read_input1(&self.values)?)),
            (40, 80) => Ok(ReadInput::ReadInput2(Self::read_input2(&self.values)?)),
            (80, 80) => Ok(ReadInput::ReadInput3(Self::parse_bank(80, &self.values)?)),
            (120, 80) => Ok(ReadInput::ReadInput4(Self::parse_bank(120, &self.values)?)),
            (r1, r2) => Err(Error::decode(format!(
                "unhandled ReadInput register={} len={}",
                r1, r2
            ))),
        }
    }

    fn read_input_all(&self) -> Result<ReadInputAll, Error> {
        let values = &self.values;

        // registers 127-159 were not asked for; pad so the bank parser can run
        let mut generator = values[240..].to_vec();
        generator.resize(80, 0);

        Ok(ReadInputAll {
            input1: Self::read_input1(&values[0..80])?,
            input2: Self::read_input2(&values[80..160])?,
            input3: Self::parse_bank(80, &values[160..240])?,
            generator: Self::parse_bank(120, &generator)?,
        })
    }

    fn read_input1(values: &[u8]) -> Result<ReadInput1, Error> {
        let mut r = Self::parse_bank::<ReadInput1>(0, values)?;
        r.calculate_derived_values()
            .map_err(|err| Error::decode(err.to_string()))?;
        Ok(r)
    }

    fn read_input2(values: &[u8]) -> Result<ReadInput2, Error> {
        let mut r = Self::parse_bank::<ReadInput2>(40, values)?;
        r.calculate_derived_values()
            .map_err(|err| Error::decode(err.to_string()))?;
        Ok(r)
    }

    fn parse_bank<'a, T: Parse<&'a [u8]>>(register: u16, values: &'a [u8]) -> Result<T, Error> {
        T::parse(values)
            .map(|(_, r)| r)
            .map_err(|err| Error::decode(format!("input bank {}: {}", register, err)))
    }

    fn decode(input: &[u8]) -> Result<Self, Error> {
        let len = input.len();
        if len < MIN_TRANSLATED_LEN {
            return Err(Error::decode(format!(
                "TranslatedData::decode packet too short ({} bytes)",
                len
            )));
        }

        let protocol = Utils::u16ify(input, 2);
        let datalog = Serial::new(&input[8..18])?;

        // the length field counts everything after itself, checksum included
        let data_length = Utils::u16ify(input, 18) as usize;
        if data_length != len - 20 {
            return Err(Error::decode(format!(
                "TranslatedData::decode data length field {} but {} bytes follow",
                data_length,
                len - 20
            )));
        }

        let data = &input[20..len - 2];

        let checksum = &input[len - 2..];
        if Self::checksum(data) != checksum {
            return Err(Error::decode(format!(
                "TranslatedData::decode checksum mismatch - got {:?}, expected {:?}",
                checksum,
                Self::checksum(data)
            )));
        }

        let source = if data[0] == 0 {
            PacketSource::Client
        } else {
            PacketSource::Inverter
        };

        if data[1] & 0x80 != 0 {
            return Err(Error::decode(format!(
                "inverter returned exception for function {} (code {:?})",
                data[1] & 0x7F,
                data.get(14)
            )));
        }
        let device_function = DeviceFunction::try_from(data[1])
            .map_err(|_| Error::decode(format!("unknown device function {}", data[1])))?;
        let inverter = Serial::new(&data[2..12])?;
        let register = Utils::u16ify(data, 12);

        let mut value_offset = 14;
        if device_function == DeviceFunction::WriteMulti && source == PacketSource::Client {
            value_offset += 2; // register count
        }

        let value_len = if Self::has_value_length_byte(source, protocol, device_function) {
            let len_byte = *data
                .get(value_offset)
                .ok_or_else(|| Error::decode("TranslatedData::decode missing value length byte"))?;
            value_offset += 1;
            len_byte as usize
        } else {
            2
        };

        let values = data.get(value_offset..).unwrap_or_default().to_vec();

        if values.len() != value_len {
            return Err(Error::decode(format!(
                "TranslatedData::decode mismatch: values.len()={}, value_length_byte={}",
                values.len(),
                value_len
            )));
        }

        Ok(Self {
            datalog,
            source,
            device_function,
            inverter,
            register,
            values,
        })
    }

    fn has_value_length_byte(
        source: PacketSource,
        protocol: u16,
        device_function: DeviceFunction,
    ) -> bool {
        use DeviceFunction::*;

        let p1 = protocol == 1;
        let psi = source == PacketSource::Inverter;
        match device_function {
            ReadHold | ReadInput => !p1 && psi,
            WriteSingle => false,
            WriteMulti => !p1 && !psi,
        }
    }

    pub fn checksum(data: &[u8]) -> [u8; 2] {
        crc16::State::<crc16::MODBUS>::calculate(data).to_le_bytes()
    }
}

impl PacketCommon for TranslatedData {
    // only read requests are ever encoded on the client side
    fn protocol(&self) -> u16 {
        match self.source {
            PacketSource::Inverter => 2,
            PacketSource::Client => 1,
        }
    }

    fn datalog(&self) -> Serial {
        self.datalog
    }

    fn tcp_function(&self) -> TcpFunction {
        TcpFunction::TranslatedData
    }

    fn bytes(&self) -> Vec<u8> {
        let mut data = vec![0; 16];

        data[2] = match self.source {
            PacketSource::Client => 0,
            PacketSource::Inverter => 1,
        };
        data[3] = self.device_function as u8;
        data[4..14].copy_from_slice(&self.inverter.data());
        data[14..16].copy_from_slice(&self.register.to_le_bytes());

        if Self::has_value_length_byte(self.source, self.protocol(), self.device_function) {
            data.push(self.values.len() as u8);
        }

        data.extend_from_slice(&self.values);

        // the two length bytes themselves aren't counted but the two checksum bytes are
        let data_length = data.len() as u16;
        data[0..2].copy_from_slice(&data_length.to_le_bytes());

        // checksum does not include the first two bytes (data length)
        let checksum = Self::checksum(&data[2..]);
        data.extend_from_slice(&checksum);

        data
    }
}

pub struct Parser;
impl Parser {
    /// Whether the frame carries a tcp function this parser decodes. Other
    /// functions (parameter reads and writes by other clients) are not ours.
    /// Frames too short to tell are left to `parse` to reject.
    pub fn is_supported(input: &[u8]) -> bool {
        input
            .get(7)
            .map_or(true, |f| TcpFunction::try_from(*f).is_ok())
    }

    pub fn parse(input: &[u8]) -> Result<Packet, Error> {
        let len = input.len();
        if len < HEADER_LEN {
            return Err(Error::decode(format!("packet less than 18 bytes ({})", len)));
        }

        if input[0..2] != PREFIX {
            return Err(Error::decode(format!(
                "invalid packet prefix {:02X} {:02X}",
                input[0], input[1]
            )));
        }

        let frame_length = Utils::u16ify(input, 4) as usize + 6;
        if frame_length != len {
            return Err(Error::decode(format!(
                "Parser::parse mismatch: input.len()={}, frame_length={}",
                len, frame_length
            )));
        }

        let tcp_function = TcpFunction::try_from(input[7])
            .map_err(|_| Error::decode(format!("unhandled tcp_function={}", input[7])))?;

        let r = match tcp_function {
            TcpFunction::Heartbeat => Packet::Heartbeat(Heartbeat::decode(input)?),
            TcpFunction::TranslatedData => Packet::TranslatedData(TranslatedData::decode(input)?),
        };

        Ok(r)
    }
}

pub struct StatusString;
impl StatusString {
    pub fn from_value(status: u16) -> &'static str {
        match status {
            0x00 => "Standby",
            0x02 => "FW Updating",
            0x04 => "PV On-grid",
            0x08 => "PV Charge",
            0x0C => "PV Charge On-grid",
            0x10 => "Battery On-grid",
            0x11 => "Bypass",
            0x14 => "PV & Battery On-grid",
            0x19 => "PV Charge + Bypass",
            0x20 => "AC Charge",
            0x28 => "PV & AC Charge",
            0x40 => "Battery Off-grid",
            0x80 => "PV Off-grid",
            0xC0 => "PV & Battery Off-grid",
            0x88 => "PV Charge Off-grid",

            _ => "Unknown",
        }
    }
}

pub struct WarningCodeString;
impl WarningCodeString {
    // only the lowest set bit is reported
    pub fn from_value(value: u32) -> &'static str {
        (0..=31)
            .find(|i| value & (1 << i) > 0)
            .map(Self::from_bit)
            .unwrap_or("OK")
    }

    fn from_bit(bit: usize) -> &'static str {
        match bit {
            0 => "W000: Battery communication failure",
            1 => "W001: AFCI communication failure",
            2 => "W002: AFCI high",
            3 => "W003: Meter communication failure",
            4 => "W004: Both charge and discharge forbidden by battery",
            5 => "W005: Auto test failed",
            7 => "W007: LCD communication failure",
            8 => "W008: FW version mismatch",
            9 => "W009: Fan stuck",
            11 => "W011: Parallel number out of range",
            12 => "W012: Bat On Mos",
            13 => "W013: Overtemperature (NTC reading is too high)",
            15 => "W015: Battery reverse connection",
            16 => "W016: Grid power outage",
            17 => "W017: Grid voltage out of range",
            18 => "W018: Grid frequency out of range",
            20 => "W020: PV insulation low",
            21 => "W021: Leakage current high",
            22 => "W022: DCI high",
            23 => "W023: PV short",
            25 => "W025: Battery voltage high",
            26 => "W026: Battery voltage low",
            27 => "W027: Battery open circuit",
            28 => "W028: EPS overload",
            29 => "W029: EPS voltage high",
            30 => "W030: Meter reverse connection",
            31 => "W031: DCV high",
            _ => "Reserved warning",
        }
    }
}

pub struct FaultCodeString;
impl FaultCodeString {
    // only the lowest set bit is reported
    pub fn from_value(value: u32) -> &'static str {
        (0..=31)
            .find(|i| value & (1 << i) > 0)
            .map(Self::from_bit)
            .unwrap_or("OK")
    }

    fn from_bit(bit: usize) -> &'static str {
        match bit {
            0 => "E000: Internal communication fault 1",
            1 => "E001: Model fault",
            2 => "E002: BatOnMosFail",
            3 => "E003: CT Fail",
            8 => "E008: CAN communication error in parallel system",
            9 => "E009: master lost in parallel system",
            10 => "E010: multiple master units in parallel system",
            11 => "E011: AC input inconsistent in parallel system",
            12 => "E012: UPS short",
            13 => "E013: Reverse current on UPS output",
            14 => "E014: Bus short",
            15 => "E015: Phase error in three phase system",
            16 => "E016: Relay check fault",
            17 => "E017: Internal communication fault 2",
            18 => "E018: Internal communication fault 3",
            19 => "E019: Bus voltage high",
            20 => "E020: EPS connection fault",
            21 => "E021: PV voltage high",
            22 => "E022: Over current protection",
            23 => "E023: Neutral fault",
            24 => "E024: PV short",
            25 => "E025: Radiator temperature over range",
            26 => "E026: Internal fault",
            27 => "E027: Sample inconsistent between Main CPU and redundant CPU",
            31 => "E031: Internal communication fault 4",
            _ => "Reserved fault",
        }
    }
}
