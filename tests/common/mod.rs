#![allow(dead_code)]

use luxpower_poller::config;
use luxpower_poller::lxp::codec::{decode_request, Command};
use luxpower_poller::lxp::dongle::Transport;
use luxpower_poller::lxp::packet::{
    DeviceFunction, Heartbeat, PacketSource, TcpFrameFactory, TranslatedData,
};
use luxpower_poller::prelude::*;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

pub const DONGLE_SERIAL: &str = "AB12345678";
pub const INVERTER_SERIAL: &str = "SN00001234";

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Factory;
impl Factory {
    pub fn datalog() -> Serial {
        Serial::from_str(DONGLE_SERIAL).unwrap()
    }

    pub fn inverter() -> Serial {
        Serial::from_str(INVERTER_SERIAL).unwrap()
    }

    pub fn dongle() -> config::Dongle {
        config::Dongle {
            enabled: true,
            host: "192.168.1.50".to_owned(),
            port: 8000,
            dongle_serial: Self::datalog(),
            inverter_serial_number: Self::inverter(),
            update_interval: Duration::from_secs(20),
            read_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            banks: None,
            heartbeats: None,
            use_tcp_nodelay: None,
            sensors: None,
        }
    }

    pub fn dongle_with_banks(banks: &[u16]) -> config::Dongle {
        config::Dongle {
            banks: Some(banks.to_vec()),
            ..Self::dongle()
        }
    }

    /// 80 bytes of register values for the input bank starting at `register`.
    pub fn bank_values(register: u16) -> Vec<u8> {
        let mut v = vec![0; 80];
        let mut set = |reg: u16, value: u16| {
            let offset = ((reg - register) * 2) as usize;
            v[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        };

        match register {
            0 => {
                set(0, 0x0C); // PV Charge On-grid
                set(1, 2500); // v_pv_1
                set(4, 531); // v_bat
                set(5, 85 | (100 << 8)); // soc, soh
                set(7, 1200); // p_pv_1
                set(8, 800); // p_pv_2
                set(10, 1500); // p_charge
                set(12, 2401); // v_ac_r
                set(15, 5000); // f_ac
                set(19, 1000); // pf
                set(26, 200); // p_to_grid
                set(27, 50); // p_to_user
                set(28, 123); // e_pv_day_1
                set(29, 45); // e_pv_day_2
            }
            40 => {
                set(40, 123456u32 as u16); // e_pv_all_1 low word
                set(41, (123456u32 >> 16) as u16);
                set(62, 0); // warning_code low word
                set(63, 1); // bit 16
                set(64, 45); // t_inner
                set(67, -5i16 as u16); // t_bat
                set(69, 100000u32 as u16); // runtime
                set(70, (100000u32 >> 16) as u16);
            }
            80 => {
                set(81, 20000); // max_chg_curr
                set(96, 2); // bat_count
                set(97, 280); // bat_capacity
                set(98, -1234i16 as u16); // bat_current
                set(101, 3345); // max_cell_voltage
                set(103, 215); // max_cell_temp
                set(106, 321); // cycle_count
                set(107, 532); // vbat_inv
            }
            120 => {
                set(121, 2400); // v_gen
                set(125, 5000); // e_gen_all
                set(129, 350); // p_eps_l1
            }
            _ => {}
        }

        v
    }

    pub fn translated_reply(register: u16) -> TranslatedData {
        TranslatedData {
            datalog: Self::datalog(),
            source: PacketSource::Inverter,
            device_function: DeviceFunction::ReadInput,
            inverter: Self::inverter(),
            register,
            values: Self::bank_values(register),
        }
    }

    /// A well-formed reply frame to a read of the bank at `register`.
    pub fn reply(register: u16) -> Vec<u8> {
        TcpFrameFactory::build(&Packet::TranslatedData(Self::translated_reply(register)))
    }

    /// Registers 0-126, as returned for `Command::read_all`.
    pub fn translated_reply_all() -> TranslatedData {
        let mut values = Vec::new();
        for register in [0, 40, 80, 120] {
            values.extend(Self::bank_values(register));
        }
        values.truncate(254);

        TranslatedData {
            values,
            ..Self::translated_reply(0)
        }
    }

    pub fn reply_all() -> Vec<u8> {
        TcpFrameFactory::build(&Packet::TranslatedData(Self::translated_reply_all()))
    }

    /// A frame with a tcp function nobody here decodes (0xC3, a parameter read).
    pub fn foreign() -> Vec<u8> {
        let mut frame = Self::heartbeat();
        frame[7] = 0xC3;
        frame
    }

    pub fn heartbeat() -> Vec<u8> {
        TcpFrameFactory::build(&Packet::Heartbeat(Heartbeat {
            datalog: Self::datalog(),
        }))
    }

    pub fn corrupt(mut frame: Vec<u8>) -> Vec<u8> {
        let n = frame.len();
        frame[n - 1] ^= 0xFF;
        frame
    }
}

pub enum Script {
    Frame(Vec<u8>),
    Timeout,
    Drop,
}

/// Stand-in for the dongle. Scripted frames are delivered first; with
/// `auto_reply` every read request is then answered with `Factory::reply` or
/// `Factory::reply_all`.
#[derive(Default)]
pub struct MockTransport {
    pub connected: bool,
    pub connect_count: usize,
    pub fail_connect: bool,
    pub auto_reply: bool,
    pub sent: Vec<(Instant, Vec<u8>)>,
    pub script: VecDeque<Script>,
    pending: VecDeque<Vec<u8>>,
}

impl MockTransport {
    pub fn auto_reply() -> Self {
        Self {
            auto_reply: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, script: Script) {
        self.script.push_back(script);
    }

    /// Registers of the read requests sent so far, in order.
    pub fn requested_registers(&self) -> Vec<u16> {
        self.sent
            .iter()
            .filter_map(|(_, bytes)| decode_request(bytes).ok())
            .map(|r| r.command().register())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), Error> {
        self.connect_count += 1;
        if self.fail_connect {
            return Err(Error::connection("connection refused"));
        }
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), Error> {
        if !self.connected {
            return Err(Error::connection("not connected"));
        }
        self.sent.push((Instant::now(), frame.to_vec()));

        if self.auto_reply {
            if let Ok(request) = decode_request(frame) {
                let reply = match request.command() {
                    Command::ReadInput { register: 0, count: 127 } => Factory::reply_all(),
                    Command::ReadInput { register, .. } => Factory::reply(register),
                };
                self.pending.push_back(reply);
            }
        }

        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, Error> {
        if !self.connected {
            return Err(Error::connection("not connected"));
        }

        match self.script.pop_front() {
            Some(Script::Frame(frame)) => return Ok(frame),
            Some(Script::Timeout) => {
                tokio::time::sleep(timeout).await;
                return Err(Error::Timeout(timeout));
            }
            Some(Script::Drop) => {
                self.connected = false;
                self.pending.clear();
                return Err(Error::connection("connection closed by peer"));
            }
            None => {}
        }

        match self.pending.pop_front() {
            Some(frame) => Ok(frame),
            None => {
                tokio::time::sleep(timeout).await;
                Err(Error::Timeout(timeout))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn disconnect(&mut self) {
        self.connected = false;
        self.pending.clear();
    }
}
