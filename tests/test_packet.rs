mod common;
use common::*;
use luxpower_poller::lxp::codec::{
    decode_request, decode_response, encode_request, Command, RequestFrame,
};
use luxpower_poller::lxp::packet::{
    DeviceFunction, PacketSource, Parser, StatusString, TranslatedData, WarningCodeString,
};
use luxpower_poller::prelude::*;

fn reseal(frame: &mut [u8]) {
    let n = frame.len();
    let crc = TranslatedData::checksum(&frame[20..n - 2]);
    frame[n - 2..].copy_from_slice(&crc);
}

#[test]
fn request_layout() {
    let bytes = encode_request(DONGLE_SERIAL, INVERTER_SERIAL, Command::read_bank(40)).unwrap();

    assert_eq!(bytes.len(), 38);
    assert_eq!(bytes[0..2], [0xA1, 0x1A]);
    assert_eq!(bytes[2..4], [1, 0]); // protocol
    assert_eq!(bytes[4..6], [32, 0]); // frame length - 6
    assert_eq!(bytes[6], 1);
    assert_eq!(bytes[7], 194);
    assert_eq!(&bytes[8..18], DONGLE_SERIAL.as_bytes());
    assert_eq!(bytes[18..20], [18, 0]); // data length
    assert_eq!(bytes[20], 0); // client
    assert_eq!(bytes[21], 4); // read input
    assert_eq!(&bytes[22..32], INVERTER_SERIAL.as_bytes());
    assert_eq!(bytes[32..34], [40, 0]);
    assert_eq!(bytes[34..36], [40, 0]);
    assert_eq!(bytes[36..38], TranslatedData::checksum(&bytes[20..36]));
}

#[test]
fn request_round_trips() {
    let serials = [
        ("AB12345678", "SN00001234"),
        ("0000000000", "ZZZZZZZZZZ"),
        ("a-b_c.d e~", "!#$%&()*+,"),
    ];

    for (dongle, inverter) in serials {
        for register in [0, 40, 80, 120, 1000] {
            for count in [1, 40, 127] {
                let command = Command::ReadInput { register, count };
                let bytes = encode_request(dongle, inverter, command).unwrap();
                let expected = RequestFrame::new(dongle, inverter, command).unwrap();
                assert_eq!(decode_request(&bytes).unwrap(), expected);
            }
        }
    }
}

#[test]
fn request_rejects_bad_serials() {
    for bad in ["", "AB1234567", "AB123456789", "AB1234567\u{e9}"] {
        let err = encode_request(bad, INVERTER_SERIAL, Command::read_bank(0)).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{:?}", err);

        let err = encode_request(DONGLE_SERIAL, bad, Command::read_bank(0)).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{:?}", err);
    }
}

#[test]
fn request_rejects_bad_counts() {
    for count in [0, 128, 1000] {
        let command = Command::ReadInput { register: 0, count };
        assert!(matches!(
            RequestFrame::new(DONGLE_SERIAL, INVERTER_SERIAL, command),
            Err(Error::Config(_))
        ));
    }
}

#[test]
fn decode_request_rejects_replies() {
    let err = decode_request(&Factory::reply(0)).unwrap_err();
    assert!(err.is_decode());
}

#[test]
fn decodes_bank_0() {
    let snapshot = decode_response(&Factory::reply(0)).unwrap();

    assert_eq!(snapshot.number(Field::Status), Some(12.0));
    assert_eq!(snapshot.text(Field::StatusText), Some("PV Charge On-grid"));
    assert_eq!(snapshot.number(Field::Pv1Voltage), Some(250.0));
    assert_eq!(snapshot.number(Field::BatteryVoltage), Some(53.1));
    assert_eq!(snapshot.number(Field::Soc), Some(85.0));
    assert_eq!(snapshot.number(Field::Soh), Some(100.0));
    assert_eq!(snapshot.number(Field::PvPower), Some(2000.0));
    assert_eq!(snapshot.number(Field::BatteryPower), Some(1500.0));
    assert_eq!(snapshot.number(Field::BatteryDischargePower), Some(0.0));
    assert_eq!(snapshot.number(Field::GridVoltageR), Some(240.1));
    assert_eq!(snapshot.number(Field::GridFrequency), Some(50.0));
    assert_eq!(snapshot.number(Field::PowerFactor), Some(1.0));
    assert_eq!(snapshot.number(Field::GridPower), Some(-150.0));
    assert_eq!(snapshot.number(Field::PvEnergyToday), Some(16.8));
    assert_eq!(snapshot.updated_at, None);

    // nothing from other banks
    assert_eq!(snapshot.get(Field::Runtime), None);
}

#[test]
fn decodes_bank_40() {
    let snapshot = decode_response(&Factory::reply(40)).unwrap();

    assert_eq!(snapshot.number(Field::Pv1EnergyTotal), Some(12345.6));
    assert_eq!(snapshot.number(Field::PvEnergyTotal), Some(12345.6));
    assert_eq!(snapshot.number(Field::FaultCode), Some(0.0));
    assert_eq!(snapshot.text(Field::FaultText), Some("OK"));
    assert_eq!(snapshot.number(Field::WarningCode), Some(65536.0));
    assert_eq!(snapshot.text(Field::WarningText), Some("W016: Grid power outage"));
    assert_eq!(snapshot.number(Field::InternalTemperature), Some(45.0));
    assert_eq!(snapshot.number(Field::BatteryTemperature), Some(-5.0));
    assert_eq!(snapshot.number(Field::Runtime), Some(100000.0));
}

#[test]
fn decodes_bank_80() {
    let snapshot = decode_response(&Factory::reply(80)).unwrap();

    assert_eq!(snapshot.number(Field::BmsMaxChargeCurrent), Some(200.0));
    assert_eq!(snapshot.number(Field::BatteryCount), Some(2.0));
    assert_eq!(snapshot.number(Field::BatteryCapacity), Some(280.0));
    assert_eq!(snapshot.number(Field::BatteryCurrent), Some(-12.34));
    assert_eq!(snapshot.number(Field::MaxCellVoltage), Some(3.345));
    assert_eq!(snapshot.number(Field::MaxCellTemperature), Some(21.5));
    assert_eq!(snapshot.number(Field::BatteryCycleCount), Some(321.0));
    assert_eq!(snapshot.number(Field::InverterBatteryVoltage), Some(53.2));
}

#[test]
fn decodes_bank_120() {
    let snapshot = decode_response(&Factory::reply(120)).unwrap();

    assert_eq!(snapshot.number(Field::HalfBusVoltage), Some(0.0));
    assert_eq!(snapshot.number(Field::GeneratorVoltage), Some(240.0));
    assert_eq!(snapshot.number(Field::GeneratorEnergyTotal), Some(500.0));
    assert_eq!(snapshot.number(Field::EpsL1Power), Some(350.0));
}

#[test]
fn decodes_all_inputs_in_one_reply() {
    let reply = Factory::reply_all();
    let snapshot = decode_response(&reply).unwrap();

    assert_eq!(snapshot.number(Field::Soc), Some(85.0));
    assert_eq!(snapshot.number(Field::Runtime), Some(100000.0));
    assert_eq!(snapshot.number(Field::BatteryCycleCount), Some(321.0));
    assert_eq!(snapshot.number(Field::GeneratorVoltage), Some(240.0));
    assert_eq!(snapshot.number(Field::GeneratorEnergyTotal), Some(500.0));
    // registers past 126 were not read
    assert_eq!(snapshot.number(Field::EpsL1Power), None);

    // same fields as reading the first three banks one by one
    let mut banks = TelemetrySnapshot::default();
    for register in [0, 40, 80] {
        banks.merge(decode_response(&Factory::reply(register)).unwrap());
    }
    for (field, value) in &banks.values {
        assert_eq!(snapshot.get(*field), Some(value), "{}", field);
    }
}

#[test]
fn read_all_request() {
    let bytes = encode_request(DONGLE_SERIAL, INVERTER_SERIAL, Command::read_all()).unwrap();

    assert_eq!(bytes.len(), 38);
    assert_eq!(bytes[32..34], [0, 0]);
    assert_eq!(bytes[34..36], [127, 0]);
}

#[test]
fn reply_must_carry_requested_count() {
    let all = RequestFrame::new(DONGLE_SERIAL, INVERTER_SERIAL, Command::read_all()).unwrap();
    let bank = RequestFrame::new(DONGLE_SERIAL, INVERTER_SERIAL, Command::read_bank(0)).unwrap();

    assert!(all.matches(&Factory::translated_reply_all()));
    assert!(!all.matches(&Factory::translated_reply(0)));
    assert!(bank.matches(&Factory::translated_reply(0)));
    assert!(!bank.matches(&Factory::translated_reply_all()));
}

#[test]
fn leading_power_factor() {
    let mut td = Factory::translated_reply(0);
    td.values[38..40].copy_from_slice(&1950u16.to_le_bytes());

    let bytes = luxpower_poller::lxp::packet::TcpFrameFactory::build(&Packet::TranslatedData(td));
    let snapshot = decode_response(&bytes).unwrap();

    assert_eq!(snapshot.number(Field::PowerFactor), Some(0.05));
}

#[test]
fn parses_reply_packet() {
    let packet = Parser::parse(&Factory::reply(0)).unwrap();

    match packet {
        Packet::TranslatedData(td) => {
            assert_eq!(td.datalog, Factory::datalog());
            assert_eq!(td.inverter, Factory::inverter());
            assert_eq!(td.source, PacketSource::Inverter);
            assert_eq!(td.device_function, DeviceFunction::ReadInput);
            assert_eq!(td.register, 0);
            assert_eq!(td.values.len(), 80);
            assert_eq!(td.protocol(), 2);
        }
        other => panic!("unexpected packet {:?}", other),
    }
}

#[test]
fn parses_heartbeat() {
    let bytes = Factory::heartbeat();
    assert_eq!(bytes.len(), 19);

    let packet = Parser::parse(&bytes).unwrap();
    assert!(matches!(packet, Packet::Heartbeat(_)));
    assert_eq!(packet.datalog(), Factory::datalog());

    // a heartbeat carries no telemetry
    assert!(decode_response(&bytes).unwrap_err().is_decode());
}

#[test]
fn truncated_frames_fail_with_decode_error() {
    let reply = Factory::reply(0);

    for n in 0..reply.len() {
        let err = decode_response(&reply[..n]).unwrap_err();
        assert!(err.is_decode(), "prefix of {} bytes: {:?}", n, err);
    }
}

#[test]
fn checksum_mismatch_fails_with_decode_error() {
    let err = decode_response(&Factory::corrupt(Factory::reply(0))).unwrap_err();
    assert!(matches!(err, Error::Decode(ref m) if m.contains("checksum")), "{:?}", err);

    // flipping a value byte leaves the stored checksum stale
    let mut reply = Factory::reply(40);
    reply[50] ^= 0x01;
    assert!(decode_response(&reply).unwrap_err().is_decode());
}

#[test]
fn rejects_malformed_headers() {
    let mut bad_prefix = Factory::reply(0);
    bad_prefix[0] = 0x00;
    assert!(decode_response(&bad_prefix).unwrap_err().is_decode());

    let mut too_long = Factory::reply(0);
    too_long.push(0);
    assert!(decode_response(&too_long).unwrap_err().is_decode());

    let mut bad_function = Factory::reply(0);
    bad_function[7] = 0xC3;
    assert!(decode_response(&bad_function).unwrap_err().is_decode());
    assert!(!Parser::is_supported(&bad_function));
    assert!(Parser::is_supported(&Factory::reply(0)));
    assert!(Parser::is_supported(&Factory::heartbeat()));
    // too short to tell; parse reports it
    assert!(Parser::is_supported(&[0xA1, 0x1A]));

    let mut bad_data_length = Factory::reply(0);
    bad_data_length[18] += 1;
    assert!(decode_response(&bad_data_length).unwrap_err().is_decode());
}

#[test]
fn rejects_exception_reply() {
    let mut reply = Factory::reply(0);
    reply[21] = 0x84;
    reseal(&mut reply);

    let err = decode_response(&reply).unwrap_err();
    assert!(matches!(err, Error::Decode(ref m) if m.contains("exception")), "{:?}", err);
}

#[test]
fn rejects_unknown_bank() {
    let mut td = Factory::translated_reply(0);
    td.register = 200;

    let bytes = luxpower_poller::lxp::packet::TcpFrameFactory::build(&Packet::TranslatedData(td));
    assert!(decode_response(&bytes).unwrap_err().is_decode());
}

#[test]
fn status_and_warning_strings() {
    assert_eq!(StatusString::from_value(0x10), "Battery On-grid");
    assert_eq!(StatusString::from_value(0xFFFF), "Unknown");
    assert_eq!(WarningCodeString::from_value(0), "OK");
    assert_eq!(
        WarningCodeString::from_value(0b1001),
        "W000: Battery communication failure"
    );
}
