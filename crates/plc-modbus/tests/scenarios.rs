//! End-to-end MODBUS request/response scenarios, checked byte-for-byte.

use plc_address::{Family, Token};
use plc_core::PlcState;
use plc_modbus::dispatch;

/// Reading four holding registers returns their big-endian values with a
/// correct byte count and CRC.
#[test]
fn read_holding_registers_returns_the_expected_frame() {
    let mut state = PlcState::new();
    state.set_d(Token::encode(Family::D, 0), 0x0011);
    state.set_d(Token::encode(Family::D, 1), 0x2233);
    state.set_d(Token::encode(Family::D, 2), 0x4455);
    state.set_d(Token::encode(Family::D, 3), 0x6677);

    let request = [0x01, 0x03, 0x00, 0x00, 0x00, 0x04, 0x44, 0x09];
    let response = dispatch(&mut state, &request).expect("well-formed request must get a response");

    assert_eq!(
        response,
        vec![0x01, 0x03, 0x08, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0xF9, 0x36]
    );
}

/// A start address beyond the `D` bank's bound returns an illegal-address
/// exception instead of touching state.
#[test]
fn read_past_the_register_bound_is_an_illegal_address_exception() {
    let mut state = PlcState::new();
    let request = [0x01, 0x03, 0xFF, 0xFF, 0x00, 0x04, 0x44, 0x2D];
    let response = dispatch(&mut state, &request).expect("malformed-address requests still get an exception");
    assert_eq!(response, vec![0x01, 0x83, 0x02, 0xC0, 0xF1]);
}

/// Writing a single coil with `0xFF00` sets it; echoing the request with a
/// freshly computed CRC is the acknowledgment. A value other than
/// `0xFF00`/`0x0000` is an illegal-value exception and must not touch state.
#[test]
fn write_single_coil_accepts_on_values_and_rejects_others() {
    let mut state = PlcState::new();
    assert!(!state.get_bit(Token::encode(Family::Y, 5)));

    let request = [0x01, 0x05, 0x00, 0x05, 0xFF, 0x00, 0x9C, 0x3B];
    let response = dispatch(&mut state, &request).unwrap();
    assert_eq!(response, request);
    assert!(state.get_bit(Token::encode(Family::Y, 5)));

    let bad_value_request = [0x01, 0x05, 0x00, 0x05, 0x12, 0x34, 0xD0, 0xBC];
    let response = dispatch(&mut state, &bad_value_request).unwrap();
    assert_eq!(response, vec![0x01, 0x85, 0x03, 0x02, 0x91]);
    assert!(state.get_bit(Token::encode(Family::Y, 5)), "a rejected write must not change the coil");
}

/// A request with a corrupted CRC is dropped entirely — no response at all.
#[test]
fn a_bad_crc_gets_no_response() {
    let mut state = PlcState::new();
    let request = [0x01, 0x03, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00];
    assert!(dispatch(&mut state, &request).is_none());
}

/// Write Single Register followed by Read Holding Registers at the same
/// address returns the value just written.
#[test]
fn write_single_register_round_trips_through_a_subsequent_read() {
    let mut state = PlcState::new();
    let write = [0x01, 0x06, 0x00, 0x05, 0x12, 0x34, 0x94, 0xBC];
    let response = dispatch(&mut state, &write).unwrap();
    assert_eq!(response, write, "FC06 echoes the request back as its acknowledgment");

    let read = [0x01, 0x03, 0x00, 0x05, 0x00, 0x01, 0x94, 0x0B];
    let response = dispatch(&mut state, &read).unwrap();
    assert_eq!(response, vec![0x01, 0x03, 0x02, 0x12, 0x34, 0xB5, 0x33]);
}

/// Write Multiple Coils packs bits little-endian within each byte: bit `j`
/// of byte `i` lands on coil `start + 8*i + j`.
#[test]
fn write_multiple_coils_preserves_bit_order_within_each_byte() {
    let mut state = PlcState::new();
    // byte 0 = 0b1011_0101, byte 1 = 0b0000_0011, starting at Y16.
    let request = [0x01, 0x0F, 0x00, 0x10, 0x00, 0x0A, 0x02, 0b1011_0101, 0b0000_0011, 0xD1, 0x39];
    let response = dispatch(&mut state, &request).unwrap();
    assert_eq!(response, vec![0x01, 0x0F, 0x00, 0x10, 0x00, 0x0A, 0xD4, 0x09]);

    let expected_bits = [true, false, true, false, true, true, false, true, true, true];
    for (j, expected) in expected_bits.iter().enumerate() {
        let token = Token::encode(Family::Y, 16 + j as u16);
        assert_eq!(state.get_bit(token), *expected, "coil {} mismatched", 16 + j);
    }
}
