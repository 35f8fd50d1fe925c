//! Function-code dispatch: turns a validated request [`Frame`] plus its raw
//! bytes into a response, reading and writing a [`PlcState`] directly.
//! Mirrors `modbus_slave_process`'s per-function-code switch, byte layout
//! included.

use crate::crc::append_crc;
use crate::framer::{build_exception, parse_frame, Frame};
use log::debug;
use plc_core::PlcState;

const FC_READ_COILS: u8 = 0x01;
const FC_READ_DISCRETE_INPUTS: u8 = 0x02;
const FC_READ_HOLDING_REGISTERS: u8 = 0x03;
const FC_READ_INPUT_REGISTERS: u8 = 0x04;
const FC_WRITE_SINGLE_COIL: u8 = 0x05;
const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;
const FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;
const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

const COIL_COUNT: u16 = 256;
const DISCRETE_INPUT_COUNT: u16 = 256;
const REGISTER_COUNT: u16 = 4096;

/// The MODBUS exception codes this slave can return. A few (beyond the
/// three actually raised below) are kept for completeness with the
/// function-code table this dispatch loop is grounded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModbusException {
    IllegalFunction = 0x01,
    IllegalAddress = 0x02,
    IllegalValue = 0x03,
    DeviceFailure = 0x04,
    Acknowledge = 0x05,
    DeviceBusy = 0x06,
    Nak = 0x07,
    MemoryError = 0x08,
}

/// `quantity != 0`, `start` in range, and `start + quantity` does not run
/// past `max_count`. Matches `modbus_check_address`.
fn check_address(start: u16, quantity: u16, max_count: u16) -> bool {
    if quantity == 0 {
        return false;
    }
    if start >= max_count {
        return false;
    }
    u32::from(start) + u32::from(quantity) <= u32::from(max_count)
}

fn exception_response(frame: &Frame, exception: ModbusException) -> Vec<u8> {
    build_exception(frame.slave_id, frame.function_code, exception as u8)
}

fn echo_header(request: &[u8]) -> Vec<u8> {
    let mut response = request[..6].to_vec();
    append_crc(&mut response);
    response
}

fn read_coil_like(frame: &Frame, max_count: u16, mut get: impl FnMut(u16) -> bool) -> Vec<u8> {
    let byte_count = ((frame.quantity + 7) / 8) as u8;
    let mut response = vec![frame.slave_id, frame.function_code, byte_count];
    for i in 0..byte_count {
        let mut byte_val = 0u8;
        for j in 0..8u16 {
            let addr = frame.start_address + u16::from(i) * 8 + j;
            if addr < max_count && get(addr) {
                byte_val |= 1 << j;
            }
        }
        response.push(byte_val);
    }
    append_crc(&mut response);
    response
}

fn read_registers(frame: &Frame, state: &PlcState) -> Vec<u8> {
    // The firmware this mirrors truncates `quantity * 2` into a single
    // byte-count field; since `check_address` already bounds `quantity` to
    // `REGISTER_COUNT`, this only matters for requests asking for more than
    // 127 registers, where the declared byte count undercounts the payload
    // that actually follows it.
    let byte_count = (frame.quantity.wrapping_mul(2) & 0xFF) as u8;
    let mut response = vec![frame.slave_id, frame.function_code, byte_count];
    for i in 0..frame.quantity {
        let addr = frame.start_address + i;
        let value = state.d_at(addr);
        response.extend_from_slice(&value.to_be_bytes());
    }
    append_crc(&mut response);
    response
}

/// Parses and executes one request against `state`, returning the response
/// bytes to send back. Returns `None` when the request is malformed (too
/// short or a bad CRC) — such frames are silently dropped, never answered,
/// matching `modbus_slave_process`'s `return 0` on a parse failure.
pub fn dispatch(state: &mut PlcState, request: &[u8]) -> Option<Vec<u8>> {
    let frame = match parse_frame(request) {
        Ok(frame) => frame,
        Err(err) => {
            debug!("dropping malformed MODBUS request: {err}");
            return None;
        }
    };

    let response = match frame.function_code {
        FC_READ_COILS => {
            if !check_address(frame.start_address, frame.quantity, COIL_COUNT) {
                exception_response(&frame, ModbusException::IllegalAddress)
            } else {
                read_coil_like(&frame, COIL_COUNT, |addr| state.get_y(addr))
            }
        }

        FC_READ_DISCRETE_INPUTS => {
            if !check_address(frame.start_address, frame.quantity, DISCRETE_INPUT_COUNT) {
                exception_response(&frame, ModbusException::IllegalAddress)
            } else {
                read_coil_like(&frame, DISCRETE_INPUT_COUNT, |addr| state.get_x(addr))
            }
        }

        FC_READ_HOLDING_REGISTERS | FC_READ_INPUT_REGISTERS => {
            if !check_address(frame.start_address, frame.quantity, REGISTER_COUNT) {
                exception_response(&frame, ModbusException::IllegalAddress)
            } else {
                read_registers(&frame, state)
            }
        }

        FC_WRITE_SINGLE_COIL => {
            if !check_address(frame.start_address, 1, COIL_COUNT) {
                exception_response(&frame, ModbusException::IllegalAddress)
            } else {
                let raw = u16::from_be_bytes([request[4], request[5]]);
                if raw != 0xFF00 && raw != 0x0000 {
                    exception_response(&frame, ModbusException::IllegalValue)
                } else {
                    state.set_y(frame.start_address, raw == 0xFF00);
                    echo_header(request)
                }
            }
        }

        FC_WRITE_SINGLE_REGISTER => {
            if !check_address(frame.start_address, 1, REGISTER_COUNT) {
                exception_response(&frame, ModbusException::IllegalAddress)
            } else {
                let value = i16::from_be_bytes([request[4], request[5]]);
                state.set_d_at(frame.start_address, value);
                echo_header(request)
            }
        }

        FC_WRITE_MULTIPLE_COILS => {
            if !check_address(frame.start_address, frame.quantity, COIL_COUNT) {
                exception_response(&frame, ModbusException::IllegalAddress)
            } else {
                let byte_count = request.get(6).copied().unwrap_or(0);
                let expected_len = usize::from(byte_count) + 9;
                if request.len() < 9 || byte_count == 0 || request.len() != expected_len {
                    exception_response(&frame, ModbusException::IllegalValue)
                } else {
                    for i in 0..u16::from(byte_count) {
                        for j in 0..8u16 {
                            let addr = frame.start_address + i * 8 + j;
                            if addr < COIL_COUNT {
                                let byte = request[7 + i as usize];
                                state.set_y(addr, (byte >> j) & 1 != 0);
                            }
                        }
                    }
                    echo_header(request)
                }
            }
        }

        FC_WRITE_MULTIPLE_REGISTERS => {
            if !check_address(frame.start_address, frame.quantity, REGISTER_COUNT) {
                exception_response(&frame, ModbusException::IllegalAddress)
            } else {
                let byte_count = request.get(6).copied().unwrap_or(0);
                let expected_byte_count = frame.quantity.wrapping_mul(2);
                let expected_len = usize::from(expected_byte_count) + 9;
                if request.len() < 9 || u16::from(byte_count) != expected_byte_count || request.len() != expected_len
                {
                    exception_response(&frame, ModbusException::IllegalValue)
                } else {
                    let qty = byte_count / 2;
                    for i in 0..u16::from(qty) {
                        let offset = 7 + usize::from(i) * 2;
                        let value = i16::from_be_bytes([request[offset], request[offset + 1]]);
                        state.set_d_at(frame.start_address + i, value);
                    }
                    echo_header(request)
                }
            }
        }

        _ => exception_response(&frame, ModbusException::IllegalFunction),
    };

    Some(response)
}
