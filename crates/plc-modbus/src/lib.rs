//! A MODBUS-RTU slave speaking directly against a [`plc_core::PlcState`]:
//! coils map to `Y`, discrete inputs to `X`, holding and input registers
//! both map to the same `D` bank (matching the firmware this is grounded
//! on, which backs both function codes with one register array).
//!
//! [`framer`] validates and parses the wire format; [`dispatcher`] does the
//! per-function-code work. [`crc`] is the CRC-16 both depend on.

pub mod crc;
pub mod dispatcher;
pub mod framer;

pub use crc::crc16;
pub use dispatcher::{dispatch, ModbusException};
pub use framer::{build_exception, parse_frame, validate_frame, Frame, FrameError};
