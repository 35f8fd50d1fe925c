//! MODBUS-RTU frame parsing: CRC validation and header extraction, matching
//! `modbus_parse_frame`/`modbus_validate_frame`.

use crate::crc::crc16;

const MIN_FRAME_LEN: usize = 8;

/// A parsed request header. The payload (coil/register data, if any) is
/// left in the original buffer; callers index past the header bytes
/// themselves, the way `modbus_slave_process` re-reads `rx_buffer` instead
/// of copying `frame.data` out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub slave_id: u8,
    pub function_code: u8,
    pub start_address: u16,
    pub quantity: u16,
}

/// Why a request buffer could not be turned into a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer is shorter than the 8-byte minimum request size.
    TooShort { len: usize },
    /// The trailing CRC doesn't match the computed one.
    CrcMismatch { expected: u16, received: u16 },
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::TooShort { len } => write!(f, "frame too short ({len} bytes, need at least {MIN_FRAME_LEN})"),
            FrameError::CrcMismatch { expected, received } => {
                write!(f, "CRC mismatch: computed {expected:#06x}, frame carried {received:#06x}")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Checks the trailing two bytes of `buffer` against `crc16` of everything
/// before them.
#[must_use]
pub fn validate_frame(buffer: &[u8]) -> bool {
    if buffer.len() < 4 {
        return false;
    }
    let (body, trailer) = buffer.split_at(buffer.len() - 2);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    crc16(body) == received
}

/// Parses the 8-byte request header common to every function code this
/// slave supports: slave id, function code, start address, and quantity
/// (reused as the raw 16-bit value for single-write requests).
pub fn parse_frame(buffer: &[u8]) -> Result<Frame, FrameError> {
    if buffer.len() < MIN_FRAME_LEN {
        return Err(FrameError::TooShort { len: buffer.len() });
    }
    if !validate_frame(buffer) {
        let body = &buffer[..buffer.len() - 2];
        let trailer = &buffer[buffer.len() - 2..];
        return Err(FrameError::CrcMismatch {
            expected: crc16(body),
            received: u16::from_le_bytes([trailer[0], trailer[1]]),
        });
    }

    Ok(Frame {
        slave_id: buffer[0],
        function_code: buffer[1],
        start_address: u16::from_be_bytes([buffer[2], buffer[3]]),
        quantity: u16::from_be_bytes([buffer[4], buffer[5]]),
    })
}

/// Builds a MODBUS exception response: `[slave_id, function_code | 0x80,
/// exception_code, crc_lo, crc_hi]`.
#[must_use]
pub fn build_exception(slave_id: u8, function_code: u8, exception_code: u8) -> Vec<u8> {
    let mut buffer = vec![slave_id, function_code | 0x80, exception_code];
    crate::crc::append_crc(&mut buffer);
    buffer
}
