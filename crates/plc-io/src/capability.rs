//! Capability traits for the physical layer. Nothing in this crate owns a
//! real GPIO/ADC peripheral — each trait is the narrow seam [`crate::binding::IoBinding`]
//! drives, the way `ull65::bus::Bus` lets a CPU run against whatever memory
//! map implements it. `plc-core` never sees these traits directly; it only
//! sees [`plc_core::ScanIo`].

/// A bank of debounced-at-the-source digital inputs, read by channel index.
pub trait DigitalIn {
    fn read(&mut self, channel: u8) -> bool;
}

/// A bank of digital outputs, written by channel index.
pub trait DigitalOut {
    fn write(&mut self, channel: u8, value: bool);
}

/// A multi-channel ADC returning raw counts (0..4095 for a 12-bit converter).
pub trait AnalogIn {
    fn read_raw(&mut self, channel: u8) -> u16;
}

/// A raw byte-oriented transport (e.g. the RS-485 link `plc-sim` frames
/// MODBUS requests over). Framing and dispatch live in `plc-modbus`; this
/// trait is only the byte pipe underneath it.
pub trait ByteIo {
    /// Non-blocking: returns `None` when no byte is currently available.
    fn read_byte(&mut self) -> Option<u8>;
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// The RUN/ERR status LEDs, set once per cycle from the scheduler's run
/// state and error register (`io_set_led_run`/`io_set_led_err`).
pub trait StatusIndicator {
    fn set_run(&mut self, on: bool);
    fn set_err(&mut self, on: bool);
}
