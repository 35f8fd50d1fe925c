//! The I/O binding layer: capability traits for digital/analog/byte-level
//! physical I/O, a debounced [`binding::IoBinding`] that turns them into a
//! [`plc_core::ScanIo`], and a real/test pair of [`plc_core::TimeSource`]
//! implementations.
//!
//! Grounded on `fx3u_io.h`'s pin map and debounce/ADC constants. Real GPIO,
//! ADC, and UART peripherals are out of scope — this crate only defines the
//! seam, mirroring how `ull65::bus::Bus` lets a CPU run against a `SimpleBus`,
//! a `TestingBus`, or a hand-rolled `Apple1Bus` without knowing which.

pub mod binding;
pub mod capability;
pub mod clock;
pub mod sim;

pub use binding::{IoBinding, RunSwitchEvent};
pub use capability::{AnalogIn, ByteIo, DigitalIn, DigitalOut, StatusIndicator};
pub use clock::{SteppedClock, SystemClock};
pub use sim::{LoopbackByteIo, SimAnalogIn, SimDigitalIn, SimDigitalOut, SimStatusIndicator};
