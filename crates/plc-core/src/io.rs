//! Capability seams the scan scheduler needs from the outside world: a time
//! source for measuring elapsed scan duration, and the bridge that
//! refreshes inputs into, and flushes outputs out of, a [`PlcState`] once
//! per cycle. Concrete hardware- or simulation-backed implementations live
//! in `plc-io`; this crate only names the seam, the way `ull65::Bus` names
//! the bus seam for its CPU.

use crate::state::PlcState;

/// A monotonic microsecond clock.
pub trait TimeSource {
    fn now_us(&mut self) -> u64;
}

/// The input-refresh/output-apply half of a scan cycle. `sample_inputs` is
/// called before the ladder program runs; `apply_outputs` after.
pub trait ScanIo {
    fn sample_inputs(&mut self, state: &mut PlcState);
    fn apply_outputs(&mut self, state: &PlcState);
}

/// A [`ScanIo`] that does nothing, for running the scan engine headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIo;

impl ScanIo for NullIo {
    fn sample_inputs(&mut self, _state: &mut PlcState) {}
    fn apply_outputs(&mut self, _state: &PlcState) {}
}
