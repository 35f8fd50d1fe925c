//! The scan engine at the heart of the FX3U-class PLC simulator.
//!
//! # Architecture
//!
//! - [`state::PlcState`] owns every addressable bank: the `X`/`Y`/`M` bit
//!   banks, the `D` word bank (with its `D8000`-series special-register
//!   overlay), and the timer/counter banks.
//! - [`instruction`] defines the ladder opcode set and the binary program
//!   format loaded into a [`scheduler::Scheduler`].
//! - [`evaluator::Evaluator`] executes one instruction at a time, threading
//!   the single boolean "bus" ladder logic depends on.
//! - [`scheduler::Scheduler`] drives the whole thing scan by scan, the way
//!   `fx3u_core_run_cycle` drives the firmware's equivalent.
//! - [`io::ScanIo`] and [`io::TimeSource`] are the capability seams the
//!   scheduler samples inputs, applies outputs, and measures scan duration
//!   through; concrete implementations live in `plc-io`.
//!
//! None of this crate talks to MODBUS or to physical I/O directly; those are
//! layered on top in `plc-modbus` and `plc-io`, both of which only ever touch
//! a [`state::PlcState`] (and, for `plc-io`, the traits in [`io`]) through
//! public seams.

pub mod counter;
pub mod evaluator;
pub mod instruction;
pub mod io;
pub mod scheduler;
pub mod state;
pub mod timer;

pub use counter::{Counter, CounterBank};
pub use evaluator::{EvalOutcome, Evaluator};
pub use instruction::{decode_program, Instruction, Opcode, Program, ProgramLoadError};
pub use io::{NullIo, ScanIo, TimeSource};
pub use scheduler::{CycleOutcome, Scheduler};
pub use state::{PlcState, RunState, ScanSummary};
pub use timer::{Timer, TimerBank};
