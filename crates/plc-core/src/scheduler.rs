//! The scan scheduler: the `STOP`/`RUN`/`PAUSE` state machine and the
//! per-cycle sequence (refresh inputs, run the program, apply outputs,
//! advance counters, record stats). Mirrors `fx3u_core_run_cycle`'s
//! execute-then-timers-then-counters ordering, with input/output I/O and a
//! `PAUSE`-on-fault transition layered on top — the firmware only ever
//! starts or stops, and has no I/O abstraction to refresh through. Timers
//! no longer advance from this end-of-cycle sweep; `TMR` advances the timer
//! it names the moment it runs, so a preset is read against this same scan.

use crate::evaluator::{EvalOutcome, Evaluator};
use crate::instruction::Program;
use crate::io::{ScanIo, TimeSource};
use crate::state::{PlcState, RunState};
use log::warn;

const INVALID_OPCODE_ERROR_BASE: u16 = 0x2000;

/// Outcome of one call to [`Scheduler::run_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran the whole program to completion.
    Scanned,
    /// Execution stopped partway through on an unrecognized opcode; the
    /// scheduler has transitioned to `PAUSE`.
    Faulted { opcode: u8 },
    /// The scheduler isn't in `RUN`, so no scan happened.
    NotRunning,
    /// No program is loaded; no scan happened.
    NoProgram,
}

/// Drives [`PlcState`] and [`Evaluator`] through one scan at a time.
pub struct Scheduler {
    program: Option<Program>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Scheduler { program: None }
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// Loads a new program and resets the evaluator's per-instruction edge
    /// state to match its length.
    pub fn load_program(&mut self, evaluator: &mut Evaluator, program: Program) {
        evaluator.reset_edge_state(program.len());
        self.program = Some(program);
    }

    /// `start()`: only takes effect from `STOP` or `PAUSE`, matching the
    /// documented state machine (there is no transition out of `RUN` via
    /// `start`, it's simply a no-op there).
    pub fn start(&self, state: &mut PlcState) {
        state.set_run_state(RunState::Run);
    }

    pub fn stop(&self, state: &mut PlcState) {
        state.set_run_state(RunState::Stop);
    }

    /// `reset()`: returns to `STOP` from any state with `state` cleared back
    /// to its power-on values. The loaded program is untouched — reset is a
    /// runtime event, not a reload.
    pub fn reset(&self, state: &mut PlcState) {
        *state = PlcState::new();
    }

    /// Runs exactly one scan cycle if `state` is in `RUN` and a program is
    /// loaded:
    ///
    /// 1. Record `t0`.
    /// 2. Refresh `X`/ADC-backed `D` registers via `io`.
    /// 3. Execute the program in order; stop at the first unrecognized
    ///    opcode and transition to `PAUSE`.
    /// 4. Apply `Y`-bits via `io`.
    /// 5. Measure elapsed time, advance counters, and record scan
    ///    statistics. Timers advance inline, inside `TMR` itself — see
    ///    [`crate::timer::TimerBank::advance`].
    pub fn run_cycle<IO: ScanIo, T: TimeSource>(
        &self,
        evaluator: &mut Evaluator,
        state: &mut PlcState,
        io: &mut IO,
        time: &mut T,
    ) -> CycleOutcome {
        if state.run_state() != RunState::Run {
            return CycleOutcome::NotRunning;
        }
        let Some(program) = &self.program else {
            return CycleOutcome::NoProgram;
        };

        let t0 = time.now_us();
        io.sample_inputs(state);

        let mut fault = None;
        for (index, instruction) in program.iter().enumerate() {
            match evaluator.step(index, instruction, state) {
                EvalOutcome::Ok => {}
                EvalOutcome::InvalidOpcode(byte) => {
                    fault = Some(byte);
                    break;
                }
            }
        }

        io.apply_outputs(state);

        let elapsed_us = u32::try_from(time.now_us().saturating_sub(t0)).unwrap_or(u32::MAX);
        state.counters.advance_all();
        state.record_scan(elapsed_us);

        match fault {
            Some(byte) => {
                warn!("invalid opcode 0x{byte:02x}, pausing scheduler");
                state.set_error(INVALID_OPCODE_ERROR_BASE | u16::from(byte));
                state.set_run_state(RunState::Pause);
                CycleOutcome::Faulted { opcode: byte }
            }
            None => CycleOutcome::Scanned,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::decode_program;
    use crate::io::NullIo;
    use plc_address::{Family, Token};

    /// A clock that advances by a fixed step every call, for deterministic
    /// scan-duration bookkeeping in tests.
    struct SteppedClock {
        now_us: u64,
        step_us: u64,
    }

    impl SteppedClock {
        fn new(step_us: u64) -> Self {
            SteppedClock { now_us: 0, step_us }
        }
    }

    impl TimeSource for SteppedClock {
        fn now_us(&mut self) -> u64 {
            let now = self.now_us;
            self.now_us += self.step_us;
            now
        }
    }

    fn ld_out(src: Token, dst: Token) -> [u8; 14] {
        let mut bytes = [0u8; 14];
        bytes[0] = 0x01;
        bytes[1..3].copy_from_slice(&src.0.to_be_bytes());
        bytes[7] = 0x05;
        bytes[8..10].copy_from_slice(&dst.0.to_be_bytes());
        bytes
    }

    #[test]
    fn does_not_scan_while_stopped() {
        let mut scheduler = Scheduler::new();
        let mut evaluator = Evaluator::new(200);
        let mut state = PlcState::new();
        let mut io = NullIo;
        let mut clock = SteppedClock::new(1_000);
        let bytes = ld_out(Token::encode(Family::X, 0), Token::encode(Family::Y, 0));
        scheduler.load_program(&mut evaluator, decode_program(&bytes).unwrap());

        let outcome = scheduler.run_cycle(&mut evaluator, &mut state, &mut io, &mut clock);
        assert_eq!(outcome, CycleOutcome::NotRunning);
    }

    #[test]
    fn scans_the_loaded_program_and_records_stats() {
        let mut scheduler = Scheduler::new();
        let mut evaluator = Evaluator::new(200);
        let mut state = PlcState::new();
        let mut io = NullIo;
        let mut clock = SteppedClock::new(2_000);
        let bytes = ld_out(Token::encode(Family::X, 0), Token::encode(Family::Y, 0));
        scheduler.load_program(&mut evaluator, decode_program(&bytes).unwrap());

        state.set_x(0, true);
        scheduler.start(&mut state);
        let outcome = scheduler.run_cycle(&mut evaluator, &mut state, &mut io, &mut clock);

        assert_eq!(outcome, CycleOutcome::Scanned);
        assert!(state.get_bit(Token::encode(Family::Y, 0)));
        assert_eq!(state.cycle_count(), 1);
    }

    #[test]
    fn an_invalid_opcode_pauses_the_scheduler_and_reports_the_fault() {
        let mut scheduler = Scheduler::new();
        let mut evaluator = Evaluator::new(200);
        let mut state = PlcState::new();
        let mut io = NullIo;
        let mut clock = SteppedClock::new(1_000);
        let bytes = decode_program(&[0x7F, 0, 0, 0, 0, 0, 0]).unwrap();
        scheduler.load_program(&mut evaluator, bytes);
        scheduler.start(&mut state);

        let outcome = scheduler.run_cycle(&mut evaluator, &mut state, &mut io, &mut clock);
        assert_eq!(outcome, CycleOutcome::Faulted { opcode: 0x7F });
        assert_eq!(state.run_state(), RunState::Pause);
        assert_eq!(state.error_code(), 0x2000 | 0x7F);
    }

    #[test]
    fn start_from_pause_resumes_without_clearing_the_error_code() {
        let mut scheduler = Scheduler::new();
        let mut evaluator = Evaluator::new(200);
        let mut state = PlcState::new();
        let mut io = NullIo;
        let mut clock = SteppedClock::new(1_000);
        let bytes = decode_program(&[0x7F, 0, 0, 0, 0, 0, 0]).unwrap();
        scheduler.load_program(&mut evaluator, bytes);
        scheduler.start(&mut state);
        scheduler.run_cycle(&mut evaluator, &mut state, &mut io, &mut clock);
        assert_eq!(state.run_state(), RunState::Pause);
        let error_code = state.error_code();
        assert_ne!(error_code, 0);

        scheduler.start(&mut state);
        assert_eq!(state.run_state(), RunState::Run);
        assert_eq!(state.error_code(), error_code, "start() from PAUSE must not clear the fault");
    }

    #[test]
    fn reset_returns_to_stop_with_state_cleared_from_any_state() {
        let scheduler = Scheduler::new();
        let mut state = PlcState::new();
        scheduler.start(&mut state);
        state.set_error(0x2001);
        state.set_y(0, true);

        scheduler.reset(&mut state);

        assert_eq!(state.run_state(), RunState::Stop);
        assert_eq!(state.error_code(), 0);
        assert!(!state.get_y(0));
    }

    #[test]
    fn missing_program_is_reported_distinctly() {
        let mut scheduler = Scheduler::new();
        let mut evaluator = Evaluator::new(200);
        let mut state = PlcState::new();
        let mut io = NullIo;
        let mut clock = SteppedClock::new(1_000);
        scheduler.start(&mut state);
        assert_eq!(
            scheduler.run_cycle(&mut evaluator, &mut state, &mut io, &mut clock),
            CycleOutcome::NoProgram
        );
    }
}
