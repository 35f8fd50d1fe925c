//! Executes one ladder instruction at a time against a [`PlcState`],
//! threading a single boolean "bus" (power flow) the way `fx3u_ld`/`fx3u_and`/
//! `fx3u_or`/... do against `g_exec_context.bus_state` in the firmware.
//!
//! Unlike the firmware, `PLS`'s edge-tracking flag is kept per instruction
//! slot rather than in one shared `static`, so two `PLS` coils in the same
//! program don't stomp on each other's rising-edge state.

use crate::instruction::{Instruction, Opcode};
use crate::state::PlcState;
use plc_address::{Family, Token, Word};

const DIV_BY_ZERO_ERROR: u16 = 0x0001;

/// Result of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutcome {
    Ok,
    /// The instruction's opcode byte did not match any known [`Opcode`].
    InvalidOpcode(u8),
}

/// Holds the evaluator's cross-instruction state: the bus and each `PLS`
/// slot's last-seen bus value.
pub struct Evaluator {
    bus: bool,
    pls_last: Vec<bool>,
    nominal_scan_period_ms: u32,
}

impl Evaluator {
    #[must_use]
    pub fn new(nominal_scan_period_ms: u32) -> Self {
        Evaluator {
            bus: false,
            pls_last: Vec::new(),
            nominal_scan_period_ms,
        }
    }

    pub fn bus(&self) -> bool {
        self.bus
    }

    pub fn nominal_scan_period_ms(&self) -> u32 {
        self.nominal_scan_period_ms
    }

    pub fn set_nominal_scan_period_ms(&mut self, ms: u32) {
        self.nominal_scan_period_ms = ms;
    }

    /// Resizes the per-instruction `PLS` edge state to match the currently
    /// loaded program. Call this whenever a new program is loaded.
    pub fn reset_edge_state(&mut self, program_len: usize) {
        self.pls_last = vec![false; program_len];
    }

    /// Executes `instr`, which was fetched from position `index` in the
    /// program (needed only to key `PLS`'s edge state).
    pub fn step(&mut self, index: usize, instr: &Instruction, state: &mut PlcState) -> EvalOutcome {
        let Some(opcode) = Opcode::from_u8(instr.opcode) else {
            return EvalOutcome::InvalidOpcode(instr.opcode);
        };

        match opcode {
            Opcode::Ld => self.bus = state.get_bit(Token(instr.op1)),
            Opcode::And => self.bus &= state.get_bit(Token(instr.op1)),
            Opcode::Or => self.bus |= state.get_bit(Token(instr.op1)),
            Opcode::Not => self.bus = !self.bus,
            Opcode::Out => state.set_bit(Token(instr.op1), self.bus),
            Opcode::Set => {
                if self.bus {
                    state.set_bit(Token(instr.op1), true);
                }
            }
            Opcode::Rst => {
                if self.bus {
                    state.set_bit(Token(instr.op1), false);
                }
            }
            Opcode::Pls => {
                if index >= self.pls_last.len() {
                    self.pls_last.resize(index + 1, false);
                }
                let rising = self.bus && !self.pls_last[index];
                self.pls_last[index] = self.bus;
                state.set_bit(Token(instr.op1), rising);
            }
            Opcode::Tmr => self.exec_tmr(instr, state),
            Opcode::Cnt => self.exec_cnt(instr, state),
            Opcode::Mov => {
                if self.bus {
                    let value = state.get_d(Token(instr.op1));
                    state.set_d(Token(instr.op2), value);
                }
            }
            Opcode::Add => self.exec_binary_d(instr, state, |a, b| a + b),
            Opcode::Sub => self.exec_binary_d(instr, state, |a, b| a - b),
            Opcode::Mul => self.exec_binary_d(instr, state, Word::wrapping_mul_low16),
            Opcode::Div => self.exec_div(instr, state),
            Opcode::Cmp => {
                let val1 = state.get_d(Token(instr.op1));
                let val2 = state.get_d(Token(instr.op2));
                self.bus = val1 == val2;
            }
            Opcode::Nop => {}
        }

        EvalOutcome::Ok
    }

    fn exec_tmr(&mut self, instr: &Instruction, state: &mut PlcState) {
        let timer_num = instr.op1 as usize;
        if timer_num >= state.timers.len() {
            return;
        }
        if self.bus {
            let preset_periods = state.get_d(Token(instr.op2)).max(0) as u32;
            let preset_ms = preset_periods.saturating_mul(self.nominal_scan_period_ms);
            state.timers.start(timer_num, preset_ms);
            // Credit this scan's own period immediately, so a preset of N
            // periods latches done on the Nth scan TMR runs, not the (N+1)th.
            state.timers.advance(timer_num, self.nominal_scan_period_ms);
        } else {
            state.timers.stop(timer_num);
        }
        self.bus = state.timers.done(timer_num);
    }

    fn exec_cnt(&mut self, instr: &Instruction, state: &mut PlcState) {
        let counter_num = instr.op1 as usize;
        if counter_num >= state.counters.len() {
            return;
        }
        if self.bus {
            let preset = state.get_d(Token(instr.op2)) as i32;
            state.counters.start(counter_num, preset);
        } else {
            state.counters.reset(counter_num);
        }
        self.bus = state.counters.done(counter_num);
    }

    fn exec_binary_d(&self, instr: &Instruction, state: &mut PlcState, op: impl Fn(Word, Word) -> Word) {
        if !self.bus {
            return;
        }
        let val1 = Word(state.get_d(Token(instr.op1)));
        let val2 = Word(state.get_d(Token(instr.op2)));
        state.set_d(Token(instr.op3), op(val1, val2).0);
    }

    fn exec_div(&self, instr: &Instruction, state: &mut PlcState) {
        if !self.bus {
            return;
        }
        let val1 = state.get_d(Token(instr.op1));
        let val2 = state.get_d(Token(instr.op2));
        if val2 == 0 {
            state.set_error(DIV_BY_ZERO_ERROR);
            return;
        }
        state.set_d(Token(instr.op3), val1 / val2);
    }
}
