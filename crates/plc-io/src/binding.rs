//! Ties the capability traits together into a [`plc_core::ScanIo`]:
//! debounced digital inputs into `X`, ADC channels converted to millivolts
//! into `D`, and `Y` written straight out to the digital outputs. Grounded
//! on `fx3u_io.h`'s debounce/ADC constants (`PICO_INPUT_DEBOUNCE_MS`,
//! `PICO_ADC_RESOLUTION`, `PICO_ADC_VREF`) and on the RUN switch's own,
//! longer debounce window (`PICO_SWITCH_DEBOUNCE_MS`).

use crate::capability::{AnalogIn, DigitalIn, DigitalOut, StatusIndicator};
use plc_address::{Family, Token};
use plc_core::{PlcState, RunState, ScanIo, TimeSource};

pub const INPUT_COUNT: u8 = 10;
pub const OUTPUT_COUNT: u8 = 9;
pub const INPUT_DEBOUNCE_US: u64 = 20_000;
pub const SWITCH_DEBOUNCE_US: u64 = 50_000;

pub const ADC_CHANNEL_COUNT: u8 = 3;
pub const ADC_MAX_COUNT: u32 = 4096;
pub const ADC_VREF_MV: u32 = 3300;

/// Default `D`-register targets for the three ADC channels (AI0, AI1, PVD).
pub const DEFAULT_ADC_REGISTERS: [u16; ADC_CHANNEL_COUNT as usize] = [110, 111, 112];

/// Converts a raw ADC count to millivolts against a 3.3V, 12-bit reference.
#[must_use]
pub fn adc_to_millivolts(raw: u16) -> u16 {
    (u32::from(raw) * ADC_VREF_MV / ADC_MAX_COUNT) as u16
}

/// One channel's debounce bookkeeping: the last raw level seen and when it
/// last changed. A level only commits once it has held steady for the
/// debounce window.
#[derive(Debug, Clone, Copy)]
struct Debounce {
    raw: bool,
    committed: bool,
    changed_at_us: u64,
}

impl Debounce {
    fn new() -> Self {
        Debounce {
            raw: false,
            committed: false,
            changed_at_us: 0,
        }
    }

    /// Feeds one fresh sample; returns the (possibly unchanged) committed
    /// value.
    fn sample(&mut self, raw: bool, now_us: u64, window_us: u64) -> bool {
        if raw != self.raw {
            self.raw = raw;
            self.changed_at_us = now_us;
        }
        if self.raw != self.committed && now_us.saturating_sub(self.changed_at_us) >= window_us {
            self.committed = self.raw;
        }
        self.committed
    }
}

/// A debounced transition on the RUN switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSwitchEvent {
    NoChange,
    /// The switch just settled closed — `plc-sim` should `start()` the
    /// scheduler.
    Closed,
    /// The switch just settled open — `plc-sim` should `stop()` the
    /// scheduler.
    Open,
}

/// Binds [`DigitalIn`]/[`DigitalOut`]/[`AnalogIn`]/[`StatusIndicator`]
/// capability implementations and a [`TimeSource`] into one [`ScanIo`], plus
/// the RUN switch's own debounced edge detector (polled separately by
/// `plc-sim`, since switching the scheduler's state is outside `ScanIo`'s
/// contract).
pub struct IoBinding<D, O, A, L, T> {
    digital_in: D,
    digital_out: O,
    analog_in: A,
    status: L,
    clock: T,
    inputs: [Debounce; INPUT_COUNT as usize],
    run_switch: Debounce,
    adc_registers: [u16; ADC_CHANNEL_COUNT as usize],
}

impl<D, O, A, L, T> IoBinding<D, O, A, L, T>
where
    D: DigitalIn,
    O: DigitalOut,
    A: AnalogIn,
    L: StatusIndicator,
    T: TimeSource,
{
    pub fn new(digital_in: D, digital_out: O, analog_in: A, status: L, clock: T) -> Self {
        Self::with_adc_registers(digital_in, digital_out, analog_in, status, clock, DEFAULT_ADC_REGISTERS)
    }

    pub fn with_adc_registers(
        digital_in: D,
        digital_out: O,
        analog_in: A,
        status: L,
        clock: T,
        adc_registers: [u16; ADC_CHANNEL_COUNT as usize],
    ) -> Self {
        IoBinding {
            digital_in,
            digital_out,
            analog_in,
            status,
            clock,
            inputs: [Debounce::new(); INPUT_COUNT as usize],
            run_switch: Debounce::new(),
            adc_registers,
        }
    }

    /// Reads the RUN switch, debounces it over [`SWITCH_DEBOUNCE_US`], and
    /// reports a transition the first cycle it settles on a new level: a
    /// rising edge means `start`, a falling edge means `stop`. The switch is
    /// authoritative over CLI commands while closed — `plc-sim`'s main loop
    /// must poll this every iteration and let it override a queued CLI
    /// command, not the other way around.
    pub fn run_switch_policy(&mut self, run_switch_raw: bool) -> RunSwitchEvent {
        let before = self.run_switch.committed;
        let now = self.clock.now_us();
        let after = self.run_switch.sample(run_switch_raw, now, SWITCH_DEBOUNCE_US);
        match (before, after) {
            (false, true) => RunSwitchEvent::Closed,
            (true, false) => RunSwitchEvent::Open,
            _ => RunSwitchEvent::NoChange,
        }
    }
}

impl<D, O, A, L, T> ScanIo for IoBinding<D, O, A, L, T>
where
    D: DigitalIn,
    O: DigitalOut,
    A: AnalogIn,
    L: StatusIndicator,
    T: TimeSource,
{
    fn sample_inputs(&mut self, state: &mut PlcState) {
        let now = self.clock.now_us();
        for channel in 0..INPUT_COUNT {
            let raw = self.digital_in.read(channel);
            let committed = self.inputs[channel as usize].sample(raw, now, INPUT_DEBOUNCE_US);
            state.set_x(u16::from(channel), committed);
        }

        for channel in 0..ADC_CHANNEL_COUNT {
            let raw = self.analog_in.read_raw(channel);
            let mv = adc_to_millivolts(raw);
            let register = self.adc_registers[channel as usize];
            state.set_d(Token::encode(Family::D, register), mv as i16);
        }
    }

    fn apply_outputs(&mut self, state: &PlcState) {
        for channel in 0..OUTPUT_COUNT {
            let value = state.get_y(u16::from(channel));
            self.digital_out.write(channel, value);
        }
        self.status.set_run(state.run_state() == RunState::Run);
        self.status.set_err(state.error_code() != 0);
    }
}
