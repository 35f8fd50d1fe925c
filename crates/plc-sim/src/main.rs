//! Cooperative main loop tying the scan engine, MODBUS slave, and I/O
//! binding together — the `plc-sim` analogue of `apple1.rs`'s `pump`/`flush_display`
//! loop, reading the single-byte CLI from stdin on a background thread so
//! scanning never blocks on user input.

mod cli;
mod config;

use clap::Parser;
use cli::Command;
use config::Config;
use plc_core::{decode_program, Evaluator, PlcState, RunState, Scheduler};
use plc_io::{
    ByteIo, IoBinding, LoopbackByteIo, RunSwitchEvent, SimAnalogIn, SimDigitalIn, SimDigitalOut,
    SimStatusIndicator, SystemClock,
};
use plc_modbus::{dispatch, validate_frame};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "plc-sim", about = "FX3U-class PLC scan engine simulator")]
struct Args {
    /// Path to a compiled ladder program (the 7-bytes-per-instruction binary
    /// format); if omitted the scheduler starts with no program loaded.
    #[arg(long)]
    program: Option<PathBuf>,

    /// Path to a TOML config file; built-in defaults apply if omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn spawn_stdin_reader() -> mpsc::Receiver<u8> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        use std::io::Read;
        let mut byte = [0u8; 1];
        let mut stdin = std::io::stdin();
        while let Ok(1) = stdin.read(&mut byte) {
            if tx.send(byte[0]).is_err() {
                break;
            }
        }
    });
    rx
}

/// Drains whatever bytes have accumulated on `bus`, and if they form a
/// complete, CRC-valid RTU frame, dispatches it against `state` and queues
/// the response. Called only between whole scans, never from inside
/// `run_cycle` — MODBUS must never observe a half-executed program.
fn service_modbus(bus: &mut LoopbackByteIo, state: &mut PlcState) {
    let mut buffer = Vec::new();
    while let Some(byte) = bus.read_byte() {
        buffer.push(byte);
    }
    if buffer.is_empty() || !validate_frame(&buffer) {
        return;
    }
    if let Some(response) = dispatch(state, &buffer) {
        bus.write_bytes(&response);
    }
}

fn apply_command(command: Command, scheduler: &Scheduler, state: &mut PlcState) {
    match command {
        Command::Start => {
            log::info!("CLI: start");
            scheduler.start(state);
        }
        Command::Stop => {
            log::info!("CLI: stop");
            scheduler.stop(state);
        }
        Command::Reset => {
            log::info!("CLI: reset");
            scheduler.reset(state);
        }
        Command::Dump => {
            let summary = state.dump();
            println!(
                "state={:?} cycles={} last_us={} min_us={} max_us={} error=0x{:04x}",
                summary.run_state, summary.cycle_count, summary.last_scan_us, summary.min_scan_us, summary.max_scan_us, summary.error_code
            );
        }
        Command::Help => println!("{}", cli::HELP_TEXT),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path).unwrap_or_else(|err| {
            log::warn!("{err}, falling back to defaults");
            Config::default()
        }),
        None => Config::default(),
    };

    let mut scheduler = Scheduler::new();
    let mut evaluator = Evaluator::new(config.scan_period_ms);
    let mut state = PlcState::new();
    state.set_station_id(config.station_id);

    match &args.program {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => match decode_program(&bytes) {
                Ok(program) => {
                    log::info!("loaded {} instruction(s) from {}", program.len(), path.display());
                    scheduler.load_program(&mut evaluator, program);
                }
                Err(err) => log::warn!("failed to decode program: {err}"),
            },
            Err(err) => log::warn!("failed to read program file: {err}"),
        },
        None => log::warn!("no program loaded at startup"),
    }

    let mut io = IoBinding::with_adc_registers(
        SimDigitalIn::new(plc_io::binding::INPUT_COUNT),
        SimDigitalOut::new(plc_io::binding::OUTPUT_COUNT),
        SimAnalogIn::new(plc_io::binding::ADC_CHANNEL_COUNT),
        SimStatusIndicator::new(),
        SystemClock::new(),
        config.adc_registers,
    );
    let mut clock = SystemClock::new();

    // Placeholder RTU transport: nothing drives real RS-485 from here, but
    // the dispatch-between-scans ordering guarantee is still real and still
    // exercised against whatever bytes a future transport pushes in.
    let mut modbus_bus = LoopbackByteIo::new();

    let cli_rx = spawn_stdin_reader();
    let scan_period = Duration::from_millis(u64::from(config.scan_period_ms));
    let mut next_scan_at = Instant::now();

    println!("plc-sim ready. Type '?' for CLI help.");

    loop {
        // The RUN switch is polled every iteration and is authoritative over
        // queued CLI commands while closed — this demo has no physical
        // switch, so it never closes and the CLI always stays live.
        match io.run_switch_policy(false) {
            RunSwitchEvent::Closed => scheduler.start(&mut state),
            RunSwitchEvent::Open => scheduler.stop(&mut state),
            RunSwitchEvent::NoChange => {}
        }

        while let Ok(byte) = cli_rx.try_recv() {
            if let Some(command) = Command::from_byte(byte) {
                apply_command(command, &scheduler, &mut state);
            }
        }

        // MODBUS dispatch only ever happens here, between whole scans, never
        // inside run_cycle — the ordering guarantee the scan engine and the
        // slave both depend on.
        service_modbus(&mut modbus_bus, &mut state);

        if Instant::now() >= next_scan_at {
            let outcome = scheduler.run_cycle(&mut evaluator, &mut state, &mut io, &mut clock);
            if let plc_core::CycleOutcome::Faulted { opcode } = outcome {
                log::warn!("scan faulted on opcode 0x{opcode:02x}, scheduler paused");
            }
            next_scan_at = Instant::now() + scan_period;
        }

        if state.run_state() != RunState::Run {
            thread::sleep(Duration::from_millis(10));
        }
    }
}
