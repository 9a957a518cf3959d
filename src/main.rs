use std::{env, error::Error, fs, process::ExitCode};

use log::{error, info};

use chipcore::{
    display::FrameBuffer,
    emulator::{Emulator, StepOutcome},
    quirks::Quirks,
    sound::Beeper,
};

// The core applies no rate limiting of its own; this driver paces it at
// a caller-chosen instruction rate against a 60 fps frame loop.
const DEFAULT_CPU_HZ: u32 = 700;
const FRAME_HZ: u32 = 60;

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let rom_path = args.next().ok_or("usage: chipcore <rom> [cpu-hz]")?;
    let cpu_hz = match args.next() {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("cpu-hz is not a number: {raw}"))?,
        None => DEFAULT_CPU_HZ,
    };
    if cpu_hz < FRAME_HZ {
        return Err(format!("cpu-hz must be at least {FRAME_HZ}").into());
    }

    let rom = fs::read(&rom_path)?;
    let frontend = FrameBuffer::new("chipcore - ESC to exit")?;
    let beeper = Beeper::new()?;
    let mut emu = Emulator::new(frontend, rand::thread_rng(), Quirks::default());
    emu.load_rom(&rom)?;
    info!("running {rom_path} at {cpu_hz} instructions per second");

    let per_frame = cpu_hz / FRAME_HZ;
    'frames: loop {
        for _ in 0..per_frame {
            match emu.step() {
                Ok(StepOutcome::Running) => {}
                Ok(StepOutcome::Halted) => break 'frames,
                Err(e) => {
                    error!("machine state: {}", emu.dump());
                    return Err(e.into());
                }
            }
        }
        if emu.drain_events() == StepOutcome::Halted {
            break;
        }
        emu.render();
        beeper.set_active(emu.sound_active());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("chipcore: {e}");
            ExitCode::FAILURE
        }
    }
}
