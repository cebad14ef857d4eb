//! Plays a stereo sine tone on the default output device until Enter is
//! pressed.
//!
//! ```text
//! RUST_LOG=debug cargo run -p pa-guard-native --example sine -- 440
//! ```

use std::error::Error;
use std::f64::consts::TAU;
use std::ffi::c_void;
use std::io::{self, BufRead};
use std::os::raw::{c_int, c_ulong};
use std::process::ExitCode;

use pa_guard_core::{
    CallbackBinding, CallbackResult, DefaultStreamConfig, DeviceStream, LibrarySession, SampleFormat,
    StreamCallbackTimeInfo,
};
use pa_guard_native::NativeHost;

const SAMPLE_RATE: f64 = 44_100.0;
const FRAMES_PER_BUFFER: u64 = 256;

struct Oscillator {
    phase: f64,
    phase_step: f64,
}

unsafe extern "C" fn fill_sine(
    _input: *const c_void,
    output: *mut c_void,
    frame_count: c_ulong,
    _time_info: *const StreamCallbackTimeInfo,
    _status_flags: c_ulong,
    user_data: *mut c_void,
) -> c_int {
    // SAFETY: `user_data` is the `Oscillator` bound in `main`, which outlives
    // the stream; `output` holds `frame_count` interleaved stereo f32 frames.
    let osc = &mut *(user_data as *mut Oscillator);
    let out = std::slice::from_raw_parts_mut(output as *mut f32, frame_count as usize * 2);

    for frame in out.chunks_exact_mut(2) {
        let sample = osc.phase.sin() as f32;
        frame[0] = sample;
        frame[1] = sample;
        osc.phase += osc.phase_step;
        if osc.phase >= TAU {
            osc.phase -= TAU;
        }
    }
    CallbackResult::Continue.into()
}

fn run(frequency: f64) -> Result<(), Box<dyn Error>> {
    let mut osc = Oscillator {
        phase: 0.0,
        phase_step: TAU * frequency / SAMPLE_RATE,
    };

    let session = LibrarySession::new(NativeHost::load()?)?;
    log::info!("{}", session.version_text());

    let config = DefaultStreamConfig {
        frames_per_buffer: FRAMES_PER_BUFFER,
        ..DefaultStreamConfig::output(2, SampleFormat::Float32, SAMPLE_RATE)
    };
    // SAFETY: `osc` is declared before the stream and so dropped after it.
    let binding = unsafe { CallbackBinding::new(fill_sine, &mut osc as *mut Oscillator as *mut c_void) };
    let mut stream = DeviceStream::open_default(&session, &config, Some(binding))?;

    stream.start()?;
    println!("Playing a sine wave of {frequency} Hz. Press Enter to stop.");
    io::stdin().lock().read_line(&mut String::new())?;
    stream.stop()?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "sine".into());
    let Some(frequency) = args.next().and_then(|arg| arg.parse::<f64>().ok()) else {
        eprintln!("Usage: {program} <frequency_in_hz>");
        return ExitCode::FAILURE;
    };

    match run(frequency) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
