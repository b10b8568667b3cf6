mod commands;
mod delegate;
mod logging;
mod surface;

use std::backtrace::Backtrace;
use std::io;
use std::process::ExitCode;
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use audio_sidecar_core::session::device_selector::select_device;
use audio_sidecar_core::session::output_path::output_prefix;
use audio_sidecar_core::storage::summary::summary_line;
use audio_sidecar_core::{CaptureProvider, RecordingSession, SidecarConfig, WaveformRenderer};
use audio_sidecar_cpal::{CpalDeviceEnumerator, CpalInputCapture};

use commands::Command;
use delegate::LogDelegate;
use surface::{format_duration, TerminalSurface};

/// Roughly 30 frames per second.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn main() -> ExitCode {
    let (env_filter, log_sink) = logging::init();
    install_panic_logging();

    let config = load_config();
    if !env_filter {
        log::set_max_level(config.log_level);
    }
    if let Some(path) = config.log_file.as_deref() {
        match log_sink.open(path) {
            Ok(()) => log::debug!("Logging to {}", path.display()),
            Err(e) => log::warn!("Couldn't open log file {}: {}", path.display(), e),
        }
    }

    let mut args = std::env::args().skip(1);
    let path_arg = args.next();
    if args.next().is_some() {
        log::warn!("Only the first argument is used as the output path; the rest are ignored");
    }
    let prefix = output_prefix(path_arg.as_deref());
    log::info!("Output prefix: {}", prefix);

    let enumerator = CpalDeviceEnumerator::new();
    log::debug!("Audio host: {}", enumerator.host_name());
    let devices = match enumerator.list_capture_devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::error!("Couldn't initialize audio: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let provider = select_device(&devices, config.interface.as_deref(), config.match_policy)
        .cloned()
        .map(CpalInputCapture::with_device);
    if let Some(ref provider) = provider {
        if !provider.is_available() {
            log::warn!("Device {} disappeared after enumeration", provider.device_info().name);
        }
    }

    let mut session = RecordingSession::new(config, provider, prefix);
    session.set_delegate(Arc::new(LogDelegate));
    if let Err(e) = session.start_capture() {
        log::error!("Couldn't start the session: {}", e);
    }

    let commands = match commands::spawn_reader(io::BufReader::new(io::stdin())) {
        Ok(rx) => Some(rx),
        Err(e) => {
            log::warn!("Couldn't read commands from stdin: {}", e);
            None
        }
    };
    log::info!("Recording. 'p' + Enter pauses or resumes, Enter stops.");

    let renderer = WaveformRenderer::default();
    let mut surface = TerminalSurface::stderr();
    let device_label = session
        .device()
        .map(|d| d.name)
        .unwrap_or_else(|| "no device".into());

    'frames: loop {
        let frame_start = Instant::now();

        if let Some(rx) = commands.as_ref() {
            loop {
                match rx.try_recv() {
                    Ok(Command::TogglePause) => toggle_pause(&mut session),
                    Ok(Command::Quit) | Err(TryRecvError::Disconnected) => break 'frames,
                    Err(TryRecvError::Empty) => break,
                }
            }
        }

        session.tick();

        let marker = if session.state().is_paused() { "paused" } else { "rec" };
        let status = format!(
            "{} {} [{}]",
            marker,
            format_duration(Duration::from_secs_f64(session.duration_secs())),
            device_label
        );
        renderer.paint(&session.bin_peaks(renderer.bins), &mut surface, &status);

        thread::sleep(FRAME_INTERVAL.saturating_sub(frame_start.elapsed()));
    }
    surface.finish();

    match session.finalize() {
        Ok(result) => match summary_line(&result) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("{}", e),
        },
        Err(e) => log::error!("Recording lost: {}", e),
    }
    log::debug!("{:?}", session.diagnostics());
    ExitCode::SUCCESS
}

fn install_panic_logging() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("{}\n{}", info, Backtrace::capture());
        default_hook(info);
    }));
}

fn load_config() -> SidecarConfig {
    let path = SidecarConfig::default_path();
    match SidecarConfig::load(&path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("{}; using defaults", e);
            SidecarConfig::default()
        }
    }
}

fn toggle_pause<P: CaptureProvider>(session: &mut RecordingSession<P>) {
    let result = if session.state().is_paused() {
        session.resume_capture()
    } else {
        session.pause_capture()
    };
    if let Err(e) = result {
        log::warn!("{}", e);
    }
}
