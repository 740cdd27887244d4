mod cli;
mod drivers;
mod firmata;
mod recorder;
mod session;
mod sink;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::drivers::{SensorSource, SimulatedSource};
use crate::firmata::FirmataSession;
use crate::session::AcquisitionLoop;
use crate::sink::{ConsoleSink, FanOutSink, JsonLinesSink, PngSink};
/// Tone frequency of the `--port sim` synthetic source; sits in the alpha
/// band so the band chart has something to show.
const SIM_TONE_HZ: f64 = 10.0;
fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Args::parse();
    let cancel = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let cancel = Arc::clone(&cancel);
        move || cancel.store(true, Ordering::Relaxed)
    })
    .context("failed to install Ctrl-C handler")?;
    let source: Box<dyn SensorSource> = if args.port == "sim" {
        log::info!("using simulated sensor source");
        Box::new(SimulatedSource::new(SIM_TONE_HZ))
    } else {
        // Connection failure aborts here, before the loop begins.
        Box::new(FirmataSession::connect(&args.port, args.pin)?)
    };
    let mut sinks = FanOutSink::new();
    if args.json {
        sinks.push(Box::new(JsonLinesSink));
    } else {
        sinks.push(Box::new(ConsoleSink));
    }
    if let Some(dir) = args.png_dir {
        sinks.push(Box::new(PngSink::new(dir)?));
    }
    let mut session = AcquisitionLoop::new(source, sinks, cancel)
        .duration_secs(args.duration)
        .target_hz(args.target_hz)
        .window_secs(args.window);
    if let Some(path) = args.csv {
        session = session.export_to(path);
    }
    session.run()?;
    Ok(())
}
