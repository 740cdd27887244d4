use clap::Parser;
use std::path::PathBuf;
/// Firmata analog reader with live Welch band powers.
#[derive(Parser, Debug)]
#[command(name = "bandprobe", version, about)]
pub struct Args {
    /// Serial port of the Firmata board, e.g. COM3 or /dev/ttyACM0.
    /// Pass `sim` to run against a built-in synthetic signal.
    #[arg(long)]
    pub port: String,
    /// Analog input channel (0 = A0).
    #[arg(long, default_value_t = 0)]
    pub pin: u8,
    /// Run length in seconds; 0 keeps going until Ctrl-C.
    #[arg(long, default_value_t = 0.0)]
    pub duration: f64,
    /// Target polling rate in Hz; non-positive disables pacing.
    #[arg(long = "target-hz", default_value_t = 100.0)]
    pub target_hz: f64,
    /// Spectral analysis window in seconds.
    #[arg(long, default_value_t = 2.0)]
    pub window: f64,
    /// Write the full acquired series to this CSV file on exit.
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Keep trace.png and bands.png updated in this directory.
    #[arg(long = "png-dir")]
    pub png_dir: Option<PathBuf>,
    /// Emit one JSON object per publish instead of status lines.
    #[arg(long)]
    pub json: bool,
}
