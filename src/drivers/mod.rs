pub mod bands;
pub mod buffer;
pub mod error;
pub mod plot;
pub mod source;
pub mod welch;
pub use bands::{band_power, Band, BandPower, BandPowerSnapshot, BANDS};
pub use buffer::{sample_rate_hz, Sample, SampleBuffer};
pub use error::SignalError;
pub use plot::{render_bands_png, render_trace_png, PlotStyle};
pub use source::{ScriptedSource, SensorSource, SimulatedSource};
pub use welch::{Psd, WelchEstimator};
