use serde::Serialize;
use std::path::PathBuf;
use crate::drivers::{
    render_bands_png, render_trace_png, BandPowerSnapshot, PlotStyle, Sample, SignalError,
};
/// Receiver for the throttled publish path: the full acquired series, the
/// current band powers and an achieved-rate string for display context.
pub trait RenderSink {
    fn publish(
        &mut self,
        series: &[Sample],
        snapshot: &BandPowerSnapshot,
        fs_hint: &str,
    ) -> Result<(), SignalError>;
}
/// Prints one status line per publish.
#[derive(Default)]
pub struct ConsoleSink;
impl RenderSink for ConsoleSink {
    fn publish(
        &mut self,
        series: &[Sample],
        snapshot: &BandPowerSnapshot,
        fs_hint: &str,
    ) -> Result<(), SignalError> {
        let bands = snapshot
            .bands
            .iter()
            .map(|b| format!("{} {:.3e}", b.name, b.power))
            .collect::<Vec<_>>()
            .join("  ");
        println!("[{} samples, {fs_hint}]  {bands}", series.len());
        Ok(())
    }
}
/// Emits one JSON object per publish on stdout, for piping into other
/// tooling.
#[derive(Default)]
pub struct JsonLinesSink;
#[derive(Serialize)]
struct JsonRecord<'a> {
    samples: usize,
    fs_hint: &'a str,
    #[serde(flatten)]
    snapshot: &'a BandPowerSnapshot,
}
impl RenderSink for JsonLinesSink {
    fn publish(
        &mut self,
        series: &[Sample],
        snapshot: &BandPowerSnapshot,
        fs_hint: &str,
    ) -> Result<(), SignalError> {
        let record = JsonRecord {
            samples: series.len(),
            fs_hint,
            snapshot,
        };
        let line = serde_json::to_string(&record)?;
        println!("{line}");
        Ok(())
    }
}
/// File-based live dashboard: rewrites `trace.png` and `bands.png` in the
/// target directory on every publish.
pub struct PngSink {
    dir: PathBuf,
    style: PlotStyle,
}
impl PngSink {
    pub fn new(dir: PathBuf) -> Result<Self, SignalError> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| SignalError::Plot(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self {
            dir,
            style: PlotStyle::default(),
        })
    }
}
impl RenderSink for PngSink {
    fn publish(
        &mut self,
        series: &[Sample],
        snapshot: &BandPowerSnapshot,
        fs_hint: &str,
    ) -> Result<(), SignalError> {
        let x_desc = format!("Time, s   ({fs_hint})");
        let trace = render_trace_png(series, &x_desc, &self.style)?;
        let bands = render_bands_png(snapshot, &self.style)?;
        for (name, bytes) in [("trace.png", trace), ("bands.png", bands)] {
            let path = self.dir.join(name);
            std::fs::write(&path, bytes)
                .map_err(|e| SignalError::Plot(format!("cannot write {}: {e}", path.display())))?;
        }
        Ok(())
    }
}
/// Fans a publish out to every configured sink. A failing sink does not
/// stop the others; the first error is reported afterwards.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn RenderSink>>,
}
impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, sink: Box<dyn RenderSink>) {
        self.sinks.push(sink);
    }
}
impl RenderSink for FanOutSink {
    fn publish(
        &mut self,
        series: &[Sample],
        snapshot: &BandPowerSnapshot,
        fs_hint: &str,
    ) -> Result<(), SignalError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.publish(series, snapshot, fs_hint) {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
