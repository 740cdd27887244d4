use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use crate::drivers::{BandPowerSnapshot, SampleBuffer, SensorSource, WelchEstimator, BANDS};
use crate::recorder::export_csv;
use crate::sink::RenderSink;
/// Fixed per-iteration cost assumed by the pacing sleep.
const SCHED_OVERHEAD: Duration = Duration::from_micros(500);
/// The analysis/publish path fires at most this often.
const PUBLISH_INTERVAL: Duration = Duration::from_millis(100);
/// And never before this many samples exist.
const MIN_PUBLISH_SAMPLES: usize = 3;
const DEFAULT_WARMUP: Duration = Duration::from_secs(3);
const WARMUP_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Stored sample values use the raw ADC scale, not the normalized reading.
const ADC_FULL_SCALE: f64 = 1023.0;
/// What one run produced, reported after cleanup.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    pub samples: usize,
    pub rate_hz: Option<f64>,
}
/// Rate-paced acquisition loop driving buffer, spectral analysis and
/// publish throttling for one run.
///
/// Exits on configured duration, cancellation, or a fatal sensor error;
/// every exit path runs the same cleanup exactly once: optional CSV
/// export, summary line, sensor release.
pub struct AcquisitionLoop<S: SensorSource, R: RenderSink> {
    source: S,
    sink: R,
    cancel: Arc<AtomicBool>,
    duration: Option<Duration>,
    target_hz: f64,
    window_sec: f64,
    warmup: Duration,
    export_path: Option<PathBuf>,
    estimator: WelchEstimator,
    buffer: SampleBuffer,
}
impl<S: SensorSource, R: RenderSink> AcquisitionLoop<S, R> {
    pub fn new(source: S, sink: R, cancel: Arc<AtomicBool>) -> Self {
        Self {
            source,
            sink,
            cancel,
            duration: None,
            target_hz: 100.0,
            window_sec: 2.0,
            warmup: DEFAULT_WARMUP,
            export_path: None,
            estimator: WelchEstimator::new(),
            buffer: SampleBuffer::new(),
        }
    }
    /// Bounded run length; 0 means unbounded.
    pub fn duration_secs(mut self, secs: f64) -> Self {
        self.duration = (secs > 0.0).then(|| Duration::from_secs_f64(secs));
        self
    }
    /// Polling pace target; non-positive disables pacing.
    pub fn target_hz(mut self, hz: f64) -> Self {
        self.target_hz = hz;
        self
    }
    pub fn window_secs(mut self, secs: f64) -> Self {
        self.window_sec = secs;
        self
    }
    /// Warm-up budget before the loop starts. Timing out is not fatal.
    pub fn warmup(mut self, budget: Duration) -> Self {
        self.warmup = budget;
        self
    }
    pub fn export_to(mut self, path: PathBuf) -> Self {
        self.export_path = Some(path);
        self
    }
    /// Runs the session to completion and reports what was collected.
    pub fn run(mut self) -> Result<RunSummary> {
        let outcome = self.acquire();
        // Cleanup happens exactly once, whatever the exit path was.
        let summary = self.finish();
        outcome?;
        Ok(summary)
    }
    fn acquire(&mut self) -> Result<()> {
        self.source
            .enable()
            .context("failed to start sensor streaming")?;
        self.warm_up().context("sensor failed during warm-up")?;
        self.drive()
    }
    /// Bounded wait for the first reading. The sensor typically needs a
    /// moment before reporting kicks in; not seeing anything within the
    /// budget is logged and tolerated.
    fn warm_up(&mut self) -> Result<()> {
        let started = Instant::now();
        while started.elapsed() < self.warmup {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(());
            }
            if self.source.poll()?.is_some() {
                log::debug!(
                    "first sensor sample after {:.0} ms",
                    started.elapsed().as_secs_f64() * 1e3
                );
                return Ok(());
            }
            thread::sleep(WARMUP_POLL_INTERVAL);
        }
        log::warn!(
            "sensor produced no data within {:.1} s; continuing anyway",
            self.warmup.as_secs_f64()
        );
        Ok(())
    }
    fn drive(&mut self) -> Result<()> {
        let loop_start = Instant::now();
        let mut last_publish: Option<Instant> = None;
        let mut snapshot = BandPowerSnapshot::zeroed(&BANDS);
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                log::info!("cancellation requested, stopping acquisition");
                return Ok(());
            }
            if let Some(limit) = self.duration {
                if loop_start.elapsed() >= limit {
                    return Ok(());
                }
            }
            match self.source.poll().context("sensor source failed mid-run")? {
                Some(reading) => {
                    let t_sec = loop_start.elapsed().as_secs_f64();
                    if let Err(e) = self.buffer.push(t_sec, reading * ADC_FULL_SCALE) {
                        log::warn!("dropping sample: {e}");
                    }
                }
                None => {} // nothing fresh this tick
            }
            if self.target_hz > 0.0 {
                let period = Duration::from_secs_f64(1.0 / self.target_hz);
                thread::sleep(period.saturating_sub(SCHED_OVERHEAD));
            }
            let due = last_publish.map_or(true, |t| t.elapsed() >= PUBLISH_INTERVAL);
            if due && self.buffer.len() >= MIN_PUBLISH_SAMPLES {
                let window = self.buffer.tail_window(self.window_sec);
                if let Some(psd) = self.estimator.estimate(window) {
                    snapshot = BandPowerSnapshot::compute(&psd, &BANDS);
                }
                // On a declined cycle the previous snapshot stays up.
                let fs_hint = match self.buffer.sample_rate_hz() {
                    Some(fs) => format!("Fs ≈ {fs:.1} Hz"),
                    None => "Fs ≈ n/a".to_string(),
                };
                if let Err(e) = self.sink.publish(self.buffer.samples(), &snapshot, &fs_hint) {
                    log::warn!("render sink failed: {e}");
                }
                last_publish = Some(Instant::now());
            }
        }
    }
    /// Export, summary, release. Runs on every exit path.
    fn finish(&mut self) -> RunSummary {
        let summary = RunSummary {
            samples: self.buffer.len(),
            rate_hz: self.buffer.sample_rate_hz(),
        };
        if let Some(path) = &self.export_path {
            if let Err(e) = export_csv(path, self.buffer.samples()) {
                log::error!("csv export failed: {e:#}");
            }
        }
        match summary.rate_hz {
            Some(fs) => println!(
                "collected {} samples; estimated sampling rate ≈ {fs:.1} Hz",
                summary.samples
            ),
            None => println!("collected {} samples", summary.samples),
        }
        if let Err(e) = self.source.release() {
            log::warn!("sensor release failed: {e}");
        }
        summary
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{Sample, ScriptedSource, SignalError, SimulatedSource};
    use std::sync::atomic::AtomicUsize;
    #[derive(Default)]
    struct CollectSink {
        publishes: Arc<AtomicUsize>,
        last_snapshot: Arc<std::sync::Mutex<Option<BandPowerSnapshot>>>,
    }
    impl RenderSink for CollectSink {
        fn publish(
            &mut self,
            _series: &[Sample],
            snapshot: &BandPowerSnapshot,
            _fs_hint: &str,
        ) -> Result<(), SignalError> {
            self.publishes.fetch_add(1, Ordering::Relaxed);
            *self.last_snapshot.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
    }
    struct ReleaseProbe<S: SensorSource> {
        inner: S,
        released: Arc<AtomicBool>,
    }
    impl<S: SensorSource> SensorSource for ReleaseProbe<S> {
        fn enable(&mut self) -> Result<(), SignalError> {
            self.inner.enable()
        }
        fn poll(&mut self) -> Result<Option<f64>, SignalError> {
            self.inner.poll()
        }
        fn release(&mut self) -> Result<(), SignalError> {
            self.released.store(true, Ordering::Relaxed);
            self.inner.release()
        }
    }
    fn cancel_token(set: bool) -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(set))
    }
    #[test]
    fn cancellation_before_start_still_releases_the_sensor() {
        let released = Arc::new(AtomicBool::new(false));
        let source = ReleaseProbe {
            inner: ScriptedSource::looping([Some(0.5)]),
            released: Arc::clone(&released),
        };
        let summary = AcquisitionLoop::new(source, CollectSink::default(), cancel_token(true))
            .target_hz(1000.0)
            .run()
            .unwrap();
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.rate_hz, None);
        assert!(released.load(Ordering::Relaxed));
    }
    #[test]
    fn cancelled_run_still_exports_the_csv() {
        let path = std::env::temp_dir().join(format!(
            "bandprobe_cancel_export_{}.csv",
            std::process::id()
        ));
        std::fs::remove_file(&path).ok();
        let source = ScriptedSource::looping([Some(0.5)]);
        AcquisitionLoop::new(source, CollectSink::default(), cancel_token(true))
            .target_hz(1000.0)
            .export_to(path.clone())
            .run()
            .unwrap();
        // Cancellation goes through the same cleanup as a timed run: the
        // export file must exist, header included, even with no samples.
        let text = std::fs::read_to_string(&path).expect("export file written");
        assert!(text.starts_with("t_sec,adc_0_1023"));
        std::fs::remove_file(&path).ok();
    }
    #[test]
    fn warm_up_timeout_is_not_fatal() {
        let source = ScriptedSource::new([]); // never produces anything
        let summary = AcquisitionLoop::new(source, CollectSink::default(), cancel_token(false))
            .warmup(Duration::from_millis(30))
            .duration_secs(0.05)
            .target_hz(1000.0)
            .run()
            .unwrap();
        assert_eq!(summary.samples, 0);
    }
    #[test]
    fn paced_run_approaches_but_does_not_exceed_the_target_rate() {
        let source = SimulatedSource::new(10.0);
        let summary = AcquisitionLoop::new(source, CollectSink::default(), cancel_token(false))
            .warmup(Duration::from_millis(100))
            .duration_secs(0.5)
            .target_hz(50.0)
            .run()
            .unwrap();
        assert!(summary.samples >= 10, "only {} samples", summary.samples);
        let rate = summary.rate_hz.expect("rate defined");
        // Sleep-based pacing undershoots under load but must not race
        // ahead of the target beyond scheduling jitter.
        assert!(rate <= 55.0, "rate {rate} exceeds the 50 Hz target");
        assert!(rate >= 15.0, "rate {rate} implausibly low");
    }
    #[test]
    fn publish_path_is_throttled_to_ten_hertz() {
        let sink = CollectSink::default();
        let publishes = Arc::clone(&sink.publishes);
        let source = ScriptedSource::looping([Some(0.4), Some(0.6)]);
        AcquisitionLoop::new(source, sink, cancel_token(false))
            .warmup(Duration::from_millis(10))
            .duration_secs(0.35)
            .target_hz(200.0)
            .run()
            .unwrap();
        let fired = publishes.load(Ordering::Relaxed);
        // ~70 acquisition ticks but at most one publish per 100 ms.
        assert!((1..=6).contains(&fired), "published {fired} times");
    }
    #[test]
    fn snapshot_stays_zeroed_until_a_window_is_analyzable() {
        let sink = CollectSink::default();
        let last = Arc::clone(&sink.last_snapshot);
        // Ten readings, then silence: enough to publish, too few for Welch.
        let script: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64 / 10.0)).collect();
        let source = ScriptedSource::new(script);
        AcquisitionLoop::new(source, sink, cancel_token(false))
            .warmup(Duration::from_millis(10))
            .duration_secs(0.15)
            .target_hz(200.0)
            .run()
            .unwrap();
        let snapshot = last.lock().unwrap().clone().expect("published at least once");
        assert!(snapshot.bands.iter().all(|b| b.power == 0.0));
    }
}
