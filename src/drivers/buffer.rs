use serde::Serialize;
use crate::drivers::SignalError;
/// One timestamped reading, `t_sec` measured from loop start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub t_sec: f64,
    pub value: f64,
}
/// Append-only store of timestamped samples for one acquisition run.
///
/// Timestamps are strictly increasing; `push` rejects anything else so the
/// window search below can rely on sorted order.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
}
impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, t_sec: f64, value: f64) -> Result<(), SignalError> {
        if let Some(last) = self.samples.last() {
            if t_sec <= last.t_sec {
                return Err(SignalError::NonMonotonicTimestamp {
                    last: last.t_sec,
                    next: t_sec,
                });
            }
        }
        self.samples.push(Sample { t_sec, value });
        Ok(())
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
    /// Achieved sampling frequency over the whole buffer, if defined.
    pub fn sample_rate_hz(&self) -> Option<f64> {
        sample_rate_hz(&self.samples)
    }
    /// Maximal contiguous suffix with `t_sec >= t_last - window_sec`.
    ///
    /// Binary search keeps this cheap as the buffer grows.
    pub fn tail_window(&self, window_sec: f64) -> &[Sample] {
        let Some(last) = self.samples.last() else {
            return &[];
        };
        let cutoff = last.t_sec - window_sec;
        let start = self.samples.partition_point(|s| s.t_sec < cutoff);
        &self.samples[start..]
    }
}
/// Sampling rate estimated from timestamp spacing: `(n - 1) / span`.
///
/// `None` for fewer than two samples or a non-positive span; callers treat
/// that as "rate not yet defined", not as a failure.
pub fn sample_rate_hz(samples: &[Sample]) -> Option<f64> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(f), Some(l)) if samples.len() >= 2 => (f, l),
        _ => return None,
    };
    let span = last.t_sec - first.t_sec;
    if span <= 0.0 {
        return None;
    }
    Some((samples.len() - 1) as f64 / span)
}
