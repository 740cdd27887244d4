use rustfft::{num_complex::Complex64, FftPlanner};
use crate::drivers::buffer::{sample_rate_hz, Sample};
/// One-sided power spectral density, frequencies ascending up to Nyquist.
#[derive(Clone, Debug)]
pub struct Psd {
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
}
/// Welch PSD estimator: averaged periodograms of overlapping Hann-tapered
/// segments. Defaults follow scipy.signal.welch (periodic Hann, 50%
/// overlap, constant detrend, density scaling) so readings stay comparable
/// with the usual tooling.
pub struct WelchEstimator {
    max_segment_len: usize,
}
/// Below this many samples a window is not worth analyzing.
pub const MIN_WINDOW_SAMPLES: usize = 16;
impl Default for WelchEstimator {
    fn default() -> Self {
        Self {
            max_segment_len: 256,
        }
    }
}
impl WelchEstimator {
    pub fn new() -> Self {
        Self::default()
    }
    /// Estimate the PSD of a window slice.
    ///
    /// Declines (`None`) when the slice has 16 or fewer samples or spans no
    /// time; the caller keeps its previous snapshot for that cycle.
    pub fn estimate(&self, window: &[Sample]) -> Option<Psd> {
        if window.len() <= MIN_WINDOW_SAMPLES {
            return None;
        }
        let fs = sample_rate_hz(window)?;
        let n = window.len();
        let nperseg = self.max_segment_len.min(n);
        let step = nperseg - nperseg / 2;
        let taper = hann_periodic(nperseg);
        let win_power: f64 = taper.iter().map(|w| w * w).sum();
        let scale = 1.0 / (fs * win_power);
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(nperseg);
        let n_freqs = nperseg / 2 + 1;
        let mut power = vec![0.0; n_freqs];
        let mut segments = 0usize;
        let mut buffer = vec![Complex64::default(); nperseg];
        let mut start = 0;
        while start + nperseg <= n {
            let segment = &window[start..start + nperseg];
            let mean =
                segment.iter().map(|s| s.value).sum::<f64>() / nperseg as f64;
            for (slot, (s, w)) in buffer.iter_mut().zip(segment.iter().zip(&taper)) {
                *slot = Complex64::new((s.value - mean) * w, 0.0);
            }
            fft.process(&mut buffer);
            for (k, acc) in power.iter_mut().enumerate() {
                let mut p = buffer[k].norm_sqr() * scale;
                // One-sided spectrum: fold the negative frequencies in,
                // except at DC and (for even lengths) Nyquist.
                let at_nyquist = nperseg % 2 == 0 && k == n_freqs - 1;
                if k > 0 && !at_nyquist {
                    p *= 2.0;
                }
                *acc += p;
            }
            segments += 1;
            start += step;
        }
        if segments == 0 {
            return None;
        }
        for p in &mut power {
            *p /= segments as f64;
        }
        let freqs = (0..n_freqs)
            .map(|k| k as f64 * fs / nperseg as f64)
            .collect();
        Some(Psd { freqs, power })
    }
}
fn hann_periodic(n: usize) -> Vec<f64> {
    use std::f64::consts::PI;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    fn sine(freq_hz: f64, fs: f64, seconds: f64) -> Vec<Sample> {
        let n = (fs * seconds) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                Sample {
                    t_sec: t,
                    value: (2.0 * std::f64::consts::PI * freq_hz * t).sin(),
                }
            })
            .collect()
    }
    #[test]
    fn declines_tiny_or_degenerate_windows() {
        let est = WelchEstimator::new();
        let few = sine(10.0, 200.0, 0.05);
        assert!(few.len() <= MIN_WINDOW_SAMPLES);
        assert!(est.estimate(&few).is_none());
        assert!(est.estimate(&[]).is_none());
        // Enough samples but zero time span: rate undefined, so decline.
        let stuck: Vec<Sample> = (0..32)
            .map(|_| Sample {
                t_sec: 1.0,
                value: 0.5,
            })
            .collect();
        assert!(est.estimate(&stuck).is_none());
    }
    #[test]
    fn frequencies_are_ascending_and_bounded_by_nyquist() {
        let est = WelchEstimator::new();
        let psd = est.estimate(&sine(10.0, 200.0, 2.0)).unwrap();
        assert_eq!(psd.freqs.len(), psd.power.len());
        assert!(psd.freqs.windows(2).all(|w| w[0] < w[1]));
        assert!(psd.freqs[0] >= 0.0);
        assert!(*psd.freqs.last().unwrap() <= 100.0 + 1e-9);
    }
    #[test]
    fn peak_lands_on_the_input_tone() {
        let est = WelchEstimator::new();
        let psd = est.estimate(&sine(10.0, 200.0, 2.0)).unwrap();
        let (peak_idx, _) = psd
            .power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        // 256-point segments at 200 Hz give ~0.78 Hz bins.
        assert!((psd.freqs[peak_idx] - 10.0).abs() < 1.0);
    }
    #[test]
    fn constant_signal_has_no_power() {
        let est = WelchEstimator::new();
        let flat: Vec<Sample> = (0..200)
            .map(|i| Sample {
                t_sec: i as f64 / 100.0,
                value: 0.73,
            })
            .collect();
        let psd = est.estimate(&flat).unwrap();
        assert!(psd.power.iter().all(|&p| p.abs() < 1e-12));
    }
    #[test]
    fn deterministic_for_identical_input() {
        let est = WelchEstimator::new();
        let window = sine(7.0, 150.0, 1.5);
        let a = est.estimate(&window).unwrap();
        let b = est.estimate(&window).unwrap();
        assert_eq!(a.freqs, b.freqs);
        assert_eq!(a.power, b.power);
    }
}
