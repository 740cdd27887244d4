use serde::Serialize;
use crate::drivers::welch::Psd;
/// Fixed frequency band in Hz.
#[derive(Clone, Copy, Debug)]
pub struct Band {
    pub name: &'static str,
    pub fmin: f64,
    pub fmax: f64,
}
/// The classic physiological bands. Contiguous and non-overlapping; gamma
/// is unreliable at low sampling rates.
pub const BANDS: [Band; 5] = [
    Band { name: "delta", fmin: 0.5, fmax: 4.0 },
    Band { name: "theta", fmin: 4.0, fmax: 8.0 },
    Band { name: "alpha", fmin: 8.0, fmax: 13.0 },
    Band { name: "beta", fmin: 13.0, fmax: 30.0 },
    Band { name: "gamma", fmin: 30.0, fmax: 45.0 },
];
/// Trapezoidal integral of the PSD over bins with frequency in
/// `[fmin, fmax]` inclusive. Exactly 0.0 when no bins fall in range.
pub fn band_power(psd: &Psd, fmin: f64, fmax: f64) -> f64 {
    let lo = psd.freqs.partition_point(|&f| f < fmin);
    let hi = psd.freqs.partition_point(|&f| f <= fmax);
    if lo >= hi {
        return 0.0;
    }
    let freqs = &psd.freqs[lo..hi];
    let power = &psd.power[lo..hi];
    let mut total = 0.0;
    for i in 1..freqs.len() {
        total += 0.5 * (power[i] + power[i - 1]) * (freqs[i] - freqs[i - 1]);
    }
    total
}
/// Per-band powers for one analysis cycle.
#[derive(Clone, Debug, Serialize)]
pub struct BandPowerSnapshot {
    pub bands: Vec<BandPower>,
}
#[derive(Clone, Debug, Serialize)]
pub struct BandPower {
    pub name: &'static str,
    pub power: f64,
}
impl BandPowerSnapshot {
    /// All-zero snapshot, shown until the first successful analysis cycle.
    pub fn zeroed(bands: &[Band]) -> Self {
        Self {
            bands: bands
                .iter()
                .map(|b| BandPower { name: b.name, power: 0.0 })
                .collect(),
        }
    }
    /// Pure function of (PSD, band list); no state, no side effects.
    pub fn compute(psd: &Psd, bands: &[Band]) -> Self {
        Self {
            bands: bands
                .iter()
                .map(|b| BandPower {
                    name: b.name,
                    power: band_power(psd, b.fmin, b.fmax),
                })
                .collect(),
        }
    }
    pub fn power(&self, name: &str) -> Option<f64> {
        self.bands.iter().find(|b| b.name == name).map(|b| b.power)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::buffer::Sample;
    use crate::drivers::welch::WelchEstimator;
    fn flat_psd(level: f64) -> Psd {
        Psd {
            freqs: (0..101).map(|k| k as f64 * 0.5).collect(), // 0..50 Hz
            power: vec![level; 101],
        }
    }
    #[test]
    fn integrates_constant_density_to_width_times_level() {
        let psd = flat_psd(2.0);
        // alpha spans 8..13 Hz -> 5 Hz * 2.0 = 10.0
        assert!((band_power(&psd, 8.0, 13.0) - 10.0).abs() < 1e-9);
    }
    #[test]
    fn empty_bin_range_is_zero_not_an_error() {
        let psd = flat_psd(2.0);
        assert_eq!(band_power(&psd, 60.0, 80.0), 0.0);
        // A range narrower than one bin catches no pair of bins either.
        assert_eq!(band_power(&psd, 8.1, 8.2), 0.0);
    }
    #[test]
    fn snapshot_is_non_negative_and_pure() {
        let psd = flat_psd(1.5);
        let a = BandPowerSnapshot::compute(&psd, &BANDS);
        let b = BandPowerSnapshot::compute(&psd, &BANDS);
        for (x, y) in a.bands.iter().zip(&b.bands) {
            assert!(x.power >= 0.0);
            assert_eq!(x.power, y.power);
        }
    }
    #[test]
    fn alpha_tone_dominates_all_other_bands() {
        // 10 Hz sine sampled at 200 Hz over a 2 s window.
        let fs = 200.0;
        let window: Vec<Sample> = (0..400)
            .map(|i| {
                let t = i as f64 / fs;
                Sample {
                    t_sec: t,
                    value: (2.0 * std::f64::consts::PI * 10.0 * t).sin(),
                }
            })
            .collect();
        let psd = WelchEstimator::new().estimate(&window).unwrap();
        let snapshot = BandPowerSnapshot::compute(&psd, &BANDS);
        let alpha = snapshot.power("alpha").unwrap();
        for band in &snapshot.bands {
            if band.name != "alpha" {
                assert!(
                    alpha > band.power,
                    "alpha {} not above {} {}",
                    alpha,
                    band.name,
                    band.power
                );
            }
        }
    }
}
