use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::drivers::Sample;
/// One exported row; field names become the CSV header.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ExportRow {
    t_sec: f64,
    adc_0_1023: f64,
}
/// Writes the whole acquired series in acquisition order, one row per
/// sample. Runs once, at loop exit.
pub fn export_csv(path: &Path, samples: &[Sample]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(["t_sec", "adc_0_1023"])?;
    for s in samples {
        writer.serialize(ExportRow {
            t_sec: s.t_sec,
            adc_0_1023: s.value,
        })?;
    }
    writer.flush()?;
    log::info!("saved {} samples to {}", samples.len(), path.display());
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bandprobe_{tag}_{}.csv", std::process::id()))
    }
    #[test]
    fn export_round_trips_exactly() {
        let samples: Vec<Sample> = (0..25)
            .map(|i| Sample {
                t_sec: i as f64 * 0.0101,
                value: (i as f64 * 37.3) % 1023.0,
            })
            .collect();
        let path = temp_path("roundtrip");
        export_csv(&path, &samples).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["t_sec", "adc_0_1023"])
        );
        let rows: Vec<ExportRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), samples.len());
        for (row, sample) in rows.iter().zip(&samples) {
            assert_eq!(row.t_sec, sample.t_sec);
            assert_eq!(row.adc_0_1023, sample.value);
        }
        std::fs::remove_file(&path).ok();
    }
    #[test]
    fn exporting_nothing_still_writes_the_header() {
        let path = temp_path("empty");
        export_csv(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("t_sec,adc_0_1023"));
        std::fs::remove_file(&path).ok();
    }
}
