use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::drivers::bands::BandPowerSnapshot;
use crate::drivers::buffer::Sample;
use crate::drivers::error::SignalError;
/// How many trailing seconds of the trace are shown.
const TRACE_HORIZON_SEC: f64 = 10.0;
const ADC_MAX: f64 = 1023.0;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub accent: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            accent: CYAN,
        }
    }
}
/// Renders the trailing seconds of the acquired series as a line plot.
/// `x_desc` carries the achieved-rate hint for display context.
pub fn render_trace_png(
    samples: &[Sample],
    x_desc: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, SignalError> {
    let Some(last) = samples.last() else {
        return Err(SignalError::Plot("trace has no samples".into()));
    };
    let t_max = last.t_sec.max(TRACE_HORIZON_SEC);
    let t_min = (last.t_sec - TRACE_HORIZON_SEC).max(0.0);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                "Analog stream (0..1023)",
                ("sans-serif", 20).into_font().color(&WHITE),
            )
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(t_min..t_max, 0.0..ADC_MAX)?;
        chart
            .configure_mesh()
            .x_desc(x_desc)
            .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        let visible = samples.iter().filter(|s| s.t_sec >= t_min);
        chart.draw_series(LineSeries::new(
            visible.map(|s| (s.t_sec, s.value)),
            &style.accent,
        ))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Renders the current band powers as a bar chart.
pub fn render_bands_png(
    snapshot: &BandPowerSnapshot,
    style: &PlotStyle,
) -> Result<Vec<u8>, SignalError> {
    if snapshot.bands.is_empty() {
        return Err(SignalError::Plot("snapshot has no bands".into()));
    }
    let y_max = snapshot
        .bands
        .iter()
        .map(|b| b.power)
        .fold(0.0f64, f64::max)
        .max(1e-9)
        * 1.1;
    let names: Vec<&'static str> = snapshot.bands.iter().map(|b| b.name).collect();
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                "Band power (Welch)",
                ("sans-serif", 20).into_font().color(&WHITE),
            )
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0.0..names.len() as f64, 0.0..y_max)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(names.len())
            .x_label_formatter(&|x| {
                names
                    .get(x.floor() as usize)
                    .map(|n| n.to_string())
                    .unwrap_or_default()
            })
            .label_style(("sans-serif", 14).into_font().color(&WHITE))
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        chart.draw_series(snapshot.bands.iter().enumerate().map(|(i, band)| {
            Rectangle::new(
                [(i as f64 + 0.15, 0.0), (i as f64 + 0.85, band.power)],
                style.accent.filled(),
            )
        }))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, SignalError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| SignalError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::bands::BANDS;
    #[test]
    fn renderers_return_png_bytes() {
        let samples: Vec<Sample> = (0..64)
            .map(|i| Sample {
                t_sec: i as f64 * 0.01,
                value: 512.0 + 300.0 * (i as f64 * 0.3).sin(),
            })
            .collect();
        let style = PlotStyle::default();
        let trace = render_trace_png(&samples, "Time, s", &style).unwrap();
        assert!(!trace.is_empty());
        let snapshot = BandPowerSnapshot::zeroed(&BANDS);
        let bars = render_bands_png(&snapshot, &style).unwrap();
        assert!(!bars.is_empty());
    }
    #[test]
    fn empty_trace_is_rejected() {
        assert!(render_trace_png(&[], "t", &PlotStyle::default()).is_err());
    }
}
