use thiserror::Error;
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("timestamp {next} does not advance past {last}; acquisition clock must be monotonic")]
    NonMonotonicTimestamp { last: f64, next: f64 },
    #[error("sensor transport failed: {0}")]
    Sensor(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("failed to encode output: {0}")]
    Encode(String),
}
impl From<serde_json::Error> for SignalError {
    fn from(value: serde_json::Error) -> Self {
        SignalError::Encode(value.to_string())
    }
}
impl From<serialport::Error> for SignalError {
    fn from(value: serialport::Error) -> Self {
        SignalError::Sensor(value.to_string())
    }
}
impl From<std::io::Error> for SignalError {
    fn from(value: std::io::Error) -> Self {
        SignalError::Sensor(value.to_string())
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for SignalError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SignalError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for SignalError {
    fn from(value: image::ImageError) -> Self {
        SignalError::Plot(value.to_string())
    }
}
