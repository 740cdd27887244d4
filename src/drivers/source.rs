use std::collections::VecDeque;
use std::time::Instant;
use rand::Rng;
use crate::drivers::SignalError;
/// Capability interface for an analog sensor transport.
///
/// `poll` never blocks: it yields the newest unconsumed reading normalized
/// to `[0.0, 1.0]`, or `None` when nothing fresh has arrived. Any transport
/// exposing this surface is interchangeable.
pub trait SensorSource {
    /// Start streaming (e.g. enable analog reporting on the board).
    fn enable(&mut self) -> Result<(), SignalError>;
    /// Newest unconsumed normalized reading, if any.
    fn poll(&mut self) -> Result<Option<f64>, SignalError>;
    /// Disconnect. Idempotent; called on every exit path.
    fn release(&mut self) -> Result<(), SignalError>;
}
impl SensorSource for Box<dyn SensorSource> {
    fn enable(&mut self) -> Result<(), SignalError> {
        (**self).enable()
    }
    fn poll(&mut self) -> Result<Option<f64>, SignalError> {
        (**self).poll()
    }
    fn release(&mut self) -> Result<(), SignalError> {
        (**self).release()
    }
}
/// In-memory source useful for tests and deterministic playback.
pub struct ScriptedSource {
    queue: VecDeque<Option<f64>>,
    repeat_last: bool,
    pub released: bool,
}
impl ScriptedSource {
    pub fn new(readings: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            queue: readings.into_iter().collect(),
            repeat_last: false,
            released: false,
        }
    }
    /// Keep replaying the final reading once the script runs out.
    pub fn looping(readings: impl IntoIterator<Item = Option<f64>>) -> Self {
        let mut s = Self::new(readings);
        s.repeat_last = true;
        s
    }
}
impl SensorSource for ScriptedSource {
    fn enable(&mut self) -> Result<(), SignalError> {
        Ok(())
    }
    fn poll(&mut self) -> Result<Option<f64>, SignalError> {
        if self.queue.len() == 1 && self.repeat_last {
            return Ok(self.queue[0]);
        }
        Ok(self.queue.pop_front().flatten())
    }
    fn release(&mut self) -> Result<(), SignalError> {
        self.released = true;
        Ok(())
    }
}
/// Hardware-free stand-in: a 10 Hz sine with a little noise, for demo runs
/// (`--port sim`) and pacing tests.
pub struct SimulatedSource {
    started: Instant,
    tone_hz: f64,
    rng: rand::rngs::ThreadRng,
}
impl SimulatedSource {
    pub fn new(tone_hz: f64) -> Self {
        Self {
            started: Instant::now(),
            tone_hz,
            rng: rand::thread_rng(),
        }
    }
}
impl SensorSource for SimulatedSource {
    fn enable(&mut self) -> Result<(), SignalError> {
        Ok(())
    }
    fn poll(&mut self) -> Result<Option<f64>, SignalError> {
        let t = self.started.elapsed().as_secs_f64();
        let tone = (2.0 * std::f64::consts::PI * self.tone_hz * t).sin();
        let noise: f64 = self.rng.gen_range(-0.02..0.02);
        Ok(Some((0.5 + 0.4 * tone + noise).clamp(0.0, 1.0)))
    }
    fn release(&mut self) -> Result<(), SignalError> {
        Ok(())
    }
}
