use anyhow::{Context, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crate::drivers::{SensorSource, SignalError};
/// StandardFirmata default baud rate.
const FIRMATA_BAUD: u32 = 57_600;
const ANALOG_MESSAGE: u8 = 0xE0;
const DIGITAL_MESSAGE: u8 = 0x90;
const REPORT_ANALOG: u8 = 0xC0;
const REPORT_VERSION: u8 = 0xF9;
const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;
const ADC_MAX: f64 = 1023.0;
/// Incremental decoder for the Firmata byte stream.
///
/// Only analog messages are surfaced; digital messages and version reports
/// are consumed and dropped, SysEx frames are skipped wholesale. A byte
/// with the high bit set while data bytes are expected resynchronizes the
/// decoder on that command.
#[derive(Default)]
struct FirmataParser {
    state: ParserState,
}
#[derive(Default, Clone, Copy)]
enum ParserState {
    #[default]
    Idle,
    Sysex,
    /// Waiting for two data bytes of an analog message on this channel.
    Analog {
        channel: u8,
        lsb: Option<u8>,
    },
    /// Waiting for two data bytes we do not care about.
    Skip {
        remaining: u8,
    },
}
impl FirmataParser {
    /// Feed one byte; returns a completed `(channel, raw 0..1023)` reading.
    fn push(&mut self, byte: u8) -> Option<(u8, u16)> {
        if byte >= 0x80 && !matches!(self.state, ParserState::Sysex) {
            self.state = ParserState::Idle;
        }
        match self.state {
            ParserState::Idle => {
                match byte {
                    SYSEX_START => self.state = ParserState::Sysex,
                    REPORT_VERSION => self.state = ParserState::Skip { remaining: 2 },
                    b if b >= 0x80 => {
                        let channel = b & 0x0F;
                        match b & 0xF0 {
                            ANALOG_MESSAGE => {
                                self.state = ParserState::Analog { channel, lsb: None }
                            }
                            DIGITAL_MESSAGE => self.state = ParserState::Skip { remaining: 2 },
                            _ => {}
                        }
                    }
                    _ => {} // stray data byte, stay idle
                }
                None
            }
            ParserState::Sysex => {
                if byte == SYSEX_END {
                    self.state = ParserState::Idle;
                }
                None
            }
            ParserState::Analog { channel, lsb: None } => {
                self.state = ParserState::Analog {
                    channel,
                    lsb: Some(byte),
                };
                None
            }
            ParserState::Analog {
                channel,
                lsb: Some(lsb),
            } => {
                self.state = ParserState::Idle;
                Some((channel, u16::from(lsb) | (u16::from(byte) << 7)))
            }
            ParserState::Skip { remaining } => {
                self.state = if remaining > 1 {
                    ParserState::Skip {
                        remaining: remaining - 1,
                    }
                } else {
                    ParserState::Idle
                };
                None
            }
        }
    }
}
/// Firmata-over-serial analog sensor.
///
/// A background thread owns the read half of the port and keeps the newest
/// decoded reading in a one-slot mailbox; `poll` takes from that slot
/// without blocking. The board link is scoped: `release` (also wired
/// through `Drop`) disables reporting, stops the reader and closes the
/// port on every exit path.
pub struct FirmataSession {
    port_name: String,
    pin: u8,
    writer: Box<dyn SerialPort>,
    latest: Arc<Mutex<Option<f64>>>,
    shutdown: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    released: bool,
}
impl FirmataSession {
    /// Opens the port and starts the background reader. Failure here is
    /// fatal to the run; nothing has been acquired yet.
    pub fn connect(port_name: &str, pin: u8) -> Result<Self> {
        let writer = serialport::new(port_name, FIRMATA_BAUD)
            .timeout(Duration::from_millis(20))
            .open()
            .with_context(|| format!("failed to open serial port {port_name}"))?;
        let reader_port = writer
            .try_clone()
            .context("failed to clone serial port handle for the reader thread")?;
        let latest = Arc::new(Mutex::new(None));
        let shutdown = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));
        let reader = thread::spawn({
            let latest = Arc::clone(&latest);
            let shutdown = Arc::clone(&shutdown);
            let failed = Arc::clone(&failed);
            move || reader_loop(reader_port, pin, latest, shutdown, failed)
        });
        log::info!("connected to firmata board on {port_name}, analog pin {pin}");
        Ok(Self {
            port_name: port_name.to_string(),
            pin,
            writer,
            latest,
            shutdown,
            failed,
            reader: Some(reader),
            released: false,
        })
    }
}
impl SensorSource for FirmataSession {
    fn enable(&mut self) -> Result<(), SignalError> {
        self.writer.write_all(&[REPORT_ANALOG | self.pin, 1])?;
        self.writer.flush()?;
        Ok(())
    }
    fn poll(&mut self) -> Result<Option<f64>, SignalError> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(SignalError::Sensor(format!(
                "serial link {} went away",
                self.port_name
            )));
        }
        let mut slot = self
            .latest
            .lock()
            .map_err(|_| SignalError::Sensor("firmata reader thread panicked".into()))?;
        Ok(slot.take())
    }
    fn release(&mut self) -> Result<(), SignalError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        // Best effort: the link may already be gone.
        let _ = self.writer.write_all(&[REPORT_ANALOG | self.pin, 0]);
        let _ = self.writer.flush();
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        log::info!("released firmata board on {}", self.port_name);
        Ok(())
    }
}
impl Drop for FirmataSession {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
fn reader_loop(
    mut port: impl Read,
    pin: u8,
    latest: Arc<Mutex<Option<f64>>>,
    shutdown: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
) {
    let mut parser = FirmataParser::default();
    let mut buf = [0u8; 256];
    while !shutdown.load(Ordering::Relaxed) {
        let n = match port.read(&mut buf) {
            // A zero-length read is EOF: an unplugged device reports this
            // rather than an error, so it means the link is gone.
            Ok(0) => {
                log::error!("firmata serial stream ended; treating as disconnect");
                failed.store(true, Ordering::Relaxed);
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::error!("firmata serial read failed: {e}");
                failed.store(true, Ordering::Relaxed);
                break;
            }
        };
        for &byte in &buf[..n] {
            if let Some((channel, raw)) = parser.push(byte) {
                if channel == pin {
                    if let Ok(mut slot) = latest.lock() {
                        *slot = Some(f64::from(raw) / ADC_MAX);
                    }
                }
            }
        }
    }
}
