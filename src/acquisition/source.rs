use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind};
use std::time::Duration;

use crate::acquisition::error::AcquisitionError;

/// One ADC reading, transmitted as the decimal ASCII text of a
/// non-negative integer on its own line.
pub type RawSample = u32;

/// Read timeout; keeps the worker responsive to stop() while a read is pending.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Outcome of one poll of a sample source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourcePoll {
    /// A complete line parsed to an ADC value.
    Sample(RawSample),
    /// Nothing usable yet: the read timed out mid-line or the line was malformed.
    Pending,
    /// The underlying stream ended; no further samples will arrive.
    Closed,
}

/// Trait representing something that can yield raw ADC samples on demand.
pub trait SampleSource: Send {
    fn poll_sample(&mut self) -> Result<SourcePoll, AcquisitionError>;
}

/// Parses one raw line as a non-negative decimal integer.
///
/// Surrounding whitespace (CR/LF included) is trimmed first. Anything that
/// is not a pure run of ASCII digits is rejected; callers drop such lines
/// silently and keep sampling.
pub(crate) fn parse_adc_line(raw: &[u8]) -> Option<RawSample> {
    let text = std::str::from_utf8(raw).ok()?;
    let digits = text.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Serial-backed source of newline-delimited ADC readings.
pub struct SerialSampleSource {
    reader: BufReader<Box<dyn serialport::SerialPort>>,
    pending: Vec<u8>,
}

impl SerialSampleSource {
    /// Opens the named device with a short read timeout.
    pub fn open(port: &str, baud: u32) -> Result<Self, AcquisitionError> {
        let handle = serialport::new(port, baud)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| AcquisitionError::Connect {
                port: port.to_owned(),
                source,
            })?;
        log::info!("opened serial port {port} at {baud} baud");
        Ok(Self {
            reader: BufReader::new(handle),
            pending: Vec::new(),
        })
    }
}

impl SampleSource for SerialSampleSource {
    fn poll_sample(&mut self) -> Result<SourcePoll, AcquisitionError> {
        // read_until appends, so a line split across read timeouts is
        // reassembled in `pending` instead of being lost.
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) => Ok(SourcePoll::Closed),
            Ok(_) => {
                let line = std::mem::take(&mut self.pending);
                Ok(match parse_adc_line(&line) {
                    Some(value) => SourcePoll::Sample(value),
                    None => SourcePoll::Pending,
                })
            }
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(SourcePoll::Pending)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory source useful for tests and deterministic playback.
///
/// Lines go through the same parsing path as serial input; the source
/// reports `Closed` once the queue is exhausted.
pub struct ManualSource {
    lines: VecDeque<String>,
}

impl ManualSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl SampleSource for ManualSource {
    fn poll_sample(&mut self) -> Result<SourcePoll, AcquisitionError> {
        let Some(line) = self.lines.pop_front() else {
            return Ok(SourcePoll::Closed);
        };
        Ok(match parse_adc_line(line.as_bytes()) {
            Some(value) => SourcePoll::Sample(value),
            None => SourcePoll::Pending,
        })
    }
}
