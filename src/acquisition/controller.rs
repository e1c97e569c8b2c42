use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::acquisition::buffer::{ScrollingBuffer, MAX_POINTS};
use crate::acquisition::error::AcquisitionError;
use crate::acquisition::filter::{FilteredSample, StreamFilter};
use crate::acquisition::source::{SampleSource, SerialSampleSource, SourcePoll};

/// Fixed baud rate of the capture firmware.
pub const BAUD_RATE: u32 = 115_200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Running,
}

/// State shared between the controller and its worker thread. The worker
/// is the only writer of the buffer; the renderer only takes locked
/// snapshots, so it never observes a partially pushed sample.
struct Shared {
    state: Mutex<ConnectionState>,
    buffer: Mutex<ScrollingBuffer>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the acquisition lifecycle: start/stop transitions, the background
/// reader thread, and the scrolling display buffer.
///
/// Exactly one worker runs at a time. The buffer keeps its contents across
/// stop()/start() cycles; the filter window is fresh per session.
pub struct AcquisitionController {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl AcquisitionController {
    pub fn new() -> Self {
        Self::with_capacity(MAX_POINTS)
    }

    pub fn with_capacity(max_points: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ConnectionState::Idle),
                buffer: Mutex::new(ScrollingBuffer::with_capacity(max_points)),
            }),
            worker: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.shared.state)
    }

    /// Copy of the display buffer, oldest sample first.
    pub fn snapshot(&self) -> Vec<FilteredSample> {
        lock(&self.shared.buffer).snapshot()
    }

    /// Opens `port` and begins pulling samples on a background thread.
    ///
    /// No-op while already running. An open failure is returned to the
    /// caller, no worker is spawned and the controller stays idle.
    pub fn start(&mut self, port: &str, baud: u32) -> Result<(), AcquisitionError> {
        if self.state() == ConnectionState::Running {
            log::debug!("start ignored: acquisition already running");
            return Ok(());
        }
        let source = SerialSampleSource::open(port, baud)?;
        self.spawn_worker(source);
        Ok(())
    }

    /// Runs the same lifecycle over an arbitrary sample source.
    pub fn start_with_source<S: SampleSource + 'static>(&mut self, source: S) {
        if self.state() == ConnectionState::Running {
            log::debug!("start ignored: acquisition already running");
            return;
        }
        self.spawn_worker(source);
    }

    /// Flips the state to idle and waits for the worker to wind down.
    ///
    /// The worker re-checks the state after every read timeout, so the
    /// join is bounded even while a read is pending. Joining also means
    /// the serial handle is released before this returns, so an immediate
    /// restart on the same port cannot race the old worker for it.
    pub fn stop(&mut self) {
        *lock(&self.shared.state) = ConnectionState::Idle;
        self.reap_worker();
    }

    fn spawn_worker<S: SampleSource + 'static>(&mut self, source: S) {
        // A previous worker may have exited on its own (EOF or read error).
        self.reap_worker();
        *lock(&self.shared.state) = ConnectionState::Running;
        let shared = Arc::clone(&self.shared);
        self.worker = Some(thread::spawn(move || run_worker(&shared, source)));
    }

    fn reap_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("acquisition worker panicked");
            }
        }
    }
}

impl Default for AcquisitionController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AcquisitionController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Background loop: poll the source, filter accepted samples, append to
/// the display buffer. Read failures and end-of-stream are reported via
/// the log and end the session; they never reach the interactive thread.
fn run_worker<S: SampleSource>(shared: &Shared, mut source: S) {
    let mut filter = StreamFilter::new();
    loop {
        if *lock(&shared.state) != ConnectionState::Running {
            break;
        }
        match source.poll_sample() {
            Ok(SourcePoll::Sample(raw)) => {
                let filtered = filter.apply(raw);
                lock(&shared.buffer).push(filtered);
            }
            Ok(SourcePoll::Pending) => {}
            Ok(SourcePoll::Closed) => {
                log::info!("sample source closed, stopping acquisition");
                *lock(&shared.state) = ConnectionState::Idle;
                break;
            }
            Err(err) => {
                log::error!("read error, stopping acquisition: {err}");
                *lock(&shared.state) = ConnectionState::Idle;
                break;
            }
        }
    }
}
