// src/acquisition/mod.rs
pub mod buffer;
pub mod controller;
pub mod error;
pub mod filter;
pub mod source;

pub use buffer::{ScrollingBuffer, MAX_POINTS};
pub use controller::{AcquisitionController, ConnectionState, BAUD_RATE};
pub use error::AcquisitionError;
pub use filter::{FilteredSample, StreamFilter};
pub use source::{ManualSource, RawSample, SampleSource, SerialSampleSource, SourcePoll};
