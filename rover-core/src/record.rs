//! Types and traits for recording training metrics.
//!
//! * [`Record`] - a container of key-value pairs of various data types.
//! * [`RecordValue`] - the types of values that can be stored.
//! * [`Recorder`] / [`AggregateRecorder`] - interfaces for writing records
//!   to an output destination, with optional aggregation across steps.
//! * [`RecordStorage`] - in-memory storage with scalar aggregation.
//! * [`CsvRecorder`] - writes aggregated scalars to a CSV file.
//! * [`NullRecorder`] - discards all records, used in tests.
//!
//! The [`Trainer`](crate::Trainer) stores a record after every
//! environment step and flushes aggregated values on an episode cadence.
mod base;
mod csv_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use csv_recorder::CsvRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
