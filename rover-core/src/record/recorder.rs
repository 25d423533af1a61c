use super::Record;

/// Writes a record to an output destination.
pub trait Recorder {
    /// Write a record to the output destination.
    ///
    /// The record is expected to carry the step at which it was produced
    /// under the recorder's step key.
    fn write(&mut self, record: Record);
}

/// A recorder that aggregates stored records before writing.
pub trait AggregateRecorder: Recorder {
    /// Stores the record for later aggregation.
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records at the given step.
    fn flush(&mut self, step: i64);
}
