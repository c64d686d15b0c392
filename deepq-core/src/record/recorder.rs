//! Interfaces of recorders.
use super::Record;

/// Writes a [`Record`] to some destination.
pub trait Recorder {
    /// Writes a record immediately.
    fn write(&mut self, record: Record);
}

/// A recorder that stores records and writes an aggregate of them on flush.
///
/// The training loop stores a record at every step it has something to
/// report, and flushes at a fixed interval. Implementations decide how the
/// stored records are summarized, typically with [`RecordStorage`].
///
/// [`RecordStorage`]: super::RecordStorage
pub trait AggregateRecorder {
    /// Stores a record for later aggregation.
    fn store(&mut self, record: Record);

    /// Aggregates the stored records and writes the result with the given step.
    fn flush(&mut self, step: i64);

    /// Called once after training. Does nothing in the default implementation.
    fn finish(&mut self) {}
}
