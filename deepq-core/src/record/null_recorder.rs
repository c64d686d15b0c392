use super::{AggregateRecorder, Record, Recorder};

/// A recorder that discards everything.
///
/// Used when logging is disabled.
#[derive(Default)]
pub struct NullRecorder {}

impl NullRecorder {
    /// Constructs a [`NullRecorder`].
    pub fn new() -> Self {
        Self {}
    }
}

impl Recorder for NullRecorder {
    fn write(&mut self, _record: Record) {}
}

impl AggregateRecorder for NullRecorder {
    fn store(&mut self, _record: Record) {}

    fn flush(&mut self, _step: i64) {}
}
