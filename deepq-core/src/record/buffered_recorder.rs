use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};

/// Keeps every record in memory.
///
/// Records passed to [`Recorder::write`] and [`AggregateRecorder::store`] are
/// kept as they are. [`AggregateRecorder::flush`] additionally keeps the
/// aggregate of the records stored since the previous flush, tagged with the
/// step under the key `"step"`. Mostly useful for inspecting a training run
/// in tests.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    flushed: Vec<Record>,
    storage: RecordStorage,
}

impl BufferedRecorder {
    /// Constructs a [`BufferedRecorder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over the raw records in the order they were given.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// Iterates over the aggregated records produced by flushes.
    pub fn iter_flushed(&self) -> std::slice::Iter<'_, Record> {
        self.flushed.iter()
    }

    /// Collects every scalar value of `key` in the raw records.
    pub fn scalars(&self, key: &str) -> Vec<f32> {
        self.buf
            .iter()
            .filter_map(|r| r.get_scalar(key).ok())
            .collect()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record.clone());
        self.buf.push(record);
    }

    fn flush(&mut self, step: i64) {
        let mut record = self.storage.aggregate();
        if !record.is_empty() {
            record.insert("step", RecordValue::Scalar(step as f32));
            self.flushed.push(record);
        }
    }
}
