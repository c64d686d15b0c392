//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records and summarizes them on demand.
///
/// Scalars stored more than once under the same key are reduced to
/// `<key>_min`, `<key>_max`, `<key>_mean` and `<key>_median`; a scalar stored
/// once keeps its key. Values of other types keep the most recent one.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::INFINITY, f32::min)
}

fn max(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

fn mean(vs: &[f32]) -> f32 {
    vs.iter().sum::<f32>() / vs.len() as f32
}

fn median(mut vs: Vec<f32>) -> f32 {
    vs.sort_by(|x, y| x.total_cmp(y));
    vs[vs.len() / 2]
}

impl RecordStorage {
    /// Constructs an empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn latest(&self, key: &str) -> Option<RecordValue> {
        self.data.iter().rev().find_map(|r| r.get(key).cloned())
    }

    fn scalars(&self, key: &str) -> Option<Vec<f32>> {
        self.data
            .iter()
            .filter_map(|r| r.get(key))
            .map(|v| match v {
                RecordValue::Scalar(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// Summarizes the stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.keys() {
            match self.scalars(&key) {
                Some(vs) if vs.len() == 1 => {
                    record.insert(key, RecordValue::Scalar(vs[0]));
                }
                Some(vs) => {
                    record.insert(format!("{}_min", key), RecordValue::Scalar(min(&vs)));
                    record.insert(format!("{}_max", key), RecordValue::Scalar(max(&vs)));
                    record.insert(format!("{}_mean", key), RecordValue::Scalar(mean(&vs)));
                    record.insert(format!("{}_median", key), RecordValue::Scalar(median(vs)));
                }
                None => {
                    if let Some(v) = self.latest(&key) {
                        record.insert(key, v);
                    }
                }
            }
        }

        self.data.clear();
        record
    }
}
