//! Base implementation of records for logging.
use crate::error::DeepqError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{
        hash_map::{IntoIter, Iter, Keys},
        HashMap,
    },
    convert::Into,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like loss or reward.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

impl RecordValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::DateTime(_) => "DateTime",
            Self::Array1(_) => "Array1",
            Self::String(_) => "String",
        }
    }
}

/// A container for storing key-value pairs of various data types.
///
/// # Examples
///
/// ```rust
/// use deepq_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss", 0.5);
/// record.insert("epsilon", RecordValue::Scalar(0.1));
///
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// assert!(record.get_scalar("episode_reward").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Consumes the record and returns an iterator over its entries.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Returns the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records. Values of `record` win on duplicate keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges `record` into this one.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    fn get_typed<T>(
        &self,
        k: &str,
        expected: &str,
        f: impl Fn(&RecordValue) -> Option<T>,
    ) -> Result<T, DeepqError> {
        let v = self
            .0
            .get(k)
            .ok_or_else(|| DeepqError::RecordKeyError(k.to_string()))?;
        f(v).ok_or_else(|| {
            DeepqError::RecordValueTypeError(format!("expected {}, got {}", expected, v.type_name()))
        })
    }

    /// Returns the scalar value of the given key.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DeepqError> {
        self.get_typed(k, "Scalar", |v| match v {
            RecordValue::Scalar(v) => Some(*v),
            _ => None,
        })
    }

    /// Returns the 1-dimensional array of the given key.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, DeepqError> {
        self.get_typed(k, "Array1", |v| match v {
            RecordValue::Array1(v) => Some(v.clone()),
            _ => None,
        })
    }

    /// Returns the string of the given key.
    pub fn get_string(&self, k: &str) -> Result<String, DeepqError> {
        self.get_typed(k, "String", |v| match v {
            RecordValue::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    /// Returns `true` if the record has no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
