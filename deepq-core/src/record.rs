//! Types and traits for recording training metrics.
//!
//! * [`Record`] - a map from names to [`RecordValue`]s
//! * [`Recorder`] and [`AggregateRecorder`] - destinations of records
//! * [`RecordStorage`] - aggregation of stored records
//! * [`BufferedRecorder`] - keeps records in memory
//! * [`NullRecorder`] - discards records
//!
//! ```rust
//! use deepq_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode_reward", RecordValue::Scalar(21.0));
//! record.insert("episode_length", RecordValue::Scalar(812.0));
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
