//! TensorBoard recorder for deepq.
use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat};
use deepq_core::record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::{debug, info, warn};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tensorboard_rs::summary_writer::SummaryWriter;

#[derive(Serialize)]
struct ParamsSnapshot<'a, T: Serialize> {
    start_time: String,
    params: &'a T,
}

/// Write records to TFRecord.
///
/// Only [`RecordValue::Scalar`] values are written. Records given to
/// [`AggregateRecorder::store`] are summarized with [`RecordStorage`] and
/// written on [`AggregateRecorder::flush`] with the given step.
///
/// Events are written to disk by a background thread of the writer, which
/// is joined by [`AggregateRecorder::finish`] (or on drop). Records given
/// after `finish` are ignored.
pub struct TensorboardRecorder {
    writer: Option<SummaryWriter>,
    logdir: PathBuf,
    step_key: String,
    storage: RecordStorage,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`, which is created if missing.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Result<Self> {
        let logdir = logdir.as_ref().to_path_buf();
        fs::create_dir_all(&logdir)
            .with_context(|| format!("failed to create log directory {:?}", logdir))?;
        info!("Writing TensorBoard logs to {:?}", logdir);

        Ok(Self {
            writer: Some(SummaryWriter::new(&logdir)),
            logdir,
            step_key: "env_steps".to_string(),
            storage: RecordStorage::new(),
        })
    }

    /// Sets the key of the step in records given to [`Recorder::write`].
    pub fn step_key(mut self, key: impl Into<String>) -> Self {
        self.step_key = key.into();
        self
    }

    pub fn logdir(&self) -> &Path {
        &self.logdir
    }

    /// Saves the parameters of the run into `config.yaml` in the log directory,
    /// together with the current time.
    pub fn log_params<T: Serialize>(&self, params: &T) -> Result<()> {
        let snapshot = ParamsSnapshot {
            start_time: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            params,
        };
        let path = self.logdir.join("config.yaml");
        let mut file = File::create(&path)?;
        file.write_all(serde_yaml::to_string(&snapshot)?.as_bytes())?;
        debug!("Saved parameters of the run to {:?}", path);
        Ok(())
    }

    fn write_scalars(&mut self, record: &Record, step: usize) {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return,
        };
        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => writer.add_scalar(k, *v, step),
                // Not supported by TensorBoard scalars
                _ => debug!("Skipped value {:?} of {}", v, k),
            }
        }
        writer.flush();
    }
}

impl Recorder for TensorboardRecorder {
    /// Writes the scalars in a record with the step found under the step key.
    ///
    /// A record without the step is dropped with a warning.
    fn write(&mut self, record: Record) {
        match record.get_scalar(&self.step_key) {
            Ok(step) => self.write_scalars(&record, step as usize),
            Err(e) => warn!("Record dropped: {}", e),
        }
    }
}

impl AggregateRecorder for TensorboardRecorder {
    fn store(&mut self, record: Record) {
        if self.writer.is_some() {
            self.storage.store(record);
        }
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        if !record.is_empty() {
            self.write_scalars(&record, step.max(0) as usize);
        }
    }

    /// Writes out the remaining events and closes the event file.
    fn finish(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            writer.flush();
            // Dropping the writer joins its background thread.
            drop(writer);
            info!("Closed TensorBoard log {:?}", self.logdir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use tempdir::TempDir;

    fn event_file_size(dir: &Path) -> Result<u64> {
        let mut size = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with("events.out.tfevents")
            {
                size += entry.metadata()?.len();
            }
        }
        Ok(size)
    }

    #[test]
    fn test_flush_writes_event_file() -> Result<()> {
        let tmp = TempDir::new("tensorboard")?;
        let logdir = tmp.path().join("run");
        let mut recorder = TensorboardRecorder::new(&logdir)?;
        recorder.flush(0);
        let size0 = event_file_size(&logdir)?;

        for v in [1.0, 2.0, 3.0] {
            recorder.store(Record::from_scalar("loss", v));
        }
        recorder.store(Record::from_slice(&[(
            "game",
            RecordValue::String("pong".to_string()),
        )]));
        recorder.flush(100);
        recorder.write(Record::from_slice(&[
            ("env_steps", RecordValue::Scalar(200.0)),
            ("episode_reward", RecordValue::Scalar(-21.0)),
        ]));
        recorder.write(Record::from_scalar("no_step", 1.0));
        recorder.finish();

        // Events are on disk once finish returns, while the recorder is alive.
        let size1 = event_file_size(&logdir)?;
        assert!(size1 > size0);

        // Closed recorders ignore further records.
        recorder.store(Record::from_scalar("loss", 4.0));
        recorder.flush(300);
        recorder.write(Record::from_slice(&[
            ("env_steps", RecordValue::Scalar(400.0)),
            ("episode_reward", RecordValue::Scalar(-20.0)),
        ]));
        recorder.finish();
        assert_eq!(event_file_size(&logdir)?, size1);
        Ok(())
    }

    #[derive(Deserialize, Serialize, Debug, PartialEq)]
    struct Params {
        lr: f64,
        game: String,
    }

    #[test]
    fn test_log_params() -> Result<()> {
        let tmp = TempDir::new("tensorboard")?;
        let recorder = TensorboardRecorder::new(tmp.path())?;
        let params = Params {
            lr: 2.5e-4,
            game: "breakout".to_string(),
        };
        recorder.log_params(&params)?;

        let text = fs::read_to_string(tmp.path().join("config.yaml"))?;
        let map: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(&text)?;
        assert!(map.contains_key("start_time"));
        let loaded: Params = serde_yaml::from_value(map["params"].clone())?;
        assert_eq!(loaded, params);
        Ok(())
    }
}
