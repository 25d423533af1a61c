use super::{AggregateRecorder, Record, RecordStorage, Recorder, RecordValue};
use anyhow::Result;
use log::warn;
use std::{fs::File, path::Path};

/// Writes scalar records to a CSV file as `(step, key, value)` rows.
pub struct CsvRecorder {
    wtr: csv::Writer<File>,
    step_key: String,
    storage: RecordStorage,
}

impl CsvRecorder {
    /// Constructs a [`CsvRecorder`] writing to the file at `path`.
    ///
    /// The parent directory must exist. The step of each written record
    /// is taken from its `"episode"` entry.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&["episode", "key", "value"])?;

        Ok(Self {
            wtr,
            step_key: "episode".to_string(),
            storage: RecordStorage::new(),
        })
    }
}

impl Recorder for CsvRecorder {
    /// Writes the scalar entries of the given [`Record`].
    ///
    /// Non-scalar values are ignored.
    fn write(&mut self, record: Record) {
        let step = match record.get(&self.step_key) {
            Some(RecordValue::Scalar(v)) => *v as i64,
            _ => {
                warn!("Record without a {:?} entry was dropped", self.step_key);
                return;
            }
        };

        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            if let RecordValue::Scalar(v) = v {
                if let Err(e) = self
                    .wtr
                    .write_record(&[format!("{}", step), k.clone(), format!("{}", v)])
                {
                    warn!("Failed to write a record: {}", e);
                }
            }
        }

        if let Err(e) = self.wtr.flush() {
            warn!("Failed to flush records: {}", e);
        }
    }
}

impl AggregateRecorder for CsvRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let mut record = self.storage.aggregate();
        if record.is_empty() {
            return;
        }
        record.insert(self.step_key.clone(), RecordValue::Scalar(step as f32));
        self.write(record);
    }
}

#[cfg(test)]
mod tests {
    use super::CsvRecorder;
    use crate::record::{AggregateRecorder, Record};
    use tempdir::TempDir;

    #[test]
    fn writes_aggregated_rows() {
        let dir = TempDir::new("csv_recorder").unwrap();
        let path = dir.path().join("metrics.csv");

        {
            let mut recorder = CsvRecorder::new(&path).unwrap();
            recorder.store(Record::from_scalar("episode_return", 1.0));
            recorder.store(Record::from_scalar("episode_return", 5.0));
            recorder.flush(1);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("episode,key,value"));
        assert!(content.contains("1,episode_return,3"));
    }
}
