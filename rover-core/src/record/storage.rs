//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;

/// A storage of records with aggregation capabilities.
///
/// Scalar values are aggregated by their mean across the stored records;
/// for other value types the latest occurrence wins.
pub struct RecordStorage {
    data: Vec<Record>,
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

impl RecordStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn keys(&self) -> HashSet<String> {
        let mut keys = HashSet::new();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    /// Returns a record aggregated over the stored records, then clears
    /// the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.keys().into_iter() {
            let mut scalars: Vec<f32> = Vec::new();
            let mut latest: Option<RecordValue> = None;

            for r in self.data.iter() {
                match r.get(&key) {
                    Some(RecordValue::Scalar(v)) => scalars.push(*v),
                    Some(v) => latest = Some(v.clone()),
                    None => {}
                }
            }

            if !scalars.is_empty() {
                record.insert(key, mean(&scalars));
            } else if let Some(v) = latest {
                record.insert(key, v);
            }
        }

        self.data = Vec::new();
        record
    }
}

impl Default for RecordStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::RecordStorage;
    use crate::record::Record;

    #[test]
    fn aggregates_scalars_by_mean() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_scalar("loss", 1.0));
        storage.store(Record::from_scalar("loss", 3.0));
        storage.store(Record::from_scalar("episode_return", 10.0));

        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("loss").unwrap(), 2.0);
        assert_eq!(agg.get_scalar("episode_return").unwrap(), 10.0);

        // storage is cleared after aggregation
        assert!(storage.aggregate().is_empty());
    }
}
