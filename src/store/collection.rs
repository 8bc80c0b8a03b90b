use super::LocalStorage;
use crate::error::RecordError;
use crate::records::Record;

/// Id-keyed, insertion-ordered collection persisted under one storage key.
///
/// Every mutation rewrites the whole collection. Ids are unique within the
/// collection; insertion order is the only ordering.
#[derive(Debug, Clone)]
pub struct RecordCollection<T> {
    storage: LocalStorage,
    key: String,
    records: Vec<T>,
}

impl<T: Record> RecordCollection<T> {
    pub fn load(storage: LocalStorage, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = storage.load(&key);
        Self {
            storage,
            key,
            records,
        }
    }

    pub fn list(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    fn position(&self, id: &str) -> Result<usize, RecordError> {
        self.records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| RecordError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })
    }

    /// Append a new record. Duplicate ids are rejected.
    pub fn insert(&mut self, record: T) -> Result<&T, RecordError> {
        if self.get(record.id()).is_some() {
            return Err(RecordError::Duplicate {
                kind: T::KIND,
                id: record.id().to_string(),
            });
        }
        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)?;
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Replace the record with the same id in place, or append it.
    pub fn upsert(&mut self, record: T) -> Result<(), RecordError> {
        let mut next = self.records.clone();
        match next.iter().position(|r| r.id() == record.id()) {
            Some(idx) => next[idx] = record,
            None => next.push(record),
        }
        self.commit(next)
    }

    /// Apply `change` to a copy of the record; the stored record is only
    /// replaced when `change` and the write both succeed.
    pub fn update<F>(&mut self, id: &str, change: F) -> Result<&T, RecordError>
    where
        F: FnOnce(&mut T) -> Result<(), RecordError>,
    {
        let idx = self.position(id)?;
        let mut next = self.records.clone();
        change(&mut next[idx])?;
        self.commit(next)?;
        Ok(&self.records[idx])
    }

    /// Remove exactly the record with `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Result<T, RecordError> {
        let idx = self.position(id)?;
        let mut next = self.records.clone();
        let removed = next.remove(idx);
        self.commit(next)?;
        Ok(removed)
    }

    /// Write the current records back to storage.
    pub fn save(&self) -> Result<(), RecordError> {
        self.storage.save(&self.key, &self.records)?;
        tracing::debug!(key = %self.key, count = self.records.len(), "Saved collection");
        Ok(())
    }

    /// Adopt `next` and write it through; a failed write restores the
    /// previous records so memory never runs ahead of storage.
    fn commit(&mut self, next: Vec<T>) -> Result<(), RecordError> {
        let previous = std::mem::replace(&mut self.records, next);
        if let Err(e) = self.save() {
            self.records = previous;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::RecordCollection;
    use crate::error::{RecordError, StoreError};
    use crate::records::{Dispute, Report, ReportStatus};
    use crate::store::{KeyValueStore, LocalStorage, MemoryStore, keys};

    /// Memory store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        read_only: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.read_only.load(Ordering::SeqCst) {
                return Err(StoreError::Io {
                    path: "flaky".to_string(),
                    reason: "disk full".to_string(),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    fn titles(collection: &RecordCollection<Report>) -> Vec<String> {
        collection.list().iter().map(|r| r.title.clone()).collect()
    }

    #[test]
    fn remove_deletes_exactly_one_and_keeps_order() {
        let storage = LocalStorage::in_memory();
        let mut reports = RecordCollection::<Report>::load(storage.clone(), keys::REPORTS);
        let mut ids = Vec::new();
        for title in ["a", "b", "c", "d"] {
            let report = reports
                .insert(Report::draft(title, "", None))
                .expect("insert");
            ids.push(report.id.clone());
        }

        let removed = reports.remove(&ids[1]).expect("remove b");
        assert_eq!(removed.title, "b");
        assert_eq!(titles(&reports), vec!["a", "c", "d"]);

        let reloaded = RecordCollection::<Report>::load(storage, keys::REPORTS);
        assert_eq!(titles(&reloaded), vec!["a", "c", "d"]);
    }

    #[test]
    fn remove_unknown_id_is_not_found_and_changes_nothing() {
        let mut reports =
            RecordCollection::<Report>::load(LocalStorage::in_memory(), keys::REPORTS);
        reports
            .insert(Report::draft("only", "", None))
            .expect("insert");

        let err = reports.remove("missing").expect_err("unknown id");
        assert!(matches!(err, RecordError::NotFound { kind: "report", .. }));
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut reports =
            RecordCollection::<Report>::load(LocalStorage::in_memory(), keys::REPORTS);
        let report = Report::draft("dup", "", None);
        reports.insert(report.clone()).expect("first insert");
        assert!(matches!(
            reports.insert(report),
            Err(RecordError::Duplicate { .. })
        ));
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let storage = LocalStorage::in_memory();
        let mut reports = RecordCollection::<Report>::load(storage.clone(), keys::REPORTS);
        let id = reports
            .insert(Report::draft("memo", "", None))
            .expect("insert")
            .id
            .clone();

        reports.update(&id, Report::finalize).expect("finalize");
        let before = reports.get(&id).cloned().expect("present");

        assert!(reports.update(&id, Report::finalize).is_err());
        assert_eq!(reports.get(&id), Some(&before));
        assert_eq!(before.status, ReportStatus::Finalized);

        let reloaded = RecordCollection::<Report>::load(storage, keys::REPORTS);
        assert_eq!(reloaded.get(&id), Some(&before));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut disputes =
            RecordCollection::<Dispute>::load(LocalStorage::in_memory(), keys::DISPUTES);
        let first = Dispute::open("first", Vec::new(), "");
        let second = Dispute::open("second", Vec::new(), "");
        disputes.insert(first.clone()).expect("insert");
        disputes.insert(second).expect("insert");

        let mut renamed = first;
        renamed.title = "renamed".to_string();
        disputes.upsert(renamed).expect("upsert");

        let titles: Vec<&str> = disputes.list().iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["renamed", "second"]);
    }

    #[test]
    fn failed_write_leaves_memory_matching_storage() {
        let backend = Arc::new(FlakyStore::default());
        let storage = LocalStorage::new(backend.clone());
        let mut reports = RecordCollection::<Report>::load(storage.clone(), keys::REPORTS);
        let id = reports
            .insert(Report::draft("kept", "", None))
            .expect("insert")
            .id
            .clone();
        let before = reports.list().to_vec();

        backend.read_only.store(true, Ordering::SeqCst);
        assert!(matches!(
            reports.insert(Report::draft("lost", "", None)),
            Err(RecordError::Store(StoreError::Io { .. }))
        ));
        assert!(reports.upsert(Report::draft("lost", "", None)).is_err());
        assert!(reports.update(&id, Report::finalize).is_err());
        assert!(reports.remove(&id).is_err());

        assert_eq!(reports.list(), before.as_slice());
        let reloaded = RecordCollection::<Report>::load(storage, keys::REPORTS);
        assert_eq!(reloaded.list(), before.as_slice());
    }
}
