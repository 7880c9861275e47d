//! Record store contract for receipts
//!
//! Receipts are keyed by `(user_id, id)`. Listing is always most recently
//! ingested first; date filters compare calendar dates only.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::Receipt;

/// Storage backend for receipts
///
/// `Database` is the production implementation; `MemoryStore` backs tests.
pub trait ReceiptStore: Send + Sync {
    /// Insert or overwrite the receipt stored under `(user_id, id)`
    fn put(&self, receipt: &Receipt) -> Result<()>;

    /// All receipts for a user, `created_at` descending
    fn list_by_user(&self, user_id: &str) -> Result<Vec<Receipt>>;

    /// Receipts dated exactly `date`
    fn list_by_user_and_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Receipt>> {
        Ok(self
            .list_by_user(user_id)?
            .into_iter()
            .filter(|r| r.date == date)
            .collect())
    }

    /// Receipts dated within `start..=end`
    fn list_by_user_and_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Receipt>> {
        Ok(self
            .list_by_user(user_id)?
            .into_iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect())
    }

    /// Receipts within an inclusive range where either bound may be open
    fn list_by_user_between(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Receipt>> {
        Ok(self
            .list_by_user(user_id)?
            .into_iter()
            .filter(|r| start.map_or(true, |s| r.date >= s) && end.map_or(true, |e| r.date <= e))
            .collect())
    }

    fn get_by_id(&self, user_id: &str, id: &str) -> Result<Option<Receipt>>;

    /// Returns false when nothing was stored under the key
    fn delete_by_id(&self, user_id: &str, id: &str) -> Result<bool>;
}

/// Sort receipts most recent first, breaking timestamp ties by id
pub(crate) fn sort_by_recency(receipts: &mut [Receipt]) {
    receipts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// In-memory store (for tests and ephemeral runs)
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(String, String), Receipt>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> Error {
        Error::InvalidData("Receipt store lock poisoned".into())
    }
}

impl ReceiptStore for MemoryStore {
    fn put(&self, receipt: &Receipt) -> Result<()> {
        let mut records = self.records.write().map_err(|_| Self::lock_err())?;
        records.insert(
            (receipt.user_id.clone(), receipt.id.clone()),
            receipt.clone(),
        );
        Ok(())
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<Receipt>> {
        let records = self.records.read().map_err(|_| Self::lock_err())?;
        let mut receipts: Vec<Receipt> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        sort_by_recency(&mut receipts);
        Ok(receipts)
    }

    fn get_by_id(&self, user_id: &str, id: &str) -> Result<Option<Receipt>> {
        let records = self.records.read().map_err(|_| Self::lock_err())?;
        Ok(records
            .get(&(user_id.to_string(), id.to_string()))
            .cloned())
    }

    fn delete_by_id(&self, user_id: &str, id: &str) -> Result<bool> {
        let mut records = self.records.write().map_err(|_| Self::lock_err())?;
        Ok(records
            .remove(&(user_id.to_string(), id.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::receipt;

    #[test]
    fn test_list_by_user_is_recency_ordered() {
        let store = MemoryStore::new();
        store.put(&receipt("u1", "a", "2024-03-05", 10.0, 1)).unwrap();
        store.put(&receipt("u1", "b", "2024-03-01", 20.0, 3)).unwrap();
        store.put(&receipt("u1", "c", "2024-03-09", 30.0, 2)).unwrap();
        store.put(&receipt("u2", "d", "2024-03-01", 40.0, 9)).unwrap();

        let ids: Vec<_> = store
            .list_by_user("u1")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(store.list_by_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let store = MemoryStore::new();
        store.put(&receipt("u1", "a", "2024-03-05", 10.0, 1)).unwrap();
        store.put(&receipt("u1", "a", "2024-03-05", 99.0, 1)).unwrap();

        let all = store.list_by_user("u1").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].total, 99.0);
    }

    #[test]
    fn test_single_day_range_matches_exact_date() {
        let store = MemoryStore::new();
        store.put(&receipt("u1", "a", "2024-03-05", 10.0, 1)).unwrap();
        store.put(&receipt("u1", "b", "2024-03-06", 20.0, 2)).unwrap();
        store.put(&receipt("u1", "c", "2024-03-05", 30.0, 3)).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let exact = store.list_by_user_and_date("u1", day).unwrap();
        let range = store.list_by_user_and_date_range("u1", day, day).unwrap();
        assert_eq!(exact, range);
        assert_eq!(exact.len(), 2);
    }

    #[test]
    fn test_range_is_inclusive() {
        let store = MemoryStore::new();
        store.put(&receipt("u1", "a", "2024-03-01", 10.0, 1)).unwrap();
        store.put(&receipt("u1", "b", "2024-03-07", 20.0, 2)).unwrap();
        store.put(&receipt("u1", "c", "2024-03-08", 30.0, 3)).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let found = store.list_by_user_and_date_range("u1", start, end).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_open_ended_range() {
        let store = MemoryStore::new();
        store.put(&receipt("u1", "a", "2024-03-01", 10.0, 1)).unwrap();
        store.put(&receipt("u1", "b", "2024-03-07", 20.0, 2)).unwrap();

        let mid = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let after = store.list_by_user_between("u1", Some(mid), None).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, "b");
        let before = store.list_by_user_between("u1", None, Some(mid)).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].id, "a");
        assert_eq!(store.list_by_user_between("u1", None, None).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_by_id() {
        let store = MemoryStore::new();
        store.put(&receipt("u1", "a", "2024-03-01", 10.0, 1)).unwrap();

        assert!(!store.delete_by_id("u1", "missingId").unwrap());
        assert_eq!(store.list_by_user("u1").unwrap().len(), 1);

        assert!(store.delete_by_id("u1", "a").unwrap());
        assert!(store.get_by_id("u1", "a").unwrap().is_none());
        assert!(!store.delete_by_id("u1", "a").unwrap());
    }

    #[test]
    fn test_keys_are_scoped_by_user() {
        let store = MemoryStore::new();
        store.put(&receipt("u1", "same", "2024-03-01", 10.0, 1)).unwrap();
        store.put(&receipt("u2", "same", "2024-03-01", 20.0, 1)).unwrap();

        assert_eq!(store.get_by_id("u1", "same").unwrap().unwrap().total, 10.0);
        assert!(store.delete_by_id("u2", "same").unwrap());
        assert!(store.get_by_id("u1", "same").unwrap().is_some());
    }
}
