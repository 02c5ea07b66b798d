//! In-memory repository.

use parking_lot::RwLock;
use tracing::debug;

use super::Repository;
use crate::error::{CrmError, Result};
use crate::model::{Entity, RecordId};

struct Table<T> {
    records: Vec<T>,
    next_id: RecordId,
}

/// A [`Repository`] holding records in a `Vec` behind a `RwLock`.
///
/// Ids increase monotonically starting after the highest seeded id and are
/// never handed out twice, even after the record that held one is deleted.
pub struct InMemoryRepository<T> {
    table: RwLock<Table<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seed the repository, e.g. from a snapshot. Existing ids are kept.
    pub fn with_records(records: Vec<T>) -> Self {
        Self::with_next_id(records, 1)
    }

    /// Seed the repository with records and a saved id high-water mark.
    ///
    /// The next id is `next_id` or one past the highest seeded id, whichever
    /// is larger, so ids freed by deletes before a save stay retired.
    pub fn with_next_id(records: Vec<T>, next_id: RecordId) -> Self {
        let highest = records.iter().map(Entity::id).max().unwrap_or(0);
        Self {
            table: RwLock::new(Table {
                records,
                next_id: next_id.max(highest.max(0) + 1),
            }),
        }
    }

    /// The id the next `create` will assign.
    pub fn next_id(&self) -> RecordId {
        self.table.read().next_id
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.table.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every record, for snapshots.
    pub fn records(&self) -> Vec<T> {
        self.table.read().records.clone()
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    fn list(&self) -> Result<Vec<T>> {
        Ok(self.records())
    }

    fn get(&self, id: RecordId) -> Result<Option<T>> {
        Ok(self
            .table
            .read()
            .records
            .iter()
            .find(|record| record.id() == id)
            .cloned())
    }

    fn create(&self, mut record: T) -> Result<T> {
        let mut table = self.table.write();
        let id = table.next_id;
        table.next_id += 1;
        record.set_id(id);
        table.records.push(record.clone());
        debug!(table = T::TABLE, id, "record created");
        Ok(record)
    }

    fn update(&self, record: T) -> Result<T> {
        let mut table = self.table.write();
        let id = record.id();
        let slot = table
            .records
            .iter_mut()
            .find(|existing| existing.id() == id)
            .ok_or(CrmError::NotFound { table: T::TABLE, id })?;
        *slot = record.clone();
        debug!(table = T::TABLE, id, "record updated");
        Ok(record)
    }

    fn delete(&self, id: RecordId) -> Result<()> {
        let mut table = self.table.write();
        let index = table
            .records
            .iter()
            .position(|record| record.id() == id)
            .ok_or(CrmError::NotFound { table: T::TABLE, id })?;
        table.records.remove(index);
        debug!(table = T::TABLE, id, "record deleted");
        Ok(())
    }
}

static_assertions::assert_impl_all!(InMemoryRepository<crate::model::Contact>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Deal, DealStage};
    use chrono::Utc;

    fn deal(name: &str) -> Deal {
        Deal::new(name, 100.0, DealStage::New, Utc::now())
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let repo = InMemoryRepository::new();
        let first = repo.create(deal("a")).unwrap();
        let second = repo.create(deal("b")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_create_ignores_supplied_id() {
        let repo = InMemoryRepository::new();
        let mut input = deal("a");
        input.id = 99;
        assert_eq!(repo.create(input).unwrap().id, 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let repo = InMemoryRepository::new();
        repo.create(deal("a")).unwrap();
        let second = repo.create(deal("b")).unwrap();
        repo.delete(second.id).unwrap();
        let third = repo.create(deal("c")).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_seeded_ids_continue_after_highest() {
        let mut seeded = deal("seed");
        seeded.id = 41;
        let repo = InMemoryRepository::with_records(vec![seeded]);
        assert_eq!(repo.create(deal("next")).unwrap().id, 42);
    }

    #[test]
    fn test_saved_next_id_outranks_highest_record() {
        let mut seeded = deal("seed");
        seeded.id = 3;
        let repo = InMemoryRepository::with_next_id(vec![seeded.clone()], 9);
        assert_eq!(repo.next_id(), 9);
        assert_eq!(repo.create(deal("next")).unwrap().id, 9);

        let stale = InMemoryRepository::with_next_id(vec![seeded], 2);
        assert_eq!(stale.next_id(), 4);
    }

    #[test]
    fn test_update_and_delete_missing_record() {
        let repo: InMemoryRepository<Deal> = InMemoryRepository::new();
        let mut ghost = deal("ghost");
        ghost.id = 7;
        assert!(matches!(
            repo.update(ghost).unwrap_err(),
            CrmError::NotFound { table: "deals", id: 7 }
        ));
        assert!(matches!(
            repo.delete(7).unwrap_err(),
            CrmError::NotFound { .. }
        ));
    }

    #[test]
    fn test_update_replaces_record() {
        let repo = InMemoryRepository::new();
        let mut created = repo.create(deal("a")).unwrap();
        created.stage = DealStage::Won;
        repo.update(created.clone()).unwrap();
        assert_eq!(repo.get(created.id).unwrap().unwrap().stage, DealStage::Won);
        assert!(repo.require(created.id + 1).is_err());
    }
}
