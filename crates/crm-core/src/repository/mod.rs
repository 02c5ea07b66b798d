//! Record storage abstraction.
//!
//! Callers receive a [`Repository`] instead of reaching into shared module
//! state, so the same code runs against the in-memory store, a snapshot file
//! or a hosted backend adapter.
//!
//! # Implementing a New Backend
//!
//! 1. Create a type holding the backend client
//! 2. Implement [`Repository`] for each record type it stores
//! 3. Map backend failures to [`CrmError::Storage`](crate::CrmError::Storage)

mod memory;
mod store;

pub use memory::InMemoryRepository;
pub use store::{CrmStore, NextIds, Snapshot};

use crate::error::Result;
use crate::model::{Entity, RecordId};

/// Generic CRUD boundary for one record table.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store can be shared between
/// the command layer and background work.
pub trait Repository<T: Entity>: Send + Sync {
    /// All records in insertion order.
    fn list(&self) -> Result<Vec<T>>;

    /// The record with `id`, if any.
    fn get(&self, id: RecordId) -> Result<Option<T>>;

    /// Insert a record. Any id on `record` is ignored and a fresh one assigned.
    fn create(&self, record: T) -> Result<T>;

    /// Replace the stored record that has `record.id()`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`](crate::CrmError::NotFound) when no such record exists.
    fn update(&self, record: T) -> Result<T>;

    /// Remove the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`](crate::CrmError::NotFound) when no such record exists.
    fn delete(&self, id: RecordId) -> Result<()>;

    /// Like [`get`](Repository::get) but treats a missing record as an error.
    fn require(&self, id: RecordId) -> Result<T> {
        self.get(id)?.ok_or(crate::CrmError::NotFound { table: T::TABLE, id })
    }
}
