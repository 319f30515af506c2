//! In-memory content repositories mirrored to the key-value store.
//!
//! Each repository owns one collection, read once from its store key when the
//! repository is opened and written back in full after every mutation. There
//! are no partial writes: the whole sequence is serialized each time.

mod content;
mod ids;

pub use content::*;
pub use ids::IdGenerator;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::db::Store;
use crate::errors::AppError;

/// An entity stored in a repository.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Store key holding the whole collection.
    const STORE_KEY: &'static str;
    /// Name used in messages ("Activity 12 not found").
    const LABEL: &'static str;

    fn id(&self) -> i64;

    /// Stamp an update time. Records without one ignore it.
    fn touch(&mut self, now: String);
}

/// Input that validates into a new record.
pub trait Draft {
    type Record: Record;

    fn build(self, id: i64, now: String) -> Result<Self::Record, AppError>;
}

/// Input that validates and merges into an existing record.
pub trait Patch {
    type Record: Record;

    fn apply(self, record: &mut Self::Record) -> Result<(), AppError>;
}

/// Answer to the "are you sure?" prompt in front of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// A collection of `T`, newest first.
pub struct Repository<T: Record> {
    store: Store,
    items: RwLock<Vec<T>>,
    ids: IdGenerator,
    /// Maximum retained records; older ones fall off the end.
    capacity: Option<usize>,
}

impl<T: Record> Repository<T> {
    /// Load the collection from the store. A missing or unreadable key yields
    /// an empty collection.
    pub async fn open(store: Store, capacity: Option<usize>) -> Self {
        let items: Vec<T> = store.get(T::STORE_KEY).await.unwrap_or_default();
        let ids = IdGenerator::seeded(items.iter().map(|item| item.id()).max());

        tracing::debug!(key = T::STORE_KEY, count = items.len(), "Loaded collection");

        Self {
            store,
            items: RwLock::new(items),
            ids,
            capacity,
        }
    }

    /// Snapshot of the whole collection.
    pub async fn list(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    /// Snapshot of the records matching `predicate`, in collection order.
    pub async fn list_where(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Validate `draft`, prepend the new record and persist.
    pub async fn create<D>(&self, draft: D) -> Result<T, AppError>
    where
        D: Draft<Record = T>,
    {
        // Ids are taken under the write lock so index 0 always holds the highest.
        let mut items = self.items.write().await;
        let record = draft.build(self.ids.next(), now())?;

        items.insert(0, record.clone());
        if let Some(capacity) = self.capacity {
            items.truncate(capacity);
        }
        self.persist(&items).await;

        tracing::info!(key = T::STORE_KEY, id = record.id(), "Created record");
        Ok(record)
    }

    /// Merge `patch` into the record with `id`, stamp it and persist.
    ///
    /// The patch is applied to a copy, so a validation failure leaves the
    /// stored record untouched.
    pub async fn update<P>(&self, id: i64, patch: P) -> Result<T, AppError>
    where
        P: Patch<Record = T>,
    {
        let mut items = self.items.write().await;
        let index = position(&items, id)?;

        let mut updated = items[index].clone();
        patch.apply(&mut updated)?;
        updated.touch(now());
        items[index] = updated.clone();
        self.persist(&items).await;

        tracing::info!(key = T::STORE_KEY, id, "Updated record");
        Ok(updated)
    }

    /// Apply `change` to the record with `id` and persist. No validation and no
    /// update stamp; used for flag toggles.
    pub async fn modify(&self, id: i64, change: impl FnOnce(&mut T)) -> Result<T, AppError> {
        let mut items = self.items.write().await;
        let index = position(&items, id)?;

        change(&mut items[index]);
        let modified = items[index].clone();
        self.persist(&items).await;

        Ok(modified)
    }

    /// Remove the record with `id` once the caller has confirmed.
    pub async fn delete(&self, id: i64, confirmation: Confirmation) -> Result<DeleteOutcome, AppError> {
        if confirmation == Confirmation::Declined {
            return Ok(DeleteOutcome::Cancelled);
        }

        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
            return Err(not_found::<T>(id));
        }
        self.persist(&items).await;

        tracing::info!(key = T::STORE_KEY, id, "Deleted record");
        Ok(DeleteOutcome::Deleted)
    }

    /// Rewrite the current collection to the store.
    pub async fn persist_all(&self) {
        let items = self.items.read().await;
        self.persist(&items).await;
    }

    /// Write the full collection. A failed write is logged and otherwise
    /// ignored; memory stays ahead of the store until the next good write.
    async fn persist(&self, items: &[T]) {
        if let Err(e) = self.store.set(T::STORE_KEY, items).await {
            tracing::warn!(key = T::STORE_KEY, "Failed to persist collection: {}", e);
        }
    }
}

fn position<T: Record>(items: &[T], id: i64) -> Result<usize, AppError> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| not_found::<T>(id))
}

fn not_found<T: Record>(id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", T::LABEL, id))
}

fn now() -> String {
    Utc::now().to_rfc3339()
}
