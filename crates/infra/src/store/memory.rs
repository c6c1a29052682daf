use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{Collection, DocumentStore, RawDoc, ReadStamp, StoreError, StoreResult, Txn, WriteOp};

#[derive(Default)]
struct Shelf {
    docs: HashMap<(Collection, Uuid), (u64, Value)>,
    /// Monotonic version source; never reused, so a deleted-and-recreated
    /// document can never satisfy a stale read stamp.
    clock: u64,
}

impl Shelf {
    fn version_of(&self, stamp: &ReadStamp) -> Option<u64> {
        self.docs
            .get(&(stamp.collection, stamp.id))
            .map(|(version, _)| *version)
    }
}

/// In-memory versioned document store. Reference implementation of the
/// optimistic-transaction contract, and the store the test suite runs on.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Shelf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, collection: Collection, id: Uuid) -> StoreResult<Option<RawDoc>> {
        let shelf = self.inner.read();
        Ok(shelf.docs.get(&(collection, id)).map(|(version, value)| RawDoc {
            id,
            version: *version,
            value: value.clone(),
        }))
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<RawDoc>> {
        let shelf = self.inner.read();
        let mut docs: Vec<RawDoc> = shelf
            .docs
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, id), (version, value))| RawDoc {
                id: *id,
                version: *version,
                value: value.clone(),
            })
            .collect();
        // Stable listing order regardless of hash-map iteration.
        docs.sort_by_key(|doc| doc.id);
        Ok(docs)
    }

    async fn commit(&self, txn: Txn) -> StoreResult<()> {
        let mut shelf = self.inner.write();
        for stamp in &txn.reads {
            if shelf.version_of(stamp) != stamp.version {
                tracing::debug!(
                    collection = stamp.collection.name(),
                    id = %stamp.id,
                    "rejecting commit over a stale read"
                );
                return Err(StoreError::Conflict);
            }
        }
        for write in txn.writes {
            shelf.clock += 1;
            let version = shelf.clock;
            match write {
                WriteOp::Put {
                    collection,
                    id,
                    value,
                } => {
                    shelf.docs.insert((collection, id), (version, value));
                }
                WriteOp::Delete { collection, id } => {
                    shelf.docs.remove(&(collection, id));
                }
            }
        }
        Ok(())
    }
}
