//! Persistence seam: named document collections with optimistic
//! read-validate-write transactions. The engine depends on nothing beyond
//! this contract; `MemoryStore` is the reference implementation.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tournaments,
    Tables,
    Participants,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Tournaments => "tournaments",
            Collection::Tables => "tables",
            Collection::Participants => "participants",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic conflict: a document read by this transaction changed before commit")]
    Conflict,

    #[error("document serialization failed")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A raw document as the store hands it out: payload plus version stamp.
#[derive(Debug, Clone)]
pub struct RawDoc {
    pub id: Uuid,
    pub version: u64,
    pub value: Value,
}

/// A deserialized document plus the version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: u64,
    pub doc: T,
}

/// Version observed for one document at read time; `None` means the
/// document was absent.
#[derive(Debug, Clone, Copy)]
pub struct ReadStamp {
    pub collection: Collection,
    pub id: Uuid,
    pub version: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum WriteOp {
    Put {
        collection: Collection,
        id: Uuid,
        value: Value,
    },
    Delete {
        collection: Collection,
        id: Uuid,
    },
}

/// The unit handed to [`DocumentStore::commit`]: every read made through a
/// [`TxnSession`] plus the buffered writes. Commit validates the whole
/// read-set and applies the writes atomically, or fails with
/// [`StoreError::Conflict`] and applies nothing.
#[derive(Debug, Clone, Default)]
pub struct Txn {
    pub reads: Vec<ReadStamp>,
    pub writes: Vec<WriteOp>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, collection: Collection, id: Uuid) -> StoreResult<Option<RawDoc>>;

    async fn list(&self, collection: Collection) -> StoreResult<Vec<RawDoc>>;

    async fn commit(&self, txn: Txn) -> StoreResult<()>;
}

/// One read-validate-write pass over a store. Reads stamp the observed
/// version into the read-set; writes are buffered until [`commit`].
///
/// [`commit`]: TxnSession::commit
pub struct TxnSession<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    txn: Txn,
}

impl<'a, S: DocumentStore + ?Sized> TxnSession<'a, S> {
    pub fn begin(store: &'a S) -> Self {
        Self {
            store,
            txn: Txn::default(),
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &mut self,
        collection: Collection,
        id: Uuid,
    ) -> StoreResult<Option<Versioned<T>>> {
        let raw = self.store.read(collection, id).await?;
        self.txn.reads.push(ReadStamp {
            collection,
            id,
            version: raw.as_ref().map(|doc| doc.version),
        });
        match raw {
            Some(doc) => Ok(Some(Versioned {
                version: doc.version,
                doc: serde_json::from_value(doc.value)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn list<T: DeserializeOwned>(
        &mut self,
        collection: Collection,
    ) -> StoreResult<Vec<Versioned<T>>> {
        let raws = self.store.list(collection).await?;
        let mut docs = Vec::with_capacity(raws.len());
        for raw in raws {
            self.txn.reads.push(ReadStamp {
                collection,
                id: raw.id,
                version: Some(raw.version),
            });
            docs.push(Versioned {
                version: raw.version,
                doc: serde_json::from_value(raw.value)?,
            });
        }
        Ok(docs)
    }

    pub fn put<T: Serialize>(
        &mut self,
        collection: Collection,
        id: Uuid,
        doc: &T,
    ) -> StoreResult<()> {
        let value = serde_json::to_value(doc)?;
        self.txn.writes.push(WriteOp::Put {
            collection,
            id,
            value,
        });
        Ok(())
    }

    pub fn delete(&mut self, collection: Collection, id: Uuid) {
        self.txn.writes.push(WriteOp::Delete { collection, id });
    }

    pub fn has_writes(&self) -> bool {
        !self.txn.writes.is_empty()
    }

    pub async fn commit(self) -> StoreResult<()> {
        self.store.commit(self.txn).await
    }
}
