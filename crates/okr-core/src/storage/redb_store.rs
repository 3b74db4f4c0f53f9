//! # redb-backed Document Store
//!
//! One table per document type plus a metadata table. Writes go through
//! [`Batch`] so multi-document changes (a cascade delete, a membership
//! sync) commit or fail as one redb transaction.
//!
//! The store runs on a file for real deployments and on redb's in-memory
//! backend for tests and throwaway runs.

use super::{DOCUMENT_TABLES, Document};
use crate::OkrError;
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// Metadata key of the id sequence.
const NEXT_ID_KEY: &str = "next_id";

/// First id handed out by a fresh store.
const FIRST_ID: u64 = 1;

enum Op {
    Put {
        table: TableDefinition<'static, u64, &'static [u8]>,
        key: u64,
        bytes: Vec<u8>,
    },
    Remove {
        table: TableDefinition<'static, u64, &'static [u8]>,
        key: u64,
    },
}

/// A set of writes applied in a single transaction.
#[derive(Default)]
pub struct Batch {
    ops: Vec<Op>,
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("ops", &self.ops.len())
            .finish()
    }
}

impl Batch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert-or-replace. The document is encoded immediately.
    pub fn put<D: Document>(&mut self, doc: &D) -> Result<(), OkrError> {
        let bytes =
            postcard::to_allocvec(doc).map_err(|e| OkrError::Serialization(e.to_string()))?;
        self.ops.push(Op::Put {
            table: D::TABLE,
            key: doc.key(),
            bytes,
        });
        Ok(())
    }

    /// Queue a delete. Deleting a missing row is not an error.
    pub fn remove<D: Document>(&mut self, key: u64) {
        self.ops.push(Op::Remove {
            table: D::TABLE,
            key,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Document store over a redb database.
pub struct Store {
    /// The redb database handle.
    db: Database,
    /// Next id to hand out. Persisted with every committed write.
    next_id: u64,
    persistent: bool,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("next_id", &self.next_id)
            .field("persistent", &self.persistent)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create a database file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OkrError> {
        let db = Database::create(path.as_ref()).map_err(|e| OkrError::Storage(e.to_string()))?;
        Self::init(db, true)
    }

    /// Create an empty store that lives only in memory.
    pub fn in_memory() -> Result<Self, OkrError> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        Self::init(db, false)
    }

    fn init(db: Database, persistent: bool) -> Result<Self, OkrError> {
        // Create tables so read transactions never see a missing table.
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| OkrError::Storage(e.to_string()))?;
            for table in DOCUMENT_TABLES {
                let _ = write_txn
                    .open_table(table)
                    .map_err(|e| OkrError::Storage(e.to_string()))?;
            }
            let _ = write_txn
                .open_table(METADATA)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| OkrError::Storage(e.to_string()))?;
        }

        let next_id = {
            let read_txn = db
                .begin_read()
                .map_err(|e| OkrError::Storage(e.to_string()))?;
            let table = read_txn
                .open_table(METADATA)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
            table
                .get(NEXT_ID_KEY)
                .map_err(|e| OkrError::Storage(e.to_string()))?
                .map(|v| v.value())
                .unwrap_or(FIRST_ID)
        };

        Ok(Self {
            db,
            next_id,
            persistent,
        })
    }

    /// Whether documents survive a restart.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Reserve a fresh id. Ids come from one sequence shared by all tables.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Fetch one document by id.
    pub fn get<D: Document>(&self, key: u64) -> Result<Option<D>, OkrError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(D::TABLE)
            .map_err(|e| OkrError::Storage(e.to_string()))?;

        match table
            .get(key)
            .map_err(|e| OkrError::Storage(e.to_string()))?
        {
            Some(data) => {
                let doc: D = postcard::from_bytes(data.value())
                    .map_err(|e| OkrError::Serialization(e.to_string()))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    /// Every document of a type, in id order.
    pub fn list<D: Document>(&self) -> Result<Vec<D>, OkrError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(D::TABLE)
            .map_err(|e| OkrError::Storage(e.to_string()))?;

        let mut docs = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| OkrError::Storage(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| OkrError::Storage(e.to_string()))?;
            let doc: D = postcard::from_bytes(value.value())
                .map_err(|e| OkrError::Serialization(e.to_string()))?;
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Number of documents of a type.
    pub fn count<D: Document>(&self) -> Result<usize, OkrError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(D::TABLE)
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        let len = table
            .len()
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        Ok(len as usize)
    }

    /// Insert or replace one document.
    pub fn put<D: Document>(&mut self, doc: &D) -> Result<(), OkrError> {
        let mut batch = Batch::new();
        batch.put(doc)?;
        self.commit(batch)
    }

    /// Delete one document.
    pub fn remove<D: Document>(&mut self, key: u64) -> Result<(), OkrError> {
        let mut batch = Batch::new();
        batch.remove::<D>(key);
        self.commit(batch)
    }

    /// Apply every queued write in one transaction, together with the
    /// current id sequence.
    pub fn commit(&mut self, batch: Batch) -> Result<(), OkrError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| OkrError::Storage(e.to_string()))?;

        for op in &batch.ops {
            match op {
                Op::Put { table, key, bytes } => {
                    let mut table = write_txn
                        .open_table(*table)
                        .map_err(|e| OkrError::Storage(e.to_string()))?;
                    table
                        .insert(*key, bytes.as_slice())
                        .map_err(|e| OkrError::Storage(e.to_string()))?;
                }
                Op::Remove { table, key } => {
                    let mut table = write_txn
                        .open_table(*table)
                        .map_err(|e| OkrError::Storage(e.to_string()))?;
                    table
                        .remove(*key)
                        .map_err(|e| OkrError::Storage(e.to_string()))?;
                }
            }
        }

        {
            let mut meta_table = write_txn
                .open_table(METADATA)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
            meta_table
                .insert(NEXT_ID_KEY, self.next_id)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
        }

        write_txn
            .commit()
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Drop every document. The id sequence keeps counting.
    pub fn clear(&mut self) -> Result<(), OkrError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        for table in DOCUMENT_TABLES {
            write_txn
                .delete_table(table)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
            let _ = write_txn
                .open_table(table)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
        }
        {
            let mut meta_table = write_txn
                .open_table(METADATA)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
            meta_table
                .insert(NEXT_ID_KEY, self.next_id)
                .map_err(|e| OkrError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| OkrError::Storage(e.to_string()))?;
        Ok(())
    }
}
