//! # Storage Module
//!
//! Document persistence on top of redb.
//!
//! Every collection is one redb table keyed by the document's numeric id,
//! with postcard-encoded values. A shared metadata table holds the id
//! sequence so ids are never reused across restarts.

mod redb_store;

pub use redb_store::{Batch, Store};

use crate::{Department, KeyResult, Objective, Team, User};
use redb::TableDefinition;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A type stored as one row of its own table.
pub trait Document: Serialize + DeserializeOwned {
    /// The table holding every document of this type.
    const TABLE: TableDefinition<'static, u64, &'static [u8]>;

    /// Row key.
    fn key(&self) -> u64;
}

impl Document for User {
    const TABLE: TableDefinition<'static, u64, &'static [u8]> = TableDefinition::new("users");

    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Document for Department {
    const TABLE: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("departments");

    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Document for Team {
    const TABLE: TableDefinition<'static, u64, &'static [u8]> = TableDefinition::new("teams");

    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Document for Objective {
    const TABLE: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("objectives");

    fn key(&self) -> u64 {
        self.id.0
    }
}

impl Document for KeyResult {
    const TABLE: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("key_results");

    fn key(&self) -> u64 {
        self.id.0
    }
}

/// Every document table, in the order they are created.
pub(crate) const DOCUMENT_TABLES: [TableDefinition<'static, u64, &'static [u8]>; 5] = [
    User::TABLE,
    Department::TABLE,
    Team::TABLE,
    Objective::TABLE,
    KeyResult::TABLE,
];
