//! Persistence gateway: uniform select/insert/update/delete/upsert access to
//! the three tables of the remote store. Rows travel as JSON objects; typed
//! records are mapped with serde at the edges.

pub mod memory;
pub mod rest;

use std::fmt;

use serde_json::Value;

pub use memory::MemoryGateway;
pub use rest::RestGateway;

use crate::core::{
    errors::Result,
    models::Record,
};

pub const ORDER_COLUMN: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Folders,
    Units,
    Vocabulary,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Folders => "folders",
            Table::Units => "units",
            Table::Vocabulary => "vocabulary",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter on a single column, e.g. `id = 'abc'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub value: String,
}

impl Filter {
    pub fn id(value: impl Into<String>) -> Self {
        Filter { column: "id", value: value.into() }
    }

    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Filter { column, value: value.into() }
    }

    pub fn matches(&self, row: &Value) -> bool {
        match row.get(self.column) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Number(n)) => n.to_string() == self.value,
            _ => false,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// All rows of `table`, ascending by creation time.
    async fn select(&self, table: Table) -> Result<Vec<Value>>;

    /// Inserts one row and returns it as persisted (with server-assigned fields).
    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    async fn update(&self, table: Table, filter: Filter, patch: Value) -> Result<()>;

    async fn delete(&self, table: Table, filter: Filter) -> Result<()>;

    /// Inserts or replaces rows by `id`.
    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<()>;

    async fn select_records<R: Record>(&self) -> Result<Vec<R>> {
        let rows = self.select(R::TABLE).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(serde_json::from_value(row)?);
        }
        Ok(records)
    }
}
