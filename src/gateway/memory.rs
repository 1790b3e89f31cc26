use std::collections::HashMap;

use chrono::{
    Duration,
    SecondsFormat,
    Utc,
};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{
    Filter,
    Gateway,
    Table,
    ORDER_COLUMN,
};
use crate::core::errors::{
    DokkaiError,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: Operation,
    pub table: Table,
}

#[derive(Default)]
struct Store {
    tables: HashMap<Table, Vec<Value>>,
    calls: Vec<Call>,
    failures: Vec<(Table, Operation)>,
    ticks: i64,
}

impl Store {
    fn next_timestamp(&mut self) -> String {
        // Strictly increasing so that rows inserted in the same millisecond keep their order
        self.ticks += 1;
        (Utc::now() + Duration::milliseconds(self.ticks))
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn begin(&mut self, table: Table, operation: Operation) -> Result<()> {
        self.calls.push(Call { operation, table });

        if let Some(pos) = self.failures.iter().position(|f| *f == (table, operation)) {
            self.failures.remove(pos);
            return Err(DokkaiError::Remote(format!(
                "{:?} on {} rejected by the store",
                operation, table
            )));
        }
        Ok(())
    }
}

/// In-process stand-in for the remote store. Keeps rows per table in
/// insertion order, stamps `created_at`, records every call and can be told
/// to reject specific calls.
#[derive(Default)]
pub struct MemoryGateway {
    store: Mutex<Store>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a table with rows as if they had already been persisted.
    pub async fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut store = self.store.lock().await;
        for mut row in rows {
            if row.get(ORDER_COLUMN).is_none_or(Value::is_null) {
                let stamp = store.next_timestamp();
                set_created_at(&mut row, stamp);
            }
            store.tables.entry(table).or_default().push(row);
        }
    }

    /// Makes the next `operation` on `table` fail once.
    pub async fn fail_next(&self, table: Table, operation: Operation) {
        self.store.lock().await.failures.push((table, operation));
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.store.lock().await.tables.get(&table).cloned().unwrap_or_default()
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.store.lock().await.calls.clone()
    }

    /// Number of calls other than selects.
    pub async fn write_count(&self) -> usize {
        self.store.lock().await.calls.iter().filter(|c| c.operation != Operation::Select).count()
    }
}

fn set_created_at(row: &mut Value, stamp: String) {
    if let Some(row) = row.as_object_mut() {
        row.insert(ORDER_COLUMN.to_string(), Value::String(stamp));
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

impl Gateway for MemoryGateway {
    async fn select(&self, table: Table) -> Result<Vec<Value>> {
        let mut store = self.store.lock().await;
        store.begin(table, Operation::Select)?;

        let mut rows = store.tables.get(&table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let a = a.get(ORDER_COLUMN).and_then(Value::as_str).unwrap_or_default();
            let b = b.get(ORDER_COLUMN).and_then(Value::as_str).unwrap_or_default();
            a.cmp(b)
        });
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<Value> {
        let mut store = self.store.lock().await;
        store.begin(table, Operation::Insert)?;

        if !row.is_object() {
            return Err(DokkaiError::Remote(format!("insert into {} expects an object", table)));
        }
        let id = row.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        if id.is_empty() {
            return Err(DokkaiError::Remote(format!("insert into {} without id", table)));
        }
        let filter = Filter::id(id.as_str());
        if store.tables.get(&table).is_some_and(|rows| rows.iter().any(|r| filter.matches(r))) {
            return Err(DokkaiError::Remote(format!("duplicate key {} in {}", id, table)));
        }

        let stamp = store.next_timestamp();
        set_created_at(&mut row, stamp);
        store.tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, filter: Filter, patch: Value) -> Result<()> {
        let mut store = self.store.lock().await;
        store.begin(table, Operation::Update)?;

        if let Some(rows) = store.tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                merge(row, &patch);
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, filter: Filter) -> Result<()> {
        let mut store = self.store.lock().await;
        store.begin(table, Operation::Delete)?;

        if let Some(rows) = store.tables.get_mut(&table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }

    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<()> {
        let mut store = self.store.lock().await;
        store.begin(table, Operation::Upsert)?;

        for row in rows {
            let id = row.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            let filter = Filter::id(id);
            let existing = store.tables.entry(table).or_default();

            match existing.iter().position(|r| filter.matches(r)) {
                Some(pos) => merge(&mut existing[pos], &row),
                None => {
                    let mut row = row;
                    if row.get(ORDER_COLUMN).is_none_or(Value::is_null) {
                        let stamp = store.next_timestamp();
                        set_created_at(&mut row, stamp);
                    }
                    store.tables.entry(table).or_default().push(row);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::models::Folder;

    #[tokio::test]
    async fn test_insert_stamps_and_orders_rows() {
        let gateway = MemoryGateway::new();
        gateway.insert(Table::Folders, json!({ "id": "a", "name": "A" })).await.unwrap();
        let b = gateway.insert(Table::Folders, json!({ "id": "b", "name": "B" })).await.unwrap();
        assert!(b["created_at"].is_string());

        let rows = gateway.select(Table::Folders).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let gateway = MemoryGateway::new();
        gateway.insert(Table::Units, json!({ "id": "u1", "title": "T" })).await.unwrap();
        let result = gateway.insert(Table::Units, json!({ "id": "u1", "title": "T" })).await;
        assert!(matches!(result, Err(DokkaiError::Remote(_))));
    }

    #[tokio::test]
    async fn test_update_delete_and_upsert() {
        let gateway = MemoryGateway::new();
        gateway
            .seed(
                Table::Vocabulary,
                vec![
                    json!({ "id": "v1", "word": "run", "unit_id": "u1" }),
                    json!({ "id": "v2", "word": "walk", "unit_id": "u2" }),
                ],
            )
            .await;

        gateway
            .update(Table::Vocabulary, Filter::id("v1"), json!({ "meaning": "走る" }))
            .await
            .unwrap();
        gateway.delete(Table::Vocabulary, Filter::eq("unit_id", "u2")).await.unwrap();
        gateway
            .upsert(
                Table::Vocabulary,
                vec![
                    json!({ "id": "v1", "meaning": "走ること" }),
                    json!({ "id": "v3", "word": "swim", "unit_id": "u1" }),
                ],
            )
            .await
            .unwrap();

        let rows = gateway.rows(Table::Vocabulary).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["word"], "run");
        assert_eq!(rows[0]["meaning"], "走ること");
        assert_eq!(rows[1]["id"], "v3");
    }

    #[tokio::test]
    async fn test_fail_next_rejects_once() {
        let gateway = MemoryGateway::new();
        gateway.fail_next(Table::Folders, Operation::Insert).await;

        let first = gateway.insert(Table::Folders, json!({ "id": "a", "name": "A" })).await;
        assert!(first.is_err());
        let second = gateway.insert(Table::Folders, json!({ "id": "a", "name": "A" })).await;
        assert!(second.is_ok());

        assert_eq!(gateway.write_count().await, 2);
        assert_eq!(gateway.rows(Table::Folders).await.len(), 1);
    }

    #[tokio::test]
    async fn test_typed_records_go_through_rows() {
        let gateway = MemoryGateway::new();
        let folder = Folder { id: "f1".to_string(), name: "Science".to_string(), created_at: None };

        gateway.insert(Table::Folders, serde_json::to_value(&folder).unwrap()).await.unwrap();

        let folders: Vec<Folder> = gateway.select_records().await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Science");
        assert!(folders[0].created_at.is_some());
    }
}
