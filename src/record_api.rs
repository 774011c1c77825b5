//! The hosted record API contract and its SQLite implementation.
//!
//! Calls fail as a whole with `Err` (transport or storage trouble). Batch
//! writes succeed as a whole and report per-record outcomes in
//! [`RecordResult`]s, the way the hosted service does.

use anyhow::{anyhow, Context};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{json, Value};

use crate::db::record_table;
use crate::model::Id;
use crate::wire::WireMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    pub success: bool,
    /// The stored wire record, `Id` included, when `success` is set.
    pub data: Option<Value>,
    pub message: Option<String>,
}

impl RecordResult {
    pub fn stored(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

pub trait RecordApi {
    fn fetch_records(&self, table: &str) -> anyhow::Result<Vec<Value>>;
    fn get_record_by_id(&self, table: &str, id: Id) -> anyhow::Result<Option<Value>>;
    fn create_records(&self, table: &str, records: Vec<WireMap>)
        -> anyhow::Result<Vec<RecordResult>>;
    /// Every record must carry its `Id`; only the keys present are changed.
    fn update_records(&self, table: &str, records: Vec<WireMap>)
        -> anyhow::Result<Vec<RecordResult>>;
    fn delete_records(&self, table: &str, ids: &[Id]) -> anyhow::Result<Vec<RecordResult>>;
}

/// Record API over a workspace SQLite file. Works on a plain connection or a
/// transaction (which derefs to one).
pub struct SqliteRecordApi<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRecordApi<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn load(&self, table: &'static str, id: Id) -> anyhow::Result<Option<WireMap>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT data FROM {table} WHERE id = ?"),
                [id],
                |r| r.get(0),
            )
            .optional()?;
        raw.map(|s| decode_row(table, id, &s)).transpose()
    }

    fn store(&self, table: &'static str, id: Id, data: &WireMap) -> anyhow::Result<()> {
        let raw = serde_json::to_string(data)?;
        self.conn.execute(
            &format!(
                "INSERT INTO {table}(id, data) VALUES(?, ?)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data"
            ),
            (id, &raw),
        )?;
        Ok(())
    }

    fn next_id(&self, table: &'static str) -> anyhow::Result<Id> {
        let id: Id = self.conn.query_row(
            &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {table}"),
            [],
            |r| r.get(0),
        )?;
        Ok(id)
    }
}

fn decode_row(table: &str, id: Id, raw: &str) -> anyhow::Result<WireMap> {
    let v: Value = serde_json::from_str(raw)
        .with_context(|| format!("corrupt row {table}#{id}"))?;
    match v {
        Value::Object(m) => Ok(m),
        _ => Err(anyhow!("corrupt row {table}#{id}: not an object")),
    }
}

fn with_id(mut data: WireMap, id: Id) -> Value {
    data.insert("Id".into(), json!(id));
    Value::Object(data)
}

impl RecordApi for SqliteRecordApi<'_> {
    fn fetch_records(&self, table: &str) -> anyhow::Result<Vec<Value>> {
        let table = record_table(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, data FROM {table} ORDER BY id"))?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, Id>(0)?, r.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, raw)| decode_row(table, id, &raw).map(|m| with_id(m, id)))
            .collect()
    }

    fn get_record_by_id(&self, table: &str, id: Id) -> anyhow::Result<Option<Value>> {
        let table = record_table(table)?;
        Ok(self.load(table, id)?.map(|m| with_id(m, id)))
    }

    fn create_records(
        &self,
        table: &str,
        records: Vec<WireMap>,
    ) -> anyhow::Result<Vec<RecordResult>> {
        let table = record_table(table)?;
        let mut results = Vec::with_capacity(records.len());
        for mut data in records {
            data.remove("Id");
            let id = self.next_id(table)?;
            self.store(table, id, &data)?;
            results.push(RecordResult::stored(with_id(data, id)));
        }
        Ok(results)
    }

    fn update_records(
        &self,
        table: &str,
        records: Vec<WireMap>,
    ) -> anyhow::Result<Vec<RecordResult>> {
        let table = record_table(table)?;
        let mut results = Vec::with_capacity(records.len());
        for mut changes in records {
            let Some(id) = changes.remove("Id").and_then(|v| v.as_i64()) else {
                results.push(RecordResult::failed("missing Id"));
                continue;
            };
            let Some(mut data) = self.load(table, id)? else {
                results.push(RecordResult::failed(format!("record {id} not found")));
                continue;
            };
            for (k, v) in changes {
                data.insert(k, v);
            }
            self.store(table, id, &data)?;
            results.push(RecordResult::stored(with_id(data, id)));
        }
        Ok(results)
    }

    fn delete_records(&self, table: &str, ids: &[Id]) -> anyhow::Result<Vec<RecordResult>> {
        let table = record_table(table)?;
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let changed = self
                .conn
                .execute(&format!("DELETE FROM {table} WHERE id = ?"), [id])?;
            if changed == 0 {
                results.push(RecordResult::failed(format!("record {id} not found")));
            } else {
                results.push(RecordResult::stored(json!({ "Id": id })));
            }
        }
        Ok(results)
    }
}
