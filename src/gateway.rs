use rusqlite::{Connection, TransactionBehavior};
use serde_json::{json, Value};
use std::marker::PhantomData;
use tracing::{error, warn};

use crate::model::Id;
use crate::record_api::{RecordApi, RecordResult, SqliteRecordApi};
use crate::store::{Collection, Entity, MemoryStore};
use crate::wire::WireEntity;

/// Per-entity CRUD as seen by the services.
///
/// Absent records and backend failures both come back as `None` / empty /
/// `false`; the remote gateway logs the failures before swallowing them.
pub trait Repository<E: Entity> {
    fn list(&mut self) -> Vec<E>;
    fn get(&mut self, id: Id) -> Option<E>;
    fn create(&mut self, record: E) -> Option<E>;
    fn update(&mut self, id: Id, patch: E::Patch) -> Option<E>;
    fn delete(&mut self, id: Id) -> bool;
}

impl<E: Entity> Repository<E> for Collection<E> {
    fn list(&mut self) -> Vec<E> {
        Collection::list(self)
    }

    fn get(&mut self, id: Id) -> Option<E> {
        Collection::get(self, id)
    }

    fn create(&mut self, record: E) -> Option<E> {
        Some(Collection::create(self, record))
    }

    fn update(&mut self, id: Id, patch: E::Patch) -> Option<E> {
        Collection::update(self, id, patch)
    }

    fn delete(&mut self, id: Id) -> bool {
        Collection::delete(self, id).is_some()
    }
}

/// Gateway onto a record API: translates to and from the wire schema and
/// turns API failures into empty results.
pub struct RemoteGateway<'a, E> {
    api: &'a dyn RecordApi,
    entity: PhantomData<E>,
}

impl<'a, E: WireEntity> RemoteGateway<'a, E> {
    pub fn new(api: &'a dyn RecordApi) -> Self {
        Self {
            api,
            entity: PhantomData,
        }
    }

    fn decode(value: &Value) -> Option<E> {
        match E::from_wire(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(table = E::TABLE, error = %e, "skipping undecodable record");
                None
            }
        }
    }

    /// Logs the failed subset of a batch write and keeps the first success.
    fn first_success(&self, op: &str, results: Vec<RecordResult>) -> Option<Value> {
        let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.success);
        if !failed.is_empty() {
            let messages: Vec<&str> = failed
                .iter()
                .filter_map(|r| r.message.as_deref())
                .collect();
            warn!(
                table = E::TABLE,
                op,
                failed = failed.len(),
                ?messages,
                "record api rejected part of a batch"
            );
        }
        ok.into_iter().next().and_then(|r| r.data)
    }
}

impl<E: WireEntity> Repository<E> for RemoteGateway<'_, E> {
    fn list(&mut self) -> Vec<E> {
        match self.api.fetch_records(E::TABLE) {
            Ok(rows) => rows.iter().filter_map(Self::decode).collect(),
            Err(e) => {
                error!(table = E::TABLE, error = %e, "failed to fetch records");
                Vec::new()
            }
        }
    }

    fn get(&mut self, id: Id) -> Option<E> {
        match self.api.get_record_by_id(E::TABLE, id) {
            Ok(row) => row.as_ref().and_then(Self::decode),
            Err(e) => {
                error!(table = E::TABLE, id, error = %e, "failed to fetch record");
                None
            }
        }
    }

    fn create(&mut self, mut record: E) -> Option<E> {
        record.fill_defaults();
        match self.api.create_records(E::TABLE, vec![record.to_wire()]) {
            Ok(results) => self
                .first_success("create", results)
                .as_ref()
                .and_then(Self::decode),
            Err(e) => {
                error!(table = E::TABLE, error = %e, "failed to create record");
                None
            }
        }
    }

    fn update(&mut self, id: Id, patch: E::Patch) -> Option<E> {
        let mut changes = E::patch_to_wire(&patch);
        changes.insert("Id".into(), json!(id));
        match self.api.update_records(E::TABLE, vec![changes]) {
            Ok(results) => self
                .first_success("update", results)
                .as_ref()
                .and_then(Self::decode),
            Err(e) => {
                error!(table = E::TABLE, id, error = %e, "failed to update record");
                None
            }
        }
    }

    fn delete(&mut self, id: Id) -> bool {
        match self.api.delete_records(E::TABLE, &[id]) {
            Ok(results) => self.first_success("delete", results).is_some(),
            Err(e) => {
                error!(table = E::TABLE, id, error = %e, "failed to delete record");
                false
            }
        }
    }
}

/// Where records live for the current session.
pub enum Backend {
    /// Local mode: process-lifetime collections.
    Memory(MemoryStore),
    /// Record API mode over a workspace database.
    RecordApi(Connection),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Memory(_) => "memory",
            Backend::RecordApi(_) => "sqlite",
        }
    }

    pub fn with_repo<E, R>(&mut self, f: impl FnOnce(&mut dyn Repository<E>) -> R) -> R
    where
        E: WireEntity,
    {
        match self {
            Backend::Memory(store) => f(E::collection(store)),
            Backend::RecordApi(conn) => {
                let api = SqliteRecordApi::new(conn);
                f(&mut RemoteGateway::<E>::new(&api))
            }
        }
    }

    /// Like [`Backend::with_repo`], but the whole closure runs as one unit:
    /// in record API mode inside a single IMMEDIATE SQLite transaction, so a
    /// second writer on the same workspace waits (up to the busy timeout)
    /// instead of reading stale rows.
    pub fn atomically<E, R>(
        &mut self,
        f: impl FnOnce(&mut dyn Repository<E>) -> R,
    ) -> anyhow::Result<R>
    where
        E: WireEntity,
    {
        match self {
            Backend::Memory(store) => Ok(f(E::collection(store))),
            Backend::RecordApi(conn) => {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let out = {
                    let api = SqliteRecordApi::new(&tx);
                    f(&mut RemoteGateway::<E>::new(&api))
                };
                tx.commit()?;
                Ok(out)
            }
        }
    }

    pub fn list<E: WireEntity>(&mut self) -> Vec<E> {
        self.with_repo(|repo: &mut dyn Repository<E>| repo.list())
    }
}
