//! Plain `<entity>.list/get/create/update/delete` for every record type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::params::{get_object, get_required_id, keyed, respond, HandlerErr};
use crate::gateway::Repository;
use crate::ipc::types::{AppState, Request};
use crate::model::{
    Announcement, Assignment, AttendanceRecord, ClassSection, Grade, ScheduleEntry, Student,
};
use crate::wire::WireEntity;

fn crud<E>(state: &mut AppState, req: &Request, op: &str) -> Option<Value>
where
    E: WireEntity + Serialize + DeserializeOwned,
    E::Patch: DeserializeOwned,
{
    let result = match op {
        "list" => keyed(E::PLURAL, state.backend.list::<E>()),
        "get" => get_required_id(&req.params, "id").and_then(|id| {
            let found = state
                .backend
                .with_repo(|repo: &mut dyn Repository<E>| repo.get(id));
            keyed(E::SINGULAR, found)
        }),
        "create" => get_object::<E>(&req.params, "record").and_then(|record| {
            let created = state
                .backend
                .with_repo(|repo: &mut dyn Repository<E>| repo.create(record));
            keyed(E::SINGULAR, created)
        }),
        "update" => update::<E>(state, &req.params),
        "delete" => get_required_id(&req.params, "id").map(|id| {
            let deleted = state
                .backend
                .with_repo(|repo: &mut dyn Repository<E>| repo.delete(id));
            json!({ "deleted": deleted })
        }),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

fn update<E>(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr>
where
    E: WireEntity + Serialize,
    E::Patch: DeserializeOwned,
{
    let id = get_required_id(params, "id")?;
    let patch: E::Patch = get_object(params, "patch")?;
    let updated = state
        .backend
        .with_repo(|repo: &mut dyn Repository<E>| repo.update(id, patch));
    keyed(E::SINGULAR, updated)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let (family, op) = req.method.split_once('.')?;
    match family {
        "students" => crud::<Student>(state, req, op),
        "classes" => crud::<ClassSection>(state, req, op),
        "attendance" => crud::<AttendanceRecord>(state, req, op),
        "assignments" => crud::<Assignment>(state, req, op),
        "grades" => crud::<Grade>(state, req, op),
        "announcements" => crud::<Announcement>(state, req, op),
        "schedule" => crud::<ScheduleEntry>(state, req, op),
        _ => None,
    }
}
