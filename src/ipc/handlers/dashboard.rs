use chrono::Utc;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::services::dashboard::summary;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    if req.method != "dashboard.summary" {
        return None;
    }
    let s = summary(&mut state.backend, Utc::now());
    Some(match serde_json::to_value(s) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "serialize_failed", e.to_string(), None),
    })
}
