use chrono::Utc;
use serde_json::{json, Value};

use super::params::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Announcement;
use crate::services::announcements::{recent_announcements, DEFAULT_RECENT_DAYS};

fn handle_recent(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let days = match params.get("days") {
        None | Some(Value::Null) => DEFAULT_RECENT_DAYS,
        Some(v) => match v.as_i64() {
            Some(d) if d >= 0 => d,
            _ => {
                return Err(HandlerErr::bad_param(
                    "days",
                    "days must be a non-negative integer",
                ))
            }
        },
    };
    let all = state.backend.list::<Announcement>();
    Ok(json!({ "announcements": recent_announcements(all, days, Utc::now()) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "announcements.recent" => Some(respond(&req.id, handle_recent(state, &req.params))),
        _ => None,
    }
}
