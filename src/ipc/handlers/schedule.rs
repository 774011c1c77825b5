use chrono::{Datelike, Local};
use serde_json::{json, Value};

use super::params::{get_optional_date, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::ScheduleEntry;
use crate::services::schedule::{day_schedule, weekly_schedule};

/// `date` lets a client ask about a day other than today.
fn handle_today(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let date = get_optional_date(params, "date")?.unwrap_or_else(|| Local::now().date_naive());
    let entries = state.backend.list::<ScheduleEntry>();
    Ok(json!({ "schedule": day_schedule(&entries, date.weekday()) }))
}

fn handle_weekly(state: &mut AppState) -> Result<Value, HandlerErr> {
    let entries = state.backend.list::<ScheduleEntry>();
    serde_json::to_value(weekly_schedule(&entries))
        .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "schedule.today" => handle_today(state, &req.params),
        "schedule.weekly" => handle_weekly(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
