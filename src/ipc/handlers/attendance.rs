use serde_json::{json, Value};

use super::params::{
    get_optional_date, get_optional_id, get_required_date, get_required_id, get_required_str,
    respond, HandlerErr,
};
use crate::gateway::Repository;
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::services::attendance::{
    attendance_stats, filter_records, mark_attendance, AttendanceFilter, DateRange,
};

fn handle_list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = AttendanceFilter {
        student_id: get_optional_id(params, "studentId")?,
        date: get_optional_date(params, "date")?,
        class_id: get_optional_id(params, "classId")?,
    };
    let rows = filter_records(state.backend.list::<AttendanceRecord>(), &filter);
    Ok(json!({ "attendance": rows }))
}

fn handle_mark(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_id(params, "studentId")?;
    let date = get_required_date(params, "date")?;
    let status: AttendanceStatus = get_required_str(params, "status")?.parse()?;
    let class_id = get_optional_id(params, "classId")?;

    let record = state
        .backend
        .atomically(|repo: &mut dyn Repository<AttendanceRecord>| {
            mark_attendance(repo, student_id, date, status, class_id)
        })
        .map_err(|e| HandlerErr::new("db_tx_failed", format!("{e:?}")))?;
    Ok(json!({ "attendance": record }))
}

fn handle_stats(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let range = match (
        get_optional_date(params, "start")?,
        get_optional_date(params, "end")?,
    ) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
        (None, None) => None,
        (Some(_), None) => {
            return Err(HandlerErr::bad_param("end", "start and end must be given together"))
        }
        (None, Some(_)) => {
            return Err(HandlerErr::bad_param("start", "start and end must be given together"))
        }
    };
    let rows = state.backend.list::<AttendanceRecord>();
    serde_json::to_value(attendance_stats(&rows, range))
        .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "attendance.list" => handle_list(state, &req.params),
        "attendance.mark" => handle_mark(state, &req.params),
        "attendance.stats" => handle_stats(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
