use chrono::Local;
use serde_json::{json, Value};

use super::params::{get_optional_id, get_required_f64, get_required_id, respond, HandlerErr};
use crate::gateway::Repository;
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, Grade};
use crate::services::grades::{
    filter_grades, grade_stats, note_score_against, update_grade, validate_score, GradeFilter,
};

fn handle_list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = GradeFilter {
        student_id: get_optional_id(params, "studentId")?,
        assignment_id: get_optional_id(params, "assignmentId")?,
    };
    let rows = filter_grades(state.backend.list::<Grade>(), &filter);
    Ok(json!({ "grades": rows }))
}

fn handle_upsert(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_id(params, "studentId")?;
    let assignment_id = get_required_id(params, "assignmentId")?;
    let score = get_required_f64(params, "score")?;
    validate_score(score)?;

    let assignment = state
        .backend
        .with_repo(|repo: &mut dyn Repository<Assignment>| repo.get(assignment_id));
    note_score_against(score, assignment.as_ref());

    let today = Local::now().date_naive();
    let grade = state
        .backend
        .atomically(|repo: &mut dyn Repository<Grade>| {
            update_grade(repo, student_id, assignment_id, score, today)
        })
        .map_err(|e| HandlerErr::new("db_tx_failed", format!("{e:?}")))??;
    Ok(json!({ "grade": grade }))
}

fn handle_stats(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_optional_id(params, "studentId")?;
    let rows = state.backend.list::<Grade>();
    serde_json::to_value(grade_stats(&rows, student_id))
        .map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "grades.list" => handle_list(state, &req.params),
        "grades.upsert" => handle_upsert(state, &req.params),
        "grades.stats" => handle_stats(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
