use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use crate::db;
use crate::gateway::Backend;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backend": state.backend.kind(),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            info!(path = %path.display(), "workspace selected");
            state.workspace = Some(path.clone());
            state.backend = Backend::RecordApi(conn);
            ok(
                &req.id,
                json!({ "workspacePath": path.to_string_lossy(), "backend": state.backend.kind() }),
            )
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_workspace_use_memory(state: &mut AppState, req: &Request) -> serde_json::Value {
    let seed = match req.params.get("seed") {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(_) => return err(&req.id, "bad_params", "seed must be a boolean", None),
    };
    match AppState::memory(seed) {
        Ok(fresh) => {
            info!(seed, "switched to in-memory store");
            *state = fresh;
            ok(&req.id, json!({ "backend": state.backend.kind(), "seeded": seed }))
        }
        Err(e) => err(&req.id, "seed_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.useMemory" => Some(handle_workspace_use_memory(state, req)),
        _ => None,
    }
}
