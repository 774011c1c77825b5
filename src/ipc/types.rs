use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::config::{BackendKind, Config};
use crate::db;
use crate::gateway::Backend;
use crate::store::MemoryStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub backend: Backend,
}

impl AppState {
    pub fn memory(seed: bool) -> anyhow::Result<Self> {
        let store = if seed {
            MemoryStore::seeded()?
        } else {
            MemoryStore::new()
        };
        info!(
            students = store.students.len(),
            classes = store.classes.len(),
            attendance = store.attendance.len(),
            grades = store.grades.len(),
            "in-memory store ready"
        );
        Ok(Self {
            workspace: None,
            backend: Backend::Memory(store),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match (config.backend, config.workspace.as_ref()) {
            (BackendKind::Sqlite, Some(path)) => {
                let conn = db::open_db(path)
                    .with_context(|| format!("failed to open workspace {}", path.display()))?;
                Ok(Self {
                    workspace: Some(path.clone()),
                    backend: Backend::RecordApi(conn),
                })
            }
            _ => Self::memory(config.seed),
        }
    }
}
