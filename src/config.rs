use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub workspace: Option<PathBuf>,
    pub seed: bool,
    pub log_filter: String,
    pub log_format: LogFormat,
    /// Problems found while reading the environment. Logging is not up yet at
    /// that point, so they are reported once it is.
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            workspace: None,
            seed: true,
            log_filter: "info".to_string(),
            log_format: LogFormat::Compact,
            warnings: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Config::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("SCHOOLD_WORKSPACE") {
            cfg.workspace = Some(PathBuf::from(v));
        }

        match get("SCHOOLD_BACKEND").map(|v| v.to_ascii_lowercase()) {
            None => {}
            Some(v) if v == "memory" => cfg.backend = BackendKind::Memory,
            Some(v) if v == "sqlite" => {
                if cfg.workspace.is_some() {
                    cfg.backend = BackendKind::Sqlite;
                } else {
                    cfg.warnings.push(
                        "SCHOOLD_BACKEND=sqlite needs SCHOOLD_WORKSPACE; using memory".to_string(),
                    );
                }
            }
            Some(other) => cfg
                .warnings
                .push(format!("unknown SCHOOLD_BACKEND {other:?}; using memory")),
        }

        match get("SCHOOLD_SEED").map(|v| v.to_ascii_lowercase()) {
            None => {}
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => cfg.seed = true,
            Some(v) if matches!(v.as_str(), "0" | "false" | "no") => cfg.seed = false,
            Some(other) => cfg
                .warnings
                .push(format!("unknown SCHOOLD_SEED {other:?}; seeding")),
        }

        if let Some(v) = get("SCHOOLD_LOG") {
            cfg.log_filter = v;
        }

        match get("SCHOOLD_LOG_FORMAT").map(|v| v.to_ascii_lowercase()) {
            None => {}
            Some(v) if v == "compact" => cfg.log_format = LogFormat::Compact,
            Some(v) if v == "json" || v == "jsonl" => cfg.log_format = LogFormat::Json,
            Some(other) => cfg
                .warnings
                .push(format!("unknown SCHOOLD_LOG_FORMAT {other:?}; using compact")),
        }

        cfg
    }
}
