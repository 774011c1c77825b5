mod config;
mod db;
mod error;
mod gateway;
mod ipc;
mod logging;
mod model;
mod record_api;
mod services;
mod store;
mod wire;

use std::io::{self, BufRead, Write};

use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env();
    logging::init(&config);

    let mut state = ipc::AppState::from_config(&config)?;
    info!(
        backend = state.backend.kind(),
        version = env!("CARGO_PKG_VERSION"),
        "schoold ready"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            // No usable id to echo back.
            Err(e) => serde_json::json!({
                "ok": false,
                "error": { "code": "bad_json", "message": e.to_string() }
            }),
        };
        writeln!(stdout, "{}", serde_json::to_string(&resp)?)?;
        stdout.flush()?;
    }
    Ok(())
}
