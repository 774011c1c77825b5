use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .env_remove("SCHOOLD_BACKEND")
        .env_remove("SCHOOLD_WORKSPACE")
        .env("SCHOOLD_SEED", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_line(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_line(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn is_ok(v: &serde_json::Value) -> bool {
    v.get("ok").and_then(|v| v.as_bool()) == Some(true)
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("schoold-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(is_ok(&health));
    assert_eq!(health["result"]["backend"], json!("memory"));
    assert_eq!(health["result"]["workspacePath"], json!(null));

    let families = [
        ("students", "student"),
        ("classes", "class"),
        ("attendance", "attendance"),
        ("assignments", "assignment"),
        ("grades", "grade"),
        ("announcements", "announcement"),
        ("schedule", "entry"),
    ];
    for (i, (plural, singular)) in families.iter().enumerate() {
        let list = request(
            &mut stdin,
            &mut reader,
            &format!("list-{i}"),
            &format!("{plural}.list"),
            json!({}),
        );
        assert!(is_ok(&list), "{plural}.list: {list}");
        let rows = list["result"][*plural].as_array().expect("rows");
        assert!(!rows.is_empty(), "{plural} seeded");

        let get = request(
            &mut stdin,
            &mut reader,
            &format!("get-{i}"),
            &format!("{plural}.get"),
            json!({ "id": 1 }),
        );
        assert!(is_ok(&get), "{plural}.get: {get}");
        assert_eq!(get["result"][*singular]["Id"], json!(1));
    }

    for (i, method) in [
        "attendance.stats",
        "grades.stats",
        "schedule.today",
        "schedule.weekly",
        "announcements.recent",
        "dashboard.summary",
    ]
    .iter()
    .enumerate()
    {
        let v = request(&mut stdin, &mut reader, &format!("read-{i}"), method, json!({}));
        assert!(is_ok(&v), "{method}: {v}");
    }

    let selected = request(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert!(is_ok(&selected));
    let health = request(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["result"]["backend"], json!("sqlite"));

    let back = request(
        &mut stdin,
        &mut reader,
        "mem",
        "workspace.useMemory",
        json!({ "seed": false }),
    );
    assert!(is_ok(&back));
    let students = request(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(students["result"]["students"], json!([]));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unknown_methods_and_bad_json_are_reported() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{\"id\":\"x\",\"method\":\"nope.nothing\"}}").expect("write");
    stdin.flush().expect("flush");
    let v = read_line(&mut reader);
    assert_eq!(v["id"], json!("x"));
    assert_eq!(v["ok"], json!(false));
    assert_eq!(v["error"]["code"], json!("not_implemented"));

    writeln!(stdin, "{{\"id\":\"y\",\"method\":\"students.reorder\"}}").expect("write");
    stdin.flush().expect("flush");
    let v = read_line(&mut reader);
    assert_eq!(v["error"]["code"], json!("not_implemented"));

    writeln!(stdin, "this is not json").expect("write");
    stdin.flush().expect("flush");
    let v = read_line(&mut reader);
    assert_eq!(v["ok"], json!(false));
    assert_eq!(v["error"]["code"], json!("bad_json"));

    // blank lines are skipped without a response
    writeln!(stdin).expect("write");
    let v = request(&mut stdin, &mut reader, "after", "health", json!({}));
    assert!(is_ok(&v));

    drop(stdin);
    let _ = child.wait();
}
