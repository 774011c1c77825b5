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

fn spawn_sidecar(seed: bool) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .env_remove("SCHOOLD_BACKEND")
        .env_remove("SCHOOLD_WORKSPACE")
        .env("SCHOOLD_SEED", if seed { "1" } else { "0" })
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn open(backend: &str) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let (child, mut stdin, mut reader) = spawn_sidecar(false);
    if backend == "sqlite" {
        let workspace = temp_dir("schoold-crud");
        request_ok(
            &mut stdin,
            &mut reader,
            "ws",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
    }
    (child, stdin, reader)
}

#[test]
fn student_create_get_update_delete() {
    for backend in ["memory", "sqlite"] {
        let (_child, mut stdin, mut reader) = open(backend);

        let created = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "students.create",
            json!({ "record": {
                "name": "Maya Patel",
                "email": "maya.patel@school.edu",
                "grade": 9,
                "section": "B",
                "rollNumber": "09B014",
                "parentIds": [201, 202],
                "dateOfBirth": "2009-06-02"
            }}),
        );
        let student = created["student"].clone();
        assert_eq!(student["Id"], json!(1), "{backend}");

        let fetched = request_ok(&mut stdin, &mut reader, "2", "students.get", json!({ "id": 1 }));
        assert_eq!(fetched["student"], student, "{backend}");
        assert_eq!(fetched["student"]["parentIds"], json!([201, 202]));
        assert_eq!(fetched["student"]["rollNumber"], json!("09B014"));

        let updated = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "students.update",
            json!({ "id": 1, "patch": { "section": "C", "parentIds": [203] } }),
        );
        assert_eq!(updated["student"]["section"], json!("C"));
        assert_eq!(updated["student"]["parentIds"], json!([203]));
        assert_eq!(updated["student"]["name"], json!("Maya Patel"), "{backend}");
        assert_eq!(updated["student"]["grade"], json!(9));

        let missing = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "students.update",
            json!({ "id": 42, "patch": { "section": "D" } }),
        );
        assert_eq!(missing["student"], json!(null));

        let deleted = request_ok(&mut stdin, &mut reader, "5", "students.delete", json!({ "id": 1 }));
        assert_eq!(deleted["deleted"], json!(true));
        let gone = request_ok(&mut stdin, &mut reader, "6", "students.get", json!({ "id": 1 }));
        assert_eq!(gone["student"], json!(null));
        let again = request_ok(&mut stdin, &mut reader, "7", "students.delete", json!({ "id": 1 }));
        assert_eq!(again["deleted"], json!(false), "{backend}");
    }
}

fn same_instant(a: &serde_json::Value, b: &str) -> bool {
    let parse = |s: &str| chrono::DateTime::parse_from_rfc3339(s).expect("timestamp");
    a.as_str().map(parse) == Some(parse(b))
}

#[test]
fn fetched_records_match_what_was_created() {
    let created_at = "2024-01-15T08:00:00.123456Z";
    for backend in ["memory", "sqlite"] {
        let (_child, mut stdin, mut reader) = open(backend);

        let input = json!({
            "title": "Term dates",
            "content": "Spring term starts 8 January.",
            "authorId": "admin-1",
            "targetAudience": "parents",
            "createdAt": created_at,
            "priority": "high",
            "isActive": false
        });
        request_ok(
            &mut stdin,
            &mut reader,
            "a1",
            "announcements.create",
            json!({ "record": input.clone() }),
        );
        let got = request_ok(
            &mut stdin,
            &mut reader,
            "a2",
            "announcements.get",
            json!({ "id": 1 }),
        );
        let a = &got["announcement"];
        for key in ["title", "content", "authorId", "targetAudience", "priority", "isActive"] {
            assert_eq!(a[key], input[key], "{backend} announcement {key}");
        }
        assert!(same_instant(&a["createdAt"], created_at), "{backend}: {}", a["createdAt"]);

        let input = json!({
            "title": "Lab report",
            "subject": "Chemistry",
            "dueDate": "2024-02-01",
            "totalPoints": 37.5,
            "description": "Titration write-up",
            "type": "lab",
            "classId": 4,
            "createdAt": created_at
        });
        request_ok(
            &mut stdin,
            &mut reader,
            "s1",
            "assignments.create",
            json!({ "record": input.clone() }),
        );
        let got = request_ok(
            &mut stdin,
            &mut reader,
            "s2",
            "assignments.get",
            json!({ "id": 1 }),
        );
        let s = &got["assignment"];
        for key in ["title", "subject", "dueDate", "description", "type", "classId"] {
            assert_eq!(s[key], input[key], "{backend} assignment {key}");
        }
        assert_eq!(s["totalPoints"].as_f64(), Some(37.5));
        assert!(same_instant(&s["createdAt"], created_at), "{backend}: {}", s["createdAt"]);

        // default timestamps carry full precision too
        let made = request_ok(
            &mut stdin,
            &mut reader,
            "n1",
            "announcements.create",
            json!({ "record": { "title": "No timestamp" } }),
        );
        let got = request_ok(
            &mut stdin,
            &mut reader,
            "n2",
            "announcements.get",
            json!({ "id": 2 }),
        );
        assert_eq!(got["announcement"], made["announcement"], "{backend}");
    }
}

#[test]
fn ids_continue_from_the_highest_existing_id() {
    for backend in ["memory", "sqlite"] {
        let (_child, mut stdin, mut reader) = open(backend);
        for i in 1..=3 {
            let res = request_ok(
                &mut stdin,
                &mut reader,
                &format!("c{i}"),
                "classes.create",
                json!({ "record": { "name": format!("Section {i}"), "studentIds": [1, 2, i] } }),
            );
            assert_eq!(res["class"]["Id"], json!(i));
        }
        request_ok(&mut stdin, &mut reader, "d", "classes.delete", json!({ "id": 2 }));
        let next = request_ok(
            &mut stdin,
            &mut reader,
            "n",
            "classes.create",
            json!({ "record": { "name": "Section 4" } }),
        );
        assert_eq!(next["class"]["Id"], json!(4), "{backend}");

        let list = request_ok(&mut stdin, &mut reader, "l", "classes.list", json!({}));
        let ids: Vec<i64> = list["classes"]
            .as_array()
            .expect("rows")
            .iter()
            .filter_map(|c| c["Id"].as_i64())
            .collect();
        assert_eq!(ids, vec![1, 3, 4], "{backend}");
        assert_eq!(list["classes"][1]["studentIds"], json!([1, 2, 3]));
    }
}

#[test]
fn announcement_defaults_are_filled_on_create() {
    for backend in ["memory", "sqlite"] {
        let (_child, mut stdin, mut reader) = open(backend);
        let res = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "announcements.create",
            json!({ "record": { "title": "Fire drill", "content": "Friday 10:00" } }),
        );
        let a = &res["announcement"];
        assert_eq!(a["name"], json!("Fire drill"), "{backend}");
        assert_eq!(a["targetAudience"], json!("all"));
        assert_eq!(a["priority"], json!("medium"));
        assert_eq!(a["isActive"], json!(true));

        // freshly created, so it counts as recent
        let recent = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "announcements.recent",
            json!({}),
        );
        assert_eq!(recent["announcements"].as_array().map(|a| a.len()), Some(1));
    }
}

#[test]
fn malformed_crud_params_are_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar(false);

    let no_id = request(&mut stdin, &mut reader, "1", "students.get", json!({}));
    assert_eq!(error_code(&no_id), Some("bad_params"));

    let zero_id = request(&mut stdin, &mut reader, "2", "grades.delete", json!({ "id": 0 }));
    assert_eq!(error_code(&zero_id), Some("bad_params"));

    let unknown_field = request(
        &mut stdin,
        &mut reader,
        "3",
        "students.update",
        json!({ "id": 1, "patch": { "nickname": "Mo" } }),
    );
    assert_eq!(error_code(&unknown_field), Some("bad_params"));

    let bad_status = request(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.create",
        json!({ "record": { "studentId": 1, "date": "2024-01-15", "status": "asleep" } }),
    );
    assert_eq!(error_code(&bad_status), Some("bad_params"));

    let no_record = request(&mut stdin, &mut reader, "5", "schedule.create", json!({}));
    assert_eq!(error_code(&no_record), Some("bad_params"));
}
