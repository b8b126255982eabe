//! Full `roster` runs against mock Sheets and GitLab servers.

use std::path::Path;

use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(home: &Path, sheets: &MockServer, gitlab: &MockServer) {
    write_config_with_columns(home, sheets, gitlab, "A", "E");
}

fn write_config_with_columns(
    home: &Path,
    sheets: &MockServer,
    gitlab: &MockServer,
    first_column: &str,
    status_column: &str,
) {
    let dir = home.join(".roster");
    std::fs::create_dir_all(&dir).unwrap();
    let yaml = format!(
        "sheet:\n  spreadsheet_id: sheet-1\n  sheet_name: Roster\n  api_base: {}/v4\n\
         \x20 first_column: {first_column}\n  status_column: {status_column}\n\
         hosting:\n  api_base: {}/api/v4\n  timeout_secs: 5\n\
         retry:\n  base_wait_ms: 1\n  max_wait_ms: 5\n",
        sheets.uri(),
        gitlab.uri()
    );
    std::fs::write(dir.join("config.yaml"), yaml).unwrap();
}

/// Run the binary off the async runtime and return (success, stdout).
async fn roster(home: &Path, args: &'static [&'static str]) -> (bool, String) {
    let home = home.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let output = Command::cargo_bin("roster")
            .unwrap()
            .env("HOME", &home)
            .env("USERPROFILE", &home)
            .env("ROSTER_SHEETS_TOKEN", "sheets-token")
            .env("ROSTER_GITLAB_TOKEN", "gl-token")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .unwrap();
        (
            output.status.success(),
            String::from_utf8(output.stdout).unwrap(),
        )
    })
    .await
    .unwrap()
}

async fn mount_rows(sheets: &MockServer, rows: Value) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": rows })))
        .expect(1)
        .mount(sheets)
        .await;
}

#[tokio::test]
async fn dry_run_reports_actions_and_touches_nothing() {
    let sheets = MockServer::start().await;
    let gitlab = MockServer::start().await;
    mount_rows(
        &sheets,
        json!([
            ["when", "team", "login", "name", "status"],
            ["t", "team1", "alice", "Ada Lovelace"],
            ["t", "team1", "bob", "Bob", "PROCESSING"],
            ["t", "team2", "carol", "Carol", "OK"],
            ["t", "team2"],
        ]),
    )
    .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sheets)
        .await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&gitlab)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &sheets, &gitlab);

    let (ok, stdout) = roster(home.path(), &["provision", "--dry-run", "--json"]).await;
    assert!(ok, "stdout: {stdout}");
    let plan: Value = serde_json::from_str(&stdout).expect("json plan");
    let actions: Vec<&str> = plan["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["create", "delete_and_recreate", "skip", "invalid"]);
    assert_eq!(plan["rows"][0]["resource"], "ada-lovelace");
}

#[tokio::test]
async fn verify_marks_every_valid_row_ok() {
    let sheets = MockServer::start().await;
    let gitlab = MockServer::start().await;
    mount_rows(
        &sheets,
        json!([
            ["when", "team", "login", "name"],
            ["t", "team1", "alice", "Ada Lovelace"],
            ["t", "team1", "ghost", "Casper"],
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", "alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&gitlab)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", "ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&gitlab)
        .await;
    for cell in ["E2", "E3"] {
        Mock::given(method("PUT"))
            .and(path_regex(format!(r"^/v4/spreadsheets/sheet-1/values/.*{cell}$")))
            .and(body_json(json!({
                "range": format!("'Roster'!{cell}"),
                "majorDimension": "ROWS",
                "values": [["OK"]],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&sheets)
            .await;
    }

    let home = TempDir::new().unwrap();
    write_config(home.path(), &sheets, &gitlab);

    let (ok, stdout) = roster(home.path(), &["verify", "--json"]).await;
    assert!(ok, "stdout: {stdout}");
    let report: Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["mode"], "verify");
    assert_eq!(report["summary"]["verified"], 1);
    assert_eq!(report["summary"]["failed"], 1);
    assert_eq!(report["rows"][1]["result"]["kind"], "verify_failed");
}

#[tokio::test]
async fn provision_retries_status_write_until_it_lands() {
    let sheets = MockServer::start().await;
    let gitlab = MockServer::start().await;
    mount_rows(
        &sheets,
        json!([
            ["when", "team", "login", "name"],
            ["t", "team1", "alice", "Ada Lovelace"],
        ]),
    )
    .await;
    // Two throttled writes, then success. Mounted first so it wins while it has budget.
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&sheets)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(json!({
            "range": "'Roster'!E2",
            "majorDimension": "ROWS",
            "values": [["OK"]],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&sheets)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/team1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&gitlab)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 42}])))
        .mount(&gitlab)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1001})))
        .expect(1)
        .mount(&gitlab)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/1001/members"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&gitlab)
        .await;

    let home = TempDir::new().unwrap();
    write_config(home.path(), &sheets, &gitlab);

    let (ok, stdout) = roster(home.path(), &["provision", "--json"]).await;
    assert!(ok, "stdout: {stdout}");
    let report: Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["rows"][0]["result"]["kind"], "created");
    assert_eq!(report["rows"][0]["write_attempts"], 3);
    assert_eq!(report["rows"][0]["status_written"], "ok");
}

#[tokio::test]
async fn shifted_columns_read_and_write_the_same_status_cell() {
    let sheets = MockServer::start().await;
    let gitlab = MockServer::start().await;
    // Read window B:F, so the status flag sits in the fifth returned cell.
    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.*B.*F$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                ["when", "team", "login", "name", "status"],
                ["t", "team1", "alice", "Ada Lovelace", "OK"],
                ["t", "team1", "bob", "Bob"],
            ]
        })))
        .expect(1)
        .mount(&sheets)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.*F3$"))
        .and(body_json(json!({
            "range": "'Roster'!F3",
            "majorDimension": "ROWS",
            "values": [["OK"]],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&sheets)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v4/groups/team1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&gitlab)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", "bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 43}])))
        .mount(&gitlab)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects"))
        .and(body_json(json!({"name": "bob", "path": "bob", "namespace_id": 7})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2002})))
        .expect(1)
        .mount(&gitlab)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/2002/members"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 43})))
        .expect(1)
        .mount(&gitlab)
        .await;

    let home = TempDir::new().unwrap();
    write_config_with_columns(home.path(), &sheets, &gitlab, "B", "F");

    let (ok, stdout) = roster(home.path(), &["provision", "--json"]).await;
    assert!(ok, "stdout: {stdout}");
    let report: Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["rows"][0]["action"], "skip");
    assert_eq!(report["rows"][0]["result"]["kind"], "converged");
    assert_eq!(report["rows"][1]["result"]["kind"], "created");
    assert_eq!(report["summary"]["converged"], 1);
    assert_eq!(report["summary"]["created"], 1);
}
