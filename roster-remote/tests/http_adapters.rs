//! Adapters against a local mock HTTP server.
//!
//! The clients are blocking, so every call runs under `spawn_blocking`.

use std::time::Duration;

use roster_core::{HostingSettings, LoginId, ResourceName, SheetSettings, Status, TeamName};
use roster_remote::{GitlabClient, SheetsClient};
use roster_sync::{HostingError, HostingGateway, SheetGateway};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sheets(server: &MockServer) -> SheetsClient {
    let mut settings = SheetSettings::new("sheet-1");
    settings.sheet_name = "Roster".into();
    settings.api_base = format!("{}/v4", server.uri());
    SheetsClient::new(&settings, "sheets-token", Duration::from_secs(5))
}

fn gitlab(server: &MockServer) -> GitlabClient {
    let settings = HostingSettings {
        api_base: format!("{}/api/v4", server.uri()),
        timeout_secs: 5,
        ..HostingSettings::default()
    };
    GitlabClient::new(&settings, "gl-token")
}

async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.expect("blocking task")
}

// ---------------------------------------------------------------------------
// 1. Sheets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sheets_read_returns_every_row_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.*Roster.*A.*E$"))
        .and(header("Authorization", "Bearer sheets-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Roster!A1:E3",
            "majorDimension": "ROWS",
            "values": [
                ["when", "team", "login", "name", "status"],
                ["t", "team1", "alice", "Ada Lovelace"],
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = sheets(&server);
    let rows = blocking(move || client.read_all_rows()).await.expect("read");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["t", "team1", "alice", "Ada Lovelace"]);
}

#[tokio::test]
async fn sheets_read_of_empty_range_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Roster!A1:E1000",
            "majorDimension": "ROWS",
        })))
        .mount(&server)
        .await;

    let mut client = sheets(&server);
    let rows = blocking(move || client.read_all_rows()).await.expect("read");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn sheets_read_failure_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let mut client = sheets(&server);
    let err = blocking(move || client.read_all_rows()).await.unwrap_err();
    assert!(err.message.contains("403"), "{err}");
    assert!(err.message.contains("PERMISSION_DENIED"), "{err}");
}

#[tokio::test]
async fn sheets_write_targets_status_cell_of_data_row() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-1/values/.*Roster.*E3$"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .and(body_json(json!({
            "range": "'Roster'!E3",
            "majorDimension": "ROWS",
            "values": [["PROCESSING"]],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCells": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = sheets(&server);
    blocking(move || client.write_status(1, Status::Processing))
        .await
        .expect("write");
}

#[tokio::test]
async fn sheets_write_failure_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(429).set_body_string("RATE_LIMIT_EXCEEDED"))
        .mount(&server)
        .await;

    let mut client = sheets(&server);
    let err = blocking(move || client.write_status(0, Status::Ok))
        .await
        .unwrap_err();
    assert!(err.message.contains("429"), "{err}");
}

// ---------------------------------------------------------------------------
// 2. GitLab
// ---------------------------------------------------------------------------

async fn mount_user(server: &MockServer, login: &str, found: bool) {
    let body = if found {
        json!([{"id": 42, "username": login}])
    } else {
        json!([])
    };
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", login))
        .and(header("PRIVATE-TOKEN", "gl-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn verify_accepts_existing_login() {
    let server = MockServer::start().await;
    mount_user(&server, "alice", true).await;

    let mut client = gitlab(&server);
    blocking(move || client.verify_login(&LoginId::from("alice")))
        .await
        .expect("verify");
}

#[tokio::test]
async fn verify_rejects_unknown_login() {
    let server = MockServer::start().await;
    mount_user(&server, "ghost", false).await;

    let mut client = gitlab(&server);
    let err = blocking(move || client.verify_login(&LoginId::from("ghost")))
        .await
        .unwrap_err();
    assert_eq!(err, HostingError::UnknownLogin("ghost".into()));
}

#[tokio::test]
async fn create_makes_project_in_team_group_and_adds_member() {
    let server = MockServer::start().await;
    mount_user(&server, "alice", true).await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/team1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "path": "team1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects"))
        .and(body_json(json!({
            "name": "ada-lovelace",
            "path": "ada-lovelace",
            "namespace_id": 7,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1001})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/1001/members"))
        .and(body_json(json!({"user_id": 42, "access_level": 30})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = gitlab(&server);
    blocking(move || {
        client.create_resource(
            &LoginId::from("alice"),
            &ResourceName::from_display_name("Ada Lovelace"),
            &TeamName::from("team1"),
        )
    })
    .await
    .expect("create");
}

#[tokio::test]
async fn create_in_missing_group_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "404 Group Not Found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = gitlab(&server);
    let err = blocking(move || {
        client.create_resource(
            &LoginId::from("alice"),
            &ResourceName::from_display_name("Ada"),
            &TeamName::from("nope"),
        )
    })
    .await
    .unwrap_err();
    assert!(matches!(err, HostingError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn delete_addresses_project_by_encoded_full_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api/v4/projects/team1(%2F|/)ada-lovelace$"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"message": "202 Accepted"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = gitlab(&server);
    blocking(move || {
        client.delete_resource(
            &ResourceName::from_display_name("Ada Lovelace"),
            &TeamName::from("team1"),
        )
    })
    .await
    .expect("delete");
}

#[tokio::test]
async fn deferred_delete_leaves_the_path_taken_for_the_next_create() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"message": "202 Accepted"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/team1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 42}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": {"path": ["has already been taken"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = gitlab(&server);
    let err = blocking(move || {
        let name = ResourceName::from_display_name("Ada");
        let team = TeamName::from("team1");
        client.delete_resource(&name, &team)?;
        client.create_resource(&LoginId::from("alice"), &name, &team)
    })
    .await
    .unwrap_err();
    match err {
        HostingError::Rejected(message) => assert!(message.contains("already been taken"), "{message}"),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_of_missing_project_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "404 Project Not Found"})))
        .mount(&server)
        .await;

    let mut client = gitlab(&server);
    let err = blocking(move || {
        client.delete_resource(
            &ResourceName::from_display_name("Ada"),
            &TeamName::from("team1"),
        )
    })
    .await
    .unwrap_err();
    assert_eq!(err, HostingError::NotFound("team1/ada".into()));
}
