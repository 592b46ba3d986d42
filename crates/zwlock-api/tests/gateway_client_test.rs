#![allow(clippy::unwrap_used)]
// Integration tests for `GatewayClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zwlock_api::{Credentials, Error, GatewayClient, Invocation, TokenStore, command_class};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GatewayClient, TempDir) {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let client = GatewayClient::with_client(
        reqwest::Client::new(),
        base_url,
        Credentials::new("admin", SecretString::from("hunter2".to_owned())),
        TokenStore::in_dir(dir.path()),
    );
    (server, client, dir)
}

fn login_ok(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", format!("ZWAYSession={token}; Path=/; HttpOnly"))
        .set_body_json(json!({ "data": { "id": 1, "login": "admin" }, "code": 200 }))
}

fn snapshot_body() -> serde_json::Value {
    json!({
        "controller": { "data": { "vendor": { "value": "RaZberry" } } },
        "updateTime": 1_700_000_000,
        "devices": {
            "1": { "data": { "givenName": { "value": "" } }, "instances": {} }
        }
    })
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_persists_token_and_extends_expiry() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .and(body_json(json!({ "login": "admin", "password": "hunter2" })))
        .respond_with(login_ok("abc123def456"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/ZAutomation/api/v1/profiles/1/token/abc123..."))
        .and(header("ZWAYSession", "abc123def456"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .and(header("ZWAYSession", "abc123def456"))
        .and(header("cookie", "ZWAYSession=abc123def456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_body()))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client.snapshot().await.unwrap();
    assert_eq!(snapshot.update_time, 1_700_000_000);
    assert_eq!(snapshot.controller_vendor(), "RaZberry");

    let stored = client.session().store().load().await.unwrap().unwrap();
    assert_eq!(stored.expose_secret(), "abc123def456");
}

#[tokio::test]
async fn test_login_failure_leaves_no_session_and_retries_next_request() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_body()))
        .expect(0)
        .mount(&server)
        .await;

    let first = client.snapshot().await;
    assert!(
        matches!(first, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {first:?}"
    );
    assert!(!client.session().is_authenticated().await);

    let second = client.snapshot().await;
    assert!(matches!(second, Err(Error::Authentication { .. })));
    assert!(client.session().store().load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_without_cookie_is_an_authentication_error() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 1 } })))
        .mount(&server)
        .await;

    let result = client.session().session().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_extension_failure_does_not_invalidate_session() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(login_ok("tok999888"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let token = client.session().session().await.unwrap();
    assert_eq!(token.expose_secret(), "tok999888");
    assert!(client.session().is_authenticated().await);
}

// ── Persisted sessions ──────────────────────────────────────────────

#[tokio::test]
async fn test_persisted_token_is_validated_once_and_reused() {
    let (server, client, _dir) = setup().await;
    client
        .session()
        .store()
        .save(&SecretString::from("persisted01".to_owned()))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/ZAutomation/api/v1/status"))
        .and(header("ZWAYSession", "persisted01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "OK" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(login_ok("unused"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .and(header("ZWAYSession", "persisted01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot_body()))
        .expect(2)
        .mount(&server)
        .await;

    client.snapshot().await.unwrap();
    client.snapshot().await.unwrap();
}

#[tokio::test]
async fn test_rejected_persisted_token_falls_back_to_login() {
    let (server, client, _dir) = setup().await;
    client
        .session()
        .store()
        .save(&SecretString::from("stale0000".to_owned()))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/ZAutomation/api/v1/status"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(login_ok("fresh11111"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let token = client.session().session().await.unwrap();
    assert_eq!(token.expose_secret(), "fresh11111");

    let stored = client.session().store().load().await.unwrap().unwrap();
    assert_eq!(stored.expose_secret(), "fresh11111");
}

// ── Data and command endpoints ──────────────────────────────────────

#[tokio::test]
async fn test_invoke_posts_structured_invocation_path() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(login_ok("cmdtoken"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(
            "/ZWave.zway/Run/devices[5].instances[0].commandClasses[98].Set(255)",
        ))
        .and(header("ZWAYSession", "cmdtoken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;

    let inv = Invocation::set(5, 0, command_class::DOOR_LOCK, [255]);
    client.invoke(&inv).await.unwrap();
}

#[tokio::test]
async fn test_server_error_propagates_without_retry() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(login_ok("tok5000"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.snapshot().await;
    match result {
        Err(Error::Gateway { status, ref message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("boom"), "unexpected message: {message}");
        }
        other => panic!("expected Gateway error, got: {other:?}"),
    }
    // The session itself is still held.
    assert!(client.session().is_authenticated().await);
}

#[tokio::test]
async fn test_unauthorized_data_response_drops_session() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(login_ok("expiring1"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // The persisted token from the first login is probed and rejected.
    Mock::given(method("GET"))
        .and(path("/ZAutomation/api/v1/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let first = client.snapshot().await;
    assert!(matches!(first, Err(Error::Gateway { status: 401, .. })));
    assert!(!client.session().is_authenticated().await);

    let second = client.snapshot().await;
    assert!(second.unwrap_err().is_auth_expired());
}

#[tokio::test]
async fn test_malformed_snapshot_is_a_deserialization_error() {
    let (server, client, _dir) = setup().await;

    Mock::given(method("POST"))
        .and(path("/ZAutomation/api/v1/login"))
        .respond_with(login_ok("tokjson"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ZWaveAPI/Data/0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"devices\": 12"))
        .mount(&server)
        .await;

    let result = client.snapshot().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}
