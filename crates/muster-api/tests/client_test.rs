#![allow(clippy::unwrap_used)]
// Integration tests for `HttpClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use muster_api::{ClusterClient, ClusterConnect, ControllerEndpoint, Error, HttpClient, HttpConnector};

// ── Helpers ─────────────────────────────────────────────────────────

fn secret(s: &str) -> secrecy::SecretString {
    s.to_string().into()
}

async fn server_with_login() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "controller_name": "prod-ctl",
            "controller_uuid": "c0ffee00-aaaa-bbbb-cccc-000000000001"
        })))
        .mount(&server)
        .await;
    server
}

async fn connect(server: &MockServer) -> HttpClient {
    let base_url = Url::parse(&server.uri()).unwrap();
    HttpClient::login(reqwest::Client::new(), base_url, "admin", &secret("pw"))
        .await
        .unwrap()
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn login_captures_controller_identity() {
    let server = server_with_login().await;
    let client = connect(&server).await;

    assert_eq!(client.controller_name(), "prod-ctl");
    assert_eq!(
        client.controller_uuid(),
        "c0ffee00-aaaa-bbbb-cccc-000000000001"
    );

    // Sessions render in debug output (error context, log fields).
    let rendered = format!("{client:?}");
    assert!(rendered.contains("prod-ctl"), "got: {rendered}");
}

#[tokio::test]
async fn connector_tolerates_stale_configured_uuid() {
    let server = server_with_login().await;
    let endpoint = ControllerEndpoint {
        name: "prod".into(),
        endpoint: Url::parse(&server.uri()).unwrap(),
        username: "admin".into(),
        password: secret("pw"),
        cacert: None,
        uuid: "out-of-date-uuid".into(),
    };

    // A mismatch is flagged in logs, never refused; the login-reported
    // identity wins.
    let client = HttpConnector::default().connect(&endpoint).await.unwrap();
    assert_eq!(
        client.controller_uuid(),
        "c0ffee00-aaaa-bbbb-cccc-000000000001"
    );
}

#[tokio::test]
async fn login_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "admin", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "controller_name": "prod-ctl",
            "controller_uuid": "u-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    connect(&server).await;
}

#[tokio::test]
async fn login_rejection_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let base_url = Url::parse(&server.uri()).unwrap();
    let result = HttpClient::login(reqwest::Client::new(), base_url, "admin", &secret("no")).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Enumeration ─────────────────────────────────────────────────────

#[tokio::test]
async fn clouds_returns_tagged_map() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/api/clouds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clouds": {
                "cloud-localhost": { "type": "lxd" },
                "cloud-bare-metal": { "type": "manual" }
            }
        })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let clouds = client.clouds().await.unwrap();

    assert_eq!(clouds.len(), 2);
    assert!(clouds.contains_key("cloud-localhost"));
    assert_eq!(
        clouds["cloud-bare-metal"].kind.as_deref(),
        Some("manual")
    );
}

#[tokio::test]
async fn model_uuids_lists_every_model() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": {
                "admin/core": "m-0001",
                "ops/monitoring": "m-0002"
            }
        })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let models = client.model_uuids().await.unwrap();

    assert_eq!(models.get("admin/core").map(String::as_str), Some("m-0001"));
    assert_eq!(
        models.get("ops/monitoring").map(String::as_str),
        Some("m-0002")
    );
}

// ── Model detail ────────────────────────────────────────────────────

#[tokio::test]
async fn get_model_decodes_full_detail() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/api/models/m-0001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": {
                "name": "core",
                "owner_tag": "user-admin",
                "cloud_tag": "cloud-localhost",
                "provider_type": "lxd"
            },
            "applications": {
                "postgresql": {
                    "charm_name": "postgresql",
                    "subordinate": false,
                    "units": [{
                        "name": "postgresql/0",
                        "public_address": "10.0.0.7",
                        "machine": {
                            "id": "0",
                            "instance_id": "i-abc",
                            "addresses": [
                                { "scope": "local-cloud", "type": "ipv4", "value": "192.168.1.9" }
                            ]
                        }
                    }]
                }
            }
        })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let model = client.get_model("m-0001").await.unwrap();

    assert_eq!(model.info.provider_type, "lxd");
    let app = &model.applications["postgresql"];
    assert_eq!(app.units.len(), 1);
    let unit = &app.units[0];
    assert_eq!(unit.machine.instance_id, "i-abc");
    let addresses = unit.machine.addresses.as_ref().unwrap();
    assert_eq!(addresses[0].kind, "ipv4");
    assert_eq!(addresses[0].value, "192.168.1.9");
}

#[tokio::test]
async fn get_model_maps_server_error() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/api/models/m-gone"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model agent lost"))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let result = client.get_model("m-gone").await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("model agent lost"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_deserialization_error() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/api/models/m-0001"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let result = client.get_model("m-0001").await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
