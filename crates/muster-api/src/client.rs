// Controller API HTTP client
//
// Wraps `reqwest::Client` with controller-specific URL construction and
// error mapping. The `ClusterClient` / `ClusterConnect` traits are the
// capability surface `muster-core` consumes -- the orchestrator and the
// collector never see HTTP.

use std::collections::BTreeMap;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::endpoint::ControllerEndpoint;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{CloudDetail, CloudsResponse, LoginResponse, ModelDetail, ModelUuidsResponse};

// ── Capability traits ───────────────────────────────────────────────

/// A connected controller session.
///
/// Enumeration results use `BTreeMap` so iteration order is deterministic
/// across runs — model processing order is observable in logs and staging.
pub trait ClusterClient {
    /// The controller's self-reported name.
    fn controller_name(&self) -> &str;

    /// The controller's self-reported UUID.
    fn controller_uuid(&self) -> &str;

    /// Clouds known to the controller, keyed by cloud tag (`cloud-{name}`).
    fn clouds(&self) -> impl Future<Output = Result<BTreeMap<String, CloudDetail>, Error>>;

    /// UUIDs of every model on the controller, across all access tiers,
    /// keyed by qualified model name.
    fn model_uuids(&self) -> impl Future<Output = Result<BTreeMap<String, String>, Error>>;

    /// Full detail for one model.
    fn get_model(&self, uuid: &str) -> impl Future<Output = Result<ModelDetail, Error>>;

    /// Tear down the session.
    fn disconnect(&self) -> impl Future<Output = Result<(), Error>>;
}

/// Something that can open a [`ClusterClient`] session for an endpoint.
pub trait ClusterConnect {
    type Handle: ClusterClient;

    fn connect(
        &self,
        endpoint: &ControllerEndpoint,
    ) -> impl Future<Output = Result<Self::Handle, Error>>;
}

// ── HTTP implementation ─────────────────────────────────────────────

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// HTTP client for a controller's management API.
///
/// Obtained through [`HttpConnector::connect`], which performs the login
/// handshake and captures the controller identity from its response.
#[derive(Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
    controller_name: String,
    controller_uuid: String,
}

impl HttpClient {
    /// Log in and build a client from an already-constructed `reqwest::Client`.
    ///
    /// Exposed for tests; production code goes through [`HttpConnector`].
    pub async fn login(
        http: reqwest::Client,
        base_url: Url,
        username: &str,
        password: &secrecy::SecretString,
    ) -> Result<Self, Error> {
        let url = join_api(&base_url, "login")?;
        debug!("POST {url}");

        let resp = http
            .post(url)
            .json(&LoginRequest {
                username,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("login rejected (HTTP {status})"),
            });
        }
        let login: LoginResponse = parse_json(resp).await?;

        info!(
            controller = %login.controller_name,
            uuid = %login.controller_uuid,
            "logged in"
        );
        Ok(Self {
            http,
            base_url,
            controller_name: login.controller_name,
            controller_uuid: login.controller_uuid,
        })
    }

    /// Send a GET request and decode the JSON response body.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = join_api(&self.base_url, path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        parse_json(resp).await
    }
}

impl ClusterClient for HttpClient {
    fn controller_name(&self) -> &str {
        &self.controller_name
    }

    fn controller_uuid(&self) -> &str {
        &self.controller_uuid
    }

    async fn clouds(&self) -> Result<BTreeMap<String, CloudDetail>, Error> {
        let resp: CloudsResponse = self.get("clouds").await?;
        Ok(resp.clouds)
    }

    async fn model_uuids(&self) -> Result<BTreeMap<String, String>, Error> {
        let resp: ModelUuidsResponse = self.get("models").await?;
        Ok(resp.models)
    }

    async fn get_model(&self, uuid: &str) -> Result<ModelDetail, Error> {
        self.get(&format!("models/{uuid}")).await
    }

    async fn disconnect(&self) -> Result<(), Error> {
        // The session cookie is dropped with the client; the controller
        // expires it server-side. Nothing to send.
        debug!(controller = %self.controller_name, "disconnected");
        Ok(())
    }
}

/// Opens [`HttpClient`] sessions from endpoint descriptors.
#[derive(Debug, Default)]
pub struct HttpConnector {
    /// Transport settings applied to every connection; per-endpoint CA
    /// certificates override `cacert`.
    pub transport: TransportConfig,
}

impl ClusterConnect for HttpConnector {
    type Handle = HttpClient;

    async fn connect(&self, endpoint: &ControllerEndpoint) -> Result<HttpClient, Error> {
        let transport = TransportConfig {
            cacert: endpoint.cacert.clone().or_else(|| self.transport.cacert.clone()),
            ..self.transport.clone()
        };
        let http = transport.build_client()?;
        let client = HttpClient::login(
            http,
            endpoint.endpoint.clone(),
            &endpoint.username,
            &endpoint.password,
        )
        .await?;

        // Stale configuration is worth flagging but not refusing: the
        // login-reported identity is authoritative.
        if !endpoint.uuid.is_empty() && endpoint.uuid != client.controller_uuid() {
            warn!(
                controller = %endpoint.name,
                configured = %endpoint.uuid,
                reported = %client.controller_uuid(),
                "controller uuid differs from configuration"
            );
        }
        Ok(client)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Build `{base}/api/{path}` without disturbing the base URL's own path.
fn join_api(base: &Url, path: &str) -> Result<Url, Error> {
    let base_str = base.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base_str}/api/{path}"))?)
}

/// Decode a JSON response, mapping HTTP-level failures to [`Error`].
async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "session expired or invalid credentials".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            message: preview(&body),
            status: status.as_u16(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

/// First 200 characters of a response body, for error context.
fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
