//! BitLaunch REST API client.
//!
//! API Documentation: <https://developers.bitlaunch.io/reference>
//!
//! Only the calls the provider needs are implemented: servers, SSH keys and
//! the per-host create options used by the data sources.

mod models;

pub use models::*;

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Base URL for the BitLaunch API.
pub const DEFAULT_BASE_URL: &str = "https://app.bitlaunch.io/api";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors returned by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the body.
        message: String,
    },

    /// The API answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body did not match the expected model.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL is not usable.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Authenticated BitLaunch API client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client against the public API.
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Servers
    // =========================================================================

    /// List all servers on the account.
    pub async fn list_servers(&self) -> Result<Vec<Server>, ApiError> {
        self.get("/servers").await
    }

    /// Show a single server.
    pub async fn get_server(&self, id: &str) -> Result<Server, ApiError> {
        self.get(&format!("/servers/{}", id)).await
    }

    /// Create a server.
    pub async fn create_server(&self, opts: &CreateServerOptions) -> Result<Server, ApiError> {
        self.post("/servers", &CreateServerRequest { server: opts })
            .await
    }

    /// Destroy a server.
    pub async fn destroy_server(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/servers/{}", id)).await
    }

    // =========================================================================
    // SSH keys
    // =========================================================================

    /// List all SSH keys on the account.
    pub async fn list_ssh_keys(&self) -> Result<Vec<SshKey>, ApiError> {
        self.get("/ssh-keys").await
    }

    /// Upload an SSH key.
    pub async fn create_ssh_key(&self, key: &CreateSshKey) -> Result<SshKey, ApiError> {
        self.post("/ssh-keys", key).await
    }

    /// Delete an SSH key.
    pub async fn delete_ssh_key(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/ssh-keys/{}", id)).await
    }

    // =========================================================================
    // Create options
    // =========================================================================

    /// Fetch images, regions and sizes offered by a host.
    pub async fn create_options(&self, host_id: i64) -> Result<CreateOptions, ApiError> {
        self.get(&format!("/hosts-create-options/{}", host_id))
            .await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "DELETE request");

        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(Self::status_error(status, &text))
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ApiError::Decode(e)
            })
        } else {
            Err(Self::status_error(status, &text))
        }
    }

    fn status_error(status: StatusCode, body: &str) -> ApiError {
        let message = error_message(body);
        if status == StatusCode::NOT_FOUND {
            ApiError::NotFound(message)
        } else {
            ApiError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// Pull a readable message out of an error body.
///
/// The API usually answers `{"error": "..."}`; anything else is returned as is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> Client {
        Client::with_base_url("test-token", &server.uri()).unwrap()
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error": "bad token"}"#), "bad token");
        assert_eq!(error_message(r#"{"message": "slow down"}"#), "slow down");
        assert_eq!(error_message("  plain text \n"), "plain text");
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            Client::with_base_url("t", "not a url"),
            Err(ApiError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            Client::with_base_url("t", "ftp://example.com"),
            Err(ApiError::InvalidEndpoint(_))
        ));

        let client = Client::with_base_url("t", "https://example.com/api/").unwrap();
        assert_eq!(client.base_url(), "https://example.com/api");
    }

    #[tokio::test]
    async fn test_list_ssh_keys_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ssh-keys"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "k1", "name": "laptop", "fingerprint": "aa:bb", "content": "ssh-ed25519 AAA"}
            ])))
            .mount(&server)
            .await;

        let keys = client_for(&server).await.list_ssh_keys().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].fingerprint, "aa:bb");
    }

    #[tokio::test]
    async fn test_create_server_wraps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/servers"))
            .and(body_json(json!({
                "server": {
                    "name": "web",
                    "hostID": 1,
                    "hostImageID": "img",
                    "sizeID": "size",
                    "regionID": "region",
                    "sshKeys": ["k1"]
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "srv-1", "status": "pending"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let opts = CreateServerOptions {
            name: "web".to_string(),
            host_id: 1,
            host_image_id: "img".to_string(),
            size_id: "size".to_string(),
            region_id: "region".to_string(),
            ssh_keys: vec!["k1".to_string()],
            ..Default::default()
        };
        let created = client_for(&server).await.create_server(&opts).await.unwrap();
        assert_eq!(created.id, "srv-1");
        assert_eq!(created.status, "pending");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/servers/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no such server"})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/ssh-keys/k1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad token"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        match client.get_server("missing").await {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "no such server"),
            other => panic!("expected NotFound, got {:?}", other),
        }

        match client.delete_ssh_key("k1").await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad token");
            },
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hosts-create-options/4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).await.create_options(4).await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
