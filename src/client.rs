//! Authenticated client for the Intune device configuration endpoints of
//! Microsoft Graph.
//!
//! `IntuneClient` holds a base endpoint, a shared [`TokenCredential`] and a
//! `reqwest::Client` connection pool. Every operation:
//!
//! 1. asks the credential for a fresh token (no caching in the client),
//! 2. builds the `Authorization` and `Content-Type` headers,
//! 3. sends exactly one request and reads the whole response.
//!
//! Non-success statuses become [`IntuneError::RequestFailed`] with the raw
//! response body. Nothing is retried.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Map, Value};

use crate::auth::TokenCredential;
use crate::error::{IntuneError, Result};

/// Default Microsoft Graph root. Device configuration endpoints live under
/// the beta API.
pub const DEFAULT_ENDPOINT: &str = "https://graph.microsoft.com/beta";

/// Scope requested from the credential for every call.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Collection path for device configuration profiles, relative to the endpoint.
const DEVICE_CONFIGURATIONS: &str = "deviceManagement/deviceConfigurations";

/// Opaque JSON object used for profile and assignment payloads and for
/// parsed responses. Key order is preserved.
pub type JsonObject = Map<String, Value>;

/// Client for creating, updating, deleting and assigning Intune device
/// configuration profiles.
///
/// Cheap to share: wrap it in an `Arc` or clone it. Concurrent calls are
/// independent; each fetches its own token.
#[derive(Clone)]
pub struct IntuneClient {
    client: Client,
    endpoint: String,
    credential: Arc<dyn TokenCredential>,
}

impl IntuneClient {
    /// Client against [`DEFAULT_ENDPOINT`].
    pub fn new(credential: Arc<dyn TokenCredential>) -> Self {
        Self::with_endpoint(credential, DEFAULT_ENDPOINT)
    }

    /// Client against a custom Graph root (national clouds, `v1.0`, or a
    /// mock server in tests). Trailing slashes are stripped.
    pub fn with_endpoint(credential: Arc<dyn TokenCredential>, endpoint: &str) -> Self {
        IntuneClient {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// The base URL every request is built from.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches a token for [`GRAPH_SCOPE`]. Credential failures are returned
    /// unchanged inside [`IntuneError::Credential`].
    async fn access_token(&self) -> Result<String> {
        let token = self
            .credential
            .get_token(&[GRAPH_SCOPE])
            .await
            .map_err(IntuneError::Credential)?;
        Ok(token.token)
    }

    /// Builds the request headers: `Authorization: Bearer <token>` and
    /// `Content-Type: application/json`.
    ///
    /// Each call asks the credential for a token.
    pub async fn headers(&self) -> Result<HeaderMap> {
        let token = self.access_token().await?;
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(IntuneError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn profile_url(&self, profile_id: &str) -> String {
        format!("{}/{DEVICE_CONFIGURATIONS}/{profile_id}", self.endpoint)
    }

    /// Sends one authenticated request and returns the successful response
    /// with its body still unread.
    ///
    /// On any non-2xx status the body is read as text and returned in
    /// [`IntuneError::RequestFailed`], chained to reqwest's status error for
    /// 4xx/5xx. A failure while reading that body is an
    /// [`IntuneError::Network`].
    async fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<&JsonObject>,
    ) -> Result<reqwest::Response> {
        let mut req = self
            .client
            .request(method.clone(), url)
            .headers(self.headers().await?);
        if let Some(payload) = payload {
            req = req.json(payload);
        }

        tracing::debug!(%method, %url, "sending Graph request");
        let resp = req.send().await?;
        let status = resp.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "Graph responded");

        // Any non-2xx counts, including 1xx and the 3xx codes reqwest does
        // not follow (300, 304, a redirect without Location).
        if !status.is_success() {
            let source = resp.error_for_status_ref().err();
            let body = resp.text().await?;
            return Err(IntuneError::RequestFailed {
                status,
                body,
                source,
            });
        }
        Ok(resp)
    }

    /// Like [`execute`](Self::execute) but parses the body as a JSON object.
    /// An empty body yields an empty object.
    async fn send_json(
        &self,
        method: Method,
        url: &str,
        payload: Option<&JsonObject>,
    ) -> Result<JsonObject> {
        let bytes = self.execute(method, url, payload).await?.bytes().await?;
        if bytes.is_empty() {
            return Ok(JsonObject::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Creates a device configuration profile.
    ///
    /// `POST {endpoint}/deviceManagement/deviceConfigurations`. The payload
    /// is sent as-is; Graph expects at least an `@odata.type` and a
    /// `displayName`. Returns the created resource.
    ///
    /// # Errors
    ///
    /// - `IntuneError::RequestFailed` — Graph returned a non-2xx status.
    /// - `IntuneError::Credential` — the credential could not supply a token.
    /// - `IntuneError::Network` — transport-level failure.
    pub async fn create_profile(&self, profile: &JsonObject) -> Result<JsonObject> {
        let url = format!("{}/{DEVICE_CONFIGURATIONS}", self.endpoint);
        self.send_json(Method::POST, &url, Some(profile)).await
    }

    /// Updates an existing profile.
    ///
    /// `PATCH {endpoint}/deviceManagement/deviceConfigurations/{id}`. Graph
    /// usually answers `204 No Content`, in which case the returned object
    /// is empty.
    pub async fn update_profile(
        &self,
        profile_id: &str,
        profile: &JsonObject,
    ) -> Result<JsonObject> {
        let url = self.profile_url(profile_id);
        self.send_json(Method::PATCH, &url, Some(profile)).await
    }

    /// Deletes a profile.
    ///
    /// `DELETE {endpoint}/deviceManagement/deviceConfigurations/{id}` with no
    /// body. Whatever the server sends back on success is discarded unread.
    pub async fn delete_profile(&self, profile_id: &str) -> Result<()> {
        let url = self.profile_url(profile_id);
        self.execute(Method::DELETE, &url, None).await?;
        Ok(())
    }

    /// Replaces the assignments of a profile.
    ///
    /// `POST {endpoint}/deviceManagement/deviceConfigurations/{id}/assign`.
    /// `assignments` is typically `{"assignments": [...]}` with one
    /// `deviceConfigurationAssignment` per target group.
    pub async fn modify_assignments(
        &self,
        profile_id: &str,
        assignments: &JsonObject,
    ) -> Result<JsonObject> {
        let url = format!("{}/assign", self.profile_url(profile_id));
        self.send_json(Method::POST, &url, Some(assignments)).await
    }
}
