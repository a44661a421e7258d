//! Credential contract and bundled credentials for Microsoft Graph.
//!
//! [`IntuneClient`](crate::client::IntuneClient) never acquires tokens
//! itself. It asks an injected [`TokenCredential`] for one before every
//! request. Two implementations ship with the crate:
//!
//! - [`StaticTokenCredential`] hands out a token the caller already holds
//!   (obtained from `az account get-access-token`, a managed identity, etc.).
//! - [`ClientSecretCredential`] runs the Azure AD OAuth2 client-credentials
//!   grant against `/oauth2/v2.0/token` and caches the result until shortly
//!   before it expires.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::{AuthError, CredentialError};

/// Default Azure AD authority host.
const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Token path under the authority host. `{tenant_id}` is replaced at runtime.
const TOKEN_PATH: &str = "/{tenant_id}/oauth2/v2.0/token";

/// Safety buffer subtracted from `expires_in` to trigger refresh before
/// the token actually expires.
const EXPIRY_BUFFER_SECS: u64 = 60;

/// A bearer token handed out by a [`TokenCredential`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    /// The raw access token, sent as `Authorization: Bearer <token>`.
    pub token: String,
    /// Expiry as seconds since the unix epoch, when the issuer reports one.
    pub expires_on: Option<u64>,
}

impl AccessToken {
    /// Token with no known expiry.
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken {
            token: token.into(),
            expires_on: None,
        }
    }
}

/// Anything that can produce an access token for a set of scopes.
///
/// Implementations own token acquisition, caching and refresh entirely;
/// callers only ever see the resulting [`AccessToken`] or an error.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns a token valid for all of `scopes`.
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError>;
}

/// Credential that always returns the same pre-acquired token.
#[derive(Clone, Debug)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Credential that returns `token` for every scope.
    pub fn new(token: impl Into<String>) -> Self {
        StaticTokenCredential {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        Ok(self.token.clone())
    }
}

/// Form body sent to the token endpoint.
/// Serialized as `application/x-www-form-urlencoded` by reqwest's `.form()`.
#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    scope: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

/// Subset of the Azure AD token response that we need. Extra fields such as
/// `ext_expires_in` are ignored.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// A token held in the cache along with when it was acquired.
struct CachedToken {
    access_token: String,
    expires_in: u64,
    acquired_at: Instant,
}

impl CachedToken {
    /// `true` once the token has exceeded its lifetime minus the buffer.
    fn is_expired(&self) -> bool {
        let lifetime = self.expires_in.saturating_sub(EXPIRY_BUFFER_SECS);
        self.acquired_at.elapsed().as_secs() >= lifetime
    }

    fn to_access_token(&self) -> AccessToken {
        let remaining = self
            .expires_in
            .saturating_sub(self.acquired_at.elapsed().as_secs());
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        AccessToken {
            token: self.access_token.clone(),
            expires_on: Some(now.saturating_add(remaining)),
        }
    }
}

/// OAuth2 client-credentials credential for an Azure AD app registration.
///
/// Tokens are cached per scope string. The cache lock is held across the
/// refresh so concurrent callers for the same scope share one token request.
pub struct ClientSecretCredential {
    client: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl ClientSecretCredential {
    /// Credential against the public Azure AD authority.
    pub fn new(tenant_id: &str, client_id: &str, client_secret: SecretString) -> Self {
        Self::with_authority_host(tenant_id, client_id, client_secret, AUTHORITY_HOST)
    }

    /// Constructor that accepts a custom authority host, used by tests to
    /// point at a local mock server and by sovereign clouds.
    pub fn with_authority_host(
        tenant_id: &str,
        client_id: &str,
        client_secret: SecretString,
        authority_host: &str,
    ) -> Self {
        ClientSecretCredential {
            client: reqwest::Client::new(),
            authority_host: authority_host.trim_end_matches('/').to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}{}",
            self.authority_host,
            TOKEN_PATH.replace("{tenant_id}", &self.tenant_id)
        )
    }

    /// Fetches a new token from Azure AD.
    ///
    /// The body is read as text before the status is checked so that the
    /// AADSTS error description survives into [`AuthError::Rejected`].
    async fn request_token(&self, scope: &str) -> Result<TokenResponse, AuthError> {
        let form = TokenRequest {
            client_id: &self.client_id,
            scope,
            client_secret: self.client_secret.expose_secret(),
            grant_type: "client_credentials",
        };

        let response = self.client.post(self.token_url()).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::Rejected { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, CredentialError> {
        let scope = scopes.join(" ");
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.get(&scope).filter(|c| !c.is_expired()) {
            return Ok(cached.to_access_token());
        }

        let response = self.request_token(&scope).await?;
        tracing::info!(
            tenant_id = %self.tenant_id,
            client_id = %self.client_id,
            %scope,
            expires_in = response.expires_in,
            "acquired access token"
        );

        let cached = CachedToken {
            access_token: response.access_token,
            expires_in: response.expires_in,
            acquired_at: Instant::now(),
        };
        let token = cached.to_access_token();
        cache.insert(scope, cached);
        Ok(token)
    }
}
