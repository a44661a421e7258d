//! Typed error hierarchy for the intune-profiles crate.
//!
//! Two enums, one per failure boundary:
//! - [`IntuneError`] covers everything [`IntuneClient`](crate::client::IntuneClient)
//!   can return: the injected credential failing, Graph answering with a
//!   non-success status, transport failures, and JSON (de)serialization.
//! - [`AuthError`] covers the bundled
//!   [`ClientSecretCredential`](crate::auth::ClientSecretCredential) talking
//!   to the Azure AD token endpoint. It reaches client callers boxed inside
//!   `IntuneError::Credential`, where it can be recovered with `downcast_ref`.
//!
//! Credential, network and parse failures are `#[error(transparent)]`: the
//! client does not reword errors it did not produce.

use reqwest::StatusCode;
use reqwest::header::InvalidHeaderValue;

/// Error type returned by [`TokenCredential`](crate::auth::TokenCredential)
/// implementations. Boxed so that any credential can plug in its own error.
pub type CredentialError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for all client operations.
#[derive(Debug, thiserror::Error)]
pub enum IntuneError {
    /// The credential failed to produce a token. Carried unmodified; the
    /// display output is the credential's own message.
    #[error(transparent)]
    Credential(CredentialError),

    /// The credential returned a token containing bytes that are not valid
    /// in an HTTP header value.
    #[error("access token is not a valid header value")]
    InvalidToken(#[source] InvalidHeaderValue),

    /// Microsoft Graph returned a status outside 2xx.
    ///
    /// `body` is the raw response text, which for Graph is usually a JSON
    /// error object with a code and message.
    #[error("Request failed: {} {}", .status.as_u16(), .body)]
    RequestFailed {
        /// HTTP status returned by Graph.
        status: StatusCode,
        /// Raw response body text.
        body: String,
        /// The status error reported by reqwest. reqwest only produces one
        /// for 4xx and 5xx, so this is `None` for 1xx and 3xx.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A transport-level failure (DNS, TCP, TLS, interrupted body).
    #[error(transparent)]
    Network(#[from] reqwest::Error),

    /// A success response body was not a JSON object.
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Failures of the OAuth2 client-credentials flow.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Azure AD rejected the token request. `body` keeps the AADSTS error
    /// code and description.
    #[error("token request failed ({status}): {body}")]
    Rejected {
        /// HTTP status returned by the token endpoint.
        status: StatusCode,
        /// Raw response body text.
        body: String,
    },

    /// The token endpoint could not be reached.
    #[error("token request network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The token endpoint answered 2xx with a body we could not parse.
    #[error("failed to parse token response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, IntuneError>;
