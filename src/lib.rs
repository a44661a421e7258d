//! Async Rust client for Intune device configuration profiles on Microsoft Graph.
//!
//! Provides a pluggable credential contract, an authenticated client that
//! creates, updates, deletes and assigns device configuration profiles, and
//! a typed error hierarchy.
//!
//! # Modules
//!
//! - [`auth`] — `TokenCredential` trait plus static and client-secret credentials.
//! - [`client`] — `IntuneClient`, the four profile operations.
//! - [`error`] — `IntuneError` and `AuthError`.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use intune_profiles::auth::ClientSecretCredential;
//! use intune_profiles::client::IntuneClient;
//!
//! let credential = ClientSecretCredential::new("tenant", "client_id", secret);
//! let client = IntuneClient::new(Arc::new(credential));
//! let profile = serde_json::json!({
//!     "@odata.type": "#microsoft.graph.windows10GeneralConfiguration",
//!     "displayName": "Baseline",
//! });
//! let created = client.create_profile(profile.as_object().unwrap()).await?;
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod error;
