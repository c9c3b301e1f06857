//! Google Calendar backend.
//!
//! # Authentication Flow
//!
//! 1. The user registers an OAuth desktop client and downloads its JSON
//! 2. [`CredentialManager`] loads the stored token, refreshing it if expired
//! 3. Otherwise [`GoogleAuthorizer`] starts a loopback server, opens the
//!    consent page with a PKCE challenge and exchanges the returned code
//! 4. The token (with the issuing client) is persisted for the next run
//!
//! # Example
//!
//! ```ignore
//! use calscan_providers::google::{
//!     CredentialManager, GoogleAuthorizer, GoogleCalendarClient, GoogleConfig, TokenStorage,
//! };
//!
//! let config = GoogleConfig::new();
//! let mut credentials = CredentialManager::new(
//!     TokenStorage::new(&config.token_path),
//!     GoogleAuthorizer::new(&config)?,
//!     config.scopes.clone(),
//! );
//! let session = credentials.obtain_session().await?;
//! let client = GoogleCalendarClient::new(&session, &config)?;
//! ```

mod client;
mod config;
mod credentials;
mod oauth;
mod tokens;

pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use credentials::{Authorizer, CredentialManager, RefreshedToken, Session};
pub use oauth::{GoogleAuthorizer, OAuthClient, PkceFlow};
pub use tokens::{TokenInfo, TokenStorage};
