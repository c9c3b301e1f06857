//! OAuth 2.0 PKCE flow for Google APIs.
//!
//! Desktop flow with a loopback redirect:
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a random state
//! 2. Bind a listener on 127.0.0.1 (a fixed range, or any free port)
//! 3. Open the consent page in the browser, printing the URL as a fallback
//! 4. Read the redirect on the listener and check the state
//! 5. Exchange the code (with verifier) for access and refresh tokens

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::backend::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

use super::config::{GoogleConfig, OAuthCredentials};
use super::credentials::{Authorizer, RefreshedToken};
use super::tokens::TokenInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Verifier length in bytes, before base64 encoding.
const CODE_VERIFIER_LENGTH: usize = 32;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PATH: &str = "/callback";

/// Low-level OAuth client: runs the consent flow and the refresh grant.
#[derive(Debug)]
pub struct OAuthClient {
    http_client: reqwest::Client,
    port_range: (u16, u16),
}

impl OAuthClient {
    /// Creates a new OAuth client.
    pub fn new(timeout: Duration, port_range: (u16, u16)) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            port_range,
        })
    }

    /// Runs the interactive consent flow and returns the granted tokens.
    ///
    /// Blocks the calling thread while waiting for the browser redirect, for
    /// at most five minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if no loopback port can be bound, the user denies
    /// access, the state does not match, the wait times out, or the code
    /// exchange fails.
    pub async fn authorize(
        &self,
        credentials: &OAuthCredentials,
        scopes: &[String],
    ) -> ProviderResult<TokenInfo> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_loopback_server(self.port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);

        let auth_url = pkce.build_auth_url(&credentials.client_id, &redirect_uri, scopes);

        info!("starting OAuth flow, opening browser");
        debug!(%auth_url, "authorization URL");

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        let callback = wait_for_callback(listener)?;
        if callback.state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        info!("received authorization code, exchanging for tokens");

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", callback.code.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        let response = self.token_request(&params, "token exchange").await?;

        info!("obtained tokens");
        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            granted_scopes(response.scope.as_deref(), scopes),
        )
        .with_client(credentials))
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh_token(
        &self,
        credentials: &OAuthCredentials,
        refresh_token: &str,
    ) -> ProviderResult<RefreshedToken> {
        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.token_request(&params, "token refresh").await?;

        info!("refreshed access token");
        Ok(RefreshedToken {
            access_token: response.access_token,
            expires_in: response.expires_in,
        })
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e).with_provider("google"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what, status, body
            ))
            .with_provider("google"));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
                .with_provider("google")
        })
    }
}

/// Uses the scopes Google reports when present, the requested ones otherwise.
fn granted_scopes(reported: Option<&str>, requested: &[String]) -> Vec<String> {
    match reported {
        Some(scope) if !scope.trim().is_empty() => {
            scope.split_whitespace().map(str::to_string).collect()
        }
        _ => requested.to_vec(),
    }
}

/// Binds the callback listener.
///
/// `(0, 0)` asks the OS for any free port; otherwise the range is tried in
/// order.
fn bind_loopback_server(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) else {
            continue;
        };
        let port = listener
            .local_addr()
            .map_err(|e| ProviderError::internal(format!("failed to read bound port: {}", e)))?
            .port();
        debug!(port, "bound loopback server");
        return Ok((listener, port));
    }
    Err(ProviderError::configuration(format!(
        "no available port in range {}-{}",
        port_range.0, port_range.1
    )))
}

fn wait_for_callback(listener: TcpListener) -> ProviderResult<CallbackParams> {
    listener
        .set_nonblocking(false)
        .map_err(|e| ProviderError::internal(format!("failed to set blocking: {}", e)))?;

    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = handle_callback(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => error!("failed to accept connection: {}", e),
            }
        }
    });

    match rx.recv_timeout(CALLBACK_TIMEOUT) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            Err(ProviderError::authentication("OAuth callback timeout"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ProviderError::internal("callback channel disconnected"))
        }
    }
}

/// Reads one request from the browser and answers it.
///
/// Returns `None` for requests that are not the redirect (favicon etc.).
fn handle_callback(mut stream: TcpStream) -> Option<ProviderResult<CallbackParams>> {
    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let result = parse_callback(&request_line)?;

    let response = if result.is_ok() {
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
        <html><body><h1>Authorization Successful</h1>\
        <p>You can close this window and return to the terminal.</p></body></html>"
    } else {
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
        <html><body><h1>Authorization Failed</h1>\
        <p>You can close this window.</p></body></html>"
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();

    Some(result)
}

/// Code and state carried by the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CallbackParams {
    code: String,
    state: String,
}

/// Parses `GET /callback?code=...&state=... HTTP/1.1`.
fn parse_callback(request_line: &str) -> Option<ProviderResult<CallbackParams>> {
    let mut parts = request_line.split_whitespace();
    if parts.next() != Some("GET") {
        return None;
    }
    let target = parts.next()?;

    let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;
    if url.path() != CALLBACK_PATH {
        return None;
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Some(Err(ProviderError::authentication(format!(
                    "authorization denied: {}",
                    value
                ))));
            }
            _ => {}
        }
    }

    Some(match code {
        Some(code) => Ok(CallbackParams {
            code,
            state: state.unwrap_or_default(),
        }),
        None => Err(ProviderError::authentication(
            "missing authorization code in callback",
        )),
    })
}

/// PKCE flow state (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 of the verifier, base64url encoded).
    pub challenge: String,
    /// Random state echoed back by the redirect.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);

        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the Google consent URL.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// [`Authorizer`] backed by Google's OAuth endpoints.
///
/// Refreshes use the client recorded in the token when available and fall
/// back to the client secret file; the interactive flow always reads the
/// file.
#[derive(Debug)]
pub struct GoogleAuthorizer {
    oauth: OAuthClient,
    client_secret_path: PathBuf,
}

impl GoogleAuthorizer {
    /// Creates an authorizer from the Google settings.
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        Ok(Self {
            oauth: OAuthClient::new(config.timeout, config.loopback_port_range)?,
            client_secret_path: config.client_secret_path.clone(),
        })
    }

    fn client_secret(&self) -> ProviderResult<OAuthCredentials> {
        let credentials = OAuthCredentials::from_file(&self.client_secret_path)?;
        credentials.validate()?;
        Ok(credentials)
    }
}

impl Authorizer for GoogleAuthorizer {
    fn refresh<'a>(
        &'a self,
        token: &'a TokenInfo,
    ) -> BoxFuture<'a, ProviderResult<RefreshedToken>> {
        Box::pin(async move {
            let refresh_token = token
                .refresh_token
                .as_deref()
                .ok_or_else(|| ProviderError::authentication("no refresh token"))?;
            let credentials = match token.client_credentials() {
                Some(credentials) => credentials,
                None => self.client_secret()?,
            };
            self.oauth.refresh_token(&credentials, refresh_token).await
        })
    }

    fn authorize<'a>(&'a self, scopes: &'a [String]) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
        Box::pin(async move {
            let credentials = self.client_secret()?;
            self.oauth.authorize(&credentials, scopes).await
        })
    }
}
