//! Argo CD account token client.
//!
//! A small session-based client: log in with username/password to get a
//! bearer session token, then use it to mint a named account token.
//!
//! The transport skips TLS certificate verification. Self-hosted Argo CD
//! instances commonly run with a self-signed certificate.

mod dump;

use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Request, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, HttpFailure, Result};

/// User-Agent sent when the provider config leaves it unset.
pub const DEFAULT_USER_AGENT: &str = "Krateo Platformops";

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Connection settings for an Argo CD server.
#[derive(Debug, Clone, Default)]
pub struct TokenProviderOptions {
    pub server_url: String,
    pub user_agent: Option<String>,
    pub debug_client: bool,
    pub timeout: Option<Duration>,
}

impl TokenProviderOptions {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }
}

/// An authenticated, pass-local view of an Argo CD server.
///
/// Produced fresh by every reconciliation pass and never persisted.
#[derive(Debug)]
pub struct Session {
    pub server_url: String,
    pub user_agent: String,
    pub token: SecretString,
    pub debug_client: bool,
    pub timeout: Option<Duration>,
}

impl Session {
    fn options(&self) -> TokenProviderOptions {
        TokenProviderOptions {
            server_url: self.server_url.clone(),
            user_agent: Some(self.user_agent.clone()),
            debug_client: self.debug_client,
            timeout: self.timeout,
        }
    }
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    expires_in: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

pub struct TokenProvider {
    http: Client,
    server_url: String,
    user_agent: HeaderValue,
    debug_client: bool,
}

impl TokenProvider {
    /// Build a client. Fails before any network call when the server URL is
    /// missing.
    pub fn new(opts: &TokenProviderOptions) -> Result<Self> {
        let server_url = opts.server_url.trim().trim_end_matches('/');
        if server_url.is_empty() {
            return Err(Error::MissingServerUrl);
        }

        let user_agent = opts
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT);
        let user_agent = HeaderValue::from_str(user_agent).unwrap_or_else(|err| {
            tracing::warn!(
                user_agent = %user_agent,
                error = %err,
                "Invalid user agent; falling back to default"
            );
            HeaderValue::from_static(DEFAULT_USER_AGENT)
        });

        let mut builder = Client::builder().danger_accept_invalid_certs(true);
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::AuthFailed(HttpFailure::Transport(e)))?;

        Ok(Self {
            http,
            server_url: server_url.to_string(),
            user_agent,
            debug_client: opts.debug_client,
        })
    }

    /// POST `/api/v1/session` and return the session token.
    pub async fn create_session(&self, username: &str, password: &SecretString) -> Result<SecretString> {
        self.create_session_inner(username, password)
            .await
            .map_err(Error::AuthFailed)
    }

    /// POST `/api/v1/account/{name}/token` and return the account token.
    ///
    /// `expires_in` is in seconds; `0` means the token never expires and no
    /// body is sent.
    pub async fn create_token_for_account(
        &self,
        session_token: &SecretString,
        name: &str,
        expires_in: i64,
    ) -> Result<SecretString> {
        self.create_token_inner(session_token, name, expires_in)
            .await
            .map_err(|failure| Error::MintFailed {
                account: name.to_string(),
                failure,
            })
    }

    async fn create_session_inner(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SecretString, HttpFailure> {
        let body = serde_json::to_vec(&SessionRequest {
            username,
            password: password.expose_secret(),
        })?;

        let req = self
            .http
            .post(format!("{}/api/v1/session", self.server_url))
            .header(USER_AGENT, self.user_agent.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .build()?;

        self.fetch_token(req).await
    }

    async fn create_token_inner(
        &self,
        session_token: &SecretString,
        name: &str,
        expires_in: i64,
    ) -> Result<SecretString, HttpFailure> {
        let url = format!(
            "{}/api/v1/account/{}/token",
            self.server_url,
            urlencoding::encode(name)
        );

        let mut req = self
            .http
            .post(url)
            .header(USER_AGENT, self.user_agent.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", session_token.expose_secret()),
            );
        if expires_in > 0 {
            req = req.body(serde_json::to_vec(&TokenRequest { expires_in })?);
        }

        self.fetch_token(req.build()?).await
    }

    /// Send a request that answers with `{"token": "..."}`.
    async fn fetch_token(&self, req: Request) -> Result<SecretString, HttpFailure> {
        if self.debug_client {
            dump::request(&req);
        }

        let res = self.http.execute(req).await?;
        let version = res.version();
        let status = res.status();
        let headers = res.headers().clone();
        let body = match res.bytes().await {
            Ok(body) => body,
            Err(err) => {
                if self.debug_client {
                    dump::response(version, status, &headers, &[]);
                }
                return Err(err.into());
            }
        };

        if self.debug_client {
            dump::response(version, status, &headers, &body);
        }

        if status != StatusCode::OK {
            return Err(HttpFailure::Status(status));
        }

        let response: TokenResponse = serde_json::from_slice(&body)?;
        Ok(SecretString::from(response.token))
    }
}

/// Log in with username and password and return the session token.
pub async fn login(
    opts: &TokenProviderOptions,
    username: &str,
    password: &SecretString,
) -> Result<SecretString> {
    TokenProvider::new(opts)?
        .create_session(username, password)
        .await
}

/// Mint a token for the named account using an authenticated session.
pub async fn generate_token(session: &Session, name: &str, expires_in: i64) -> Result<SecretString> {
    TokenProvider::new(&session.options())?
        .create_token_for_account(&session.token, name, expires_in)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_server_url_fails_fast() {
        let err = TokenProvider::new(&TokenProviderOptions::new("  ")).err().unwrap();
        assert!(matches!(err, Error::MissingServerUrl));
    }

    #[test]
    fn blank_user_agent_uses_default() {
        let opts = TokenProviderOptions {
            user_agent: Some(String::new()),
            ..TokenProviderOptions::new("https://argocd.example/")
        };
        let provider = TokenProvider::new(&opts).unwrap();
        assert_eq!(provider.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(provider.server_url, "https://argocd.example");
    }

    #[test]
    fn session_debug_output_redacts_token() {
        let session = Session {
            server_url: "https://argocd.example".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token: SecretString::from("super-secret"),
            debug_client: false,
            timeout: None,
        };
        assert!(!format!("{session:?}").contains("super-secret"));
    }
}
