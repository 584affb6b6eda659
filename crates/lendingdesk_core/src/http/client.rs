//! Blocking JSON client with bearer auth and refresh-on-403.
//!
//! # Responsibility
//! - Build endpoint URLs relative to the configured API base.
//! - Send JSON requests with the current access token.
//! - Refresh the access token once per request when the backend answers 403.
//!
//! # Invariants
//! - The refresh endpoint itself is never retried.
//! - An empty token clears the `Authorization` header.

use super::{ApiError, ApiResult};
use crate::config::Config;
use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::RwLock;
use std::time::{Duration, Instant};

const REFRESH_PATH: &str = "auth/refresh-token";
const LOGIN_PATH: &str = "auth/login";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Shared backend client used by every repository and channel.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    access_token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Creates a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// - Returns `InvalidUrl` when `base_url` is not an absolute URL.
    /// - Returns `Transport` when the HTTP backend cannot be initialized.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            // Refresh tokens travel as an http-only cookie set by login.
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url,
            access_token: RwLock::new(None),
        })
    }

    /// Creates a client from loaded configuration, applying any preset token.
    pub fn from_config(config: &Config) -> ApiResult<Self> {
        let client = Self::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        if let Some(token) = config.access_token.as_deref() {
            client.set_access_token(token);
        }
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sets the bearer token; an empty string clears it.
    pub fn set_access_token(&self, token: &str) {
        let mut slot = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = if token.trim().is_empty() {
            None
        } else {
            Some(token.trim().to_string())
        };
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Logs in with librarian credentials and stores the returned token.
    pub fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let body = serde_json::to_value(LoginRequest { email, password })?;
        let response = self.send_once(Method::POST, LOGIN_PATH, Some(&body))?;
        let response = ensure_success(response)?;
        let token: TokenResponse = decode_body(response)?;
        self.set_access_token(&token.access_token);
        info!("event=auth_login module=http status=ok");
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.execute(Method::GET, path, None)?;
        decode_body(response)
    }

    pub fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::POST, path, Some(&body))?;
        decode_body(response)
    }

    pub fn put_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::PUT, path, Some(&body))?;
        decode_body(response)
    }

    pub fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute(Method::DELETE, path, None)?;
        Ok(())
    }

    /// Sends one request, refreshing the token and replaying once on 403.
    fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResult<Response> {
        let started_at = Instant::now();
        let response = self.send_once(method.clone(), path, body)?;

        let response = if response.status() == StatusCode::FORBIDDEN {
            match self.refresh_access_token() {
                Ok(()) => {
                    debug!(
                        "event=api_retry module=http method={} path={} reason=token_refreshed",
                        method, path
                    );
                    self.send_once(method.clone(), path, body)?
                }
                Err(ApiError::SessionExpired) => return Err(ApiError::SessionExpired),
                Err(err) => {
                    warn!("event=token_refresh module=http status=error error={}", err);
                    response
                }
            }
        } else {
            response
        };

        let status = response.status();
        debug!(
            "event=api_request module=http method={} path={} status_code={} duration_ms={}",
            method,
            path,
            status.as_u16(),
            started_at.elapsed().as_millis()
        );
        ensure_success(response)
    }

    fn refresh_access_token(&self) -> ApiResult<()> {
        let response = self.send_once(Method::POST, REFRESH_PATH, None)?;
        match response.status() {
            StatusCode::UNAUTHORIZED => {
                warn!("event=token_refresh module=http status=expired");
                Err(ApiError::SessionExpired)
            }
            _ => {
                let response = ensure_success(response)?;
                let token: TokenResponse = decode_body(response)?;
                self.set_access_token(&token.access_token);
                info!("event=token_refresh module=http status=ok");
                Ok(())
            }
        }
    }

    fn send_once(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResult<Response> {
        let url = self.endpoint(path)?;
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = self.access_token() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send()?)
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::InvalidUrl(format!("`{path}`: {err}")))
    }
}

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let trimmed = raw.trim();
    // `Url::join` drops the last segment unless the base ends with a slash.
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|err| ApiError::InvalidUrl(format!("`{raw}`: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!("`{raw}` cannot be a base url")));
    }
    Ok(url)
}

fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message_from_body(&text, status),
    })
}

/// Prefers the backend's `{"message": ...}` text, then the raw body, then
/// the status reason phrase.
fn error_message_from_body(text: &str, status: StatusCode) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                if !message.trim().is_empty() {
                    return message.clone();
                }
            }
        }
    }

    let trimmed = text.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

fn decode_body<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let text = response.text()?;
    // DELETE/PUT endpoints may answer with an empty body.
    let source = if text.trim().is_empty() { "null" } else { text.as_str() };
    Ok(serde_json::from_str(source)?)
}
