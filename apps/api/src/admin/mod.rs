//! Client for the remote admin API.
//!
//! Every CRUD tool goes through this module. Requests carry a bearer token
//! managed by `auth`: supplied by the caller, cached in Redis, or obtained by
//! logging in with the configured service credentials. A request that comes
//! back 401 triggers one re-login before the error is surfaced.

pub mod auth;
pub mod resources;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// How much of an error response body is carried into error messages.
const BODY_SNIPPET_CHARS: usize = 1200;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("admin API rejected the token: {0}")]
    Unauthorized(String),

    #[error("admin API returned {status} for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    #[error("admin API login failed: {0}")]
    Login(String),

    #[error("no admin API token available and no login credentials configured")]
    NoCredentials,
}

/// Shared client for the admin panel. Cloning is cheap; all clones share the
/// HTTP connection pool and the in-memory token slot.
#[derive(Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base_url: String,
    panel: String,
    login_email: Option<String>,
    login_password: Option<String>,
    redis: redis::Client,
    token: Arc<RwLock<Option<String>>>,
}

impl AdminClient {
    pub fn new(config: &Config, redis: redis::Client) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        AdminClient {
            http,
            base_url: config.admin_base_url.clone(),
            panel: config.admin_panel.clone(),
            login_email: config.admin_login_email.clone(),
            login_password: config.admin_login_password.clone(),
            redis,
            token: Arc::new(RwLock::new(None)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, self.panel, path)
    }

    fn has_login_credentials(&self) -> bool {
        self.login_email.is_some() && self.login_password.is_some()
    }

    /// Sends one authenticated request. A 401 response clears the token and,
    /// when service credentials exist, logs in again and retries once.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, AdminError> {
        let token = self.ensure_token(None).await?;
        match self
            .send_with_token(&token, method.clone(), path, query, body)
            .await
        {
            Err(AdminError::Unauthorized(_)) if self.has_login_credentials() => {
                warn!("admin API rejected the token, logging in again");
                self.clear_token().await;
                let token = self.relogin().await?;
                self.send_with_token(&token, method, path, query, body).await
            }
            other => other,
        }
    }

    async fn send_with_token(
        &self,
        token: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, AdminError> {
        let url = self.url(path);
        let mut req = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header("Accept", "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(AdminError::Unauthorized(snippet(&text)));
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(AdminError::Api {
                status: status.as_u16(),
                url,
                body: snippet(&text),
            });
        }
        Ok(safe_json(&text))
    }
}

/// Parses a response body as JSON, falling back to `{"raw_text": ...}` for
/// endpoints that return plain text.
fn safe_json(text: &str) -> Value {
    match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => json!({ "raw_text": text }),
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(BODY_SNIPPET_CHARS).collect()
}

/// Peels up to two `data` envelopes off a list response, then normalizes the
/// remainder into rows. Some panel endpoints nest pagination inside an outer
/// `data` wrapper.
fn unwrap_rows(mut v: Value) -> Vec<Value> {
    for _ in 0..2 {
        match v.get_mut("data").map(Value::take) {
            Some(inner) => v = inner,
            None => break,
        }
    }
    match v {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Unwraps a single-record `data` envelope when present.
fn unwrap_record(mut v: Value) -> Value {
    if let Some(data) = v.get_mut("data") {
        if data.is_object() {
            return data.take();
        }
    }
    v
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_safe_json_parses_json() {
        assert_eq!(safe_json(r#"{"ok": true}"#), json!({"ok": true}));
    }

    #[test]
    fn test_safe_json_wraps_plain_text() {
        assert_eq!(
            safe_json("Deleted successfully"),
            json!({"raw_text": "Deleted successfully"})
        );
    }

    #[test]
    fn test_snippet_truncates_by_characters() {
        let long = "é".repeat(2000);
        let cut = snippet(&long);
        assert_eq!(cut.chars().count(), BODY_SNIPPET_CHARS);
    }

    #[test]
    fn test_unwrap_rows_plain_array() {
        let rows = unwrap_rows(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_unwrap_rows_single_envelope() {
        let rows = unwrap_rows(json!({"data": [{"id": 1}]}));
        assert_eq!(rows, vec![json!({"id": 1})]);
    }

    #[test]
    fn test_unwrap_rows_double_envelope() {
        let rows = unwrap_rows(json!({"data": {"data": [{"id": 7}], "total": 1}}));
        assert_eq!(rows, vec![json!({"id": 7})]);
    }

    #[test]
    fn test_unwrap_rows_null_is_empty() {
        assert!(unwrap_rows(json!({"data": null})).is_empty());
    }

    #[test]
    fn test_unwrap_rows_scalar_becomes_single_row() {
        let rows = unwrap_rows(json!({"data": {"id": 3, "name": "x"}}));
        assert_eq!(rows, vec![json!({"id": 3, "name": "x"})]);
    }

    #[test]
    fn test_unwrap_record() {
        let rec = unwrap_record(json!({"data": {"id": 9}}));
        assert_eq!(rec, json!({"id": 9}));
        let plain = unwrap_record(json!({"id": 9}));
        assert_eq!(plain, json!({"id": 9}));
        // a data key that is not an object stays wrapped
        let odd = unwrap_record(json!({"data": [1, 2]}));
        assert_eq!(odd, json!({"data": [1, 2]}));
    }
}
