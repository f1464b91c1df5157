//! Bearer-token lifecycle for the admin API.
//!
//! Token precedence: a token supplied with the request, then the in-memory
//! slot, then the Redis cache, then a fresh login with service credentials.
//! Cached tokens are probed with a cheap list call before use; only a 401
//! marks a token unusable.

use std::time::Duration;

use redis::AsyncCommands;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{safe_json, snippet, AdminClient, AdminError};

const TOKEN_CACHE_KEY: &str = "admin_api:token";
const PING_TIMEOUT: Duration = Duration::from_secs(15);

impl AdminClient {
    /// Resolves the token to use for admin API calls.
    ///
    /// A `preferred` token (from the incoming request) is validated and, when
    /// accepted, becomes the shared token. A rejected preferred token is an
    /// error rather than a silent fallback so the caller learns its
    /// credentials are bad.
    pub async fn ensure_token(&self, preferred: Option<&str>) -> Result<String, AdminError> {
        if let Some(t) = preferred.map(str::trim).filter(|t| !t.is_empty()) {
            if self.token_usable(t).await {
                self.store_token(t).await;
                return Ok(t.to_string());
            }
            return Err(AdminError::Unauthorized(
                "the provided admin API token was rejected".to_string(),
            ));
        }

        if let Some(t) = self.token.read().await.clone() {
            return Ok(t);
        }

        if let Some(t) = self.cached_token().await {
            if self.token_usable(&t).await {
                *self.token.write().await = Some(t.clone());
                return Ok(t);
            }
            self.clear_token().await;
        }

        if self.has_login_credentials() {
            return self.relogin().await;
        }
        Err(AdminError::NoCredentials)
    }

    /// Logs in with the configured service credentials and stores the token.
    pub(super) async fn relogin(&self) -> Result<String, AdminError> {
        let (email, password) = match (&self.login_email, &self.login_password) {
            (Some(e), Some(p)) => (e.clone(), p.clone()),
            _ => return Err(AdminError::NoCredentials),
        };
        let token = self.login(&email, &password).await?;
        self.store_token(&token).await;
        Ok(token)
    }

    /// The panel's login endpoint is picky about content types across
    /// deployments, so the same credentials are tried as a form, as JSON, and
    /// as multipart before giving up.
    async fn login(&self, email: &str, password: &str) -> Result<String, AdminError> {
        let url = format!("{}/api/auth/login", self.base_url);
        let form = [("email", email), ("password", password)];
        let body = json!({ "email": email, "password": password });
        let multipart = reqwest::multipart::Form::new()
            .text("email", email.to_string())
            .text("password", password.to_string());

        let attempts = vec![
            self.http.post(&url).form(&form),
            self.http.post(&url).json(&body),
            self.http.post(&url).multipart(multipart),
        ];

        let mut last_failure = "no login attempt was made".to_string();
        for attempt in attempts {
            let resp = attempt.send().await?;
            let status = resp.status();
            let text = resp.text().await?;
            if status.is_success() {
                let parsed = safe_json(&text);
                return extract_token(&parsed).ok_or_else(|| {
                    AdminError::Login(format!("login response had no token: {}", snippet(&text)))
                });
            }
            last_failure = format!("status {}: {}", status.as_u16(), snippet(&text));
            debug!("admin login attempt failed with {last_failure}");
        }
        Err(AdminError::Login(last_failure))
    }

    /// A cheap authenticated probe. Only a 401 marks the token unusable; a
    /// network hiccup or an unrelated error status says nothing about the
    /// token itself.
    async fn token_usable(&self, token: &str) -> bool {
        let url = self.url("talent");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("page", "1"), ("per_page", "1")])
            .timeout(PING_TIMEOUT)
            .send()
            .await;
        match resp {
            Ok(resp) => resp.status() != StatusCode::UNAUTHORIZED,
            Err(e) => {
                warn!("admin API ping failed, assuming the token is usable: {e}");
                true
            }
        }
    }

    async fn redis_conn(&self) -> Option<redis::aio::MultiplexedConnection> {
        match self.redis.get_multiplexed_async_connection().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!("redis unavailable for the admin token cache: {e}");
                None
            }
        }
    }

    async fn cached_token(&self) -> Option<String> {
        let mut conn = self.redis_conn().await?;
        match conn.get::<_, Option<String>>(TOKEN_CACHE_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("failed to read the cached admin token: {e}");
                None
            }
        }
    }

    async fn store_token(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());
        if let Some(mut conn) = self.redis_conn().await {
            if let Err(e) = conn.set::<_, _, ()>(TOKEN_CACHE_KEY, token).await {
                warn!("failed to cache the admin token: {e}");
            }
        }
    }

    pub(super) async fn clear_token(&self) {
        *self.token.write().await = None;
        if let Some(mut conn) = self.redis_conn().await {
            if let Err(e) = conn.del::<_, ()>(TOKEN_CACHE_KEY).await {
                warn!("failed to drop the cached admin token: {e}");
            }
        }
    }
}

/// Login responses vary by panel version; the token shows up as `token`,
/// `access_token`, or `data.token`.
fn extract_token(body: &Value) -> Option<String> {
    let candidates = [
        body.get("token"),
        body.get("access_token"),
        body.get("data").and_then(|d| d.get("token")),
    ];
    for candidate in candidates {
        if let Some(token) = candidate.and_then(Value::as_str) {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_token_top_level() {
        assert_eq!(
            extract_token(&json!({"token": "abc"})),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_extract_token_access_token() {
        assert_eq!(
            extract_token(&json!({"access_token": "xyz"})),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn test_extract_token_nested_in_data() {
        assert_eq!(
            extract_token(&json!({"data": {"token": "nested"}})),
            Some("nested".to_string())
        );
    }

    #[test]
    fn test_extract_token_prefers_token_over_access_token() {
        let body = json!({"token": "first", "access_token": "second"});
        assert_eq!(extract_token(&body), Some("first".to_string()));
    }

    #[test]
    fn test_extract_token_ignores_blank_and_missing() {
        assert_eq!(extract_token(&json!({"token": "  "})), None);
        assert_eq!(extract_token(&json!({"message": "ok"})), None);
    }
}
