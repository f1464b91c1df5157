//! HTTP handlers for chat and the session lifecycle.
//!
//! Every route authenticates against the admin API first (a caller-supplied
//! token wins over the service token), then resolves the caller's identity
//! before touching the session row.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::identity::{resolve_identity, ResolvedIdentity};
use crate::models::message::StoredMessage;
use crate::models::session::{Checkpoint, SessionRow};
use crate::state::AppState;
use crate::tools::ToolRun;

use super::engine;
use super::prompts::{DEFAULT_SYSTEM_PROMPT, WELCOME_MESSAGE};
use super::store;

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Write acknowledgement carried on every mutating response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WriteReceipt {
    pub db_updated: bool,
    pub db_match: u64,
    pub db_modified: u64,
}

impl From<u64> for WriteReceipt {
    fn from(rows: u64) -> Self {
        WriteReceipt {
            db_updated: true,
            db_match: rows,
            db_modified: rows,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_runs: Option<Vec<ToolRun>>,
    pub messages: Vec<StoredMessage>,
    pub identity: Value,
    #[serde(flatten)]
    pub receipt: WriteReceipt,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub user_id: String,
    pub identity: Value,
    pub messages: Vec<StoredMessage>,
    pub resets_count: i32,
    pub checkpoints: Vec<Checkpoint>,
    pub greeted: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub ok: bool,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(flatten)]
    pub receipt: WriteReceipt,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/chat
///
/// An empty `message` asks for a session summary (or a welcome line on a
/// fresh session); anything else runs a full assistant turn with tools.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let user_id = req.user_id.as_deref().map(str::trim).unwrap_or("");
    let session_id = req.session_id.as_deref().map(str::trim).unwrap_or("");
    if user_id.is_empty() || session_id.is_empty() {
        return Err(AppError::Validation(
            "user_id and session_id must be provided".to_string(),
        ));
    }
    let system_prompt = req.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let user_msg = req.message.as_deref().map(str::trim).unwrap_or("");

    admin_auth(&state, &headers, req.token.as_deref()).await?;
    let identity = require_identity(&state, user_id).await?;
    let summary = identity.summary();

    let row = store::get_or_create_session(
        &state.db,
        user_id,
        session_id,
        system_prompt,
        Some(&summary),
    )
    .await?;
    // The directory is the source of truth; stored identity follows it.
    if row.identity.as_ref() != Some(&summary) {
        store::sync_identity(&state.db, row.id, &summary).await?;
    }

    let row_id = row.id;
    let was_greeted = row.greeted;
    let mut messages = row.messages.0;
    let name_for_greet = if identity.name.trim().is_empty() {
        user_id.to_string()
    } else {
        identity.name.clone()
    };

    if user_msg.is_empty() {
        let text = if messages.len() > 1 {
            engine::run_summary(&state, &messages).await?
        } else {
            WELCOME_MESSAGE.to_string()
        };
        let text = apply_greeting(was_greeted, &name_for_greet, &text);
        messages.push(StoredMessage::assistant(&text));
        let rows = store::save_messages(&state.db, row_id, &messages, true).await?;
        return Ok(Json(ChatResponse {
            session_id: session_id.to_string(),
            answer: text,
            tool_runs: None,
            messages,
            identity: summary,
            receipt: rows.into(),
        }));
    }

    let (answer, tool_runs) =
        engine::run_turn(&state, user_id, session_id, &mut messages, user_msg).await?;
    let answer = apply_greeting(was_greeted, &name_for_greet, &answer);
    messages.push(StoredMessage::assistant(&answer));
    let rows = store::save_messages(&state.db, row_id, &messages, true).await?;

    info!(
        "chat turn for session {session_id} ran {} tool call(s)",
        tool_runs.len()
    );
    Ok(Json(ChatResponse {
        session_id: session_id.to_string(),
        answer,
        tool_runs: Some(tool_runs),
        messages,
        identity: summary,
        receipt: rows.into(),
    }))
}

/// GET /api/history
pub async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let user_id = query.user_id.as_deref().map(str::trim).unwrap_or("");
    let session_id = query.session_id.as_deref().map(str::trim).unwrap_or("");
    if user_id.is_empty() || session_id.is_empty() {
        return Err(AppError::Validation(
            "user_id and session_id must be provided".to_string(),
        ));
    }

    admin_auth(&state, &headers, None).await?;
    let identity = require_identity(&state, user_id).await?;
    let summary = identity.summary();

    let row = store::get_or_create_session(
        &state.db,
        user_id,
        session_id,
        DEFAULT_SYSTEM_PROMPT,
        Some(&summary),
    )
    .await?;
    Ok(Json(HistoryResponse {
        session_id: session_id.to_string(),
        user_id: user_id.to_string(),
        identity: summary,
        messages: row.messages.0,
        resets_count: row.resets_count,
        checkpoints: row.checkpoints.0,
        greeted: row.greeted,
    }))
}

/// GET /api/session/:session_id
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionRow>, AppError> {
    let user_id = query.user_id.as_deref().map(str::trim).unwrap_or("");
    if user_id.is_empty() {
        return Err(AppError::Validation("user_id must be provided".to_string()));
    }

    admin_auth(&state, &headers, None).await?;
    require_identity(&state, user_id).await?;

    let row = store::find_session(&state.db, user_id, &session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    Ok(Json(row))
}

/// POST /api/reset
///
/// Keeps the history but records a checkpoint, bumps the reset counter, and
/// re-arms the one-time greeting.
pub async fn reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, AppError> {
    let user_id = req.user_id.as_deref().map(str::trim).unwrap_or("");
    let session_id = req.session_id.as_deref().map(str::trim).unwrap_or("");
    if user_id.is_empty() || session_id.is_empty() {
        return Err(AppError::Validation(
            "user_id and session_id must be provided".to_string(),
        ));
    }

    admin_auth(&state, &headers, req.token.as_deref()).await?;
    let identity = require_identity(&state, user_id).await?;
    let summary = identity.summary();

    let row = store::get_or_create_session(
        &state.db,
        user_id,
        session_id,
        DEFAULT_SYSTEM_PROMPT,
        Some(&summary),
    )
    .await?;
    let checkpoint = Checkpoint {
        at: Utc::now(),
        note: "logical reset".to_string(),
    };
    let rows = store::logical_reset(&state.db, row.id, &checkpoint).await?;

    Ok(Json(ResetResponse {
        ok: true,
        session_id: session_id.to_string(),
        checkpoint: Some(checkpoint),
        receipt: rows.into(),
    }))
}

/// POST /api/hard_reset
///
/// Rebuilds the history from scratch: just the system prompt, identity
/// refreshed from the directory.
pub async fn hard_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, AppError> {
    let user_id = req.user_id.as_deref().map(str::trim).unwrap_or("");
    let session_id = req.session_id.as_deref().map(str::trim).unwrap_or("");
    if user_id.is_empty() || session_id.is_empty() {
        return Err(AppError::Validation(
            "user_id and session_id must be provided".to_string(),
        ));
    }
    let system_prompt = req.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);

    admin_auth(&state, &headers, req.token.as_deref()).await?;
    let identity = require_identity(&state, user_id).await?;
    let summary = identity.summary();

    let row = store::get_or_create_session(
        &state.db,
        user_id,
        session_id,
        system_prompt,
        Some(&summary),
    )
    .await?;
    let rows = store::hard_reset(&state.db, row.id, system_prompt, Some(&summary)).await?;

    Ok(Json(ResetResponse {
        ok: true,
        session_id: session_id.to_string(),
        checkpoint: None,
        receipt: rows.into(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared plumbing
// ────────────────────────────────────────────────────────────────────────────

/// Validates admin API access for this request. Any failure in the token
/// chain is answered with 401; the chain details stay in the logs.
pub(crate) async fn admin_auth(
    state: &AppState,
    headers: &HeaderMap,
    body_token: Option<&str>,
) -> Result<(), AppError> {
    let token = caller_token(headers, body_token);
    if let Err(e) = state.admin.ensure_token(token.as_deref()).await {
        warn!("admin API auth failed: {e}");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub(crate) async fn require_identity(
    state: &AppState,
    user_id: &str,
) -> Result<ResolvedIdentity, AppError> {
    resolve_identity(&state.admin, user_id).await.ok_or_else(|| {
        AppError::Validation(format!(
            "user_id '{user_id}' not recognized by the talent/company API"
        ))
    })
}

/// Token precedence: Authorization bearer, then X-Api-Token, then the body.
pub(crate) fn caller_token(headers: &HeaderMap, body_token: Option<&str>) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        let auth = auth.trim();
        if let Some(prefix) = auth.get(..7) {
            if prefix.eq_ignore_ascii_case("bearer ") {
                let token = auth[7..].trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    if let Some(x) = headers.get("x-api-token").and_then(|v| v.to_str().ok()) {
        let x = x.trim();
        if !x.is_empty() {
            return Some(x.to_string());
        }
    }
    body_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn apply_greeting(was_greeted: bool, name: &str, text: &str) -> String {
    if was_greeted {
        text.to_string()
    } else {
        engine::prefix_greeting(name, text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn make_headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.insert(
                axum::http::HeaderName::try_from(*k).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn test_caller_token_prefers_bearer_header() {
        let headers = make_headers(&[("authorization", "Bearer abc"), ("x-api-token", "xyz")]);
        assert_eq!(caller_token(&headers, Some("body")), Some("abc".to_string()));
    }

    #[test]
    fn test_caller_token_bearer_is_case_insensitive() {
        let headers = make_headers(&[("authorization", "bEaReR  abc ")]);
        assert_eq!(caller_token(&headers, None), Some("abc".to_string()));
    }

    #[test]
    fn test_caller_token_falls_back_to_x_api_token() {
        let headers = make_headers(&[("authorization", "Basic zzz"), ("x-api-token", " xyz ")]);
        assert_eq!(caller_token(&headers, None), Some("xyz".to_string()));
    }

    #[test]
    fn test_caller_token_falls_back_to_body() {
        let headers = HeaderMap::new();
        assert_eq!(caller_token(&headers, Some(" tok ")), Some("tok".to_string()));
        assert_eq!(caller_token(&headers, Some("   ")), None);
        assert_eq!(caller_token(&headers, None), None);
    }

    #[test]
    fn test_apply_greeting_only_once() {
        assert_eq!(apply_greeting(false, "Budi", "Hello."), "Hi Budi\n\nHello.");
        assert_eq!(apply_greeting(true, "Budi", "Hello."), "Hello.");
    }

    #[test]
    fn test_write_receipt_flattens_into_response() {
        let resp = ResetResponse {
            ok: true,
            session_id: "s1".to_string(),
            checkpoint: None,
            receipt: WriteReceipt::from(1),
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["db_updated"], true);
        assert_eq!(v["db_match"], 1);
        assert_eq!(v["db_modified"], 1);
        assert!(v.get("checkpoint").is_none());
    }
}
