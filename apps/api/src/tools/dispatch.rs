//! Executes tool calls issued by the model.
//!
//! Failures never abort the chat turn: the error is serialized into the tool
//! result so the model can explain it to the user. Every call, successful or
//! not, goes to the audit log.

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::admin::AdminError;
use crate::chat::prompts::{
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TITLE, TALENT_SCOUTING_PROMPT, TITLE_INSTRUCTION,
};
use crate::chat::store;
use crate::llm_client::{ChatMessage, ChatOptions, ToolCall};
use crate::models::message::StoredMessage;
use crate::state::AppState;

use super::audit;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("missing or invalid argument '{0}'")]
    MissingArg(&'static str),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// One executed tool call: what was invoked, with what, and what came back.
#[derive(Debug, Clone, Serialize)]
pub struct ToolRun {
    pub name: String,
    pub args: Value,
    pub result: Value,
}

/// Runs a single tool call end to end and audit-logs it. The returned
/// `result` is what gets fed back to the model as the tool message.
pub async fn run_tool_call(
    state: &AppState,
    user_id: &str,
    session_id: &str,
    call: &ToolCall,
) -> ToolRun {
    let name = call.function.name.clone();
    let (args, result) = match parse_args(&call.function.arguments) {
        Ok(args) => {
            let result = match execute(state, &name, &args).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("tool '{name}' failed: {e}");
                    json!({ "error": e.to_string() })
                }
            };
            (Value::Object(args), result)
        }
        Err(e) => (
            json!({}),
            json!({ "error": format!("invalid tool arguments: {e}") }),
        ),
    };

    let run = ToolRun { name, args, result };
    audit::log_tool_call(&state.config.tool_log_dir, user_id, session_id, &run).await;
    run
}

fn parse_args(raw: &str) -> Result<Map<String, Value>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str::<Map<String, Value>>(raw)
}

async fn execute(
    state: &AppState,
    name: &str,
    args: &Map<String, Value>,
) -> Result<Value, ToolError> {
    let admin = &state.admin;
    match name {
        // ── Contact workflow ───────────────────────────────────────────────
        "prepare_talent_message" => {
            let talent_name = req_str(args, "talent_name")?;
            let proposed = req_str(args, "proposed_message")?;
            Ok(json!({
                "status": "waiting_confirmation",
                "talent_name": talent_name,
                "message_draft": proposed,
                "confirmation_question": format!(
                    "I am ready to send a message to {talent_name}. Is the \
                     following message okay: '{proposed}'? (Yes/No/Edit)"
                ),
            }))
        }
        "start_chat_with_talent" => {
            let talent_name = req_str(args, "talent_name")?;
            let initial = req_str(args, "initial_message")?;
            // required by the schema; the session itself is keyed by name
            let _talent_id = req_string_like(args, "talent_id")?;
            let identity = json!({ "type": "talent", "name": talent_name });
            start_chat(state, talent_name, identity, DEFAULT_SYSTEM_PROMPT, initial).await
        }
        "initiate_contact" => {
            let talent_id = req_i64(args, "talent_id")?;
            let talent_name = req_str(args, "talent_name")?;
            let chat_user_id = req_str(args, "chat_user_id")?;
            let job_opening_id = req_i64(args, "job_opening_id")?;
            let initial = req_str(args, "initial_message")?;
            info!(
                "initiating contact with {chat_user_id} [{talent_id}/{talent_name}] \
                 for opening {job_opening_id}"
            );

            if let Err(e) = admin
                .create_candidate(json!({
                    "talent_id": talent_id,
                    "job_opening_id": job_opening_id,
                    "status": 1,
                }))
                .await
            {
                return Ok(json!({
                    "success": false,
                    "error": format!("failed to create the candidate: {e}"),
                }));
            }

            let identity = json!({ "type": "talent", "name": talent_name });
            match start_chat(state, chat_user_id, identity, TALENT_SCOUTING_PROMPT, initial).await {
                Ok(_) => Ok(json!({
                    "success": true,
                    "message": format!(
                        "Talent {chat_user_id} registered as a candidate and the \
                         first message has been sent."
                    ),
                })),
                Err(e) => Ok(json!({
                    "success": false,
                    "error": format!("candidate created, but starting the chat failed: {e}"),
                })),
            }
        }

        // ── Talent ─────────────────────────────────────────────────────────
        "list_talent" => Ok(Value::Array(
            admin
                .list_talents(page(args), per_page(args), search(args))
                .await?,
        )),
        "get_talent_detail" => Ok(admin.talent_detail(req_i64(args, "talent_id")?).await?),
        "create_talent" => {
            require_keys(args, &["name", "position", "birthdate", "summary"])?;
            Ok(admin.create_talent(Value::Object(args.clone())).await?)
        }
        "update_talent" => {
            let id = req_i64(args, "talent_id")?;
            Ok(admin
                .update_talent(id, payload_without(args, "talent_id"))
                .await?)
        }
        "delete_talent" => Ok(admin.delete_talent(req_i64(args, "talent_id")?).await?),

        // ── Candidates ─────────────────────────────────────────────────────
        "list_candidates" => Ok(Value::Array(
            admin
                .list_candidates(page(args), per_page(args), search(args))
                .await?,
        )),
        "get_candidate_detail" => Ok(admin
            .candidate_detail(req_i64(args, "candidate_id")?)
            .await?),
        "create_candidate" => {
            require_keys(args, &["talent_id", "job_opening_id"])?;
            Ok(admin.create_candidate(Value::Object(args.clone())).await?)
        }
        "update_candidate" => {
            let id = req_i64(args, "candidate_id")?;
            Ok(admin
                .update_candidate(id, payload_without(args, "candidate_id"))
                .await?)
        }
        "delete_candidate" => Ok(admin
            .delete_candidate(req_i64(args, "candidate_id")?)
            .await?),

        // ── Companies ──────────────────────────────────────────────────────
        "list_companies" => Ok(Value::Array(
            admin
                .list_companies(page(args), per_page(args), search(args))
                .await?,
        )),
        "get_company_detail" => Ok(admin.company_detail(req_i64(args, "company_id")?).await?),
        "create_company" => {
            require_keys(args, &["name"])?;
            Ok(admin.create_company(Value::Object(args.clone())).await?)
        }
        "update_company" => {
            let id = req_i64(args, "company_id")?;
            Ok(admin
                .update_company(id, payload_without(args, "company_id"))
                .await?)
        }
        "delete_company" => Ok(admin.delete_company(req_i64(args, "company_id")?).await?),

        // ── Company properties ─────────────────────────────────────────────
        "list_company_properties" => Ok(Value::Array(
            admin
                .list_company_properties(page(args), per_page(args), search(args))
                .await?,
        )),
        "get_company_property_detail" => Ok(admin
            .company_property_detail(req_i64(args, "prop_id")?)
            .await?),
        "create_company_property" => {
            require_keys(args, &["company_id", "key", "value"])?;
            Ok(admin
                .create_company_property(Value::Object(args.clone()))
                .await?)
        }
        "update_company_property" => {
            let id = req_i64(args, "prop_id")?;
            Ok(admin
                .update_company_property(id, payload_without(args, "prop_id"))
                .await?)
        }
        "delete_company_property" => Ok(admin
            .delete_company_property(req_i64(args, "prop_id")?)
            .await?),

        // ── Job openings ───────────────────────────────────────────────────
        "list_job_openings" => Ok(Value::Array(
            admin
                .list_job_openings(page(args), per_page(args), search(args))
                .await?,
        )),
        "get_job_opening_detail" => Ok(admin
            .job_opening_detail(req_i64(args, "opening_id")?)
            .await?),
        "create_job_opening" => {
            require_keys(args, &["company_id", "title"])?;
            Ok(admin.create_job_opening(Value::Object(args.clone())).await?)
        }
        "update_job_opening" => {
            let id = req_i64(args, "opening_id")?;
            Ok(admin
                .update_job_opening(id, payload_without(args, "opening_id"))
                .await?)
        }
        "delete_job_opening" => Ok(admin
            .delete_job_opening(req_i64(args, "opening_id")?)
            .await?),

        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// Creates a session owned by `owner` seeded with the system prompt and the
/// approved first message, then asks the model for a short title.
async fn start_chat(
    state: &AppState,
    owner: &str,
    identity: Value,
    system_prompt: &str,
    initial_message: &str,
) -> Result<Value, ToolError> {
    let messages = vec![
        StoredMessage::system(system_prompt),
        StoredMessage::assistant(initial_message),
    ];
    let title = generate_title(state, &messages).await;
    let session_id = Uuid::new_v4().to_string();
    store::create_session(
        &state.db,
        owner,
        &session_id,
        &title,
        &messages,
        Some(identity),
    )
    .await?;

    Ok(json!({
        "success": true,
        "message": format!("New chat session with {owner} created."),
        "session_id": session_id,
    }))
}

async fn generate_title(state: &AppState, seed: &[StoredMessage]) -> String {
    let mut messages: Vec<ChatMessage> = seed.iter().map(ChatMessage::from).collect();
    messages.push(ChatMessage::user(TITLE_INSTRUCTION));
    let opts = ChatOptions {
        max_tokens: Some(20),
        ..ChatOptions::default()
    };
    match state.llm.chat(&messages, opts).await {
        Ok(reply) => {
            let title = reply.content.unwrap_or_default().trim().replace('"', "");
            if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title
            }
        }
        Err(e) => {
            warn!("title generation failed: {e}");
            DEFAULT_TITLE.to_string()
        }
    }
}

// ── Argument helpers ─────────────────────────────────────────────────────────

fn page(args: &Map<String, Value>) -> u32 {
    args.get("page").and_then(Value::as_u64).unwrap_or(1) as u32
}

fn per_page(args: &Map<String, Value>) -> u32 {
    args.get("per_page").and_then(Value::as_u64).unwrap_or(10) as u32
}

fn search(args: &Map<String, Value>) -> Option<&str> {
    args.get("search").and_then(Value::as_str)
}

fn req_str<'a>(args: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ToolError::MissingArg(key))
}

/// Accepts ids the model sends as either a JSON number or a numeric string.
fn req_i64(args: &Map<String, Value>, key: &'static str) -> Result<i64, ToolError> {
    let v = args.get(key).ok_or(ToolError::MissingArg(key))?;
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or(ToolError::MissingArg(key))
}

fn req_string_like(args: &Map<String, Value>, key: &'static str) -> Result<String, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ToolError::MissingArg(key)),
    }
}

fn require_keys(args: &Map<String, Value>, keys: &[&'static str]) -> Result<(), ToolError> {
    for &key in keys {
        if !args.contains_key(key) {
            return Err(ToolError::MissingArg(key));
        }
    }
    Ok(())
}

/// The raw arguments minus the path id, which the panel takes from the URL.
fn payload_without(args: &Map<String, Value>, id_key: &str) -> Value {
    let mut map = args.clone();
    map.remove(id_key);
    Value::Object(map)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_parse_args_empty_is_empty_map() {
        assert!(parse_args("").unwrap().is_empty());
        assert!(parse_args("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_args_rejects_non_objects() {
        assert!(parse_args("[1, 2]").is_err());
        assert!(parse_args("\"hi\"").is_err());
        assert!(parse_args("{not json").is_err());
    }

    #[test]
    fn test_page_defaults() {
        let args = make_args(json!({}));
        assert_eq!(page(&args), 1);
        assert_eq!(per_page(&args), 10);
        assert!(search(&args).is_none());
    }

    #[test]
    fn test_page_overrides() {
        let args = make_args(json!({"page": 3, "per_page": 25, "search": "rust"}));
        assert_eq!(page(&args), 3);
        assert_eq!(per_page(&args), 25);
        assert_eq!(search(&args), Some("rust"));
    }

    #[test]
    fn test_req_i64_accepts_number_and_numeric_string() {
        let args = make_args(json!({"talent_id": 7, "opening_id": "42"}));
        assert_eq!(req_i64(&args, "talent_id").unwrap(), 7);
        assert_eq!(req_i64(&args, "opening_id").unwrap(), 42);
        assert!(req_i64(&args, "company_id").is_err());
        let bad = make_args(json!({"talent_id": "seven"}));
        assert!(req_i64(&bad, "talent_id").is_err());
    }

    #[test]
    fn test_req_str_rejects_blank() {
        let args = make_args(json!({"talent_name": "  ", "proposed_message": "hello"}));
        assert!(req_str(&args, "talent_name").is_err());
        assert_eq!(req_str(&args, "proposed_message").unwrap(), "hello");
    }

    #[test]
    fn test_req_string_like() {
        let args = make_args(json!({"a": "12", "b": 12, "c": true}));
        assert_eq!(req_string_like(&args, "a").unwrap(), "12");
        assert_eq!(req_string_like(&args, "b").unwrap(), "12");
        assert!(req_string_like(&args, "c").is_err());
        assert!(req_string_like(&args, "missing").is_err());
    }

    #[test]
    fn test_payload_without_strips_path_id() {
        let args = make_args(json!({"talent_id": 7, "name": "Budi"}));
        let payload = payload_without(&args, "talent_id");
        assert_eq!(payload, json!({"name": "Budi"}));
    }

    #[test]
    fn test_require_keys() {
        let args = make_args(json!({"name": "x", "position": "y"}));
        assert!(require_keys(&args, &["name", "position"]).is_ok());
        let err = require_keys(&args, &["name", "birthdate"]).unwrap_err();
        assert!(err.to_string().contains("birthdate"));
    }
}
