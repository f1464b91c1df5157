//! Turn orchestration: history trimming, greeting, the tool loop.

use tracing::debug;

use crate::llm_client::{ChatMessage, ChatOptions, LlmError};
use crate::models::message::{role, StoredMessage};
use crate::state::AppState;
use crate::tools::{run_tool_call, ToolRun};

use super::prompts::SUMMARY_INSTRUCTION;

/// How much history is replayed to the model: the first (system) message
/// plus this many of the most recent messages.
pub const MAX_HISTORY_MESSAGES: usize = 50;

/// Shrinks long histories to the system prompt plus the newest
/// `MAX_HISTORY_MESSAGES` entries. Tool messages left at the head of the
/// window are dropped, since a tool result without its assistant call is
/// rejected by the completion API.
pub fn trim_history(messages: &[StoredMessage]) -> Vec<StoredMessage> {
    if messages.len() <= MAX_HISTORY_MESSAGES {
        return messages.to_vec();
    }
    let tail = &messages[messages.len() - MAX_HISTORY_MESSAGES..];
    let skip = tail.iter().take_while(|m| m.role == role::TOOL).count();

    let mut trimmed = Vec::with_capacity(1 + tail.len() - skip);
    trimmed.push(messages[0].clone());
    trimmed.extend_from_slice(&tail[skip..]);
    trimmed
}

pub fn greeting_prefix(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        "Hi".to_string()
    } else {
        format!("Hi {name}")
    }
}

/// Puts the one-time greeting above the answer text.
pub fn prefix_greeting(name: &str, text: &str) -> String {
    format!("{}\n\n{}", greeting_prefix(name), text)
        .trim()
        .to_string()
}

fn for_model(messages: &[StoredMessage]) -> Vec<ChatMessage> {
    trim_history(messages).iter().map(ChatMessage::from).collect()
}

/// One full assistant turn: append the user message, let the model pick
/// tools, execute them, and ask for the final answer. The caller owns
/// persisting `messages` afterwards.
pub async fn run_turn(
    state: &AppState,
    user_id: &str,
    session_id: &str,
    messages: &mut Vec<StoredMessage>,
    user_text: &str,
) -> Result<(String, Vec<ToolRun>), LlmError> {
    messages.push(StoredMessage::user(user_text));

    let opts = ChatOptions {
        tools: Some(state.tool_specs.as_slice()),
        ..ChatOptions::default()
    };
    let first = state.llm.chat(&for_model(messages), opts).await?;

    let mut tool_runs = Vec::new();
    let answer = match first.tool_calls {
        Some(calls) if !calls.is_empty() => {
            debug!("model requested {} tool call(s)", calls.len());
            messages.push(StoredMessage::assistant_with_calls(
                first.content.clone(),
                calls.clone(),
            ));

            for call in &calls {
                let run = run_tool_call(state, user_id, session_id, call).await;
                let content = serde_json::to_string(&run.result).unwrap_or_default();
                messages.push(StoredMessage::tool(&call.id, &call.function.name, &content));
                tool_runs.push(run);
            }

            let second = state
                .llm
                .chat(&for_model(messages), ChatOptions::default())
                .await?;
            second.content.unwrap_or_default()
        }
        _ => first.content.unwrap_or_default(),
    };

    Ok((answer, tool_runs))
}

/// One-sentence summary of the whole session, with a deterministic fallback
/// when the model returns nothing.
pub async fn run_summary(
    state: &AppState,
    messages: &[StoredMessage],
) -> Result<String, LlmError> {
    let mut history = for_model(messages);
    history.push(ChatMessage::user(SUMMARY_INSTRUCTION));

    let reply = state.llm.chat(&history, ChatOptions::default()).await?;
    let text = reply.content.unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return Ok(fallback_summary(messages));
    }
    Ok(text)
}

/// Joins the last two user messages when the model has nothing to say.
pub fn fallback_summary(messages: &[StoredMessage]) -> String {
    let user_texts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == role::USER)
        .filter_map(|m| m.content.as_deref())
        .collect();
    let tail_start = user_texts.len().saturating_sub(2);
    let tail = &user_texts[tail_start..];
    if tail.is_empty() {
        "A short conversation.".to_string()
    } else {
        format!("Quick summary: {}", tail.join("; "))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_history(len: usize) -> Vec<StoredMessage> {
        let mut messages = vec![StoredMessage::system("prompt")];
        for i in 1..len {
            if i % 2 == 1 {
                messages.push(StoredMessage::user(&format!("question {i}")));
            } else {
                messages.push(StoredMessage::assistant(&format!("answer {i}")));
            }
        }
        messages
    }

    #[test]
    fn test_trim_keeps_short_histories_intact() {
        let messages = make_history(MAX_HISTORY_MESSAGES);
        let trimmed = trim_history(&messages);
        assert_eq!(trimmed.len(), messages.len());
    }

    #[test]
    fn test_trim_keeps_system_prompt_and_newest_tail() {
        let messages = make_history(120);
        let trimmed = trim_history(&messages);
        assert_eq!(trimmed.len(), 1 + MAX_HISTORY_MESSAGES);
        assert_eq!(trimmed[0].role, role::SYSTEM);
        assert_eq!(
            trimmed.last().unwrap().content,
            messages.last().unwrap().content
        );
    }

    #[test]
    fn test_trim_drops_orphaned_tool_messages_at_window_head() {
        let mut messages = make_history(120);
        // Force the trimmed window to open with tool results.
        let head = messages.len() - MAX_HISTORY_MESSAGES;
        messages[head] = StoredMessage::tool("call_1", "list_talent", "[]");
        messages[head + 1] = StoredMessage::tool("call_2", "list_companies", "[]");

        let trimmed = trim_history(&messages);
        assert_eq!(trimmed[0].role, role::SYSTEM);
        assert_ne!(trimmed[1].role, role::TOOL);
        assert_eq!(trimmed.len(), 1 + MAX_HISTORY_MESSAGES - 2);
    }

    #[test]
    fn test_greeting_prefix() {
        assert_eq!(greeting_prefix("Budi"), "Hi Budi");
        assert_eq!(greeting_prefix("  "), "Hi");
    }

    #[test]
    fn test_prefix_greeting_joins_with_blank_line() {
        assert_eq!(prefix_greeting("Budi", "Welcome back."), "Hi Budi\n\nWelcome back.");
        assert_eq!(prefix_greeting("Budi", ""), "Hi Budi");
    }

    #[test]
    fn test_fallback_summary_joins_last_two_user_messages() {
        let messages = vec![
            StoredMessage::system("prompt"),
            StoredMessage::user("first"),
            StoredMessage::assistant("ok"),
            StoredMessage::user("second"),
            StoredMessage::user("third"),
        ];
        assert_eq!(fallback_summary(&messages), "Quick summary: second; third");
    }

    #[test]
    fn test_fallback_summary_without_user_messages() {
        let messages = vec![StoredMessage::system("prompt")];
        assert_eq!(fallback_summary(&messages), "A short conversation.");
    }
}
