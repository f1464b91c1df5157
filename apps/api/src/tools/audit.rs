//! Audit log for tool calls.
//!
//! Every invocation lands in its own file under the configured log directory
//! so operators can reconstruct what the model did on behalf of a user. Log
//! failures are reported but never fail the chat turn.

use std::io;
use std::path::Path;

use chrono::Utc;
use tracing::warn;

use super::dispatch::ToolRun;

pub async fn log_tool_call(dir: &str, user_id: &str, session_id: &str, run: &ToolRun) {
    if let Err(e) = try_log(Path::new(dir), user_id, session_id, run).await {
        warn!("failed to write the tool audit log: {e}");
    }
}

async fn try_log(dir: &Path, user_id: &str, session_id: &str, run: &ToolRun) -> io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(&run.name, session_id));
    tokio::fs::write(&path, render(user_id, session_id, run)).await
}

fn file_name(tool: &str, session_id: &str) -> String {
    let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let sid: String = session_id.chars().take(8).collect();
    format!("{stamp}__{tool}_{sid}.log")
}

fn render(user_id: &str, session_id: &str, run: &ToolRun) -> String {
    let at = Utc::now().format("%Y/%m/%d %H:%M:%S");
    let args = serde_json::to_string(&run.args).unwrap_or_default();
    let result = serde_json::to_string_pretty(&run.result).unwrap_or_default();
    format!(
        "[{at}] [User: {user_id}, Session: {session_id}]\nCalled: {}({args})\nResult: {result}\n",
        run.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_run() -> ToolRun {
        ToolRun {
            name: "list_talent".to_string(),
            args: json!({"page": 1}),
            result: json!([{"id": 1, "name": "Budi"}]),
        }
    }

    #[test]
    fn test_file_name_shape() {
        let name = file_name("list_talent", "0d9f3a77-abcd-4000-8000-000000000000");
        assert!(name.ends_with("__list_talent_0d9f3a77.log"), "{name}");
    }

    #[test]
    fn test_render_contains_call_and_result() {
        let body = render("budi", "sess-1", &make_run());
        assert!(body.contains("[User: budi, Session: sess-1]"));
        assert!(body.contains("Called: list_talent({\"page\":1})"));
        assert!(body.contains("\"name\": \"Budi\""));
    }

    #[tokio::test]
    async fn test_try_log_writes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        try_log(dir.path(), "budi", "sess-1", &make_run())
            .await
            .unwrap();

        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        let entry = entries.next().unwrap().unwrap();
        let body = std::fs::read_to_string(entry.path()).unwrap();
        assert!(body.contains("Called: list_talent"));
    }

    #[tokio::test]
    async fn test_try_log_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs/tools");
        try_log(&nested, "budi", "sess-1", &make_run())
            .await
            .unwrap();
        assert!(nested.read_dir().unwrap().next().is_some());
    }
}
