//! Session persistence.
//!
//! One row per (user, session) pair; history, checkpoints, and identity ride
//! along as JSONB. All writes bump `updated_at` except the identity sync,
//! which is a background correction rather than user activity.

use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::message::StoredMessage;
use crate::models::session::{Checkpoint, SessionRow};

use super::prompts::DEFAULT_TITLE;

pub async fn find_session(
    db: &PgPool,
    user_name: &str,
    session_id: &str,
) -> Result<Option<SessionRow>, sqlx::Error> {
    sqlx::query_as::<_, SessionRow>(
        "SELECT * FROM chat_sessions WHERE user_name = $1 AND session_id = $2",
    )
    .bind(user_name)
    .bind(session_id)
    .fetch_optional(db)
    .await
}

/// Fetches the session, creating it seeded with the system prompt when it
/// does not exist. Losing the insert race is fine: the winner's row is
/// fetched instead.
pub async fn get_or_create_session(
    db: &PgPool,
    user_name: &str,
    session_id: &str,
    system_prompt: &str,
    identity: Option<&Value>,
) -> Result<SessionRow, sqlx::Error> {
    if let Some(row) = find_session(db, user_name, session_id).await? {
        return Ok(row);
    }

    let seed = vec![StoredMessage::system(system_prompt)];
    let inserted = sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO chat_sessions (id, user_name, session_id, title, messages, identity)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_name, session_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_name)
    .bind(session_id)
    .bind(DEFAULT_TITLE)
    .bind(Json(&seed))
    .bind(identity.map(Json))
    .fetch_optional(db)
    .await?;

    match inserted {
        Some(row) => Ok(row),
        None => find_session(db, user_name, session_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound),
    }
}

/// Creates a session with an explicit title and seed history. Used by the
/// chat-starting tools, where the session id is freshly generated.
pub async fn create_session(
    db: &PgPool,
    user_name: &str,
    session_id: &str,
    title: &str,
    messages: &[StoredMessage],
    identity: Option<Value>,
) -> Result<SessionRow, sqlx::Error> {
    sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO chat_sessions (id, user_name, session_id, title, messages, identity)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_name)
    .bind(session_id)
    .bind(title)
    .bind(Json(messages))
    .bind(identity.map(Json))
    .fetch_one(db)
    .await
}

/// Persists the full message history and the greeted flag. Returns the
/// affected row count for the write receipt.
pub async fn save_messages(
    db: &PgPool,
    id: Uuid,
    messages: &[StoredMessage],
    greeted: bool,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE chat_sessions SET messages = $2, greeted = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(Json(messages))
    .bind(greeted)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

pub async fn sync_identity(db: &PgPool, id: Uuid, identity: &Value) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chat_sessions SET identity = $2 WHERE id = $1")
        .bind(id)
        .bind(Json(identity))
        .execute(db)
        .await?;
    Ok(())
}

/// Marks a logical reset: bumps the counter, records the checkpoint, and
/// re-arms the greeting. History is kept.
pub async fn logical_reset(
    db: &PgPool,
    id: Uuid,
    checkpoint: &Checkpoint,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        r#"
        UPDATE chat_sessions
        SET resets_count = resets_count + 1,
            checkpoints = checkpoints || $2,
            greeted = FALSE,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(Json(checkpoint))
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

/// Wipes the history back to a lone system prompt and refreshes the stored
/// identity. Checkpoints and the reset counter survive.
pub async fn hard_reset(
    db: &PgPool,
    id: Uuid,
    system_prompt: &str,
    identity: Option<&Value>,
) -> Result<u64, sqlx::Error> {
    let seed = vec![StoredMessage::system(system_prompt)];
    let res = sqlx::query(
        r#"
        UPDATE chat_sessions
        SET messages = $2,
            identity = $3,
            greeted = FALSE,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(Json(&seed))
    .bind(identity.map(Json))
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

pub async fn session_count(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chat_sessions")
        .fetch_one(db)
        .await
}
