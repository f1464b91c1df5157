use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::message::StoredMessage;

/// One chat session, unique per `(user_name, session_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_name: String,
    pub session_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Json<Vec<StoredMessage>>,
    pub resets_count: i32,
    pub checkpoints: Json<Vec<Checkpoint>>,
    /// `{"type": "talent" | "company", "name": ...}` resolved at creation.
    pub identity: Option<Value>,
    pub greeted: bool,
}

/// Marker appended by a logical reset. Messages are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub at: DateTime<Utc>,
    pub note: String,
}
