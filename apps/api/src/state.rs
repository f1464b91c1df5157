use std::sync::Arc;

use sqlx::PgPool;

use crate::admin::AdminClient;
use crate::config::Config;
use crate::llm_client::{LlmClient, ToolSpec};
use crate::recommend::JobRanker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Admin API client; owns the Redis-backed service-token cache.
    pub admin: AdminClient,
    pub config: Config,
    /// Pluggable job ranker. Default: LlmJobRanker with a skill-overlap fallback.
    pub ranker: Arc<dyn JobRanker>,
    /// Tool definitions sent with every first-stage completion.
    pub tool_specs: Arc<Vec<ToolSpec>>,
}
