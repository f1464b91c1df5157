pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat_handlers;
use crate::recommend::handlers as recommend_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::api_health_handler))
        // Chat & session lifecycle
        .route("/api/chat", post(chat_handlers::chat))
        .route("/api/history", get(chat_handlers::history))
        .route("/api/session/:session_id", get(chat_handlers::session))
        .route("/api/reset", post(chat_handlers::reset))
        .route("/api/hard_reset", post(chat_handlers::hard_reset))
        // Recommendations
        .route("/api/info", get(recommend_handlers::info))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm_client::LlmClient;
    use crate::recommend::SkillOverlapRanker;

    fn make_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/test".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            openai_api_key: "test-key".to_string(),
            admin_base_url: "http://localhost:8000".to_string(),
            admin_panel: "admin".to_string(),
            admin_login_email: None,
            admin_login_password: None,
            tool_log_dir: "logs/tools".to_string(),
            port: 3000,
            rust_log: "info".to_string(),
        };
        let db = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        let redis = redis::Client::open(config.redis_url.as_str()).unwrap();
        let admin = crate::admin::AdminClient::new(&config, redis);
        AppState {
            db,
            llm: LlmClient::new(config.openai_api_key.clone()),
            admin,
            ranker: Arc::new(SkillOverlapRanker),
            tool_specs: Arc::new(crate::tools::tool_specs()),
            config,
        }
    }

    #[tokio::test]
    async fn test_health_route_responds_without_backends() {
        let app = build_router(make_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
