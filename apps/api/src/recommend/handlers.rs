//! GET /api/info — the information button: who the caller is, the latest
//! openings, and ranked recommendations with display-ready lines.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::chat::handlers::{admin_auth, require_identity};
use crate::errors::AppError;
use crate::identity::{display_name, IdentityKind};
use crate::state::AppState;

use super::{extract_skills, simplify_job, RankedJob, SimplifiedJob, TalentProfile};

const DEFAULT_LIMIT: i64 = 30;
const MAX_LIMIT: i64 = 100;
/// At most this many display lines, however long the ranking is.
const RECOMMENDATION_LINES: usize = 10;

#[derive(Debug, Deserialize)]
pub struct InfoQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub talent_id: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub identity: Value,
    pub talent: TalentProfile,
    pub messages: Vec<String>,
    pub latest_openings: Vec<Value>,
    pub model_result: Vec<RankedJob>,
}

pub async fn info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<InfoQuery>,
) -> Result<Json<InfoResponse>, AppError> {
    let user_id = query.user_id.as_deref().map(str::trim).unwrap_or("");
    if user_id.is_empty() {
        return Err(AppError::Validation("user_id must be provided".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    admin_auth(&state, &headers, None).await?;
    let identity = require_identity(&state, user_id).await?;

    let talent_data = match identity.kind {
        // The search record can be thin; refetch by id when we have one.
        IdentityKind::Talent => match talent_id_of(&identity.raw) {
            Some(tid) => match state.admin.talent_detail(tid).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!("talent detail lookup failed, using search record: {e}");
                    identity.raw.clone()
                }
            },
            None => identity.raw.clone(),
        },
        // A company caller must say which talent to recommend for.
        IdentityKind::Company => {
            let talent_id = query.talent_id.as_deref().map(str::trim).unwrap_or("");
            if talent_id.is_empty() {
                return Err(AppError::Validation(
                    "include talent_id in the query for recommendations".to_string(),
                ));
            }
            let tid: i64 = talent_id
                .parse()
                .map_err(|_| AppError::Validation("talent_id must be numeric".to_string()))?;
            state.admin.talent_detail(tid).await.map_err(|e| {
                warn!("talent {tid} lookup failed: {e}");
                AppError::NotFound("Talent not found on the admin API".to_string())
            })?
        }
    };

    let openings = state
        .admin
        .list_job_openings(1, limit as u32, None)
        .await
        .map_err(|e| {
            warn!("job openings fetch failed: {e}");
            AppError::AdminApi("failed to fetch job openings from the admin API".to_string())
        })?;

    let profile = TalentProfile {
        name: display_name(&talent_data, "talent"),
        skills: extract_skills(&talent_data),
    };
    let simplified: Vec<SimplifiedJob> = openings.iter().map(simplify_job).collect();
    let ranking = state.ranker.rank(&profile, &simplified).await;

    let mut messages: Vec<String> = ranking
        .iter()
        .take(RECOMMENDATION_LINES)
        .map(recommendation_line)
        .collect();
    if messages.is_empty() {
        messages.push("General information: no job openings match right now.".to_string());
    }

    let latest_openings: Vec<Value> = openings.into_iter().take(limit as usize).collect();
    Ok(Json(InfoResponse {
        identity: identity.summary(),
        talent: profile,
        messages,
        latest_openings,
        model_result: ranking,
    }))
}

/// A usable numeric id out of a raw talent record. Zero and non-numeric ids
/// count as absent.
fn talent_id_of(raw: &Value) -> Option<i64> {
    let v = raw.get("id")?;
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|id| *id != 0)
}

fn recommendation_line(rec: &RankedJob) -> String {
    let title = if rec.title.trim().is_empty() {
        "(untitled)"
    } else {
        rec.title.trim()
    };
    let company = if rec.company_name.trim().is_empty() {
        "(company)"
    } else {
        rec.company_name.trim()
    };
    let score = rec
        .score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let reason = rec.reason.as_deref().unwrap_or("");
    format!("Recommended: {title} at {company} - score {score}. Reason: {reason}")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_rec(title: &str, company: &str, score: Option<f64>, reason: Option<&str>) -> RankedJob {
        RankedJob {
            id: Value::Null,
            title: title.to_string(),
            company_name: company.to_string(),
            score,
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_recommendation_line_full() {
        let rec = make_rec("Backend Dev", "Acme", Some(80.0), Some("strong skill match"));
        assert_eq!(
            recommendation_line(&rec),
            "Recommended: Backend Dev at Acme - score 80. Reason: strong skill match"
        );
    }

    #[test]
    fn test_recommendation_line_placeholders() {
        let rec = make_rec("", "  ", None, None);
        assert_eq!(
            recommendation_line(&rec),
            "Recommended: (untitled) at (company) - score -. Reason: "
        );
    }

    #[test]
    fn test_recommendation_line_fractional_score() {
        let rec = make_rec("Dev", "Acme", Some(82.5), Some("ok"));
        assert!(recommendation_line(&rec).contains("score 82.5"));
    }

    #[test]
    fn test_talent_id_of_variants() {
        assert_eq!(talent_id_of(&json!({"id": 12})), Some(12));
        assert_eq!(talent_id_of(&json!({"id": "34"})), Some(34));
        assert_eq!(talent_id_of(&json!({"id": 0})), None);
        assert_eq!(talent_id_of(&json!({"id": "abc"})), None);
        assert_eq!(talent_id_of(&json!({})), None);
    }

    #[test]
    fn test_limit_clamp_bounds() {
        for (given, want) in [(None, 30), (Some(0), 1), (Some(-5), 1), (Some(500), 100)] {
            let limit = given.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
            assert_eq!(limit, want);
        }
    }
}
