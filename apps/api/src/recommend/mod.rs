//! Job recommendations — pluggable, trait-based ranking of openings against
//! a talent profile.
//!
//! Default: `LlmJobRanker` (scores via the model, degrades to skill overlap
//! when the call fails). `SkillOverlapRanker` is the deterministic backend.
//!
//! `AppState` holds an `Arc<dyn JobRanker>`, swapped at startup.

pub mod handlers;
mod prompts;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::llm_client::{strip_json_fences, ChatMessage, ChatOptions, LlmClient, LlmError};

use prompts::{RANKING_FORMAT_INSTRUCTION, RANKING_SYSTEM_PROMPT};

/// Openings beyond this count are not sent to the model.
const MAX_JOBS_FOR_RANKING: usize = 50;
/// Points per shared skill in the overlap fallback.
const OVERLAP_POINTS_PER_SKILL: f64 = 10.0;

const OVERLAP_REASON: &str =
    "Score based on simple overlap between candidate skills and requirements.";

// ────────────────────────────────────────────────────────────────────────────
// Data models (shared across all ranker backends)
// ────────────────────────────────────────────────────────────────────────────

/// The talent half of a ranking request.
#[derive(Debug, Clone, Serialize)]
pub struct TalentProfile {
    pub name: String,
    pub skills: Vec<String>,
}

/// A job opening reduced to the fields that matter for matching. Admin API
/// records vary wildly in shape; `simplify_job` flattens the variants.
#[derive(Debug, Clone, Serialize)]
pub struct SimplifiedJob {
    pub id: Value,
    pub title: String,
    pub company_name: String,
    pub skills: Vec<String>,
    pub requirements: String,
    pub location: String,
}

/// One scored opening. Rankers return these sorted best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedJob {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The job ranker trait. Implement this to swap backends without touching
/// the endpoint or handler code.
///
/// Ranking is best-effort and never fails the request: backends degrade to
/// a cheaper strategy internally instead of returning an error.
#[async_trait]
pub trait JobRanker: Send + Sync {
    async fn rank(&self, talent: &TalentProfile, openings: &[SimplifiedJob]) -> Vec<RankedJob>;
}

// ────────────────────────────────────────────────────────────────────────────
// SkillOverlapRanker — deterministic backend
// ────────────────────────────────────────────────────────────────────────────

/// Counts case-insensitive skill intersections, ten points apiece.
pub struct SkillOverlapRanker;

#[async_trait]
impl JobRanker for SkillOverlapRanker {
    async fn rank(&self, talent: &TalentProfile, openings: &[SimplifiedJob]) -> Vec<RankedJob> {
        overlap_rank(talent, openings)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmJobRanker — default backend
// ────────────────────────────────────────────────────────────────────────────

/// Ranks via a chat completion; falls back to `overlap_rank` when the model
/// call fails or the reply is not parseable.
pub struct LlmJobRanker {
    llm: LlmClient,
}

impl LlmJobRanker {
    pub fn new(llm: LlmClient) -> Self {
        LlmJobRanker { llm }
    }

    async fn rank_via_model(
        &self,
        talent: &TalentProfile,
        openings: &[SimplifiedJob],
    ) -> Result<Vec<RankedJob>, LlmError> {
        let payload = json!({ "talent": talent, "openings": openings });
        let messages = vec![
            ChatMessage::system(RANKING_SYSTEM_PROMPT),
            ChatMessage::user(RANKING_FORMAT_INSTRUCTION),
            ChatMessage::user(serde_json::to_string(&payload).unwrap_or_default()),
        ];
        let reply = self.llm.chat(&messages, ChatOptions::default()).await?;
        let text = reply.content.unwrap_or_default();
        Ok(parse_ranked(&text)?)
    }
}

#[async_trait]
impl JobRanker for LlmJobRanker {
    async fn rank(&self, talent: &TalentProfile, openings: &[SimplifiedJob]) -> Vec<RankedJob> {
        let capped = &openings[..openings.len().min(MAX_JOBS_FOR_RANKING)];
        match self.rank_via_model(talent, capped).await {
            Ok(mut ranked) => {
                sort_ranked(&mut ranked);
                ranked
            }
            Err(e) => {
                warn!("LLM ranking failed, using skill overlap: {e}");
                overlap_rank(talent, capped)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core ranking helpers
// ────────────────────────────────────────────────────────────────────────────

/// Scores openings by shared skills with the talent, best first. Stable, so
/// equally scored openings keep the admin API's order.
pub fn overlap_rank(talent: &TalentProfile, openings: &[SimplifiedJob]) -> Vec<RankedJob> {
    let talent_skills: HashSet<String> = talent
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut ranked: Vec<RankedJob> = openings
        .iter()
        .map(|job| {
            let shared = job
                .skills
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| talent_skills.contains(s))
                .collect::<HashSet<_>>()
                .len();
            RankedJob {
                id: job.id.clone(),
                title: job.title.clone(),
                company_name: job.company_name.clone(),
                score: Some(shared as f64 * OVERLAP_POINTS_PER_SKILL),
                reason: Some(OVERLAP_REASON.to_string()),
            }
        })
        .collect();
    sort_ranked(&mut ranked);
    ranked
}

/// Orders by score descending; an absent score counts as zero. Stable.
fn sort_ranked(ranked: &mut [RankedJob]) {
    ranked.sort_by(|a, b| {
        let a = a.score.unwrap_or(0.0);
        let b = b.score.unwrap_or(0.0);
        b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Parses a ranking reply: a direct JSON array, or the first `[` .. last `]`
/// slice of a chatty reply.
fn parse_ranked(text: &str) -> Result<Vec<RankedJob>, serde_json::Error> {
    let text = strip_json_fences(text);
    match serde_json::from_str::<Vec<RankedJob>>(text) {
        Ok(ranked) => Ok(ranked),
        Err(e) => match extract_json_array(text) {
            Some(slice) => serde_json::from_str(slice),
            None => Err(e),
        },
    }
}

/// Slices from the first `[` to the last `]`, if both exist in order.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shaping admin API records
// ────────────────────────────────────────────────────────────────────────────

/// Flattens a raw job-opening record into a `SimplifiedJob`, tolerating the
/// field-name variants the admin API emits.
pub fn simplify_job(raw: &Value) -> SimplifiedJob {
    let id = raw
        .get("id")
        .or_else(|| raw.get("_id"))
        .or_else(|| raw.get("job_id"))
        .cloned()
        .unwrap_or(Value::Null);
    let title = first_string(raw, &["title", "position", "role"]).unwrap_or_default();
    let company_name = first_string(raw, &["company_name"])
        .or_else(|| {
            raw.get("company")
                .and_then(|c| c.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    let skills = raw
        .get("skills")
        .or_else(|| raw.get("required_skills"))
        .map(string_list)
        .unwrap_or_default();
    let requirements = first_string(raw, &["requirements", "body"]).unwrap_or_default();
    let location = first_string(raw, &["location", "city", "region"]).unwrap_or_default();

    SimplifiedJob {
        id,
        title,
        company_name,
        skills,
        requirements,
        location,
    }
}

/// Pulls a skill list out of a raw talent record. Skills arrive as a JSON
/// array, a JSON-encoded string, or a comma-separated string, under `skills`
/// or one of a few legacy keys.
pub fn extract_skills(raw: &Value) -> Vec<String> {
    for key in ["skills", "skill_list", "keahlian", "competencies"] {
        let Some(v) = raw.get(key) else { continue };
        let skills = match v {
            Value::Array(_) => string_list(v),
            Value::String(s) => {
                // Some records store the array itself JSON-encoded.
                if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                    if parsed.is_array() {
                        string_list(&parsed)
                    } else {
                        split_commas(s)
                    }
                } else {
                    split_commas(s)
                }
            }
            _ => Vec::new(),
        };
        if !skills.is_empty() {
            return skills;
        }
    }
    Vec::new()
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        raw.get(k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn string_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn split_commas(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_talent(skills: &[&str]) -> TalentProfile {
        TalentProfile {
            name: "Budi".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn make_job(id: i64, title: &str, skills: &[&str]) -> SimplifiedJob {
        SimplifiedJob {
            id: json!(id),
            title: title.to_string(),
            company_name: "Acme".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            requirements: String::new(),
            location: String::new(),
        }
    }

    #[test]
    fn test_overlap_rank_ten_points_per_shared_skill() {
        let talent = make_talent(&["Rust", "SQL", "Go"]);
        let jobs = vec![
            make_job(1, "Backend", &["rust", "sql"]),
            make_job(2, "Data", &["python"]),
        ];
        let ranked = overlap_rank(&talent, &jobs);
        assert_eq!(ranked[0].score, Some(20.0));
        assert_eq!(ranked[1].score, Some(0.0));
    }

    #[test]
    fn test_overlap_rank_sorts_best_first() {
        let talent = make_talent(&["rust"]);
        let jobs = vec![
            make_job(1, "No match", &["php"]),
            make_job(2, "Match", &["rust"]),
        ];
        let ranked = overlap_rank(&talent, &jobs);
        assert_eq!(ranked[0].title, "Match");
        assert_eq!(ranked[1].title, "No match");
    }

    #[test]
    fn test_overlap_rank_is_stable_on_ties() {
        let talent = make_talent(&["rust"]);
        let jobs = vec![
            make_job(1, "First", &["rust"]),
            make_job(2, "Second", &["rust"]),
        ];
        let ranked = overlap_rank(&talent, &jobs);
        assert_eq!(ranked[0].title, "First");
        assert_eq!(ranked[1].title, "Second");
    }

    #[test]
    fn test_sort_ranked_treats_missing_score_as_zero() {
        let mut ranked = vec![
            RankedJob {
                id: Value::Null,
                title: "unscored".to_string(),
                company_name: String::new(),
                score: None,
                reason: None,
            },
            RankedJob {
                id: Value::Null,
                title: "scored".to_string(),
                company_name: String::new(),
                score: Some(5.0),
                reason: None,
            },
        ];
        sort_ranked(&mut ranked);
        assert_eq!(ranked[0].title, "scored");
    }

    #[test]
    fn test_parse_ranked_direct_array() {
        let text = r#"[{"id": 1, "title": "Dev", "company_name": "Acme", "score": 80, "reason": "good"}]"#;
        let ranked = parse_ranked(text).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, Some(80.0));
    }

    #[test]
    fn test_parse_ranked_digs_array_out_of_prose() {
        let text = "Here are the rankings:\n[{\"id\": 1, \"title\": \"Dev\"}]\nHope that helps!";
        let ranked = parse_ranked(text).unwrap();
        assert_eq!(ranked[0].title, "Dev");
        assert_eq!(ranked[0].score, None);
    }

    #[test]
    fn test_parse_ranked_rejects_garbage() {
        assert!(parse_ranked("no array here").is_err());
        assert!(parse_ranked("] backwards [").is_err());
    }

    #[test]
    fn test_simplify_job_field_variants() {
        let raw = json!({
            "job_id": 7,
            "position": "Backend Engineer",
            "company": {"name": "Acme"},
            "required_skills": ["Rust", "SQL"],
            "body": "3+ years experience",
            "city": "Jakarta"
        });
        let job = simplify_job(&raw);
        assert_eq!(job.id, json!(7));
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.company_name, "Acme");
        assert_eq!(job.skills, vec!["Rust", "SQL"]);
        assert_eq!(job.requirements, "3+ years experience");
        assert_eq!(job.location, "Jakarta");
    }

    #[test]
    fn test_simplify_job_empty_record() {
        let job = simplify_job(&json!({}));
        assert_eq!(job.id, Value::Null);
        assert!(job.title.is_empty());
        assert!(job.skills.is_empty());
    }

    #[test]
    fn test_extract_skills_from_array() {
        let raw = json!({"skills": ["Rust", " SQL ", 42]});
        assert_eq!(extract_skills(&raw), vec!["Rust", "SQL", "42"]);
    }

    #[test]
    fn test_extract_skills_from_json_encoded_string() {
        let raw = json!({"skills": "[\"Rust\", \"SQL\"]"});
        assert_eq!(extract_skills(&raw), vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_extract_skills_from_comma_string() {
        let raw = json!({"skills": "Rust, SQL, , Go"});
        assert_eq!(extract_skills(&raw), vec!["Rust", "SQL", "Go"]);
    }

    #[test]
    fn test_extract_skills_legacy_keys() {
        let raw = json!({"keahlian": "Rust, SQL"});
        assert_eq!(extract_skills(&raw), vec!["Rust", "SQL"]);
        let raw = json!({"skill_list": ["Go"]});
        assert_eq!(extract_skills(&raw), vec!["Go"]);
        assert!(extract_skills(&json!({})).is_empty());
    }
}
