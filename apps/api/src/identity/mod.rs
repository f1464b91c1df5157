//! Identity resolution against the admin API.
//!
//! A caller identifies itself with a free-text `user_id`: a numeric record id,
//! a talent name, or a company name. Resolution looks the string up in both
//! the talent and company directories and keeps the closest match, scored by
//! `name_match_score`.

use std::collections::HashSet;

use serde_json::{json, Value};
use tracing::warn;

use crate::admin::AdminClient;

/// Query substrings that suggest the caller is a company, not a person.
const COMPANY_MARKERS: [&str; 11] = [
    "-", " inc", " llc", " ltd", " pt ", " tbk", " corp", " co ", " gmbh", " s.r.l", " s.a",
];

/// How far company search results are nudged when the query itself looks like
/// a company name.
const COMPANY_MARKER_BONUS: f64 = 3.0;

const SEARCH_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    Talent,
    Company,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Talent => "talent",
            IdentityKind::Company => "company",
        }
    }
}

/// A resolved caller identity: which directory matched, the display name, and
/// the raw record it came from.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub kind: IdentityKind,
    pub name: String,
    pub raw: Value,
}

impl ResolvedIdentity {
    /// The compact `{"type", "name"}` form stored on sessions and returned in
    /// responses. The raw record never leaves the process this way.
    pub fn summary(&self) -> Value {
        json!({ "type": self.kind.as_str(), "name": self.name })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Name scoring
// ────────────────────────────────────────────────────────────────────────────

/// Scores how well `candidate_name` matches `query`, 0..100:
///
/// 1. equal after trim + lowercase        -> 100
/// 2. slug equal (diacritics folded)      -> 95
/// 3. substring containment either way    -> 80
/// 4. token-set Jaccard overlap           -> 60 * jaccard (only when > 0)
/// 5. otherwise (including empty input)   -> 0
pub fn name_match_score(candidate_name: &str, query: &str) -> f64 {
    let a = candidate_name.trim().to_lowercase();
    let b = query.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a == b {
        return 100.0;
    }

    let sa = slug(&a);
    let sb = slug(&b);
    if !sa.is_empty() && sa == sb {
        return 95.0;
    }

    if a.contains(&b) || b.contains(&a) {
        return 80.0;
    }

    let ta = token_set(&a);
    let tb = token_set(&b);
    if !ta.is_empty() && !tb.is_empty() {
        let inter = ta.intersection(&tb).count();
        let union = ta.union(&tb).count();
        let jacc = if union > 0 {
            inter as f64 / union as f64
        } else {
            0.0
        };
        if jacc > 0.0 {
            return 60.0 * jacc;
        }
    }

    0.0
}

/// Lowercases, folds common accented Latin letters to their ASCII base, and
/// drops everything that is not alphanumeric.
pub fn slug(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(fold_diacritic)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// ASCII-alphanumeric tokens of a lowercased string.
fn token_set(s: &str) -> HashSet<&str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Picks the object whose display name scores highest against `query`.
/// First entry wins on ties.
pub fn best_match_by_name<'a>(objects: &'a [Value], query: &str) -> Option<&'a Value> {
    let mut best: Option<&Value> = None;
    let mut best_score = -1.0_f64;
    for obj in objects {
        let name = display_name(obj, "");
        let score = name_match_score(&name, query);
        if score > best_score {
            best_score = score;
            best = Some(obj);
        }
    }
    best
}

/// Extracts a human-readable name from an opaque admin record.
/// Falls back to a joined first/last name pair, then to `default`.
pub fn display_name(obj: &Value, default: &str) -> String {
    if let Some(map) = obj.as_object() {
        for key in [
            "name",
            "full_name",
            "fullname",
            "display_name",
            "company_name",
            "title",
        ] {
            if let Some(v) = map.get(key).and_then(Value::as_str) {
                let v = v.trim();
                if !v.is_empty() {
                    return v.to_string();
                }
            }
        }
        let first = map
            .get("first_name")
            .or_else(|| map.get("firstname"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();
        let last = map
            .get("last_name")
            .or_else(|| map.get("lastname"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();
        let combo = format!("{first} {last}").trim().to_string();
        if !combo.is_empty() {
            return combo;
        }
    }
    default.to_string()
}

fn looks_like_company(query: &str) -> bool {
    let q = query.to_lowercase();
    COMPANY_MARKERS.iter().any(|marker| q.contains(marker))
}

// ────────────────────────────────────────────────────────────────────────────
// Resolution against the admin API
// ────────────────────────────────────────────────────────────────────────────

/// Resolves `user_id` to a talent or company record.
///
/// Numeric ids go straight to the detail endpoints, talent first. Anything
/// else is searched in both directories; the better-scoring match wins, with
/// a small bonus for companies when the query itself looks like a company
/// name. Exact ties prefer the company. Lookup failures on one directory
/// degrade to the other rather than failing the resolution.
pub async fn resolve_identity(admin: &AdminClient, user_id: &str) -> Option<ResolvedIdentity> {
    let uid = user_id.trim();
    if uid.is_empty() {
        return None;
    }

    if uid.chars().all(|c| c.is_ascii_digit()) {
        let id = uid.parse::<i64>().unwrap_or_default();
        match admin.talent_detail(id).await {
            Ok(t) if t.is_object() => {
                return Some(ResolvedIdentity {
                    kind: IdentityKind::Talent,
                    name: display_name(&t, uid),
                    raw: t,
                });
            }
            Ok(_) => {}
            Err(e) => warn!("talent detail lookup failed for id {id}: {e}"),
        }
        match admin.company_detail(id).await {
            Ok(c) if c.is_object() => {
                return Some(ResolvedIdentity {
                    kind: IdentityKind::Company,
                    name: display_name(&c, uid),
                    raw: c,
                });
            }
            Ok(_) => {}
            Err(e) => warn!("company detail lookup failed for id {id}: {e}"),
        }
        return None;
    }

    let companies = admin
        .list_companies(1, SEARCH_PAGE_SIZE, Some(uid))
        .await
        .unwrap_or_else(|e| {
            warn!("company search failed for '{uid}': {e}");
            Vec::new()
        });
    let talents = admin
        .list_talents(1, SEARCH_PAGE_SIZE, Some(uid))
        .await
        .unwrap_or_else(|e| {
            warn!("talent search failed for '{uid}': {e}");
            Vec::new()
        });

    let best_company = best_match_by_name(&companies, uid);
    let best_talent = best_match_by_name(&talents, uid);

    let mut company_score = best_company
        .map(|c| name_match_score(&display_name(c, ""), uid))
        .unwrap_or(-1.0);
    let talent_score = best_talent
        .map(|t| name_match_score(&display_name(t, ""), uid))
        .unwrap_or(-1.0);

    if looks_like_company(uid) && company_score >= 0.0 {
        company_score += COMPANY_MARKER_BONUS;
    }

    let as_company = |c: &Value| ResolvedIdentity {
        kind: IdentityKind::Company,
        name: display_name(c, uid),
        raw: c.clone(),
    };
    let as_talent = |t: &Value| ResolvedIdentity {
        kind: IdentityKind::Talent,
        name: display_name(t, uid),
        raw: t.clone(),
    };

    if company_score > talent_score {
        if let Some(c) = best_company {
            return Some(as_company(c));
        }
    }
    if talent_score > company_score {
        if let Some(t) = best_talent {
            return Some(as_talent(t));
        }
    }
    // Tie: prefer the company
    if let Some(c) = best_company {
        return Some(as_company(c));
    }
    if let Some(t) = best_talent {
        return Some(as_talent(t));
    }

    warn!("no talent or company match for user_id '{uid}'");
    None
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_match_scores_100() {
        assert_eq!(name_match_score("Budi Santoso", "Budi Santoso"), 100.0);
    }

    #[test]
    fn test_exact_match_is_case_and_whitespace_insensitive() {
        assert_eq!(name_match_score("  budi santoso ", "BUDI SANTOSO"), 100.0);
    }

    #[test]
    fn test_slug_match_scores_95() {
        assert_eq!(name_match_score("Budi-Santoso", "budi santoso"), 95.0);
    }

    #[test]
    fn test_slug_match_folds_diacritics() {
        assert_eq!(name_match_score("José Núñez", "jose nunez"), 95.0);
    }

    #[test]
    fn test_substring_scores_80() {
        assert_eq!(name_match_score("Budi", "Budi Santoso"), 80.0);
        assert_eq!(name_match_score("Budi Santoso", "Budi"), 80.0);
    }

    #[test]
    fn test_token_overlap_scores_60_times_jaccard() {
        // {budi, santoso} vs {santoso, wijaya}: 1 of 3 tokens shared
        let score = name_match_score("Budi Santoso", "Santoso Wijaya");
        assert!((score - 20.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_token_overlap_is_symmetric() {
        let ab = name_match_score("Budi Santoso", "Santoso Wijaya");
        let ba = name_match_score("Santoso Wijaya", "Budi Santoso");
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_disjoint_names_score_0() {
        assert_eq!(name_match_score("Budi Santoso", "Citra Lestari"), 0.0);
    }

    #[test]
    fn test_empty_either_side_scores_0() {
        assert_eq!(name_match_score("", "Budi"), 0.0);
        assert_eq!(name_match_score("Budi", "   "), 0.0);
    }

    #[test]
    fn test_slug_strips_non_alphanumerics() {
        assert_eq!(slug("PT. Alta-Teknologi 21"), "ptaltateknologi21");
    }

    #[test]
    fn test_slug_keeps_non_latin_letters() {
        assert_eq!(slug("東京 Tower"), "東京tower");
    }

    #[test]
    fn test_display_name_prefers_name_key() {
        let obj = json!({"name": "Budi", "title": "Engineer"});
        assert_eq!(display_name(&obj, "x"), "Budi");
    }

    #[test]
    fn test_display_name_skips_blank_values() {
        let obj = json!({"name": "  ", "company_name": "Alta Teknologi"});
        assert_eq!(display_name(&obj, "x"), "Alta Teknologi");
    }

    #[test]
    fn test_display_name_joins_first_and_last() {
        let obj = json!({"first_name": "Budi", "last_name": "Santoso"});
        assert_eq!(display_name(&obj, "x"), "Budi Santoso");
        let half = json!({"firstname": "Budi"});
        assert_eq!(display_name(&half, "x"), "Budi");
    }

    #[test]
    fn test_display_name_falls_back_to_default() {
        assert_eq!(display_name(&json!({}), "fallback"), "fallback");
        assert_eq!(display_name(&json!(null), "fallback"), "fallback");
    }

    #[test]
    fn test_best_match_picks_highest_score() {
        let objects = vec![
            json!({"name": "Citra Lestari"}),
            json!({"name": "Budi Santoso"}),
            json!({"name": "Budi"}),
        ];
        let best = best_match_by_name(&objects, "Budi Santoso").unwrap();
        assert_eq!(best["name"], "Budi Santoso");
    }

    #[test]
    fn test_best_match_first_wins_on_tie() {
        let objects = vec![json!({"name": "Alpha"}), json!({"name": "Beta"})];
        // Both score 0 against an unrelated query; the first entry is kept.
        let best = best_match_by_name(&objects, "Zeta").unwrap();
        assert_eq!(best["name"], "Alpha");
    }

    #[test]
    fn test_best_match_empty_list_is_none() {
        assert!(best_match_by_name(&[], "Budi").is_none());
    }

    #[test]
    fn test_company_markers() {
        assert!(looks_like_company("Alta-Teknologi"));
        assert!(looks_like_company("acme inc"));
        assert!(looks_like_company("PT Maju Tbk"));
        assert!(!looks_like_company("Budi Santoso"));
    }

    #[test]
    fn test_identity_summary_shape() {
        let identity = ResolvedIdentity {
            kind: IdentityKind::Talent,
            name: "Budi".to_string(),
            raw: json!({"id": 7}),
        };
        assert_eq!(
            identity.summary(),
            json!({"type": "talent", "name": "Budi"})
        );
    }
}
