use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bounds and thresholds of the cross-project learning memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Overall score at or above which an outcome counts as a success pattern.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
    /// Overall score below which an outcome counts as a challenge pattern.
    #[serde(default = "default_challenge_threshold")]
    pub challenge_threshold: f64,
    /// Overall score at or above which strengths enter the best-practices list.
    #[serde(default = "default_practice_threshold")]
    pub practice_threshold: f64,

    #[serde(default = "default_success_bucket_cap")]
    pub success_bucket_cap: usize,
    #[serde(default = "default_challenge_bucket_cap")]
    pub challenge_bucket_cap: usize,
    #[serde(default = "default_practice_cap")]
    pub best_practices_cap: usize,
    #[serde(default = "default_practice_cap")]
    pub common_issues_cap: usize,

    #[serde(default = "default_trend_history_cap")]
    pub trend_history_cap: usize,
    /// Window size for trend comparison (recent window vs. the one before it).
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: f64,

    #[serde(default = "default_recent_scores_cap")]
    pub recent_scores_cap: usize,
    #[serde(default = "default_insights_best_practices")]
    pub insights_best_practices: usize,
    #[serde(default = "default_insights_common_issues")]
    pub insights_common_issues: usize,

    /// Fallback recommendations per asset type, used when no metric-driven
    /// recommendation exists for that type yet.
    #[serde(default = "default_fallback_recommendations")]
    pub fallback_recommendations: BTreeMap<String, Vec<String>>,
}

fn default_success_threshold() -> f64 {
    0.85
}
fn default_challenge_threshold() -> f64 {
    0.80
}
fn default_practice_threshold() -> f64 {
    0.90
}
fn default_success_bucket_cap() -> usize {
    10
}
fn default_challenge_bucket_cap() -> usize {
    5
}
fn default_practice_cap() -> usize {
    10
}
fn default_trend_history_cap() -> usize {
    20
}
fn default_trend_window() -> usize {
    5
}
fn default_trend_threshold() -> f64 {
    0.05
}
fn default_recent_scores_cap() -> usize {
    10
}
fn default_insights_best_practices() -> usize {
    5
}
fn default_insights_common_issues() -> usize {
    3
}

fn default_fallback_recommendations() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (
            "logo_primary".into(),
            vec![
                "Ensure the mark stays legible at small sizes.".into(),
                "Maintain brand color presence in every variant.".into(),
            ],
        ),
        (
            "logo_horizontal".into(),
            vec![
                "Keep lockup spacing consistent with the primary logo.".into(),
                "Preserve the wordmark's typography across variants.".into(),
            ],
        ),
        (
            "business_card".into(),
            vec![
                "Keep contact hierarchy clear and uncluttered.".into(),
                "Mirror letterhead styling for a unified print family.".into(),
            ],
        ),
        (
            "letterhead".into(),
            vec![
                "Leave generous margins for body content.".into(),
                "Anchor the logo to the same corner across documents.".into(),
            ],
        ),
        (
            "social_media_post".into(),
            vec![
                "Keep text readable at feed sizes.".into(),
                "Reuse the brand palette for instant recognition.".into(),
            ],
        ),
        (
            "flyer".into(),
            vec![
                "Lead with one dominant visual element.".into(),
                "Keep the call to action inside the brand color family.".into(),
            ],
        ),
        (
            "banner".into(),
            vec![
                "Design for extreme aspect ratios without crowding.".into(),
                "Keep the logo clear of the safe-area edges.".into(),
            ],
        ),
    ])
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            success_threshold: default_success_threshold(),
            challenge_threshold: default_challenge_threshold(),
            practice_threshold: default_practice_threshold(),
            success_bucket_cap: default_success_bucket_cap(),
            challenge_bucket_cap: default_challenge_bucket_cap(),
            best_practices_cap: default_practice_cap(),
            common_issues_cap: default_practice_cap(),
            trend_history_cap: default_trend_history_cap(),
            trend_window: default_trend_window(),
            trend_threshold: default_trend_threshold(),
            recent_scores_cap: default_recent_scores_cap(),
            insights_best_practices: default_insights_best_practices(),
            insights_common_issues: default_insights_common_issues(),
            fallback_recommendations: default_fallback_recommendations(),
        }
    }
}
