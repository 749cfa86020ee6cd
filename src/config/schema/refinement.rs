use serde::{Deserialize, Serialize};

/// Tunables of the bounded refinement loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Overall score at or above which an asset needs no refinement.
    #[serde(default = "default_target_consistency")]
    pub target_consistency: f64,
    /// Working score at which the loop stops before exhausting iterations.
    #[serde(default = "default_early_exit_threshold")]
    pub early_exit_threshold: f64,

    /// Iteration 0 targets metrics below this bound.
    #[serde(default = "default_critical_band_max")]
    pub critical_band_max: f64,
    /// Iteration 1 targets metrics in [critical_band_max, moderate_band_max).
    #[serde(default = "default_moderate_band_max")]
    pub moderate_band_max: f64,
    /// Iterations ≥2 target metrics in [moderate_band_max, fine_tune_band_max).
    #[serde(default = "default_fine_tune_band_max")]
    pub fine_tune_band_max: f64,
    #[serde(default = "default_max_targets")]
    pub max_targets_per_iteration: usize,
    /// Metric names targeted when no metric falls into the iteration's band.
    #[serde(default = "default_fallback_targets")]
    pub fallback_targets: Vec<String>,

    /// Deterministic metadata bump applied when no generator is available.
    #[serde(default = "default_quality_bump")]
    pub quality_bump: f64,
    #[serde(default = "default_alignment_bump")]
    pub alignment_bump: f64,
    #[serde(default = "default_bump_ceiling")]
    pub bump_ceiling: f64,
}

fn default_max_iterations() -> usize {
    3
}
fn default_target_consistency() -> f64 {
    0.85
}
fn default_early_exit_threshold() -> f64 {
    0.90
}
fn default_critical_band_max() -> f64 {
    0.75
}
fn default_moderate_band_max() -> f64 {
    0.85
}
fn default_fine_tune_band_max() -> f64 {
    0.90
}
fn default_max_targets() -> usize {
    3
}
fn default_fallback_targets() -> Vec<String> {
    vec![
        "color_consistency".into(),
        "style_consistency".into(),
        "brand_personality_alignment".into(),
    ]
}
fn default_quality_bump() -> f64 {
    0.05
}
fn default_alignment_bump() -> f64 {
    0.03
}
fn default_bump_ceiling() -> f64 {
    0.95
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            target_consistency: default_target_consistency(),
            early_exit_threshold: default_early_exit_threshold(),
            critical_band_max: default_critical_band_max(),
            moderate_band_max: default_moderate_band_max(),
            fine_tune_band_max: default_fine_tune_band_max(),
            max_targets_per_iteration: default_max_targets(),
            fallback_targets: default_fallback_targets(),
            quality_bump: default_quality_bump(),
            alignment_bump: default_alignment_bump(),
            bump_ceiling: default_bump_ceiling(),
        }
    }
}
