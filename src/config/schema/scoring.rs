use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relative weight of each consistency metric in the overall score.
///
/// The weights deliberately sum to 1.28, matching the behavior of the system
/// this engine gates for: the overall score divides by the sum of weights
/// actually present, so the overweighting cancels out when all twelve
/// metrics are computed. Renormalizing to 1.0 would shift scores whenever a
/// metric is absent and break recorded history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricWeights {
    #[serde(default = "default_w_color")]
    pub color_consistency: f64,
    #[serde(default = "default_w_style")]
    pub style_consistency: f64,
    #[serde(default = "default_w_composition")]
    pub composition_consistency: f64,
    #[serde(default = "default_w_personality")]
    pub brand_personality_alignment: f64,
    #[serde(default = "default_w_values")]
    pub brand_values_expression: f64,
    #[serde(default = "default_w_audience")]
    pub target_audience_appropriateness: f64,
    #[serde(default = "default_w_professional")]
    pub professional_standards: f64,
    #[serde(default = "default_w_commercial")]
    pub commercial_viability: f64,
    #[serde(default = "default_w_scalability")]
    pub scalability_assessment: f64,
    #[serde(default = "default_w_dna")]
    pub visual_dna_match: f64,
    #[serde(default = "default_w_harmony")]
    pub cross_asset_harmony: f64,
    #[serde(default = "default_w_integration")]
    pub brand_system_integration: f64,
}

fn default_w_color() -> f64 {
    0.15
}
fn default_w_style() -> f64 {
    0.15
}
fn default_w_composition() -> f64 {
    0.10
}
fn default_w_personality() -> f64 {
    0.12
}
fn default_w_values() -> f64 {
    0.10
}
fn default_w_audience() -> f64 {
    0.08
}
fn default_w_professional() -> f64 {
    0.12
}
fn default_w_commercial() -> f64 {
    0.08
}
fn default_w_scalability() -> f64 {
    0.05
}
fn default_w_dna() -> f64 {
    0.15
}
fn default_w_harmony() -> f64 {
    0.08
}
fn default_w_integration() -> f64 {
    0.10
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            color_consistency: default_w_color(),
            style_consistency: default_w_style(),
            composition_consistency: default_w_composition(),
            brand_personality_alignment: default_w_personality(),
            brand_values_expression: default_w_values(),
            target_audience_appropriateness: default_w_audience(),
            professional_standards: default_w_professional(),
            commercial_viability: default_w_commercial(),
            scalability_assessment: default_w_scalability(),
            visual_dna_match: default_w_dna(),
            cross_asset_harmony: default_w_harmony(),
            brand_system_integration: default_w_integration(),
        }
    }
}

/// All tunables of the consistency scorer: weights, floors, caps, per-asset-
/// type base tables and the recommendation templates. Every value the scorer
/// would otherwise hard-code lives here so tests and hosts can substitute
/// their own policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringPolicy {
    #[serde(default)]
    pub weights: MetricWeights,

    /// Ceiling applied to capped metrics, leaving headroom below 1.0.
    #[serde(default = "default_score_ceiling")]
    pub score_ceiling: f64,
    /// Fallback used when a sub-score computation fails outright.
    #[serde(default = "default_metric_fallback")]
    pub metric_fallback: f64,

    /// Floor for color overlap against a non-empty baseline.
    #[serde(default = "default_color_floor")]
    pub color_floor: f64,
    /// Color score when the baseline is empty (first asset of a project).
    #[serde(default = "default_color_empty_baseline")]
    pub color_empty_baseline: f64,
    /// Floor for the DNA-match metric against a non-empty baseline.
    #[serde(default = "default_dna_floor")]
    pub dna_floor: f64,
    #[serde(default = "default_dna_empty_baseline")]
    pub dna_empty_baseline: f64,
    #[serde(default = "default_style_empty_baseline")]
    pub style_empty_baseline: f64,
    #[serde(default = "default_harmony_empty_baseline")]
    pub harmony_empty_baseline: f64,

    #[serde(default = "default_strength_threshold")]
    pub strength_threshold: f64,
    #[serde(default = "default_weakness_threshold")]
    pub weakness_threshold: f64,
    #[serde(default = "default_max_strengths")]
    pub max_strengths: usize,
    #[serde(default = "default_max_weaknesses")]
    pub max_weaknesses: usize,

    /// Assumed values for quality indicators an asset did not declare.
    #[serde(default = "default_assumed_quality")]
    pub default_generation_quality: f64,
    #[serde(default = "default_assumed_quality")]
    pub default_professional_quality: f64,
    #[serde(default = "default_assumed_quality")]
    pub default_brand_alignment: f64,

    /// Generation methods the professional-standards metric treats as
    /// production-grade.
    #[serde(default = "default_preferred_methods")]
    pub preferred_methods: Vec<String>,
    /// Minimum content-reference length for the "large enough content" proxy.
    #[serde(default = "default_content_reference_min_len")]
    pub content_reference_min_len: usize,

    /// Base composition score per asset type.
    #[serde(default = "default_composition_base")]
    pub composition_base: BTreeMap<String, f64>,
    #[serde(default = "default_type_base_fallback")]
    pub composition_default: f64,
    /// Base audience-appropriateness score per asset type.
    #[serde(default = "default_audience_base")]
    pub audience_base: BTreeMap<String, f64>,
    #[serde(default = "default_type_base_fallback")]
    pub audience_default: f64,
    /// Base scalability score per asset type.
    #[serde(default = "default_scalability_base")]
    pub scalability_base: BTreeMap<String, f64>,
    #[serde(default = "default_type_base_fallback")]
    pub scalability_default: f64,

    /// Recommendation template per weak metric, keyed by metric name.
    #[serde(default = "default_recommendations")]
    pub recommendations: BTreeMap<String, String>,
    #[serde(default = "default_excellent_recommendation")]
    pub excellent_recommendation: String,
}

fn default_score_ceiling() -> f64 {
    0.95
}
fn default_metric_fallback() -> f64 {
    0.8
}
fn default_color_floor() -> f64 {
    0.8
}
fn default_color_empty_baseline() -> f64 {
    0.9
}
fn default_dna_floor() -> f64 {
    0.8
}
fn default_dna_empty_baseline() -> f64 {
    0.9
}
fn default_style_empty_baseline() -> f64 {
    0.85
}
fn default_harmony_empty_baseline() -> f64 {
    0.85
}
fn default_strength_threshold() -> f64 {
    0.90
}
fn default_weakness_threshold() -> f64 {
    0.80
}
fn default_max_strengths() -> usize {
    5
}
fn default_max_weaknesses() -> usize {
    3
}
fn default_assumed_quality() -> f64 {
    0.85
}
fn default_preferred_methods() -> Vec<String> {
    vec!["external".into(), "diffusion".into(), "vector".into()]
}
fn default_content_reference_min_len() -> usize {
    10
}
fn default_type_base_fallback() -> f64 {
    0.80
}

fn default_composition_base() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("logo_primary".into(), 0.88),
        ("logo_horizontal".into(), 0.86),
        ("business_card".into(), 0.85),
        ("letterhead".into(), 0.84),
        ("social_media_post".into(), 0.80),
        ("flyer".into(), 0.82),
        ("banner".into(), 0.83),
    ])
}

fn default_audience_base() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("logo_primary".into(), 0.86),
        ("logo_horizontal".into(), 0.85),
        ("business_card".into(), 0.84),
        ("letterhead".into(), 0.84),
        ("social_media_post".into(), 0.82),
        ("flyer".into(), 0.83),
        ("banner".into(), 0.82),
    ])
}

fn default_scalability_base() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("logo_primary".into(), 0.95),
        ("logo_horizontal".into(), 0.93),
        ("business_card".into(), 0.85),
        ("letterhead".into(), 0.88),
        ("social_media_post".into(), 0.80),
        ("flyer".into(), 0.82),
        ("banner".into(), 0.86),
    ])
}

fn default_recommendations() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "color_consistency".into(),
            "Align the palette with the established brand colors; reuse the dominant hex values from existing assets.".into(),
        ),
        (
            "style_consistency".into(),
            "Match the generation method and style keywords used by the rest of the asset set.".into(),
        ),
        (
            "composition_consistency".into(),
            "Adjust layout proportions to the composition conventions of this asset type.".into(),
        ),
        (
            "brand_personality_alignment".into(),
            "Reflect the declared brand personality traits more directly in the visual treatment.".into(),
        ),
        (
            "brand_values_expression".into(),
            "Strengthen the expression of core brand values across the asset's messaging cues.".into(),
        ),
        (
            "target_audience_appropriateness".into(),
            "Tune tone and visual density toward the declared target audience.".into(),
        ),
        (
            "professional_standards".into(),
            "Raise production quality: sharper output, a preferred generation method, complete content.".into(),
        ),
        (
            "commercial_viability".into(),
            "Provide high-resolution, print-ready output with a valid content reference.".into(),
        ),
        (
            "scalability_assessment".into(),
            "Simplify detail so the design survives scaling across sizes and media.".into(),
        ),
        (
            "visual_dna_match".into(),
            "Bring colors and generation method closer to the brand's visual DNA fingerprint.".into(),
        ),
        (
            "cross_asset_harmony".into(),
            "Reduce quality deviation from sibling assets and reuse their generation method.".into(),
        ),
        (
            "brand_system_integration".into(),
            "Flag and maintain consistency metadata so the asset slots into the brand system.".into(),
        ),
    ])
}

fn default_excellent_recommendation() -> String {
    "Excellent consistency — maintain the current approach for future assets.".into()
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: MetricWeights::default(),
            score_ceiling: default_score_ceiling(),
            metric_fallback: default_metric_fallback(),
            color_floor: default_color_floor(),
            color_empty_baseline: default_color_empty_baseline(),
            dna_floor: default_dna_floor(),
            dna_empty_baseline: default_dna_empty_baseline(),
            style_empty_baseline: default_style_empty_baseline(),
            harmony_empty_baseline: default_harmony_empty_baseline(),
            strength_threshold: default_strength_threshold(),
            weakness_threshold: default_weakness_threshold(),
            max_strengths: default_max_strengths(),
            max_weaknesses: default_max_weaknesses(),
            default_generation_quality: default_assumed_quality(),
            default_professional_quality: default_assumed_quality(),
            default_brand_alignment: default_assumed_quality(),
            preferred_methods: default_preferred_methods(),
            content_reference_min_len: default_content_reference_min_len(),
            composition_base: default_composition_base(),
            composition_default: default_type_base_fallback(),
            audience_base: default_audience_base(),
            audience_default: default_type_base_fallback(),
            scalability_base: default_scalability_base(),
            scalability_default: default_type_base_fallback(),
            recommendations: default_recommendations(),
            excellent_recommendation: default_excellent_recommendation(),
        }
    }
}
