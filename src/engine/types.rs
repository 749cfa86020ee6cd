use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use uuid::Uuid;

// AssetType — category of a generated artifact. Custom(_) carries types the
// engine does not model; they score against the table fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    LogoPrimary,
    LogoHorizontal,
    BusinessCard,
    Letterhead,
    SocialMediaPost,
    Flyer,
    Banner,
    Custom(String),
}

impl AssetType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::LogoPrimary => "logo_primary",
            Self::LogoHorizontal => "logo_horizontal",
            Self::BusinessCard => "business_card",
            Self::Letterhead => "letterhead",
            Self::SocialMediaPost => "social_media_post",
            Self::Flyer => "flyer",
            Self::Banner => "banner",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AssetType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "logo_primary" => Self::LogoPrimary,
            "logo_horizontal" => Self::LogoHorizontal,
            "business_card" => Self::BusinessCard,
            "letterhead" => Self::Letterhead,
            "social_media_post" => Self::SocialMediaPost,
            "flyer" => Self::Flyer,
            "banner" => Self::Banner,
            _ => Self::Custom(value),
        }
    }
}

impl From<AssetType> for String {
    fn from(value: AssetType) -> Self {
        value.as_str().to_owned()
    }
}

// Metric — consistency scoring dimension (EXACTLY 12; BTreeMap key for
// stable ordering, like the taste axes)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    ColorConsistency,
    StyleConsistency,
    CompositionConsistency,
    BrandPersonalityAlignment,
    BrandValuesExpression,
    TargetAudienceAppropriateness,
    ProfessionalStandards,
    CommercialViability,
    ScalabilityAssessment,
    VisualDnaMatch,
    CrossAssetHarmony,
    BrandSystemIntegration,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::ColorConsistency,
        Metric::StyleConsistency,
        Metric::CompositionConsistency,
        Metric::BrandPersonalityAlignment,
        Metric::BrandValuesExpression,
        Metric::TargetAudienceAppropriateness,
        Metric::ProfessionalStandards,
        Metric::CommercialViability,
        Metric::ScalabilityAssessment,
        Metric::VisualDnaMatch,
        Metric::CrossAssetHarmony,
        Metric::BrandSystemIntegration,
    ];
}

// MetricScores — score per metric, all in [0, 1]
pub type MetricScores = BTreeMap<Metric, f64>;

// AssetMetadata — declared attributes of one generated asset. The engine
// never inspects pixels; everything it knows about an asset is declared here
// by the producer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default)]
    pub primary_colors: Vec<String>,
    #[serde(default)]
    pub style_keywords: Vec<String>,
    #[serde(default)]
    pub personality_tags: Vec<String>,
    #[serde(default)]
    pub generation_method: Option<String>,
    #[serde(default)]
    pub generation_quality: Option<f64>,
    #[serde(default)]
    pub professional_quality: Option<f64>,
    #[serde(default)]
    pub brand_alignment: Option<f64>,
    #[serde(default)]
    pub consistency_maintained: bool,
    #[serde(default)]
    pub high_resolution: bool,
    #[serde(default)]
    pub print_ready: bool,
    #[serde(default)]
    pub refinement_applied: bool,
    #[serde(default)]
    pub refinement_quality: Option<f64>,
    /// Declared attributes the engine does not model.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AssetMetadata {
    /// Merge a refinement patch into this metadata. Declared values in the
    /// patch win; list fields are unioned; flags are sticky once set.
    pub fn merge(&mut self, patch: &AssetMetadata) {
        for color in &patch.primary_colors {
            if !self.primary_colors.contains(color) {
                self.primary_colors.push(color.clone());
            }
        }
        for keyword in &patch.style_keywords {
            if !self.style_keywords.contains(keyword) {
                self.style_keywords.push(keyword.clone());
            }
        }
        for tag in &patch.personality_tags {
            if !self.personality_tags.contains(tag) {
                self.personality_tags.push(tag.clone());
            }
        }
        if patch.generation_method.is_some() {
            self.generation_method.clone_from(&patch.generation_method);
        }
        if patch.generation_quality.is_some() {
            self.generation_quality = patch.generation_quality;
        }
        if patch.professional_quality.is_some() {
            self.professional_quality = patch.professional_quality;
        }
        if patch.brand_alignment.is_some() {
            self.brand_alignment = patch.brand_alignment;
        }
        if patch.refinement_quality.is_some() {
            self.refinement_quality = patch.refinement_quality;
        }
        self.consistency_maintained |= patch.consistency_maintained;
        self.high_resolution |= patch.high_resolution;
        self.print_ready |= patch.print_ready;
        self.refinement_applied |= patch.refinement_applied;
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

// Asset — one generated visual artifact; content lives behind an opaque
// reference owned by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub project_id: String,
    pub asset_type: AssetType,
    pub content_reference: String,
    #[serde(default)]
    pub metadata: AssetMetadata,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(
        project_id: impl Into<String>,
        asset_type: AssetType,
        content_reference: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            asset_type,
            content_reference: content_reference.into(),
            metadata: AssetMetadata::default(),
            created_at: Utc::now(),
        }
    }
}

// CategoryProfile — one Visual DNA category (BTreeMap for stable ordering)
pub type CategoryProfile = BTreeMap<String, serde_json::Value>;

// VisualDna — multi-category stylistic fingerprint of an asset set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualDna {
    pub color: CategoryProfile,
    pub color_harmony: CategoryProfile,
    pub color_psychology: CategoryProfile,
    pub shape_language: CategoryProfile,
    pub composition: CategoryProfile,
    pub spatial_relationships: CategoryProfile,
    pub typography: CategoryProfile,
    pub hierarchy: CategoryProfile,
    pub text_styling: CategoryProfile,
    pub aesthetic_signature: CategoryProfile,
    pub personality: CategoryProfile,
    pub design_system: CategoryProfile,
    pub brand_expression: CategoryProfile,
    pub emotional_tone: CategoryProfile,
    pub industry_fit: CategoryProfile,
    /// Short order-independent fingerprint of the salient attributes.
    pub consistency_seed: String,
    /// Mean of the per-phase extraction confidences, in [0, 1].
    pub extraction_confidence: f64,
}

fn string_list(profile: &CategoryProfile, key: &str) -> Vec<String> {
    profile
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

impl VisualDna {
    pub fn dominant_colors(&self) -> Vec<String> {
        string_list(&self.color, "dominant")
    }

    pub fn style_keywords(&self) -> Vec<String> {
        string_list(&self.aesthetic_signature, "keywords")
    }

    pub fn personality_traits(&self) -> Vec<String> {
        string_list(&self.personality, "traits")
    }
}

// ConsistencyAnalysis — output of scoring one asset; never mutated, a new
// refinement iteration produces a new one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyAnalysis {
    pub metrics: MetricScores,
    pub overall_score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub analysis_confidence: f64,
    #[serde(default)]
    pub fallback_reason: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Overall score substituted when the whole pipeline faults.
pub const FALLBACK_OVERALL_SCORE: f64 = 0.75;

impl ConsistencyAnalysis {
    /// Confidence derived from the overall score, capped at 1.0.
    pub fn confidence_for(overall_score: f64) -> f64 {
        (overall_score + 0.1).min(1.0)
    }

    /// Analysis substituted when an unexpected fault escapes the inner
    /// guards. The caller still gets a well-formed, annotated result.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            metrics: MetricScores::new(),
            overall_score: FALLBACK_OVERALL_SCORE,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            recommendations: Vec::new(),
            analysis_confidence: Self::confidence_for(FALLBACK_OVERALL_SCORE),
            fallback_reason: Some(reason.into()),
            analyzed_at: Utc::now(),
        }
    }
}

// RefinementRecord — outcome of one improvement iteration, recorded whether
// or not the attempt was committed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementRecord {
    pub iteration: usize,
    pub targets: Vec<Metric>,
    pub score_delta: f64,
    pub achieved: bool,
}

// RefinementResult — ordered iteration records plus the final asset state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementResult {
    pub records: Vec<RefinementRecord>,
    pub final_asset: Asset,
    pub final_score: f64,
    pub total_iterations: usize,
    pub improvement_achieved: bool,
}

// BrandStrategy — read-only strategic input owned by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandPersonality {
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualDirection {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub typography_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagingFramework {
    #[serde(default)]
    pub key_messages: Vec<String>,
    #[serde(default)]
    pub brand_promise: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandStrategy {
    pub id: String,
    pub business_name: String,
    #[serde(default)]
    pub brand_personality: BrandPersonality,
    #[serde(default)]
    pub visual_direction: VisualDirection,
    #[serde(default)]
    pub color_palette: Vec<String>,
    #[serde(default)]
    pub messaging_framework: MessagingFramework,
}

// GenerationConstraints — data bundle parameterizing generation prompts;
// assembled by the orchestrator, no scoring involved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConstraints {
    #[serde(default)]
    pub color: Vec<String>,
    #[serde(default)]
    pub aesthetic: Vec<String>,
    #[serde(default)]
    pub composition: Vec<String>,
    #[serde(default)]
    pub brand: Vec<String>,
    #[serde(default)]
    pub asset_specific: Vec<String>,
    pub quality_threshold: f64,
    #[serde(default)]
    pub historical_insights: Vec<String>,
}

// GenerationInstructions — prompt enhancements handed to the collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationInstructions {
    #[serde(default)]
    pub prompt_enhancements: Vec<String>,
    #[serde(default)]
    pub visual_specs: Vec<String>,
    #[serde(default)]
    pub quality_checkpoints: Vec<String>,
    #[serde(default)]
    pub validation_rules: Vec<String>,
}

// OutcomeKind — how a validate-and-refine call concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    Validated,
    Refined,
    Fallback,
}

// ValidationOutcome — final asset plus everything learned about it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub asset: Asset,
    pub analysis: ConsistencyAnalysis,
    #[serde(default)]
    pub refinement: Option<RefinementResult>,
    pub meets_threshold: bool,
    pub kind: OutcomeKind,
}
