use crate::engine::types::{AssetMetadata, AssetType, GenerationInstructions};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;

// QualityTier — generation-effort profile; retry budget and acceptance
// threshold are the collaborator's concern, not this crate's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QualityTier {
    Premium,
    #[default]
    Professional,
    Standard,
}

/// One generation or refinement request handed to the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub quality_tier: QualityTier,
    pub asset_type: AssetType,
    #[serde(default)]
    pub instructions: Option<GenerationInstructions>,
}

/// What the collaborator reports back: a content handle plus the declared
/// metadata of the regenerated content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub content_reference: String,
    #[serde(default)]
    pub metadata: AssetMetadata,
    /// The collaborator's own quality estimate for this output, in [0, 1].
    pub reported_quality: f64,
}

/// External generation collaborator. The engine only supplies prompts and
/// consumes a content handle plus success/failure; bounded retries belong to
/// the implementation behind this trait.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationOutput>;
}

/// Generator that is never available. Drives the deterministic metadata-bump
/// fallback in the refinement loop; also useful for hosts that validate
/// without regenerating.
pub struct NullGenerator;

#[async_trait]
impl Generator for NullGenerator {
    fn name(&self) -> &str {
        "null"
    }

    async fn generate(&self, _request: &GenerationRequest) -> anyhow::Result<GenerationOutput> {
        Err(GenerationError::Unavailable {
            generator: "null".into(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_tier_serializes_snake_case() {
        let json = serde_json::to_string(&QualityTier::Premium).unwrap();
        assert_eq!(json, "\"premium\"");
        assert_eq!(QualityTier::Professional.to_string(), "professional");
    }

    #[tokio::test]
    async fn null_generator_reports_unavailable() {
        let request = GenerationRequest {
            prompt: "refine".into(),
            quality_tier: QualityTier::Standard,
            asset_type: AssetType::Flyer,
            instructions: None,
        };
        let err = NullGenerator.generate(&request).await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn generation_request_roundtrip() {
        let request = GenerationRequest {
            prompt: "logo refresh".into(),
            quality_tier: QualityTier::Premium,
            asset_type: AssetType::LogoPrimary,
            instructions: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: GenerationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quality_tier, QualityTier::Premium);
        assert_eq!(back.asset_type, AssetType::LogoPrimary);
    }
}
