use super::types::{
    Asset, AssetMetadata, ConsistencyAnalysis, Metric, RefinementRecord, RefinementResult,
    VisualDna,
};
use crate::config::RefinementConfig;
use crate::error::GenerationError;
use crate::generation::{GenerationRequest, Generator, QualityTier};
use std::str::FromStr;
use std::sync::Arc;

/// Assumed value for quality indicators the asset has not declared, used by
/// the quick re-validation check.
const ASSUMED_QUALITY: f64 = 0.85;

/// Indicator value when a refinement has been applied to the asset.
const REFINEMENT_APPLIED_INDICATOR: f64 = 1.0;
const REFINEMENT_PENDING_INDICATOR: f64 = 0.8;

/// Which kind of instruction a weak metric calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstructionFocus {
    Color,
    Style,
    Brand,
    Professional,
    General,
}

impl InstructionFocus {
    fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::ColorConsistency | Metric::VisualDnaMatch => Self::Color,
            Metric::StyleConsistency
            | Metric::CompositionConsistency
            | Metric::CrossAssetHarmony => Self::Style,
            Metric::BrandPersonalityAlignment
            | Metric::BrandValuesExpression
            | Metric::BrandSystemIntegration
            | Metric::TargetAudienceAppropriateness => Self::Brand,
            Metric::ProfessionalStandards
            | Metric::CommercialViability
            | Metric::ScalabilityAssessment => Self::Professional,
        }
    }
}

/// Bounded improvement loop over one low-scoring asset, using the scorer's
/// analysis as its oracle and the generation collaborator (when available)
/// to apply changes.
pub struct RefinementLoop {
    config: RefinementConfig,
    generator: Arc<dyn Generator>,
}

impl RefinementLoop {
    pub fn new(config: RefinementConfig, generator: Arc<dyn Generator>) -> Self {
        Self { config, generator }
    }

    /// Run up to `max_iterations` improvement passes.
    ///
    /// Each iteration targets the band of metrics appropriate to its depth
    /// (critical, then moderate, then fine-tune), applies a refinement, and
    /// commits the result only when the quick re-validation score improved.
    /// The loop stops early once the working score reaches the early-exit
    /// threshold, and aborts (keeping partial records) if the collaborator
    /// fails outright. The committed score never decreases.
    pub async fn refine(
        &self,
        asset: &Asset,
        analysis: &ConsistencyAnalysis,
        dna: &VisualDna,
    ) -> RefinementResult {
        let mut working_asset = asset.clone();
        let mut working_score = analysis.overall_score;
        let mut records: Vec<RefinementRecord> = Vec::new();

        for iteration in 0..self.config.max_iterations {
            if working_score >= self.config.early_exit_threshold {
                break;
            }

            let targets = self.select_targets(iteration, analysis);
            let prompt = self.build_instructions(&targets, dna);
            let entry_score = working_score;

            let patch = match self.apply_refinement(&working_asset, &prompt).await {
                Ok(patch) => patch,
                Err(e) => {
                    tracing::warn!(
                        "RefinementLoop: iteration {iteration} aborted, keeping {} records: {e}",
                        records.len()
                    );
                    break;
                }
            };

            let mut merged = working_asset.metadata.clone();
            merged.merge(&patch);
            let new_score = self.quick_check(&merged, dna);

            let achieved = new_score > entry_score;
            if achieved {
                working_asset.metadata = merged;
                working_score = new_score;
            }
            records.push(RefinementRecord {
                iteration,
                targets: targets.clone(),
                score_delta: new_score - entry_score,
                achieved,
            });

            if working_score >= self.config.early_exit_threshold {
                break;
            }
        }

        let total_iterations = records.len();
        let improvement_achieved = working_score >= self.config.target_consistency;
        RefinementResult {
            records,
            final_asset: working_asset,
            final_score: working_score,
            total_iterations,
            improvement_achieved,
        }
    }

    /// Metrics to improve this iteration: critical first, then moderate,
    /// then fine-tuning, falling back to the configured default set.
    fn select_targets(&self, iteration: usize, analysis: &ConsistencyAnalysis) -> Vec<Metric> {
        let (low, high) = match iteration {
            0 => (0.0, self.config.critical_band_max),
            1 => (self.config.critical_band_max, self.config.moderate_band_max),
            _ => (self.config.moderate_band_max, self.config.fine_tune_band_max),
        };
        let mut targets: Vec<Metric> = analysis
            .metrics
            .iter()
            .filter(|(_, score)| **score >= low && **score < high)
            .map(|(metric, _)| *metric)
            .collect();
        if targets.is_empty() {
            targets = self
                .config
                .fallback_targets
                .iter()
                .filter_map(|name| Metric::from_str(name).ok())
                .collect();
        }
        targets.truncate(self.config.max_targets_per_iteration);
        targets
    }

    /// Refinement prompt keyed by the targets' focus, parameterized with the
    /// DNA's salient attributes and fingerprint.
    fn build_instructions(&self, targets: &[Metric], dna: &VisualDna) -> String {
        let mut focuses: Vec<InstructionFocus> = Vec::new();
        for target in targets {
            let focus = InstructionFocus::for_metric(*target);
            if !focuses.contains(&focus) {
                focuses.push(focus);
            }
        }
        if focuses.is_empty() {
            focuses.push(InstructionFocus::General);
        }

        let mut lines = vec![format!(
            "Refine the asset while preserving brand fingerprint {}.",
            dna.consistency_seed
        )];
        for focus in focuses {
            match focus {
                InstructionFocus::Color => lines.push(format!(
                    "Anchor the palette to the established brand colors: {}.",
                    dna.dominant_colors().join(", ")
                )),
                InstructionFocus::Style => lines.push(format!(
                    "Match the established aesthetic: {}.",
                    dna.style_keywords().join(", ")
                )),
                InstructionFocus::Brand => lines.push(format!(
                    "Express the brand personality: {}.",
                    dna.personality_traits().join(", ")
                )),
                InstructionFocus::Professional => lines.push(
                    "Raise production quality to print-ready, high-resolution standards."
                        .to_owned(),
                ),
                InstructionFocus::General => lines.push(
                    "Improve overall visual consistency with the existing asset set.".to_owned(),
                ),
            }
        }
        lines.join("\n")
    }

    /// Delegate to the collaborator; when it reports itself unavailable,
    /// synthesize the deterministic metadata bump instead. Other collaborator
    /// failures propagate and abort the loop.
    async fn apply_refinement(
        &self,
        asset: &Asset,
        prompt: &str,
    ) -> anyhow::Result<AssetMetadata> {
        let request = GenerationRequest {
            prompt: prompt.to_owned(),
            quality_tier: QualityTier::Professional,
            asset_type: asset.asset_type.clone(),
            instructions: None,
        };
        match self.generator.generate(&request).await {
            Ok(output) => {
                let mut patch = output.metadata;
                patch.refinement_applied = true;
                patch.refinement_quality = Some(output.reported_quality.clamp(0.0, 1.0));
                Ok(patch)
            }
            Err(e) if e.downcast_ref::<GenerationError>().is_some_and(|g| {
                matches!(g, GenerationError::Unavailable { .. })
            }) =>
            {
                tracing::debug!(
                    "RefinementLoop: generator unavailable, using deterministic bump"
                );
                Ok(self.bump_patch(&asset.metadata))
            }
            Err(e) => Err(e),
        }
    }

    /// Fallback refinement: a small deterministic quality bump on the
    /// declared metadata.
    fn bump_patch(&self, metadata: &AssetMetadata) -> AssetMetadata {
        let quality = metadata.generation_quality.unwrap_or(ASSUMED_QUALITY);
        let alignment = metadata.brand_alignment.unwrap_or(ASSUMED_QUALITY);
        let bumped_quality = (quality + self.config.quality_bump).min(self.config.bump_ceiling);
        AssetMetadata {
            generation_quality: Some(bumped_quality),
            brand_alignment: Some(
                (alignment + self.config.alignment_bump).min(self.config.bump_ceiling),
            ),
            refinement_applied: true,
            refinement_quality: Some(bumped_quality),
            ..AssetMetadata::default()
        }
    }

    /// Lightweight five-factor re-validation of a refined metadata record.
    fn quick_check(&self, metadata: &AssetMetadata, dna: &VisualDna) -> f64 {
        let quality = metadata.generation_quality.unwrap_or(ASSUMED_QUALITY);
        let alignment = metadata.brand_alignment.unwrap_or(ASSUMED_QUALITY);
        let applied = if metadata.refinement_applied {
            REFINEMENT_APPLIED_INDICATOR
        } else {
            REFINEMENT_PENDING_INDICATOR
        };
        let dna_confidence =
            (dna.extraction_confidence + 0.05).min(self.config.bump_ceiling);
        let reported = metadata.refinement_quality.unwrap_or(quality);
        ((quality + alignment + applied + dna_confidence + reported) / 5.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dna::VisualDnaBuilder;
    use crate::engine::types::{AssetType, MetricScores};
    use crate::generation::{GenerationOutput, NullGenerator};
    use async_trait::async_trait;
    use chrono::Utc;

    fn analysis_with(overall: f64, metric_score: f64) -> ConsistencyAnalysis {
        let mut metrics = MetricScores::new();
        for metric in Metric::ALL {
            metrics.insert(metric, metric_score);
        }
        ConsistencyAnalysis {
            metrics,
            overall_score: overall,
            strengths: vec![],
            weaknesses: vec![],
            recommendations: vec![],
            analysis_confidence: ConsistencyAnalysis::confidence_for(overall),
            fallback_reason: None,
            analyzed_at: Utc::now(),
        }
    }

    fn flyer() -> Asset {
        let mut asset = Asset::new("p1", AssetType::Flyer, "asset://flyer/1");
        asset.metadata.generation_quality = Some(0.6);
        asset.metadata.brand_alignment = Some(0.6);
        asset
    }

    fn loop_with_null() -> RefinementLoop {
        RefinementLoop::new(RefinementConfig::default(), Arc::new(NullGenerator))
    }

    #[tokio::test]
    async fn final_score_never_below_entry() {
        let asset = flyer();
        let analysis = analysis_with(0.7, 0.7);
        let dna = VisualDnaBuilder::extract(&[asset.clone()]);
        let result = loop_with_null().refine(&asset, &analysis, &dna).await;
        assert!(result.final_score >= analysis.overall_score);
    }

    #[tokio::test]
    async fn uncommitted_iterations_leave_asset_unchanged() {
        struct WorseGenerator;
        #[async_trait]
        impl Generator for WorseGenerator {
            fn name(&self) -> &str {
                "worse"
            }
            async fn generate(
                &self,
                _request: &GenerationRequest,
            ) -> anyhow::Result<GenerationOutput> {
                Ok(GenerationOutput {
                    content_reference: "asset://worse".into(),
                    metadata: AssetMetadata {
                        generation_quality: Some(0.1),
                        brand_alignment: Some(0.1),
                        ..AssetMetadata::default()
                    },
                    reported_quality: 0.1,
                })
            }
        }

        let mut asset = flyer();
        asset.metadata.generation_quality = Some(0.95);
        asset.metadata.brand_alignment = Some(0.95);
        let analysis = analysis_with(0.88, 0.88);
        let dna = VisualDnaBuilder::extract(&[asset.clone()]);
        let refiner =
            RefinementLoop::new(RefinementConfig::default(), Arc::new(WorseGenerator));
        let result = refiner.refine(&asset, &analysis, &dna).await;
        // Patch merge prefers declared patch values, which makes the quick
        // check worse than the entry score; nothing commits
        assert_eq!(result.final_asset.metadata, asset.metadata);
        assert!((result.final_score - 0.88).abs() < f64::EPSILON);
        assert!(result.records.iter().all(|r| !r.achieved));
    }

    #[tokio::test]
    async fn early_exit_after_first_iteration() {
        let mut asset = flyer();
        asset.metadata.generation_quality = Some(0.95);
        asset.metadata.brand_alignment = Some(0.95);
        let analysis = analysis_with(0.84, 0.84);
        let dna = VisualDnaBuilder::extract(&[asset.clone()]);
        let result = loop_with_null().refine(&asset, &analysis, &dna).await;
        // Quick check: (0.95 + 0.95 + 1.0 + 0.83 + 0.95) / 5 = 0.936 ≥ 0.90
        assert_eq!(result.total_iterations, 1);
        assert!(result.final_score >= 0.90);
        assert!(result.improvement_achieved);
    }

    #[tokio::test]
    async fn generator_failure_aborts_keeping_records() {
        struct FailingGenerator;
        #[async_trait]
        impl Generator for FailingGenerator {
            fn name(&self) -> &str {
                "failing"
            }
            async fn generate(
                &self,
                _request: &GenerationRequest,
            ) -> anyhow::Result<GenerationOutput> {
                Err(GenerationError::Request {
                    generator: "failing".into(),
                    message: "upstream 500".into(),
                }
                .into())
            }
        }

        let asset = flyer();
        let analysis = analysis_with(0.7, 0.7);
        let dna = VisualDnaBuilder::extract(&[asset.clone()]);
        let refiner =
            RefinementLoop::new(RefinementConfig::default(), Arc::new(FailingGenerator));
        let result = refiner.refine(&asset, &analysis, &dna).await;
        assert!(result.records.is_empty());
        assert!((result.final_score - 0.7).abs() < f64::EPSILON);
        assert!(!result.improvement_achieved);
    }

    #[tokio::test]
    async fn records_capped_by_max_iterations() {
        let asset = flyer();
        let analysis = analysis_with(0.5, 0.5);
        let dna = VisualDnaBuilder::extract(&[asset.clone()]);
        let result = loop_with_null().refine(&asset, &analysis, &dna).await;
        assert!(result.total_iterations <= 3);
        assert_eq!(result.records.len(), result.total_iterations);
    }

    #[test]
    fn targets_capped_at_three_per_iteration() {
        let refiner = loop_with_null();
        let analysis = analysis_with(0.5, 0.5);
        let targets = refiner.select_targets(0, &analysis);
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn empty_band_falls_back_to_default_targets() {
        let refiner = loop_with_null();
        // Every metric at 0.95: no band matches on any iteration
        let analysis = analysis_with(0.95, 0.95);
        let targets = refiner.select_targets(0, &analysis);
        assert_eq!(
            targets,
            vec![
                Metric::ColorConsistency,
                Metric::StyleConsistency,
                Metric::BrandPersonalityAlignment,
            ]
        );
    }

    #[test]
    fn iteration_bands_partition_by_severity() {
        let refiner = loop_with_null();
        let mut metrics = MetricScores::new();
        metrics.insert(Metric::ColorConsistency, 0.70); // critical
        metrics.insert(Metric::StyleConsistency, 0.80); // moderate
        metrics.insert(Metric::VisualDnaMatch, 0.87); // fine-tune
        let analysis = ConsistencyAnalysis {
            metrics,
            overall_score: 0.78,
            strengths: vec![],
            weaknesses: vec![],
            recommendations: vec![],
            analysis_confidence: 0.88,
            fallback_reason: None,
            analyzed_at: Utc::now(),
        };
        assert_eq!(refiner.select_targets(0, &analysis), vec![Metric::ColorConsistency]);
        assert_eq!(refiner.select_targets(1, &analysis), vec![Metric::StyleConsistency]);
        assert_eq!(refiner.select_targets(2, &analysis), vec![Metric::VisualDnaMatch]);
    }

    #[test]
    fn instructions_carry_dna_fingerprint() {
        let refiner = loop_with_null();
        let mut asset = flyer();
        asset.metadata.primary_colors = vec!["#112233".into()];
        let dna = VisualDnaBuilder::extract(&[asset]);
        let prompt =
            refiner.build_instructions(&[Metric::ColorConsistency], &dna);
        assert!(prompt.contains(&dna.consistency_seed));
        assert!(prompt.contains("#112233"));
    }
}
