use super::dna::{DnaCache, VisualDnaBuilder};
use super::memory::{MemoryStore, TypeInsights};
use super::refine::RefinementLoop;
use super::scorer::ConsistencyScorer;
use super::types::{
    Asset, AssetType, BrandStrategy, ConsistencyAnalysis, GenerationConstraints,
    GenerationInstructions, OutcomeKind, RefinementResult, ValidationOutcome, VisualDna,
};
use crate::config::EngineConfig;
use crate::generation::Generator;
use std::sync::Arc;

/// Facade composing extraction, scoring, refinement and memory into the
/// end-to-end consistency flow. Stateless across calls except for the shared
/// memory store and the per-strategy DNA cache it owns.
pub struct ConsistencyOrchestrator {
    config: EngineConfig,
    scorer: ConsistencyScorer,
    refiner: RefinementLoop,
    generator: Arc<dyn Generator>,
    memory: Arc<MemoryStore>,
    dna_cache: DnaCache,
}

impl ConsistencyOrchestrator {
    pub fn new(
        config: EngineConfig,
        generator: Arc<dyn Generator>,
        memory: Arc<MemoryStore>,
    ) -> Self {
        let scorer = ConsistencyScorer::new(config.scoring.clone());
        let refiner = RefinementLoop::new(config.refinement.clone(), Arc::clone(&generator));
        Self {
            config,
            scorer,
            refiner,
            generator,
            memory,
            dna_cache: DnaCache::new(),
        }
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Visual DNA for a strategy's asset set, cached for the process
    /// lifetime per strategy id.
    pub fn extract_dna(&self, strategy: &BrandStrategy, base_assets: &[Asset]) -> Arc<VisualDna> {
        self.dna_cache.get_or_extract(&strategy.id, base_assets)
    }

    /// Structured constraint bundle parameterizing generation prompts.
    /// Purely data assembly; nothing here scores anything.
    pub fn build_constraints(
        &self,
        dna: &VisualDna,
        strategy: &BrandStrategy,
        asset_type: &AssetType,
    ) -> GenerationConstraints {
        let insights = self.memory.insights(asset_type);

        let mut color = Vec::new();
        let dominant = dna.dominant_colors();
        if !dominant.is_empty() {
            color.push(format!("Use the dominant brand colors: {}.", dominant.join(", ")));
        }
        if !strategy.color_palette.is_empty() {
            color.push(format!(
                "Stay within the declared palette: {}.",
                strategy.color_palette.join(", ")
            ));
        }

        let mut aesthetic = Vec::new();
        let keywords = dna.style_keywords();
        if !keywords.is_empty() {
            aesthetic.push(format!("Established aesthetic: {}.", keywords.join(", ")));
        }
        if let Some(style) = &strategy.visual_direction.style {
            aesthetic.push(format!("Visual direction: {style}."));
        }
        if let Some(mood) = &strategy.visual_direction.mood {
            aesthetic.push(format!("Mood: {mood}."));
        }

        let composition = vec![
            format!("Follow the composition conventions of a {asset_type}."),
            "Keep grid alignment and centered balance consistent with existing assets.".into(),
        ];

        let mut brand = vec![format!("Asset for {}.", strategy.business_name)];
        let traits = &strategy.brand_personality.traits;
        if !traits.is_empty() {
            brand.push(format!("Brand personality: {}.", traits.join(", ")));
        }
        if let Some(archetype) = &strategy.brand_personality.archetype {
            brand.push(format!("Archetype: {archetype}."));
        }
        if let Some(promise) = &strategy.messaging_framework.brand_promise {
            brand.push(format!("Brand promise: {promise}."));
        }

        let mut historical_insights = insights.best_practices.clone();
        for pitfall in &insights.common_pitfalls {
            historical_insights.push(format!("Avoid: {pitfall}"));
        }
        if let Some(rate) = insights.recent_success_rate {
            historical_insights.push(format!("Recent consistency average: {rate:.2}."));
        }

        GenerationConstraints {
            color,
            aesthetic,
            composition,
            brand,
            asset_specific: insights.fallback_recommendations,
            quality_threshold: self.config.refinement.target_consistency,
            historical_insights,
        }
    }

    /// Generation-prompt enhancements handed to the external collaborator.
    pub fn build_instructions(
        &self,
        asset_type: &AssetType,
        constraints: &GenerationConstraints,
        guidelines: &[String],
        dna: &VisualDna,
    ) -> GenerationInstructions {
        let mut prompt_enhancements = Vec::new();
        prompt_enhancements.extend(constraints.color.iter().cloned());
        prompt_enhancements.extend(constraints.aesthetic.iter().cloned());
        prompt_enhancements.extend(constraints.brand.iter().cloned());
        prompt_enhancements.extend(guidelines.iter().cloned());

        let mut visual_specs = constraints.composition.clone();
        visual_specs.extend(constraints.asset_specific.iter().cloned());
        visual_specs.push(format!("Brand fingerprint: {}.", dna.consistency_seed));

        let quality_checkpoints = vec![
            format!(
                "Overall consistency at or above {:.2}.",
                constraints.quality_threshold
            ),
            "Dominant brand color visibly present.".into(),
            format!("Output production-ready for a {asset_type}."),
        ];

        let validation_rules = vec![
            "Declared palette must overlap the established dominant colors.".into(),
            "Generation method must match the established method where one exists.".into(),
            "Declared quality scores must accompany the output metadata.".into(),
        ];

        GenerationInstructions {
            prompt_enhancements,
            visual_specs,
            quality_checkpoints,
            validation_rules,
        }
    }

    /// Score one asset against a baseline and strategy (exposed boundary
    /// operation; no refinement, no memory update).
    pub fn validate_consistency(
        &self,
        asset: &Asset,
        baseline: &[Asset],
        strategy: &BrandStrategy,
    ) -> ConsistencyAnalysis {
        self.scorer
            .score(asset, baseline, strategy, self.dna_cache.get(&strategy.id).as_deref())
    }

    /// Run the refinement loop directly (exposed boundary operation).
    pub async fn refine_asset(
        &self,
        asset: &Asset,
        analysis: &ConsistencyAnalysis,
        dna: &VisualDna,
        max_iterations: Option<usize>,
    ) -> RefinementResult {
        match max_iterations {
            Some(iterations) if iterations != self.config.refinement.max_iterations => {
                let mut adjusted = self.config.refinement.clone();
                adjusted.max_iterations = iterations;
                RefinementLoop::new(adjusted, Arc::clone(&self.generator))
                    .refine(asset, analysis, dna)
                    .await
            }
            _ => self.refiner.refine(asset, analysis, dna).await,
        }
    }

    /// Record a scored outcome into the shared learning memory.
    pub fn record_outcome(&self, asset: &Asset, analysis: &ConsistencyAnalysis) {
        self.memory.record(asset, analysis);
    }

    /// Learning-memory snapshot for one asset type.
    pub fn insights(&self, asset_type: &AssetType) -> TypeInsights {
        self.memory.insights(asset_type)
    }

    /// End-to-end validation: score, refine below target, remember.
    ///
    /// Never returns an error: an unexpected fault anywhere in the flow is
    /// converted into a fallback outcome with an annotated analysis.
    pub async fn validate_and_refine(
        &self,
        asset: Asset,
        baseline: &[Asset],
        strategy: &BrandStrategy,
        dna: Option<Arc<VisualDna>>,
        target_consistency: Option<f64>,
    ) -> ValidationOutcome {
        let original = asset.clone();
        match self
            .try_validate_and_refine(asset, baseline, strategy, dna, target_consistency)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("ConsistencyOrchestrator: pipeline fault, returning fallback: {e}");
                ValidationOutcome {
                    asset: original,
                    analysis: ConsistencyAnalysis::fallback(e.to_string()),
                    refinement: None,
                    meets_threshold: false,
                    kind: OutcomeKind::Fallback,
                }
            }
        }
    }

    async fn try_validate_and_refine(
        &self,
        asset: Asset,
        baseline: &[Asset],
        strategy: &BrandStrategy,
        dna: Option<Arc<VisualDna>>,
        target_consistency: Option<f64>,
    ) -> anyhow::Result<ValidationOutcome> {
        let target =
            target_consistency.unwrap_or(self.config.refinement.target_consistency);
        let analysis = self
            .scorer
            .score(&asset, baseline, strategy, dna.as_deref());

        let mut final_asset = asset;
        let mut final_analysis = analysis.clone();
        let mut refinement = None;
        let mut kind = OutcomeKind::Validated;

        if analysis.overall_score < target {
            tracing::info!(
                "ConsistencyOrchestrator: {} scored {:.3} below target {:.3}, refining",
                final_asset.id,
                analysis.overall_score,
                target
            );
            let dna = match dna {
                Some(dna) => dna,
                None if baseline.is_empty() => {
                    Arc::new(VisualDnaBuilder::extract(std::slice::from_ref(&final_asset)))
                }
                None => self.dna_cache.get_or_extract(&strategy.id, baseline),
            };
            let result = self.refiner.refine(&final_asset, &analysis, &dna).await;
            if result.final_score > analysis.overall_score {
                final_asset = result.final_asset.clone();
                final_analysis =
                    self.scorer
                        .score(&final_asset, baseline, strategy, Some(dna.as_ref()));
                kind = OutcomeKind::Refined;
            }
            refinement = Some(result);
        }

        self.memory.record(&final_asset, &final_analysis);
        let meets_threshold = final_analysis.overall_score >= target;
        Ok(ValidationOutcome {
            asset: final_asset,
            analysis: final_analysis,
            refinement,
            meets_threshold,
            kind,
        })
    }
}
