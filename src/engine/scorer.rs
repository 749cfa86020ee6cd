use super::types::{
    Asset, AssetMetadata, BrandStrategy, ConsistencyAnalysis, Metric, MetricScores, VisualDna,
};
use crate::config::ScoringPolicy;
use chrono::Utc;

/// Base quality constant folded into the commercial-viability mean.
const COMMERCIAL_BASE_QUALITY: f64 = 0.85;

/// Fixed indicator folded into the brand-system-integration mean.
const INTEGRATION_BASE: f64 = 0.85;

/// Overlap fallback when one of the two trait sets is undeclared; sparse
/// metadata degrades instead of punishing.
const UNDECLARED_OVERLAP: f64 = 0.8;

/// Scores one candidate asset against a baseline set and a brand strategy
/// across twelve weighted metrics.
///
/// Every metric is clamped to [0, 1] and individually fault-tolerant: a
/// sub-score that comes out non-finite is replaced with the policy's fallback
/// constant instead of surfacing an error.
pub struct ConsistencyScorer {
    policy: ScoringPolicy,
}

impl ConsistencyScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Compute all twelve metrics and the weighted overall score. The DNA is
    /// optional and only consulted by the DNA-match metric when no baseline
    /// exists yet.
    pub fn score(
        &self,
        candidate: &Asset,
        baseline: &[Asset],
        strategy: &BrandStrategy,
        dna: Option<&VisualDna>,
    ) -> ConsistencyAnalysis {
        let mut metrics = MetricScores::new();
        for metric in Metric::ALL {
            let raw = match metric {
                Metric::ColorConsistency => self.color_consistency(candidate, baseline),
                Metric::StyleConsistency => self.style_consistency(candidate, baseline),
                Metric::CompositionConsistency => self.composition_consistency(candidate),
                Metric::BrandPersonalityAlignment => {
                    self.brand_personality_alignment(candidate, strategy)
                }
                Metric::BrandValuesExpression => self.brand_values_expression(candidate),
                Metric::TargetAudienceAppropriateness => {
                    self.target_audience_appropriateness(candidate)
                }
                Metric::ProfessionalStandards => self.professional_standards(candidate),
                Metric::CommercialViability => self.commercial_viability(candidate),
                Metric::ScalabilityAssessment => self.scalability_assessment(candidate),
                Metric::VisualDnaMatch => self.visual_dna_match(candidate, baseline, dna),
                Metric::CrossAssetHarmony => self.cross_asset_harmony(candidate, baseline),
                Metric::BrandSystemIntegration => {
                    self.brand_system_integration(candidate, baseline)
                }
            };
            metrics.insert(metric, self.guarded(metric, raw));
        }

        let overall_score = self.overall(&metrics);
        let strengths = self.strengths(&metrics);
        let weaknesses = self.weaknesses(&metrics);
        let recommendations = self.recommendations(&metrics);

        ConsistencyAnalysis {
            metrics,
            overall_score,
            strengths,
            weaknesses,
            recommendations,
            analysis_confidence: ConsistencyAnalysis::confidence_for(overall_score),
            fallback_reason: None,
            analyzed_at: Utc::now(),
        }
    }

    // ── Aggregation ─────────────────────────────────────────────────────

    /// Weighted mean over the metrics actually present. Weights deliberately
    /// sum past 1.0 (see `MetricWeights`); dividing by the present-weight sum
    /// keeps the result in [0, 1].
    fn overall(&self, metrics: &MetricScores) -> f64 {
        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for (metric, score) in metrics {
            let weight = self.weight(*metric);
            weighted += score * weight;
            weight_sum += weight;
        }
        if weight_sum <= 0.0 {
            return self.policy.metric_fallback;
        }
        (weighted / weight_sum).clamp(0.0, 1.0)
    }

    fn weight(&self, metric: Metric) -> f64 {
        let w = &self.policy.weights;
        match metric {
            Metric::ColorConsistency => w.color_consistency,
            Metric::StyleConsistency => w.style_consistency,
            Metric::CompositionConsistency => w.composition_consistency,
            Metric::BrandPersonalityAlignment => w.brand_personality_alignment,
            Metric::BrandValuesExpression => w.brand_values_expression,
            Metric::TargetAudienceAppropriateness => w.target_audience_appropriateness,
            Metric::ProfessionalStandards => w.professional_standards,
            Metric::CommercialViability => w.commercial_viability,
            Metric::ScalabilityAssessment => w.scalability_assessment,
            Metric::VisualDnaMatch => w.visual_dna_match,
            Metric::CrossAssetHarmony => w.cross_asset_harmony,
            Metric::BrandSystemIntegration => w.brand_system_integration,
        }
    }

    fn strengths(&self, metrics: &MetricScores) -> Vec<String> {
        let mut strong: Vec<(Metric, f64)> = metrics
            .iter()
            .filter(|(_, s)| **s >= self.policy.strength_threshold)
            .map(|(m, s)| (*m, *s))
            .collect();
        strong.sort_by(|a, b| b.1.total_cmp(&a.1));
        strong
            .into_iter()
            .take(self.policy.max_strengths)
            .map(|(m, s)| format!("{m} ({s:.2})"))
            .collect()
    }

    fn weaknesses(&self, metrics: &MetricScores) -> Vec<String> {
        let mut weak: Vec<(Metric, f64)> = metrics
            .iter()
            .filter(|(_, s)| **s < self.policy.weakness_threshold)
            .map(|(m, s)| (*m, *s))
            .collect();
        weak.sort_by(|a, b| a.1.total_cmp(&b.1));
        weak.into_iter()
            .take(self.policy.max_weaknesses)
            .map(|(m, s)| format!("{m} ({s:.2})"))
            .collect()
    }

    fn recommendations(&self, metrics: &MetricScores) -> Vec<String> {
        let mut weak: Vec<(Metric, f64)> = metrics
            .iter()
            .filter(|(_, s)| **s < self.policy.weakness_threshold)
            .map(|(m, s)| (*m, *s))
            .collect();
        weak.sort_by(|a, b| a.1.total_cmp(&b.1));
        let recommendations: Vec<String> = weak
            .into_iter()
            .take(self.policy.max_weaknesses)
            .filter_map(|(m, _)| self.policy.recommendations.get(&m.to_string()).cloned())
            .collect();
        if recommendations.is_empty() {
            vec![self.policy.excellent_recommendation.clone()]
        } else {
            recommendations
        }
    }

    fn guarded(&self, metric: Metric, value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            tracing::warn!(
                "ConsistencyScorer: {metric} produced a non-finite score; using fallback {}",
                self.policy.metric_fallback
            );
            self.policy.metric_fallback
        }
    }

    // ── Metadata defaults ───────────────────────────────────────────────

    fn quality(&self, metadata: &AssetMetadata) -> f64 {
        metadata
            .generation_quality
            .unwrap_or(self.policy.default_generation_quality)
    }

    fn professional(&self, metadata: &AssetMetadata) -> f64 {
        metadata
            .professional_quality
            .unwrap_or(self.policy.default_professional_quality)
    }

    fn alignment(&self, metadata: &AssetMetadata) -> f64 {
        metadata
            .brand_alignment
            .unwrap_or(self.policy.default_brand_alignment)
    }

    fn type_base(table: &std::collections::BTreeMap<String, f64>, asset: &Asset, default: f64) -> f64 {
        table.get(asset.asset_type.as_str()).copied().unwrap_or(default)
    }

    // ── Metrics ─────────────────────────────────────────────────────────

    /// 1. Color overlap against each baseline asset, averaged, floored.
    /// A first asset is trivially consistent with itself.
    fn color_consistency(&self, candidate: &Asset, baseline: &[Asset]) -> f64 {
        if baseline.is_empty() {
            return self.policy.color_empty_baseline;
        }
        let mean: f64 = baseline
            .iter()
            .map(|b| {
                jaccard(
                    &candidate.metadata.primary_colors,
                    &b.metadata.primary_colors,
                )
            })
            .sum::<f64>()
            / baseline.len() as f64;
        mean.max(self.policy.color_floor)
    }

    /// 2. 60/40 blend of generation-method match ratio and style-keyword
    /// overlap, capped.
    fn style_consistency(&self, candidate: &Asset, baseline: &[Asset]) -> f64 {
        if baseline.is_empty() {
            return self.policy.style_empty_baseline;
        }
        let method_ratio = method_match_ratio(candidate, baseline);
        let baseline_keywords: Vec<String> = {
            let mut all: Vec<String> = baseline
                .iter()
                .flat_map(|b| b.metadata.style_keywords.iter().cloned())
                .collect();
            all.sort();
            all.dedup();
            all
        };
        let keyword_overlap = jaccard(&candidate.metadata.style_keywords, &baseline_keywords);
        (0.6 * method_ratio + 0.4 * keyword_overlap).min(self.policy.score_ceiling)
    }

    /// 3. Per-type base adjusted by declared generation quality.
    fn composition_consistency(&self, candidate: &Asset) -> f64 {
        let base = Self::type_base(
            &self.policy.composition_base,
            candidate,
            self.policy.composition_default,
        );
        (base * (0.9 + 0.1 * self.quality(&candidate.metadata))).min(self.policy.score_ceiling)
    }

    /// 4. Strategy-trait overlap blended 60/40 with declared brand alignment.
    fn brand_personality_alignment(&self, candidate: &Asset, strategy: &BrandStrategy) -> f64 {
        let traits = &strategy.brand_personality.traits;
        let tags = &candidate.metadata.personality_tags;
        let overlap = if traits.is_empty() || tags.is_empty() {
            UNDECLARED_OVERLAP
        } else {
            jaccard(traits, tags)
        };
        0.6 * overlap + 0.4 * self.alignment(&candidate.metadata)
    }

    /// 5. Mean of the declared quality indicators, with a small bonus when
    /// the producer flagged consistency as maintained.
    fn brand_values_expression(&self, candidate: &Asset) -> f64 {
        let m = &candidate.metadata;
        let mean = (self.quality(m) + self.professional(m) + self.alignment(m)) / 3.0;
        let bonus = if m.consistency_maintained { 0.05 } else { 0.0 };
        (mean + bonus).min(self.policy.score_ceiling)
    }

    /// 6. Per-type base plus a quality-proportional boost, capped.
    fn target_audience_appropriateness(&self, candidate: &Asset) -> f64 {
        let base = Self::type_base(
            &self.policy.audience_base,
            candidate,
            self.policy.audience_default,
        );
        (base + 0.1 * self.quality(&candidate.metadata)).min(self.policy.score_ceiling)
    }

    /// 7. Mean of four indicators: the two declared qualities, a
    /// large-enough-content proxy, and a preferred-method proxy.
    fn professional_standards(&self, candidate: &Asset) -> f64 {
        let m = &candidate.metadata;
        let content_ok = if candidate.content_reference.len() >= self.policy.content_reference_min_len
        {
            1.0
        } else {
            0.7
        };
        let preferred = m
            .generation_method
            .as_ref()
            .is_some_and(|method| self.policy.preferred_methods.contains(method));
        let method_ok = if preferred { 1.0 } else { 0.75 };
        (self.quality(m) + self.professional(m) + content_ok + method_ok) / 4.0
    }

    /// 8. Mean of four readiness indicators.
    fn commercial_viability(&self, candidate: &Asset) -> f64 {
        let m = &candidate.metadata;
        let content_valid = if candidate.content_reference.trim().is_empty() {
            0.6
        } else {
            1.0
        };
        let high_res = if m.high_resolution { 1.0 } else { 0.7 };
        let print_ready = if m.print_ready { 1.0 } else { 0.7 };
        (content_valid + high_res + print_ready + COMMERCIAL_BASE_QUALITY) / 4.0
    }

    /// 9. Per-type scalability base scaled by the quality factor.
    fn scalability_assessment(&self, candidate: &Asset) -> f64 {
        let base = Self::type_base(
            &self.policy.scalability_base,
            candidate,
            self.policy.scalability_default,
        );
        (base * (0.9 + 0.1 * self.quality(&candidate.metadata))).min(self.policy.score_ceiling)
    }

    /// 10. Per-baseline blend of color similarity and method equality,
    /// averaged and floored. With no baseline the DNA's dominant colors
    /// stand in when available.
    fn visual_dna_match(
        &self,
        candidate: &Asset,
        baseline: &[Asset],
        dna: Option<&VisualDna>,
    ) -> f64 {
        if baseline.is_empty() {
            return match dna {
                Some(dna) => {
                    let color_sim = jaccard(&candidate.metadata.primary_colors, &dna.dominant_colors());
                    (0.6 * color_sim + 0.4 * INTEGRATION_BASE).max(self.policy.dna_floor)
                }
                None => self.policy.dna_empty_baseline,
            };
        }
        let mean: f64 = baseline
            .iter()
            .map(|b| {
                let color_sim = jaccard(
                    &candidate.metadata.primary_colors,
                    &b.metadata.primary_colors,
                );
                let method_eq = match (
                    &candidate.metadata.generation_method,
                    &b.metadata.generation_method,
                ) {
                    (Some(a), Some(b)) if a == b => 1.0,
                    (Some(_), Some(_)) => 0.0,
                    _ => 0.5,
                };
                0.6 * color_sim + 0.4 * method_eq
            })
            .sum::<f64>()
            / baseline.len() as f64;
        mean.max(self.policy.dna_floor)
    }

    /// 11. Blend of the method-match ratio (mapped into [0.70, 0.95]) and
    /// closeness to the baseline's mean quality.
    fn cross_asset_harmony(&self, candidate: &Asset, baseline: &[Asset]) -> f64 {
        if baseline.is_empty() {
            return self.policy.harmony_empty_baseline;
        }
        let ratio = method_match_ratio(candidate, baseline);
        let method_component = 0.70 + ratio * 0.25;
        let baseline_mean: f64 = baseline
            .iter()
            .map(|b| self.quality(&b.metadata))
            .sum::<f64>()
            / baseline.len() as f64;
        let deviation = (self.quality(&candidate.metadata) - baseline_mean).abs();
        0.7 * method_component + 0.3 * (1.0 - deviation)
    }

    /// 12. Mean of four conditional indicators keyed on alignment, the
    /// consistency flag, and whether a baseline exists.
    fn brand_system_integration(&self, candidate: &Asset, baseline: &[Asset]) -> f64 {
        let m = &candidate.metadata;
        let aligned = if self.alignment(m) >= 0.8 { 0.9 } else { 0.75 };
        let maintained = if m.consistency_maintained { 0.9 } else { 0.8 };
        let system = if baseline.is_empty() { 0.85 } else { 0.88 };
        (aligned + maintained + system + INTEGRATION_BASE) / 4.0
    }
}

/// Jaccard overlap of two string sets. Two empty sets are trivially
/// identical.
fn jaccard(a: &[String], b: &[String]) -> f64 {
    use std::collections::BTreeSet;
    let left: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let right: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Fraction of baseline assets sharing the candidate's generation method.
/// Undeclared methods on either side count half.
fn method_match_ratio(candidate: &Asset, baseline: &[Asset]) -> f64 {
    if baseline.is_empty() {
        return 0.0;
    }
    let score: f64 = baseline
        .iter()
        .map(|b| {
            match (
                &candidate.metadata.generation_method,
                &b.metadata.generation_method,
            ) {
                (Some(a), Some(b)) if a == b => 1.0,
                (Some(_), Some(_)) => 0.0,
                _ => 0.5,
            }
        })
        .sum();
    score / baseline.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::AssetType;

    fn candidate(colors: &[&str], method: Option<&str>) -> Asset {
        let mut asset = Asset::new("p1", AssetType::Flyer, "asset://flyer/1");
        asset.metadata.primary_colors = colors.iter().map(|s| (*s).to_owned()).collect();
        asset.metadata.generation_method = method.map(str::to_owned);
        asset
    }

    fn scorer() -> ConsistencyScorer {
        ConsistencyScorer::new(ScoringPolicy::default())
    }

    #[test]
    fn all_scores_within_unit_interval() {
        let asset = candidate(&["#112233"], Some("external"));
        let baseline = vec![candidate(&["#445566"], Some("diffusion"))];
        let analysis = scorer().score(&asset, &baseline, &BrandStrategy::default(), None);
        for (metric, score) in &analysis.metrics {
            assert!(
                (0.0..=1.0).contains(score),
                "{metric} out of bounds: {score}"
            );
        }
        assert!((0.0..=1.0).contains(&analysis.overall_score));
    }

    #[test]
    fn empty_baseline_metrics_at_least_point_eight() {
        let asset = candidate(&["#112233"], Some("external"));
        let analysis = scorer().score(&asset, &[], &BrandStrategy::default(), None);
        for metric in [
            Metric::ColorConsistency,
            Metric::StyleConsistency,
            Metric::VisualDnaMatch,
            Metric::CrossAssetHarmony,
            Metric::BrandSystemIntegration,
        ] {
            assert!(
                analysis.metrics[&metric] >= 0.80,
                "{metric} below first-asset floor: {}",
                analysis.metrics[&metric]
            );
        }
    }

    #[test]
    fn first_asset_scenario_is_deterministic() {
        let asset = candidate(&["#112233"], Some("external"));
        let strategy = BrandStrategy::default();
        let s = scorer();
        let first = s.score(&asset, &[], &strategy, None);
        let second = s.score(&asset, &[], &strategy, None);
        assert_eq!(first.metrics, second.metrics);
        assert!((first.overall_score - second.overall_score).abs() < f64::EPSILON);
        // Empty-baseline color fallback sits in the first-asset range
        assert!(first.metrics[&Metric::ColorConsistency] >= 0.85);
    }

    #[test]
    fn identical_assets_score_high_on_color_and_dna() {
        let asset = candidate(&["#112233", "#445566"], Some("external"));
        let twin = candidate(&["#112233", "#445566"], Some("external"));
        let analysis = scorer().score(&asset, &[twin], &BrandStrategy::default(), None);
        assert!(analysis.metrics[&Metric::ColorConsistency] >= 0.95);
        assert!(analysis.metrics[&Metric::VisualDnaMatch] >= 0.95);
    }

    #[test]
    fn disjoint_colors_hit_the_floor() {
        let asset = candidate(&["#000000"], Some("external"));
        let baseline = vec![candidate(&["#ffffff"], Some("external"))];
        let analysis = scorer().score(&asset, &baseline, &BrandStrategy::default(), None);
        assert!((analysis.metrics[&Metric::ColorConsistency] - 0.8).abs() < 1e-9);
        assert!((analysis.metrics[&Metric::VisualDnaMatch] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn flyer_scalability_scenario() {
        let mut asset = candidate(&[], None);
        asset.metadata.generation_quality = Some(0.5);
        let analysis = scorer().score(&asset, &[], &BrandStrategy::default(), None);
        // 0.82 * (0.9 + 0.5 * 0.1) = 0.779
        assert!((analysis.metrics[&Metric::ScalabilityAssessment] - 0.779).abs() < 1e-9);
    }

    #[test]
    fn overall_normalizes_by_present_weights() {
        let s = scorer();
        let mut metrics = MetricScores::new();
        metrics.insert(Metric::ColorConsistency, 0.9);
        metrics.insert(Metric::StyleConsistency, 0.9);
        // Only two metrics present; mean must still be 0.9, not diluted by
        // the absent ten
        assert!((s.overall(&metrics) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn strengths_capped_at_five() {
        let asset = candidate(&["#112233"], Some("external"));
        let twin = candidate(&["#112233"], Some("external"));
        let mut strong = asset.clone();
        strong.metadata.generation_quality = Some(0.95);
        strong.metadata.professional_quality = Some(0.95);
        strong.metadata.brand_alignment = Some(0.95);
        strong.metadata.high_resolution = true;
        strong.metadata.print_ready = true;
        strong.metadata.consistency_maintained = true;
        let analysis = scorer().score(&strong, &[twin], &BrandStrategy::default(), None);
        assert!(analysis.strengths.len() <= 5);
        assert!(analysis.weaknesses.len() <= 3);
    }

    #[test]
    fn no_weaknesses_yields_excellent_recommendation() {
        let asset = candidate(&["#112233"], Some("external"));
        let twin = candidate(&["#112233"], Some("external"));
        let analysis = scorer().score(&asset, &[twin], &BrandStrategy::default(), None);
        if analysis.weaknesses.is_empty() {
            assert_eq!(analysis.recommendations.len(), 1);
            assert!(analysis.recommendations[0].contains("Excellent"));
        }
    }

    #[test]
    fn weak_metrics_produce_targeted_recommendations() {
        let mut asset = candidate(&["#000000"], Some("handmade"));
        asset.metadata.generation_quality = Some(0.3);
        asset.metadata.professional_quality = Some(0.3);
        asset.metadata.brand_alignment = Some(0.3);
        asset.content_reference = "x".into();
        let baseline = vec![candidate(&["#ffffff"], Some("external"))];
        let analysis = scorer().score(&asset, &baseline, &BrandStrategy::default(), None);
        assert!(!analysis.weaknesses.is_empty());
        assert!(!analysis.recommendations.is_empty());
        assert!(!analysis.recommendations[0].contains("Excellent"));
    }

    #[test]
    fn analysis_confidence_tracks_overall() {
        let asset = candidate(&["#112233"], Some("external"));
        let analysis = scorer().score(&asset, &[], &BrandStrategy::default(), None);
        let expected = (analysis.overall_score + 0.1).min(1.0);
        assert!((analysis.analysis_confidence - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let set = vec!["#1".to_owned(), "#2".to_owned()];
        assert!((jaccard(&set, &set) - 1.0).abs() < f64::EPSILON);
        assert!((jaccard(&[], &[]) - 1.0).abs() < f64::EPSILON);
        assert!(jaccard(&set, &[]) < f64::EPSILON);
    }
}
