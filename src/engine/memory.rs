use super::types::{Asset, AssetType, ConsistencyAnalysis, Metric};
use crate::config::MemoryConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use strum::Display;

// Trend — direction of a metric's recent history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Stable,
}

// MemoryNode — per-asset-type aggregate statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryNode {
    pub total_assets: u64,
    /// Running mean, updated incrementally on each recorded outcome.
    pub average_consistency: f64,
    /// Deduplicated strength strings, oldest evicted first.
    pub best_practices: VecDeque<String>,
    pub common_issues: VecDeque<String>,
}

// MetricTrend — bounded score history plus derived direction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricTrend {
    pub history: VecDeque<f64>,
    pub average: f64,
    pub trend: Trend,
}

// PatternRecord — metadata snapshot of a notably good or bad outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecord {
    pub asset_type: AssetType,
    #[serde(default)]
    pub generation_method: Option<String>,
    pub metadata: super::types::AssetMetadata,
    pub overall_score: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Snapshot handed back by `insights`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeInsights {
    pub node: MemoryNode,
    pub best_practices: Vec<String>,
    pub common_pitfalls: Vec<String>,
    #[serde(default)]
    pub recent_success_rate: Option<f64>,
    pub fallback_recommendations: Vec<String>,
}

/// The full learning state. Serializable so hosts can persist it across
/// processes through their own storage collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryState {
    nodes: BTreeMap<String, MemoryNode>,
    /// Success patterns keyed by "asset_type::generation_method".
    success_patterns: BTreeMap<String, Vec<PatternRecord>>,
    /// Challenge patterns keyed by asset type alone.
    challenge_patterns: BTreeMap<String, Vec<PatternRecord>>,
    metric_trends: BTreeMap<Metric, MetricTrend>,
    recent_scores: BTreeMap<String, VecDeque<f64>>,
}

/// Cross-project learning memory: per-asset-type statistics, success and
/// challenge exemplars, and per-metric trend detection.
///
/// The single lock makes each record/insights call an atomic
/// read-modify-write, so one store can be shared by concurrent orchestrator
/// invocations without breaking the running-average or bounded-list
/// invariants.
pub struct MemoryStore {
    config: MemoryConfig,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Record one scored outcome.
    pub fn record(&self, asset: &Asset, analysis: &ConsistencyAnalysis) {
        let mut state = self.lock();
        let score = analysis.overall_score;
        let type_key = asset.asset_type.to_string();

        if score >= self.config.success_threshold {
            let method = asset
                .metadata
                .generation_method
                .clone()
                .unwrap_or_else(|| "undeclared".into());
            let key = format!("{type_key}::{method}");
            let bucket = state.success_patterns.entry(key).or_default();
            bucket.push(Self::pattern_record(asset, score));
            trim_front(bucket, self.config.success_bucket_cap);
        }
        if score < self.config.challenge_threshold {
            let bucket = state.challenge_patterns.entry(type_key.clone()).or_default();
            bucket.push(Self::pattern_record(asset, score));
            trim_front(bucket, self.config.challenge_bucket_cap);
        }

        let practice_threshold = self.config.practice_threshold;
        let challenge_threshold = self.config.challenge_threshold;
        let practices_cap = self.config.best_practices_cap;
        let issues_cap = self.config.common_issues_cap;
        let node = state.nodes.entry(type_key.clone()).or_default();
        let n = node.total_assets as f64;
        node.average_consistency = (node.average_consistency * n + score) / (n + 1.0);
        node.total_assets += 1;
        if score >= practice_threshold {
            merge_bounded(&mut node.best_practices, &analysis.strengths, practices_cap);
        }
        if score < challenge_threshold {
            merge_bounded(&mut node.common_issues, &analysis.weaknesses, issues_cap);
        }

        for (metric, metric_score) in &analysis.metrics {
            let history_cap = self.config.trend_history_cap;
            let trend_entry = state.metric_trends.entry(*metric).or_default();
            trend_entry.history.push_back(*metric_score);
            while trend_entry.history.len() > history_cap {
                trend_entry.history.pop_front();
            }
            trend_entry.average = mean(trend_entry.history.iter().copied());
            trend_entry.trend =
                detect_trend(&trend_entry.history, self.config.trend_window, self.config.trend_threshold);
        }

        let recent = state.recent_scores.entry(type_key).or_default();
        recent.push_back(score);
        while recent.len() > self.config.recent_scores_cap {
            recent.pop_front();
        }
    }

    /// Aggregate insight snapshot for one asset type.
    pub fn insights(&self, asset_type: &AssetType) -> TypeInsights {
        let state = self.lock();
        let type_key = asset_type.to_string();
        let node = state.nodes.get(&type_key).cloned().unwrap_or_default();
        let best_practices = node
            .best_practices
            .iter()
            .take(self.config.insights_best_practices)
            .cloned()
            .collect();
        let common_pitfalls = node
            .common_issues
            .iter()
            .take(self.config.insights_common_issues)
            .cloned()
            .collect();
        let recent_success_rate = state
            .recent_scores
            .get(&type_key)
            .filter(|scores| !scores.is_empty())
            .map(|scores| mean(scores.iter().copied()));
        let fallback_recommendations = self
            .config
            .fallback_recommendations
            .get(&type_key)
            .cloned()
            .unwrap_or_default();
        TypeInsights {
            node,
            best_practices,
            common_pitfalls,
            recent_success_rate,
            fallback_recommendations,
        }
    }

    /// Current trend for one metric, if any history exists.
    pub fn metric_trend(&self, metric: Metric) -> Option<MetricTrend> {
        self.lock().metric_trends.get(&metric).cloned()
    }

    /// Clone of the full learning state, for host-side persistence.
    pub fn snapshot(&self) -> MemoryState {
        self.lock().clone()
    }

    /// Replace the learning state with a previously snapshotted one.
    pub fn restore(&self, state: MemoryState) {
        *self.lock() = state;
    }

    fn pattern_record(asset: &Asset, score: f64) -> PatternRecord {
        PatternRecord {
            asset_type: asset.asset_type.clone(),
            generation_method: asset.metadata.generation_method.clone(),
            metadata: asset.metadata.clone(),
            overall_score: score,
            recorded_at: Utc::now(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        0.0
    } else {
        collected.iter().sum::<f64>() / collected.len() as f64
    }
}

fn trim_front<T>(bucket: &mut Vec<T>, cap: usize) {
    while bucket.len() > cap {
        bucket.remove(0);
    }
}

fn merge_bounded(list: &mut VecDeque<String>, additions: &[String], cap: usize) {
    for addition in additions {
        if !list.contains(addition) {
            list.push_back(addition.clone());
        }
    }
    while list.len() > cap {
        list.pop_front();
    }
}

/// Dual-mode trend detection: with two full windows of history, compare the
/// most recent window to the one before it; with at least one window,
/// compare the recent window to the all-time average; otherwise stable.
fn detect_trend(history: &VecDeque<f64>, window: usize, threshold: f64) -> Trend {
    if history.len() < window {
        return Trend::Stable;
    }
    let recent = mean(history.iter().rev().take(window).copied());
    let reference = if history.len() >= window * 2 {
        mean(history.iter().rev().skip(window).take(window).copied())
    } else {
        mean(history.iter().copied())
    };
    let delta = recent - reference;
    if delta > threshold {
        Trend::Improving
    } else if delta < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{AssetMetadata, MetricScores};

    fn analysis(overall: f64) -> ConsistencyAnalysis {
        let mut metrics = MetricScores::new();
        metrics.insert(Metric::ColorConsistency, overall);
        metrics.insert(Metric::StyleConsistency, overall);
        ConsistencyAnalysis {
            metrics,
            overall_score: overall,
            strengths: vec![format!("strength at {overall:.2}")],
            weaknesses: vec![format!("weakness at {overall:.2}")],
            recommendations: vec![],
            analysis_confidence: ConsistencyAnalysis::confidence_for(overall),
            fallback_reason: None,
            analyzed_at: Utc::now(),
        }
    }

    fn logo(method: &str) -> Asset {
        let mut asset = Asset::new("p1", AssetType::LogoPrimary, "asset://logo/1");
        asset.metadata = AssetMetadata {
            generation_method: Some(method.into()),
            ..AssetMetadata::default()
        };
        asset
    }

    fn store() -> MemoryStore {
        MemoryStore::new(MemoryConfig::default())
    }

    #[test]
    fn running_average_updates_incrementally() {
        let store = store();
        let asset = logo("external");
        store.record(&asset, &analysis(0.8));
        store.record(&asset, &analysis(0.9));
        let insights = store.insights(&AssetType::LogoPrimary);
        assert_eq!(insights.node.total_assets, 2);
        assert!((insights.node.average_consistency - 0.85).abs() < 1e-9);
    }

    #[test]
    fn bounded_lists_never_exceed_caps() {
        let store = store();
        let asset = logo("external");
        for i in 0..100 {
            // Alternate strong and weak outcomes with distinct strings
            let score = if i % 2 == 0 { 0.91 } else { 0.70 };
            let mut a = analysis(score);
            a.strengths = vec![format!("strength {i}")];
            a.weaknesses = vec![format!("weakness {i}")];
            store.record(&asset, &a);
        }
        let insights = store.insights(&AssetType::LogoPrimary);
        assert!(insights.node.best_practices.len() <= 10);
        assert!(insights.node.common_issues.len() <= 10);
        let trend = store.metric_trend(Metric::ColorConsistency).unwrap();
        assert!(trend.history.len() <= 20);
    }

    #[test]
    fn success_and_challenge_buckets_are_bounded() {
        let store = store();
        let asset = logo("external");
        for _ in 0..30 {
            store.record(&asset, &analysis(0.9));
            store.record(&asset, &analysis(0.5));
        }
        let state = store.snapshot();
        for bucket in state.success_patterns.values() {
            assert!(bucket.len() <= 10);
        }
        for bucket in state.challenge_patterns.values() {
            assert!(bucket.len() <= 5);
        }
    }

    #[test]
    fn mid_range_scores_enter_neither_bucket() {
        let store = store();
        let asset = logo("external");
        store.record(&asset, &analysis(0.82));
        let state = store.snapshot();
        assert!(state.success_patterns.is_empty());
        assert!(state.challenge_patterns.is_empty());
        assert_eq!(state.nodes["logo_primary"].total_assets, 1);
    }

    #[test]
    fn trend_improving_with_rising_windows() {
        let mut history = VecDeque::new();
        for score in [0.5, 0.5, 0.5, 0.5, 0.5, 0.8, 0.8, 0.8, 0.8, 0.8] {
            history.push_back(score);
        }
        assert_eq!(detect_trend(&history, 5, 0.05), Trend::Improving);
    }

    #[test]
    fn trend_declining_with_falling_windows() {
        let mut history = VecDeque::new();
        for score in [0.9, 0.9, 0.9, 0.9, 0.9, 0.6, 0.6, 0.6, 0.6, 0.6] {
            history.push_back(score);
        }
        assert_eq!(detect_trend(&history, 5, 0.05), Trend::Declining);
    }

    #[test]
    fn trend_single_window_compares_to_all_time_average() {
        let mut history = VecDeque::new();
        // 7 samples: recent 5 average 0.9 vs all-time average ≈ 0.843
        for score in [0.7, 0.7, 0.9, 0.9, 0.9, 0.9, 0.9] {
            history.push_back(score);
        }
        assert_eq!(detect_trend(&history, 5, 0.05), Trend::Improving);
    }

    #[test]
    fn trend_insufficient_history_is_stable() {
        let mut history = VecDeque::new();
        history.push_back(0.9);
        assert_eq!(detect_trend(&history, 5, 0.05), Trend::Stable);
    }

    #[test]
    fn insights_include_fallback_recommendations() {
        let store = store();
        let insights = store.insights(&AssetType::Flyer);
        assert!(!insights.fallback_recommendations.is_empty());
        assert!(insights.recent_success_rate.is_none());
        assert_eq!(insights.node.total_assets, 0);
    }

    #[test]
    fn recent_success_rate_windows_last_scores() {
        let store = store();
        let asset = logo("external");
        for _ in 0..15 {
            store.record(&asset, &analysis(0.6));
        }
        for _ in 0..10 {
            store.record(&asset, &analysis(0.9));
        }
        let insights = store.insights(&AssetType::LogoPrimary);
        // Window of 10 only sees the recent 0.9 run
        assert!((insights.recent_success_rate.unwrap() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let store = store();
        let asset = logo("external");
        store.record(&asset, &analysis(0.9));
        let snapshot = store.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let recovered: MemoryState = serde_json::from_str(&json).unwrap();

        let fresh = MemoryStore::new(MemoryConfig::default());
        fresh.restore(recovered);
        let insights = fresh.insights(&AssetType::LogoPrimary);
        assert_eq!(insights.node.total_assets, 1);
    }
}
