use super::memory::MemoryConfig;
use super::refinement::RefinementConfig;
use super::scoring::ScoringPolicy;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ── Top-level config ──────────────────────────────────────────────

/// Top-level engine configuration composing the per-subsystem policies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringPolicy,

    #[serde(default)]
    pub refinement: RefinementConfig,

    #[serde(default)]
    pub memory: MemoryConfig,
}

impl EngineConfig {
    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break scoring invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f64| -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Validation(format!(
                    "{name} must be in [0, 1], got {v}"
                )))
            }
        };
        unit("scoring.score_ceiling", self.scoring.score_ceiling)?;
        unit("scoring.metric_fallback", self.scoring.metric_fallback)?;
        unit("scoring.strength_threshold", self.scoring.strength_threshold)?;
        unit("scoring.weakness_threshold", self.scoring.weakness_threshold)?;
        unit(
            "refinement.target_consistency",
            self.refinement.target_consistency,
        )?;
        unit(
            "refinement.early_exit_threshold",
            self.refinement.early_exit_threshold,
        )?;

        if self.refinement.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "refinement.max_iterations must be at least 1".into(),
            ));
        }
        if self.refinement.critical_band_max >= self.refinement.moderate_band_max
            || self.refinement.moderate_band_max >= self.refinement.fine_tune_band_max
        {
            return Err(ConfigError::Validation(
                "refinement bands must be strictly increasing".into(),
            ));
        }
        if self.memory.trend_window == 0 {
            return Err(ConfigError::Validation(
                "memory.trend_window must be at least 1".into(),
            ));
        }
        if self.memory.trend_history_cap < self.memory.trend_window * 2 {
            return Err(ConfigError::Validation(
                "memory.trend_history_cap must hold two trend windows".into(),
            ));
        }
        Ok(())
    }
}
