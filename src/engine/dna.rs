use super::extractor;
use super::types::{Asset, VisualDna};
use crate::error::ExtractionError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-phase extraction confidences. These are fixed representative values
/// for each extraction phase, not measured per call; the overall confidence
/// is their arithmetic mean.
const PHASE_CONFIDENCES: [f64; 5] = [
    0.85, // color
    0.78, // geometry
    0.72, // typography
    0.80, // style
    0.75, // brand manifestation
];

/// Confidence reported when fingerprint derivation fails internally.
const DEGRADED_CONFIDENCE: f64 = 0.5;

/// Seed substituted when fingerprint derivation fails; callers still get a
/// well-formed DNA.
const FALLBACK_SEED: &str = "0000000000000000";

const SEED_LEN: usize = 16;

/// Canonical fingerprint material. Field order is fixed by the struct and
/// every list is sorted and deduplicated, so the serialization (and the
/// seed) is independent of asset ordering.
#[derive(Serialize)]
struct SeedMaterial {
    colors: Vec<String>,
    keywords: Vec<String>,
    traits: Vec<String>,
}

/// Builds a unified Visual DNA profile from a snapshot of assets.
pub struct VisualDnaBuilder;

impl VisualDnaBuilder {
    /// Run all fifteen category extractions and derive the fingerprint.
    ///
    /// Never errors: an internal fault degrades `extraction_confidence` to
    /// 0.5 and the returned DNA is still fully populated.
    pub fn extract(assets: &[Asset]) -> VisualDna {
        let mut dna = VisualDna {
            color: extractor::extract_color(assets),
            color_harmony: extractor::extract_color_harmony(assets),
            color_psychology: extractor::extract_color_psychology(assets),
            shape_language: extractor::extract_shape_language(assets),
            composition: extractor::extract_composition(assets),
            spatial_relationships: extractor::extract_spatial_relationships(assets),
            typography: extractor::extract_typography(assets),
            hierarchy: extractor::extract_hierarchy(assets),
            text_styling: extractor::extract_text_styling(assets),
            aesthetic_signature: extractor::extract_aesthetic_signature(assets),
            personality: extractor::extract_personality(assets),
            design_system: extractor::extract_design_system(assets),
            brand_expression: extractor::extract_brand_expression(assets),
            emotional_tone: extractor::extract_emotional_tone(assets),
            industry_fit: extractor::extract_industry_fit(assets),
            consistency_seed: String::new(),
            extraction_confidence: Self::confidence(),
        };

        match Self::consistency_seed(assets) {
            Ok(seed) => dna.consistency_seed = seed,
            Err(e) => {
                tracing::warn!("VisualDnaBuilder: fingerprint degraded: {e}");
                dna.consistency_seed = FALLBACK_SEED.to_owned();
                dna.extraction_confidence = DEGRADED_CONFIDENCE;
            }
        }
        dna
    }

    fn confidence() -> f64 {
        PHASE_CONFIDENCES.iter().sum::<f64>() / PHASE_CONFIDENCES.len() as f64
    }

    /// Short stable fingerprint over the qualifying attribute sets.
    fn consistency_seed(assets: &[Asset]) -> Result<String, ExtractionError> {
        let mut colors = extractor::dominant_colors(assets, 5);
        colors.sort();
        colors.dedup();
        let material = SeedMaterial {
            colors,
            keywords: extractor::style_keywords(assets),
            traits: extractor::personality_tags(assets),
        };
        let canonical = serde_json::to_string(&material)
            .map_err(|e| ExtractionError::Fingerprint(e.to_string()))?;
        let digest = Sha256::digest(canonical.as_bytes());
        Ok(hex::encode(digest)[..SEED_LEN].to_owned())
    }
}

/// Process-lifetime DNA cache keyed by brand-strategy id.
///
/// There is no explicit invalidation; entries live until the process (or the
/// owning orchestrator) goes away. Shared across concurrent orchestrator
/// invocations, so reads and writes serialize on one lock.
#[derive(Default)]
pub struct DnaCache {
    inner: Mutex<HashMap<String, Arc<VisualDna>>>,
}

impl DnaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached DNA for a strategy, extracting and caching it on first use.
    pub fn get_or_extract(&self, strategy_id: &str, assets: &[Asset]) -> Arc<VisualDna> {
        let mut cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dna) = cache.get(strategy_id) {
            return Arc::clone(dna);
        }
        let dna = Arc::new(VisualDnaBuilder::extract(assets));
        cache.insert(strategy_id.to_owned(), Arc::clone(&dna));
        dna
    }

    pub fn get(&self, strategy_id: &str) -> Option<Arc<VisualDna>> {
        let cache = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(strategy_id).map(Arc::clone)
    }
}
