//! Category-level attribute extraction over declared asset metadata.
//!
//! Every function here is a pure function of its input assets: declared
//! attributes are aggregated by set union / frequency count, and categories
//! with no declared signal fall back to static domain defaults instead of
//! erroring. Sparse metadata degrades to generic but plausible brand
//! descriptors.

use super::types::{Asset, CategoryProfile};
use serde_json::json;
use std::collections::BTreeMap;

// ─── Aggregation helpers ────────────────────────────────────────────────────

/// Frequency of each declared color across the asset set.
pub fn color_frequencies(assets: &[Asset]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for asset in assets {
        for color in &asset.metadata.primary_colors {
            *counts.entry(color.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// The `n` most frequent colors, ties broken lexicographically so the result
/// is independent of asset ordering.
pub fn dominant_colors(assets: &[Asset], n: usize) -> Vec<String> {
    let counts = color_frequencies(assets);
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(n).map(|(color, _)| color).collect()
}

/// Sorted union of declared style keywords.
pub fn style_keywords(assets: &[Asset]) -> Vec<String> {
    let mut keywords: Vec<String> = assets
        .iter()
        .flat_map(|a| a.metadata.style_keywords.iter().cloned())
        .collect();
    keywords.sort();
    keywords.dedup();
    keywords
}

/// Sorted union of declared personality tags.
pub fn personality_tags(assets: &[Asset]) -> Vec<String> {
    let mut tags: Vec<String> = assets
        .iter()
        .flat_map(|a| a.metadata.personality_tags.iter().cloned())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Frequency of each declared generation method.
pub fn method_counts(assets: &[Asset]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for asset in assets {
        if let Some(method) = &asset.metadata.generation_method {
            *counts.entry(method.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// The most common generation method, ties broken lexicographically.
pub fn dominant_method(assets: &[Asset]) -> Option<String> {
    method_counts(assets)
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(method, _)| method)
}

/// Mean declared generation quality, if any asset declared one.
pub fn mean_quality(assets: &[Asset]) -> Option<f64> {
    let declared: Vec<f64> = assets
        .iter()
        .filter_map(|a| a.metadata.generation_quality)
        .collect();
    if declared.is_empty() {
        None
    } else {
        Some(declared.iter().sum::<f64>() / declared.len() as f64)
    }
}

fn types_observed(assets: &[Asset]) -> Vec<String> {
    let mut types: Vec<String> = assets
        .iter()
        .map(|a| a.asset_type.to_string())
        .collect();
    types.sort();
    types.dedup();
    types
}

fn keyword_signal(assets: &[Asset], candidates: &[&str]) -> Option<String> {
    let keywords = style_keywords(assets);
    candidates
        .iter()
        .find(|c| keywords.iter().any(|k| k.contains(*c)))
        .map(|c| (*c).to_owned())
}

// ─── Category extractions ───────────────────────────────────────────────────

pub fn extract_color(assets: &[Asset]) -> CategoryProfile {
    let dominant = dominant_colors(assets, 5);
    let palette_size = color_frequencies(assets).len();
    BTreeMap::from([
        ("dominant".into(), json!(dominant)),
        ("palette_size".into(), json!(palette_size)),
        (
            "saturation_profile".into(),
            json!(if palette_size > 3 { "varied" } else { "restrained" }),
        ),
    ])
}

pub fn extract_color_harmony(assets: &[Asset]) -> CategoryProfile {
    let palette_size = color_frequencies(assets).len();
    let scheme = match palette_size {
        0 | 1 => "monochromatic",
        2 => "complementary",
        3 => "triadic",
        _ => "extended",
    };
    BTreeMap::from([
        ("scheme".into(), json!(scheme)),
        ("accent_usage".into(), json!("selective")),
    ])
}

pub fn extract_color_psychology(assets: &[Asset]) -> CategoryProfile {
    let mood = keyword_signal(assets, &["warm", "cool", "vibrant", "muted"])
        .unwrap_or_else(|| "confident_calm".into());
    BTreeMap::from([
        ("mood".into(), json!(mood)),
        ("energy".into(), json!("balanced")),
    ])
}

pub fn extract_shape_language(assets: &[Asset]) -> CategoryProfile {
    let philosophy = keyword_signal(assets, &["geometric", "organic", "angular", "rounded"])
        .unwrap_or_else(|| "clean_minimalism".into());
    BTreeMap::from([
        ("philosophy".into(), json!(philosophy)),
        ("corner_treatment".into(), json!("consistent")),
    ])
}

pub fn extract_composition(assets: &[Asset]) -> CategoryProfile {
    BTreeMap::from([
        ("balance".into(), json!("centered_balance")),
        ("grid_discipline".into(), json!("aligned")),
        ("asset_types".into(), json!(types_observed(assets))),
    ])
}

pub fn extract_spatial_relationships(assets: &[Asset]) -> CategoryProfile {
    let density = if assets.len() > 4 { "established" } else { "forming" };
    BTreeMap::from([
        ("whitespace".into(), json!("generous")),
        ("density".into(), json!(density)),
    ])
}

pub fn extract_typography(assets: &[Asset]) -> CategoryProfile {
    let family = keyword_signal(assets, &["serif", "sans", "mono", "script"])
        .unwrap_or_else(|| "modern_sans".into());
    BTreeMap::from([
        ("family_direction".into(), json!(family)),
        ("weight_range".into(), json!("regular_to_bold")),
    ])
}

pub fn extract_hierarchy(_assets: &[Asset]) -> CategoryProfile {
    BTreeMap::from([
        ("primary_focus".into(), json!("logo_led")),
        ("reading_order".into(), json!("top_down")),
    ])
}

pub fn extract_text_styling(_assets: &[Asset]) -> CategoryProfile {
    BTreeMap::from([
        ("density".into(), json!("minimal_text")),
        ("case_treatment".into(), json!("mixed_case")),
    ])
}

pub fn extract_aesthetic_signature(assets: &[Asset]) -> CategoryProfile {
    let keywords = style_keywords(assets);
    let signature = if keywords.is_empty() {
        "contemporary_professional".to_owned()
    } else {
        keywords.join("_")
    };
    BTreeMap::from([
        ("keywords".into(), json!(keywords)),
        ("signature".into(), json!(signature)),
    ])
}

pub fn extract_personality(assets: &[Asset]) -> CategoryProfile {
    let mut traits = personality_tags(assets);
    if traits.is_empty() {
        traits = vec!["professional".into(), "trustworthy".into()];
    }
    BTreeMap::from([("traits".into(), json!(traits))])
}

pub fn extract_design_system(assets: &[Asset]) -> CategoryProfile {
    let methods: Vec<String> = method_counts(assets).into_keys().collect();
    BTreeMap::from([
        ("generation_methods".into(), json!(methods)),
        ("dominant_method".into(), json!(dominant_method(assets))),
        ("asset_count".into(), json!(assets.len())),
    ])
}

pub fn extract_brand_expression(assets: &[Asset]) -> CategoryProfile {
    let maintained = assets
        .iter()
        .filter(|a| a.metadata.consistency_maintained)
        .count();
    let ratio = if assets.is_empty() {
        0.0
    } else {
        maintained as f64 / assets.len() as f64
    };
    BTreeMap::from([
        ("expression".into(), json!("confident")),
        ("consistency_ratio".into(), json!(ratio)),
    ])
}

pub fn extract_emotional_tone(assets: &[Asset]) -> CategoryProfile {
    let tone = keyword_signal(assets, &["playful", "serious", "elegant", "bold"])
        .unwrap_or_else(|| "assured_optimism".into());
    BTreeMap::from([("tone".into(), json!(tone))])
}

pub fn extract_industry_fit(assets: &[Asset]) -> CategoryProfile {
    let coverage = types_observed(assets);
    BTreeMap::from([
        ("versatility".into(), json!("multi_format")),
        ("format_coverage".into(), json!(coverage.len())),
    ])
}
