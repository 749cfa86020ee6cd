use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Brandloom`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains. Most of the engine degrades to
/// documented fallback values instead of erroring (see the scorer and DNA
/// builder); these types cover the genuinely fallible boundaries: config
/// load, the generation collaborator, and memory snapshots.
#[derive(Debug, Error)]
pub enum BrandloomError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generation collaborator ─────────────────────────────────────────
    #[error("generation: {0}")]
    Generation(#[from] GenerationError),

    // ── DNA extraction ──────────────────────────────────────────────────
    #[error("extraction: {0}")]
    Extraction(#[from] ExtractionError),

    // ── Refinement loop ─────────────────────────────────────────────────
    #[error("refinement: {0}")]
    Refinement(#[from] RefinementError),

    // ── Learning memory ─────────────────────────────────────────────────
    #[error("memory: {0}")]
    Memory(#[from] MemoryError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Generation collaborator errors ─────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator {generator} request failed: {message}")]
    Request { generator: String, message: String },

    #[error("generator {generator} unavailable")]
    Unavailable { generator: String },

    #[error("generator {generator} exhausted retries for tier {tier}")]
    RetriesExhausted { generator: String, tier: String },
}

// ─── DNA extraction errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("fingerprint serialization failed: {0}")]
    Fingerprint(String),

    #[error("category {category} extraction failed: {message}")]
    Category { category: String, message: String },
}

// ─── Refinement errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RefinementError {
    #[error("iteration {iteration} aborted: {message}")]
    IterationAborted { iteration: usize, message: String },

    #[error("no analysis available for asset {asset_id}")]
    MissingAnalysis { asset_id: String },
}

// ─── Memory errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    #[error("snapshot failed: {0}")]
    Snapshot(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, BrandloomError>;
