pub mod dna;
pub mod extractor;
pub mod memory;
pub mod orchestrator;
pub mod refine;
pub mod scorer;
pub mod types;

pub use dna::{DnaCache, VisualDnaBuilder};
pub use memory::{MemoryNode, MemoryState, MemoryStore, MetricTrend, Trend, TypeInsights};
pub use orchestrator::ConsistencyOrchestrator;
pub use refine::RefinementLoop;
pub use scorer::ConsistencyScorer;
pub use types::{
    Asset, AssetMetadata, AssetType, BrandPersonality, BrandStrategy, CategoryProfile,
    ConsistencyAnalysis, GenerationConstraints, GenerationInstructions, MessagingFramework,
    Metric, MetricScores, OutcomeKind, RefinementRecord, RefinementResult, ValidationOutcome,
    VisualDirection, VisualDna,
};
