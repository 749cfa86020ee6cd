mod engine;
mod memory;
mod refinement;
mod scoring;

pub use engine::EngineConfig;
pub use memory::MemoryConfig;
pub use refinement::RefinementConfig;
pub use scoring::{MetricWeights, ScoringPolicy};
