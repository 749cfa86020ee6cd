pub mod schema;

pub use schema::{EngineConfig, MemoryConfig, MetricWeights, RefinementConfig, ScoringPolicy};
