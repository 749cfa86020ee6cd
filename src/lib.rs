#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::cast_precision_loss
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
#[doc(hidden)]
pub mod observability;

pub use config::EngineConfig;
pub use engine::{
    Asset, AssetMetadata, AssetType, BrandStrategy, ConsistencyAnalysis, ConsistencyOrchestrator,
    ConsistencyScorer, MemoryStore, Metric, RefinementLoop, RefinementResult, ValidationOutcome,
    VisualDna, VisualDnaBuilder,
};
pub use error::{BrandloomError, Result};
pub use generation::{GenerationOutput, GenerationRequest, Generator, NullGenerator, QualityTier};
