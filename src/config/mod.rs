pub mod schema;

pub use schema::{
    Config, EvolutionConfig, FeedbackConfig, ObservabilityConfig, OrchestratorConfig,
};
