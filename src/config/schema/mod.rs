mod core;
mod evolution;
mod feedback;
mod observability;
mod orchestrator;

pub use core::Config;
pub use evolution::EvolutionConfig;
pub use feedback::FeedbackConfig;
pub use observability::ObservabilityConfig;
pub use orchestrator::OrchestratorConfig;
