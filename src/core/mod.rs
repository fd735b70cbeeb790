pub mod feedback;
pub mod orchestrator;
pub mod style;
