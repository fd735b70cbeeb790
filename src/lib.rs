#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod core;
pub mod error;
pub mod observability;

pub use config::Config;
pub use crate::core::feedback::{FeedbackAggregator, FeedbackSample, FeedbackSource};
pub use crate::core::orchestrator::CreativeOrchestrator;
pub use crate::core::style::{GenerationRecord, Style, StyleEvolutionEngine};
pub use error::{ChromaticaError, CollaboratorError, ConfigError, StyleError};
