// Feedback normalization: ratings, free-text sentiment and social/trend signals.

pub mod aggregator;
pub mod types;

pub use aggregator::FeedbackAggregator;
pub use types::{FeedbackSample, FeedbackSource, RawFeedback, weighted_fitness};
