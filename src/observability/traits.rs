use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    GenerationSeeded {
        style: String,
    },
    FeedbackSubmitted {
        generation: u64,
        samples: usize,
        fitness: Option<f64>,
    },
    GenerationAdvanced {
        generation: u64,
        fitness: f64,
        elite_kept: bool,
    },
    RenderCompleted {
        model: String,
        duration: Duration,
        attempts: u32,
        success: bool,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Numeric metrics
#[derive(Debug, Clone)]
pub enum ObserverMetric {
    RenderLatency(Duration),
    HistoryDepth(u64),
    TrendSignalsIngested(u64),
    CandidateScore { kind: String, score: f64 },
}

/// Sink for evolution and render telemetry.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent);

    /// Record a numeric metric
    fn record_metric(&self, metric: &ObserverMetric);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
