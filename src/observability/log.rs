use super::traits::{Observer, ObserverEvent, ObserverMetric};
use tracing::{info, warn};

/// Emits every event and metric as a structured `tracing` record.
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::GenerationSeeded { style } => {
                info!(style = %style, "evolution.seeded");
            }
            ObserverEvent::FeedbackSubmitted {
                generation,
                samples,
                fitness,
            } => {
                info!(generation, samples, fitness = ?fitness, "evolution.feedback");
            }
            ObserverEvent::GenerationAdvanced {
                generation,
                fitness,
                elite_kept,
            } => {
                info!(generation, fitness, elite_kept, "evolution.advanced");
            }
            ObserverEvent::RenderCompleted {
                model,
                duration,
                attempts,
                success,
            } => {
                info!(
                    model = %model,
                    duration_ms = millis(*duration),
                    attempts,
                    success,
                    "render.completed"
                );
            }
            ObserverEvent::Error { component, message } => {
                warn!(component = %component, error = %message, "error");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::RenderLatency(d) => {
                info!(latency_ms = millis(*d), "metric.render_latency");
            }
            ObserverMetric::HistoryDepth(depth) => {
                info!(depth, "metric.history_depth");
            }
            ObserverMetric::TrendSignalsIngested(count) => {
                info!(count, "metric.trend_signals_ingested");
            }
            ObserverMetric::CandidateScore { kind, score } => {
                info!(kind = %kind, score, "metric.candidate_score");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn log_observer_name() {
        assert_eq!(LogObserver::new().name(), "log");
    }

    #[test]
    fn log_observer_all_events_no_panic() {
        let obs = LogObserver::new();
        obs.record_event(&ObserverEvent::GenerationSeeded {
            style: "nocturne".into(),
        });
        obs.record_event(&ObserverEvent::FeedbackSubmitted {
            generation: 0,
            samples: 2,
            fitness: Some(0.7),
        });
        obs.record_event(&ObserverEvent::GenerationAdvanced {
            generation: 1,
            fitness: 0.8,
            elite_kept: false,
        });
        obs.record_event(&ObserverEvent::RenderCompleted {
            model: "sdxl".into(),
            duration: Duration::MAX,
            attempts: 3,
            success: false,
        });
        obs.record_event(&ObserverEvent::Error {
            component: "renderer".into(),
            message: "timeout".into(),
        });
    }

    #[test]
    fn log_observer_all_metrics_no_panic() {
        let obs = LogObserver::new();
        obs.record_metric(&ObserverMetric::RenderLatency(Duration::from_secs(2)));
        obs.record_metric(&ObserverMetric::HistoryDepth(u64::MAX));
        obs.record_metric(&ObserverMetric::TrendSignalsIngested(0));
        obs.record_metric(&ObserverMetric::CandidateScore {
            kind: "elite".into(),
            score: 0.5,
        });
    }
}
