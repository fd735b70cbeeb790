//! Drives one creative cycle: style → prompt → render → feedback → evolution.

pub mod collaborators;
pub mod prompt;

pub use collaborators::{
    ImageRenderer, Prediction, PredictionInput, PredictionStatus, PromptExpander, PromptSpec,
    TrendSignal, TrendSource,
};
pub use prompt::style_prompt_fragment;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::{FeedbackConfig, OrchestratorConfig};
use crate::core::feedback::{FeedbackAggregator, FeedbackSample};
use crate::core::style::{GenerationRecord, SplitMix64, Style, StyleEvolutionEngine};
use crate::error::{CollaboratorError, Result};
use crate::observability::{NoopObserver, Observer, ObserverEvent, ObserverMetric};

/// A finished render together with the style generation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub concept: String,
    pub prompt: String,
    pub outputs: Vec<String>,
    pub style_id: String,
    pub generation: u64,
    /// Set when this render completed an evolution cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolved: Option<GenerationRecord>,
}

pub struct CreativeOrchestrator<R = SplitMix64> {
    engine: Mutex<StyleEvolutionEngine<R>>,
    aggregator: FeedbackAggregator,
    expander: Arc<dyn PromptExpander>,
    renderer: Arc<dyn ImageRenderer>,
    trends: Option<Arc<dyn TrendSource>>,
    observer: Arc<dyn Observer>,
    config: OrchestratorConfig,
    trend_weight: f64,
    renders: AtomicU32,
}

impl<R: RngCore + Clone + Send> CreativeOrchestrator<R> {
    pub fn new(
        engine: StyleEvolutionEngine<R>,
        expander: Arc<dyn PromptExpander>,
        renderer: Arc<dyn ImageRenderer>,
        config: OrchestratorConfig,
        feedback: &FeedbackConfig,
    ) -> Self {
        Self {
            engine: Mutex::new(engine),
            aggregator: FeedbackAggregator::new(feedback),
            expander,
            renderer,
            trends: None,
            observer: Arc::new(NoopObserver),
            config,
            trend_weight: feedback.trend_weight,
            renders: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn with_trend_source(mut self, source: Arc<dyn TrendSource>) -> Self {
        self.trends = Some(source);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    fn engine(&self) -> MutexGuard<'_, StyleEvolutionEngine<R>> {
        // Engine calls never leave partial state behind, so a poisoned lock is still usable.
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_style(&self) -> Result<Style> {
        Ok(self.engine().current_style()?.clone())
    }

    pub fn history(&self) -> Vec<GenerationRecord> {
        self.engine().history()
    }

    pub fn renders(&self) -> u32 {
        self.renders.load(Ordering::Relaxed)
    }

    /// Seed the underlying engine; fails if it already holds a generation.
    pub fn seed(&self, style: Style) -> Result<()> {
        let name = style.name.clone();
        self.engine().seed(style)?;
        self.observer
            .record_event(&ObserverEvent::GenerationSeeded { style: name });
        Ok(())
    }

    /// Expand `concept` under the current style, render it, and evolve when
    /// the render cadence is reached.
    pub async fn create_art(&self, concept: &str) -> Result<Artwork> {
        let (style, generation) = {
            let engine = self.engine();
            let style = engine.current_style()?.clone();
            (style, engine.generation().unwrap_or_default())
        };

        let spec = PromptSpec {
            model: self.config.prompt_model.clone(),
            system_prompt: prompt::SYSTEM_PROMPT.to_string(),
            user_prompt: prompt::brief(concept, &style),
            temperature: self.config.prompt_temperature,
        };
        let expanded = self.expander.get_completion(&spec).await.map_err(|e| {
            self.record_error("prompt_expander", &e);
            CollaboratorError::PromptExpansion(e.to_string())
        })?;
        let prompt = expanded.trim().to_string();
        if prompt.is_empty() {
            return Err(
                CollaboratorError::PromptExpansion("expander returned no text".into()).into(),
            );
        }

        let outputs = self.render_with_retry(&prompt).await?;
        let count = self.renders.fetch_add(1, Ordering::Relaxed) + 1;

        let evolved = if self.config.evolve_every > 0 && count % self.config.evolve_every == 0 {
            Some(self.evolve()?)
        } else {
            None
        };

        Ok(Artwork {
            concept: concept.to_string(),
            prompt,
            outputs,
            style_id: style.id,
            generation,
            evolved,
        })
    }

    async fn render_with_retry(&self, prompt: &str) -> Result<Vec<String>> {
        let input = PredictionInput {
            prompt: prompt.to_string(),
            negative_prompt: None,
        };
        let model = &self.config.image_model;
        let max_attempts = self.config.render_retries + 1;
        let started = Instant::now();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let backoff = self
                    .config
                    .retry_backoff_ms
                    .saturating_mul(1_u64 << (attempt - 2).min(16));
                tracing::warn!(
                    model = %model,
                    attempt,
                    backoff_ms = backoff,
                    error = %last_error,
                    "retrying render"
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match self.renderer.run_prediction(model, &input).await {
                Ok(prediction) if prediction.is_usable() => {
                    let duration = started.elapsed();
                    self.observer.record_event(&ObserverEvent::RenderCompleted {
                        model: model.clone(),
                        duration,
                        attempts: attempt,
                        success: true,
                    });
                    self.observer
                        .record_metric(&ObserverMetric::RenderLatency(duration));
                    return Ok(prediction.output);
                }
                Ok(prediction) => {
                    last_error = format!(
                        "prediction ended as {} with {} output(s)",
                        prediction.status,
                        prediction.output.len()
                    );
                }
                Err(e) => last_error = e.to_string(),
            }
        }

        self.observer.record_event(&ObserverEvent::RenderCompleted {
            model: model.clone(),
            duration: started.elapsed(),
            attempts: max_attempts,
            success: false,
        });
        self.observer.record_event(&ObserverEvent::Error {
            component: "image_renderer".into(),
            message: last_error.clone(),
        });
        Err(CollaboratorError::Render {
            model: model.clone(),
            attempts: max_attempts,
            message: last_error,
        }
        .into())
    }

    /// Advance one generation now, regardless of render cadence.
    pub fn evolve(&self) -> Result<GenerationRecord> {
        let mut engine = self.engine();
        let previous_id = engine.current_style()?.id.clone();
        let record = engine.evolve()?;
        let depth = engine.history_len();
        drop(engine);

        let elite_kept = record.style.id == previous_id;
        let fitness = record.fitness.unwrap_or(0.5);
        self.observer.record_event(&ObserverEvent::GenerationAdvanced {
            generation: record.generation,
            fitness,
            elite_kept,
        });
        self.observer.record_metric(&ObserverMetric::CandidateScore {
            kind: if elite_kept { "elite" } else { "offspring" }.into(),
            score: fitness,
        });
        self.observer
            .record_metric(&ObserverMetric::HistoryDepth(depth as u64));
        Ok(record)
    }

    /// Explicit "X out of Y" rating against the current generation.
    pub fn submit_rating(&self, score: f64, out_of: f64) -> Result<()> {
        let sample = self.aggregator.from_rating(score, out_of);
        self.submit(&[sample])
    }

    pub fn submit_comment(&self, comment: &str) -> Result<()> {
        let sample = self.aggregator.from_text(comment);
        self.submit(&[sample])
    }

    /// Pull trend signals and feed them in as social samples. Returns how
    /// many were accepted; a missing source is a no-op.
    pub async fn ingest_trends(&self) -> Result<usize> {
        let Some(source) = &self.trends else {
            return Ok(0);
        };
        let signals = source.fetch_signals().await.map_err(|e| {
            self.record_error("trend_source", &e);
            CollaboratorError::TrendSource(e.to_string())
        })?;

        let mut samples = Vec::with_capacity(signals.len());
        for signal in &signals {
            match self
                .aggregator
                .from_social_signal(signal.score, self.trend_weight)
            {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    tracing::warn!(topic = %signal.topic, error = %e, "skipping trend signal");
                }
            }
        }

        self.submit(&samples)?;
        self.observer
            .record_metric(&ObserverMetric::TrendSignalsIngested(samples.len() as u64));
        Ok(samples.len())
    }

    fn submit(&self, samples: &[FeedbackSample]) -> Result<()> {
        let mut engine = self.engine();
        engine.submit_feedback(samples)?;
        let generation = engine.generation().unwrap_or_default();
        let fitness = engine.current().and_then(|record| record.fitness);
        drop(engine);

        self.observer.record_event(&ObserverEvent::FeedbackSubmitted {
            generation,
            samples: samples.len(),
            fitness,
        });
        Ok(())
    }

    fn record_error(&self, component: &str, error: &anyhow::Error) {
        tracing::warn!(component, error = %error, "collaborator call failed");
        self.observer.record_event(&ObserverEvent::Error {
            component: component.to_string(),
            message: error.to_string(),
        });
    }
}
