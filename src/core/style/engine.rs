use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use strum::Display;

use super::math::{self, ScoringContext};
use super::rng::SplitMix64;
use super::types::{GenerationRecord, Style};
use crate::config::EvolutionConfig;
use crate::core::feedback::FeedbackSample;
use crate::error::StyleError;

// EnginePhase: Idle → Evaluating → Selecting → Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnginePhase {
    /// Current generation has no pending feedback.
    Idle,
    /// Feedback has been accumulated against the current generation.
    Evaluating,
    /// `evolve` is building and scoring candidates.
    Selecting,
}

// CandidateKind: listed from safest to boldest; exact ties go to the safer one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CandidateKind {
    Elite,
    SubtleMutation,
    Interpolation,
    BoldMutation,
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub style: Style,
    pub score: f64,
}

/// Serializable history, for hosts that persist evolution across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub history: Vec<GenerationRecord>,
}

/// Holds the current style and a bounded history, and runs selection.
///
/// The engine is single-writer: every mutating call takes `&mut self`, and a
/// host sharing one instance must serialize access itself (the orchestrator
/// keeps it behind a mutex). A failed call leaves the engine as it was.
pub struct StyleEvolutionEngine<R = SplitMix64> {
    config: EvolutionConfig,
    history: VecDeque<GenerationRecord>,
    feedback: Vec<FeedbackSample>,
    // Immediate parent of the current style, kept even after it leaves history.
    current_parent: Option<Style>,
    phase: EnginePhase,
    rng: R,
}

impl<R: RngCore + Clone> StyleEvolutionEngine<R> {
    pub fn new(config: EvolutionConfig, rng: R) -> Result<Self, StyleError> {
        config
            .validate()
            .map_err(|e| StyleError::argument(e.to_string()))?;
        Ok(Self {
            history: VecDeque::with_capacity(config.history_capacity.min(64)),
            config,
            feedback: Vec::new(),
            current_parent: None,
            phase: EnginePhase::Idle,
            rng,
        })
    }

    /// Rebuild an engine from persisted history. Records must be contiguous;
    /// anything beyond `history_capacity` is dropped oldest-first.
    pub fn restore(
        snapshot: EngineSnapshot,
        config: EvolutionConfig,
        rng: R,
    ) -> Result<Self, StyleError> {
        let mut engine = Self::new(config, rng)?;
        let mut previous: Option<u64> = None;
        for record in &snapshot.history {
            if let Some(prev) = previous
                && record.generation != prev + 1
            {
                return Err(StyleError::argument(format!(
                    "snapshot generations are not contiguous: {prev} followed by {}",
                    record.generation
                )));
            }
            record.style.validate()?;
            if let Some(fitness) = record.fitness
                && !(0.0..=1.0).contains(&fitness)
            {
                return Err(StyleError::argument(format!(
                    "generation {} has fitness {fitness} outside [0, 1]",
                    record.generation
                )));
            }
            previous = Some(record.generation);
        }

        engine.history = snapshot.history.into();
        engine.evict_over_capacity();
        engine.current_parent = engine.current().and_then(|record| {
            let parent_id = &record.style.lineage.as_ref()?.primary;
            engine.find_style(parent_id).cloned()
        });
        tracing::info!(
            generations = engine.history.len(),
            current = ?engine.generation(),
            "style engine restored"
        );
        Ok(engine)
    }

    /// Install the generation-0 style.
    pub fn seed(&mut self, style: Style) -> Result<(), StyleError> {
        if !self.history.is_empty() {
            return Err(StyleError::state(format!(
                "engine already seeded ({} generation(s) in history)",
                self.history.len()
            )));
        }
        style.validate()?;

        tracing::info!(style = %style.name, id = %style.id, "style engine seeded");
        self.history.push_back(GenerationRecord {
            generation: 0,
            style,
            fitness: None,
        });
        self.feedback.clear();
        self.current_parent = None;
        self.phase = EnginePhase::Idle;
        Ok(())
    }

    pub fn current(&self) -> Option<&GenerationRecord> {
        self.history.back()
    }

    pub fn current_style(&self) -> Result<&Style, StyleError> {
        self.current()
            .map(|record| &record.style)
            .ok_or_else(|| StyleError::state("engine has not been seeded"))
    }

    pub fn generation(&self) -> Option<u64> {
        self.current().map(|record| record.generation)
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Feedback attributed to the current generation so far.
    pub fn pending_feedback(&self) -> &[FeedbackSample] {
        &self.feedback
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Oldest-first copy of the retained history.
    pub fn history(&self) -> Vec<GenerationRecord> {
        self.history.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            history: self.history(),
        }
    }

    pub fn find_style(&self, id: &str) -> Option<&Style> {
        self.history
            .iter()
            .rev()
            .map(|record| &record.style)
            .find(|style| style.id == id)
    }

    /// Provenance chain for `id`, newest first, following primary parents
    /// while they are still in history.
    pub fn lineage_of(&self, id: &str) -> Vec<&Style> {
        let mut chain = Vec::new();
        let mut cursor = self.find_style(id);
        while let Some(style) = cursor {
            if chain.iter().any(|seen: &&Style| seen.id == style.id) {
                break;
            }
            chain.push(style);
            cursor = style
                .lineage
                .as_ref()
                .and_then(|lineage| self.find_style(&lineage.primary));
        }
        chain
    }

    /// Accumulate feedback against the current generation and refresh its fitness.
    pub fn submit_feedback(&mut self, samples: &[FeedbackSample]) -> Result<(), StyleError> {
        if samples.is_empty() {
            return Ok(());
        }
        let current = self
            .current()
            .ok_or_else(|| StyleError::state("cannot submit feedback before seeding"))?;

        let mut accumulated = self.feedback.clone();
        accumulated.extend_from_slice(samples);
        let fitness = math::score(
            &current.style,
            &accumulated,
            &self.config.structural_weights,
            self.scoring_context(self.current_parent.as_ref()),
        )?;

        tracing::debug!(
            generation = current.generation,
            samples = samples.len(),
            total = accumulated.len(),
            fitness,
            "feedback accumulated"
        );
        self.feedback = accumulated;
        if let Some(record) = self.history.back_mut() {
            record.fitness = Some(fitness);
        }
        self.phase = EnginePhase::Evaluating;
        Ok(())
    }

    /// Build candidates from the current style, keep the best, advance one generation.
    pub fn evolve(&mut self) -> Result<GenerationRecord, StyleError> {
        let previous_phase = self.phase;
        self.phase = EnginePhase::Selecting;

        let mut rng = self.rng.clone();
        match self.select_next(&mut rng) {
            Ok((record, kind)) => {
                self.rng = rng;
                // A surviving elite keeps its feedback and parent, so its score carries forward.
                if kind != CandidateKind::Elite {
                    self.current_parent = self.current().map(|current| current.style.clone());
                    self.feedback.clear();
                }
                self.history.push_back(record.clone());
                self.evict_over_capacity();
                self.phase = EnginePhase::Idle;
                Ok(record)
            }
            Err(err) => {
                self.phase = previous_phase;
                Err(err)
            }
        }
    }

    /// Score every candidate for the next generation, best (and safest) first.
    /// Works on a copy of the generator, so the next `evolve` is unaffected.
    pub fn rank_candidates(&self) -> Result<Vec<Candidate>, StyleError> {
        let mut rng = self.rng.clone();
        let mut candidates = self.build_candidates(&mut rng)?;
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.kind.cmp(&b.kind)));
        Ok(candidates)
    }

    fn select_next(&self, rng: &mut R) -> Result<(GenerationRecord, CandidateKind), StyleError> {
        let current = self
            .current()
            .ok_or_else(|| StyleError::state("cannot evolve an unseeded engine"))?;
        let next_generation = current.generation + 1;

        let candidates = self.build_candidates(rng)?;
        let mut winner: Option<&Candidate> = None;
        for candidate in &candidates {
            tracing::debug!(
                kind = %candidate.kind,
                score = candidate.score,
                version = candidate.style.version,
                "candidate scored"
            );
            // Candidates arrive safest-first, so only a strictly better score displaces.
            if winner.is_none_or(|best| candidate.score > best.score) {
                winner = Some(candidate);
            }
        }
        let winner =
            winner.ok_or_else(|| StyleError::state("no candidates were produced"))?;

        tracing::info!(
            generation = next_generation,
            winner = %winner.kind,
            fitness = winner.score,
            "generation advanced"
        );
        Ok((
            GenerationRecord {
                generation: next_generation,
                style: winner.style.clone(),
                fitness: Some(winner.score),
            },
            winner.kind,
        ))
    }

    fn build_candidates(&self, rng: &mut R) -> Result<Vec<Candidate>, StyleError> {
        let current = self
            .current()
            .ok_or_else(|| StyleError::state("cannot evolve an unseeded engine"))?
            .style
            .clone();

        let subtle = math::mutate(&current, self.config.low_mutation_strength, rng)?;
        let bold = math::mutate(&current, self.config.high_mutation_strength, rng)?;
        let partner = self.pick_partner(rng).unwrap_or_else(|| current.clone());
        let blended = math::interpolate(&current, &partner, self.config.interpolation_ratio)?;

        let weights = self.config.structural_weights;
        let fresh_ctx = self.scoring_context(Some(&current));
        let mut candidates = Vec::with_capacity(4);

        candidates.push(Candidate {
            kind: CandidateKind::Elite,
            score: math::score(
                &current,
                &self.feedback,
                &weights,
                self.scoring_context(self.current_parent.as_ref()),
            )?,
            style: current.clone(),
        });
        for (kind, style) in [
            (CandidateKind::SubtleMutation, subtle),
            (CandidateKind::Interpolation, blended),
            (CandidateKind::BoldMutation, bold),
        ] {
            // No feedback history yet, so feedback fitness starts neutral.
            let score = math::score(&style, &[], &weights, fresh_ctx)?;
            candidates.push(Candidate { kind, style, score });
        }

        Ok(candidates)
    }

    /// A random earlier generation, or the current style's parent when
    /// history holds fewer than two records.
    fn pick_partner(&self, rng: &mut R) -> Option<Style> {
        let priors = self.history.len().saturating_sub(1);
        if priors == 0 {
            return self.current_parent.clone();
        }
        let index = rng.random_range(0..priors);
        self.history.get(index).map(|record| record.style.clone())
    }

    fn scoring_context<'a>(&'a self, parent: Option<&'a Style>) -> ScoringContext<'a> {
        ScoringContext::new(&self.config.reference_tags).with_parent(parent)
    }

    fn evict_over_capacity(&mut self) {
        while self.history.len() > self.config.history_capacity {
            if let Some(evicted) = self.history.pop_front() {
                tracing::debug!(generation = evicted.generation, "history record evicted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feedback::FeedbackAggregator;
    use crate::core::style::types::ParamValue;
    use rand::SeedableRng;

    fn seed_style() -> Style {
        Style::new("seed")
            .with_param("brightness", ParamValue::unit(0.5))
            .with_param("contrast", ParamValue::unit(0.5))
    }

    fn engine(seed: u64) -> StyleEvolutionEngine {
        StyleEvolutionEngine::new(EvolutionConfig::default(), SplitMix64::seed_from_u64(seed))
            .unwrap()
    }

    #[test]
    fn evolve_before_seed_is_invalid_state() {
        let mut engine = engine(1);
        assert!(matches!(engine.evolve(), Err(StyleError::InvalidState(_))));
        assert!(engine.history().is_empty());
        assert_eq!(engine.phase(), EnginePhase::Idle);
    }

    #[test]
    fn current_style_before_seed_is_invalid_state() {
        assert!(matches!(
            engine(1).current_style(),
            Err(StyleError::InvalidState(_))
        ));
    }

    #[test]
    fn double_seed_is_rejected() {
        let mut engine = engine(1);
        engine.seed(seed_style()).unwrap();
        assert!(matches!(
            engine.seed(seed_style()),
            Err(StyleError::InvalidState(_))
        ));
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn seed_rejects_out_of_domain_style() {
        let mut engine = engine(1);
        let hot = Style::new("hot").with_param("brightness", ParamValue::unit(2.0));
        assert!(matches!(
            engine.seed(hot),
            Err(StyleError::InvalidArgument(_))
        ));
        assert!(engine.history().is_empty());
    }

    #[test]
    fn empty_feedback_is_a_no_op() {
        let mut engine = engine(1);
        engine.seed(seed_style()).unwrap();
        engine.submit_feedback(&[]).unwrap();
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert!(engine.current().unwrap().fitness.is_none());
    }

    #[test]
    fn feedback_before_seed_is_invalid_state() {
        let sample = FeedbackAggregator::default().from_rating(5.0, 10.0);
        assert!(matches!(
            engine(1).submit_feedback(&[sample]),
            Err(StyleError::InvalidState(_))
        ));
    }

    #[test]
    fn feedback_accumulates_instead_of_overwriting() {
        let aggregator = FeedbackAggregator::default();
        let mut engine = engine(3);
        engine.seed(seed_style()).unwrap();

        engine
            .submit_feedback(&[aggregator.from_rating(10.0, 10.0)])
            .unwrap();
        let after_first = engine.current().unwrap().fitness.unwrap();
        assert_eq!(engine.phase(), EnginePhase::Evaluating);

        engine
            .submit_feedback(&[aggregator.from_rating(0.0, 10.0)])
            .unwrap();
        let after_second = engine.current().unwrap().fitness.unwrap();

        assert_eq!(engine.pending_feedback().len(), 2);
        assert!(after_second < after_first);
        // mean of 1.0 and 0.0 at equal weight
        let expected = math::score(
            &seed_style(),
            engine.pending_feedback(),
            &EvolutionConfig::default().structural_weights,
            ScoringContext::default(),
        )
        .unwrap();
        assert!((after_second - expected).abs() < 1e-12);
    }

    #[test]
    fn offspring_win_resets_feedback() {
        let mut engine = engine(11);
        let seed = seed_style();
        engine.seed(seed.clone()).unwrap();
        engine
            .submit_feedback(&[FeedbackAggregator::default().from_rating(0.0, 10.0)])
            .unwrap();

        let record = engine.evolve().unwrap();

        assert_eq!(record.generation, 1);
        assert_ne!(record.style.id, seed.id);
        assert!(record.fitness.is_some_and(|f| (0.0..=1.0).contains(&f)));
        assert_eq!(engine.generation(), Some(1));
        assert!(engine.pending_feedback().is_empty());
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert_eq!(engine.current_style().unwrap().id, record.style.id);
    }

    #[test]
    fn surviving_elite_keeps_its_feedback() {
        let mut engine = engine(5);
        engine.seed(seed_style()).unwrap();
        engine
            .submit_feedback(&[FeedbackAggregator::default().from_rating(10.0, 10.0)])
            .unwrap();

        let first = engine.evolve().unwrap();
        assert_eq!(engine.pending_feedback().len(), 1);
        let second = engine.evolve().unwrap();

        assert!(second.fitness >= first.fitness);
        if second.style.id == first.style.id {
            assert_eq!(second.fitness, first.fitness);
        }
    }

    #[test]
    fn ranking_does_not_disturb_the_next_evolve() {
        let mut inspected = engine(23);
        let mut untouched = engine(23);
        for engine in [&mut inspected, &mut untouched] {
            engine.seed(seed_style()).unwrap();
        }

        let ranked = inspected.rank_candidates().unwrap();
        let a = inspected.evolve().unwrap();
        let b = untouched.evolve().unwrap();

        assert!(a.style.parameters_equal(&b.style));
        assert_eq!(a.fitness, b.fitness);
        assert_eq!(a.fitness, Some(ranked[0].score));
    }

    #[test]
    fn strong_feedback_keeps_the_elite() {
        let mut engine = engine(5);
        let seed = seed_style();
        engine.seed(seed.clone()).unwrap();
        engine
            .submit_feedback(&[FeedbackAggregator::default().from_rating(10.0, 10.0)])
            .unwrap();

        let record = engine.evolve().unwrap();

        assert!(record.style.parameters_equal(&seed));
        assert_eq!(record.style.id, seed.id);
    }

    #[test]
    fn ranking_puts_safer_candidate_first_on_ties() {
        // A style without numeric dials makes every candidate score identically.
        let mut engine = engine(8);
        engine
            .seed(Style::new("flat").with_param("medium", ParamValue::categorical("ink")))
            .unwrap();

        let ranked = engine.rank_candidates().unwrap();
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].kind, CandidateKind::Elite);

        let record = engine.evolve().unwrap();
        assert_eq!(record.style.id, engine.history()[0].style.id);
    }

    #[test]
    fn history_is_bounded_and_contiguous() {
        let config = EvolutionConfig {
            history_capacity: 5,
            ..EvolutionConfig::default()
        };
        let mut engine =
            StyleEvolutionEngine::new(config, SplitMix64::seed_from_u64(21)).unwrap();
        engine.seed(seed_style()).unwrap();

        for _ in 0..12 {
            engine.evolve().unwrap();
        }

        let generations: Vec<u64> = engine.history().iter().map(|r| r.generation).collect();
        assert_eq!(generations, vec![8, 9, 10, 11, 12]);
        assert_eq!(engine.history_len(), 5);
    }

    #[test]
    fn same_seed_replays_identically() {
        let run = |seed| {
            let mut engine = engine(seed);
            engine.seed(seed_style()).unwrap();
            (0..6)
                .map(|_| engine.evolve().unwrap().fitness.unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn lineage_follows_parents_in_history() {
        let mut engine = engine(13);
        engine.seed(seed_style()).unwrap();
        for _ in 0..4 {
            engine.evolve().unwrap();
        }

        let current_id = engine.current_style().unwrap().id.clone();
        let chain = engine.lineage_of(&current_id);
        assert!(!chain.is_empty());
        assert_eq!(chain[0].id, current_id);
        for pair in chain.windows(2) {
            let lineage = pair[0].lineage.as_ref().expect("derived style has lineage");
            assert_eq!(lineage.primary, pair[1].id);
        }
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut engine = engine(17);
        engine.seed(seed_style()).unwrap();
        for _ in 0..3 {
            engine.evolve().unwrap();
        }

        let snapshot = engine.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: EngineSnapshot = serde_json::from_str(&json).unwrap();
        let restored = StyleEvolutionEngine::restore(
            parsed,
            EvolutionConfig::default(),
            SplitMix64::seed_from_u64(1),
        )
        .unwrap();

        let ids = |engine: &StyleEvolutionEngine| {
            engine
                .history()
                .into_iter()
                .map(|record| (record.generation, record.style.id))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&restored), ids(&engine));
        assert_eq!(restored.generation(), Some(3));
    }

    #[test]
    fn restore_rejects_gaps() {
        let mut engine = engine(19);
        engine.seed(seed_style()).unwrap();
        engine.evolve().unwrap();
        engine.evolve().unwrap();

        let mut snapshot = engine.snapshot();
        snapshot.history.remove(1);

        assert!(matches!(
            StyleEvolutionEngine::restore(
                snapshot,
                EvolutionConfig::default(),
                SplitMix64::seed_from_u64(1)
            ),
            Err(StyleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = EvolutionConfig {
            history_capacity: 0,
            ..EvolutionConfig::default()
        };
        assert!(StyleEvolutionEngine::new(config, SplitMix64::new(0)).is_err());
    }
}
