use crate::cli::commands::{Cli, Commands, Rating};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use chromatica::Config;
use chromatica::core::feedback::FeedbackAggregator;
use chromatica::core::style::{
    EngineSnapshot, ParamValue, SplitMix64, Style, StyleEvolutionEngine,
};
use chromatica::observability::{Observer, ObserverEvent, ObserverMetric, create_observer};

/// Options for one offline `evolve` run.
#[derive(Debug, Default)]
pub struct EvolveOptions {
    pub generations: u32,
    pub seed_file: Option<PathBuf>,
    pub history_in: Option<PathBuf>,
    pub ratings: Vec<Rating>,
    pub comments: Vec<String>,
    pub history_out: Option<PathBuf>,
    pub rng_seed: Option<u64>,
}

/// Neutral starting point used when no seed file is given.
fn baseline_style() -> Style {
    Style::new("baseline")
        .with_description("Even-handed starting style")
        .with_param("brightness", ParamValue::unit(0.5))
        .with_param("contrast", ParamValue::unit(0.5))
        .with_param("color_saturation", ParamValue::unit(0.5))
        .with_param("detail", ParamValue::unit(0.5))
        .with_param("medium", ParamValue::categorical("digital painting"))
}

fn load_seed(path: &Path) -> Result<Style> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed style {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse seed style {}", path.display()))
}

fn load_snapshot(path: &Path) -> Result<EngineSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse history {}", path.display()))
}

/// Run the loop and return the final history as pretty JSON.
pub fn run_evolve(
    config: &Config,
    options: &EvolveOptions,
    observer: &dyn Observer,
) -> Result<String> {
    let seed = options.rng_seed.or(config.evolution.rng_seed);
    let rng = SplitMix64::from_optional_seed(seed);

    let mut engine = match &options.history_in {
        Some(path) => {
            StyleEvolutionEngine::restore(load_snapshot(path)?, config.evolution.clone(), rng)?
        }
        None => {
            let style = match &options.seed_file {
                Some(path) => load_seed(path)?,
                None => baseline_style(),
            };
            let mut engine = StyleEvolutionEngine::new(config.evolution.clone(), rng)?;
            let name = style.name.clone();
            engine.seed(style)?;
            observer.record_event(&ObserverEvent::GenerationSeeded { style: name });
            engine
        }
    };

    let aggregator = FeedbackAggregator::new(&config.feedback);
    let samples: Vec<_> = options
        .ratings
        .iter()
        .map(|rating| aggregator.from_rating(rating.score, rating.out_of))
        .chain(options.comments.iter().map(|c| aggregator.from_text(c)))
        .collect();

    for _ in 0..options.generations {
        if !samples.is_empty() {
            engine.submit_feedback(&samples)?;
            observer.record_event(&ObserverEvent::FeedbackSubmitted {
                generation: engine.generation().unwrap_or_default(),
                samples: samples.len(),
                fitness: engine.current().and_then(|record| record.fitness),
            });
        }
        let previous_id = engine.current_style()?.id.clone();
        let record = engine.evolve()?;
        observer.record_event(&ObserverEvent::GenerationAdvanced {
            generation: record.generation,
            fitness: record.fitness.unwrap_or(0.5),
            elite_kept: record.style.id == previous_id,
        });
        info!(
            generation = record.generation,
            style = %record.style.name,
            fitness = ?record.fitness,
            "evolved"
        );
    }
    observer.record_metric(&ObserverMetric::HistoryDepth(engine.history_len() as u64));
    observer.flush();

    let json = serde_json::to_string_pretty(&engine.snapshot())?;
    if let Some(path) = &options.history_out {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write history {}", path.display()))?;
        info!(path = %path.display(), "history written");
    }
    Ok(json)
}

pub fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Evolve {
            generations,
            seed_file,
            history_in,
            ratings,
            comments,
            history_out,
            rng_seed,
        } => {
            let options = EvolveOptions {
                generations,
                seed_file,
                history_in,
                ratings,
                comments,
                history_out,
                rng_seed,
            };
            let observer = create_observer(&config.observability);
            println!("{}", run_evolve(&config, &options, observer.as_ref())?);
            Ok(())
        }
        Commands::Feedback { text } => {
            let sample = FeedbackAggregator::new(&config.feedback).from_text(&text);
            println!("{}", serde_json::to_string_pretty(&sample)?);
            Ok(())
        }
        Commands::Config => {
            println!("# {}", config.config_path.display());
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chromatica::observability::NoopObserver;
    use tempfile::TempDir;

    fn seeded_options(generations: u32) -> EvolveOptions {
        EvolveOptions {
            generations,
            rng_seed: Some(7),
            ..EvolveOptions::default()
        }
    }

    #[test]
    fn evolve_from_baseline_produces_contiguous_history() {
        let json = run_evolve(&Config::default(), &seeded_options(3), &NoopObserver).unwrap();
        let snapshot: EngineSnapshot = serde_json::from_str(&json).unwrap();
        let generations: Vec<u64> = snapshot.history.iter().map(|r| r.generation).collect();
        assert_eq!(generations, vec![0, 1, 2, 3]);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let config = Config::default();
        let scores = |json: String| {
            let snapshot: EngineSnapshot = serde_json::from_str(&json).unwrap();
            snapshot
                .history
                .into_iter()
                .map(|r| r.fitness)
                .collect::<Vec<_>>()
        };
        let a = scores(run_evolve(&config, &seeded_options(4), &NoopObserver).unwrap());
        let b = scores(run_evolve(&config, &seeded_options(4), &NoopObserver).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn seed_file_and_history_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let seed_path = tmp.path().join("seed.toml");
        std::fs::write(
            &seed_path,
            r#"
            name = "ink wash"
            tags = ["noir"]

            [parameters]
            brightness = 0.3
            medium = "sumi ink"
            grain = { value = 4.0, min = 0.0, max = 10.0 }
            "#,
        )
        .unwrap();
        let history_path = tmp.path().join("history.json");

        let first = EvolveOptions {
            seed_file: Some(seed_path),
            history_out: Some(history_path.clone()),
            ratings: vec![Rating {
                score: 6.0,
                out_of: 10.0,
            }],
            ..seeded_options(2)
        };
        run_evolve(&Config::default(), &first, &NoopObserver).unwrap();
        assert!(history_path.exists());

        let resumed = EvolveOptions {
            history_in: Some(history_path),
            ..seeded_options(1)
        };
        let json = run_evolve(&Config::default(), &resumed, &NoopObserver).unwrap();
        let snapshot: EngineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.history.first().unwrap().style.name, "ink wash");
        assert_eq!(snapshot.history.last().unwrap().generation, 3);
    }

    #[test]
    fn missing_seed_file_is_reported() {
        let options = EvolveOptions {
            seed_file: Some(PathBuf::from("/nonexistent/seed.toml")),
            ..seeded_options(1)
        };
        let err = run_evolve(&Config::default(), &options, &NoopObserver).unwrap_err();
        assert!(err.to_string().contains("seed style"));
    }
}
