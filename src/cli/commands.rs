use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// `Chromatica` - generative art with a style that evolves from feedback.
#[derive(Parser, Debug)]
#[command(name = "chromatica")]
#[command(author = "theonlyhennygod")]
#[command(version)]
#[command(about = "Evolve a visual style from audience feedback.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the evolution loop offline and print the resulting history as JSON
    Evolve {
        /// Number of generations to advance
        #[arg(short, long, default_value = "1")]
        generations: u32,

        /// TOML file describing the seed style (default: built-in baseline)
        #[arg(long)]
        seed_file: Option<PathBuf>,

        /// Resume from a history JSON written by an earlier run
        #[arg(long, conflicts_with = "seed_file")]
        history_in: Option<PathBuf>,

        /// Rating applied to every generation, e.g. `8/10` (repeatable)
        #[arg(long = "rating")]
        ratings: Vec<Rating>,

        /// Comment applied to every generation (repeatable)
        #[arg(long = "comment")]
        comments: Vec<String>,

        /// Also write the history JSON to this file
        #[arg(long)]
        history_out: Option<PathBuf>,

        /// Seed for reproducible runs (overrides config)
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// Show how a comment would be scored
    Feedback {
        /// The comment text
        text: String,
    },

    /// Print the effective configuration
    Config,
}

/// `score/out_of` as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub score: f64,
    pub out_of: f64,
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (score, out_of) = s
            .split_once('/')
            .ok_or_else(|| format!("expected SCORE/OUT_OF, got '{s}'"))?;
        let score: f64 = score
            .trim()
            .parse()
            .map_err(|_| format!("invalid score '{score}'"))?;
        let out_of: f64 = out_of
            .trim()
            .parse()
            .map_err(|_| format!("invalid scale '{out_of}'"))?;
        if !out_of.is_finite() || out_of <= 0.0 {
            return Err(format!("scale must be positive, got {out_of}"));
        }
        Ok(Self { score, out_of })
    }
}
