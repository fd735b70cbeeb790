// Style evolution core: the style entity, pure style math and the
// generation-by-generation selection engine.

pub mod engine;
pub mod math;
pub mod rng;
pub mod types;

pub use engine::{Candidate, CandidateKind, EngineSnapshot, EnginePhase, StyleEvolutionEngine};
pub use math::{ScoreBreakdown, ScoringContext, StructuralWeights, interpolate, mutate, score};
pub use rng::SplitMix64;
pub use types::{GenerationRecord, Lineage, ParamDomain, ParamValue, Style};
