use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Chromatica`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; glue code (config loading, CLI dispatch,
/// collaborator calls) continues to use `anyhow::Result` for context chains.
#[derive(Debug, Error)]
pub enum ChromaticaError {
    // ── Style evolution core ────────────────────────────────────────────
    #[error("style: {0}")]
    Style(#[from] StyleError),

    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── External collaborators (prompt / render / trends) ───────────────
    #[error("collaborator: {0}")]
    Collaborator(#[from] CollaboratorError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Style evolution errors ─────────────────────────────────────────────────

/// Errors raised by the evolution core. A failed call never leaves the engine
/// partially advanced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    /// Malformed numeric range or out-of-domain input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation invoked before its required prior state (e.g. evolve before seed).
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl StyleError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to save config: {0}")]
    Save(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Collaborator errors ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("prompt expansion failed: {0}")]
    PromptExpansion(String),

    #[error("model {model} render failed after {attempts} attempt(s): {message}")]
    Render {
        model: String,
        attempts: u32,
        message: String,
    },

    #[error("trend source failed: {0}")]
    TrendSource(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ChromaticaError>;
