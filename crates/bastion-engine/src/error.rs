//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of loading a scenario and
//! playing it, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: bastion_core::ConfigError,
    },

    /// The scenario file could not be read.
    #[error("failed to read scenario: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The scenario file is not valid YAML or does not match the schema.
    #[error("failed to parse scenario: {source}")]
    Scenario {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },

    /// The scenario refers to a name it never declared.
    #[error("unknown {kind} '{name}' in scenario")]
    UnknownName {
        /// What kind of thing was looked up.
        kind: &'static str,
        /// The name used.
        name: String,
    },

    /// A phase delegate failed.
    #[error("delegate error: {source}")]
    Delegate {
        /// The underlying delegate error.
        #[from]
        source: bastion_core::DelegateError,
    },

    /// Driving a suspended move failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: bastion_core::RunnerError,
    },

    /// Writing or reading a checkpoint failed.
    #[error("checkpoint error: {source}")]
    Checkpoint {
        /// The underlying checkpoint error.
        #[from]
        source: bastion_core::CheckpointError,
    },

    /// No scenario path was given on the command line.
    #[error("usage: bastion-engine <scenario.yaml>")]
    Usage,
}

impl EngineError {
    /// Whether a script can carry on after this error.
    ///
    /// Rejected orders and unanswered decisions leave the game untouched (or
    /// the move suspended); anything else aborts the run.
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Delegate { source }
            | Self::Runner {
                source: bastion_core::RunnerError::Delegate { source },
            } => source.is_rejection(),
            Self::Runner { .. } => true,
            Self::Config { .. }
            | Self::Io { .. }
            | Self::Scenario { .. }
            | Self::UnknownName { .. }
            | Self::Checkpoint { .. }
            | Self::Usage => false,
        }
    }
}
