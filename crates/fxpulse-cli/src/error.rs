use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] fxpulse_core::ValidationError),

    #[error(transparent)]
    Config(#[from] fxpulse_core::CoreError),

    #[error(transparent)]
    Source(#[from] fxpulse_core::SourceError),

    #[error(transparent)]
    Engine(#[from] fxpulse_core::EngineError),

    #[error(transparent)]
    Refresh(#[from] fxpulse_core::RefreshError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("logging setup failed: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Source(_) | Self::Engine(_) | Self::Refresh(_) => 3,
            Self::Serialization(_) => 4,
            Self::Logging(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
