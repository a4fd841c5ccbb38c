//! Error types for the supervisor

use sortbay_core::config::LayoutError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Supervisor startup errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for the cell
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration parsed but describes an unusable cell
    #[error("invalid configuration: {0}")]
    Config(LayoutError),

    /// Thread could not be started
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

impl From<LayoutError> for Error {
    fn from(e: LayoutError) -> Self {
        Error::Config(e)
    }
}
