//! Error types for catalog building and rendering

use thiserror::Error;

/// Result type alias for webshots operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or rendering a job
#[derive(Error, Debug)]
pub enum Error {
    /// The renderer executable could not be started
    #[error("Failed to launch renderer: {0}")]
    Launch(String),

    /// The renderer exited without writing the expected screenshot
    #[error("Renderer produced no output at {0}")]
    MissingOutput(String),

    /// The renderer ran past its deadline and was killed
    #[error("Renderer timed out after {0}ms")]
    Timeout(u64),

    /// Filesystem or process I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
