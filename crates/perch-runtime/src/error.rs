//! Runtime error types.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

use crate::config::ConfigError;
use perch_framework::{BotError, PluginError};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Plugin wiring failed.
    #[error("Plugin wiring failed: {0}")]
    Plugin(#[from] PluginError),

    /// Could not connect to the server.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection failed while reading or writing lines.
    #[error("Connection error: {0}")]
    Connection(#[from] LinesCodecError),

    /// The outbound writer task panicked or was cancelled.
    #[error("Writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),

    /// The outbound queue closed before registration was sent.
    #[error(transparent)]
    Bot(#[from] BotError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
