//! Error types for CLI operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration failed to parse or validate
    #[error("invalid configuration '{}': {source}", path.display())]
    ConfigInvalid {
        path: PathBuf,
        #[source]
        source: contracts::ContractError,
    },

    /// The pipeline never reached `Running`
    #[error("pipeline failed to start: {0}")]
    Startup(#[source] odometry::PipelineError),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn config_invalid(path: &Path, source: contracts::ContractError) -> Self {
        Self::ConfigInvalid {
            path: path.to_path_buf(),
            source,
        }
    }
}
