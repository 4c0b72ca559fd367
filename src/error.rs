//! Errors of the command line front end.
//!
//! Packaging failures are [`crate::bundler::Error`]; this type adds argument,
//! configuration file and report errors on top and turns all of them into
//! user-facing suggestions.

use crate::bundler::ErrorKind;
use thiserror::Error;

/// Result type alias for front-end operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type of the binary
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Packaging errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Errors carrying ad-hoc context
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// A step of the command failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Step that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Actionable suggestions for this error.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            Self::Bundler(e) => match (e.kind(), e.advice()) {
                (_, Some(advice)) => vec![advice.to_string()],
                (ErrorKind::PlatformUnsupported, None) => {
                    vec!["Run the bundler on the platform the package targets".to_string()]
                }
                (ErrorKind::ExternalToolFailure, None) => vec![
                    "Check the tool output above".to_string(),
                    "Re-run with RUST_LOG=debug to see every line the tool printed".to_string(),
                ],
                _ => Vec::new(),
            },
            Self::Cli(CliError::InvalidArguments { .. }) => {
                vec!["Run with --help to see the accepted arguments".to_string()]
            }
            Self::Toml(_) => vec!["Check the syntax of the parameter file".to_string()],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
