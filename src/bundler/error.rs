//! Error types for the bundling pipeline.
//!
//! Every failure raised while deriving parameters, resolving modules, assembling
//! images or invoking packaging tools is an [`Error`]. The driver only cares about
//! the coarse [`ErrorKind`] of an error: platform mismatches and configuration
//! problems skip a bundler, everything else fails it.

use std::{fmt::Display, io, path::PathBuf};

/// Result alias used throughout the bundler.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used to decide a bundler's outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The host cannot produce this bundler's artifact.
    PlatformUnsupported,
    /// A parameter is missing or contradicts another one.
    ConfigurationInvalid,
    /// An external tool exited non-zero or could not be driven.
    ExternalToolFailure,
    /// Anything else.
    UnexpectedFault,
}

/// Bundler error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Host operating system differs from the bundler's target.
    #[error("bundler `{bundler}` targets {platform}, which is not the host platform")]
    PlatformUnsupported {
        /// Bundler id
        bundler: String,
        /// Target platform name
        platform: String,
    },

    /// Missing or contradictory configuration.
    #[error("{message}")]
    ConfigurationInvalid {
        /// What is wrong
        message: String,
        /// How to fix it, when known
        advice: Option<String>,
    },

    /// External tool exited unsuccessfully.
    #[error("`{tool}` failed{}: {detail}", code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    ExternalToolFailure {
        /// Program name
        tool: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Short description
        detail: String,
    },

    /// Process could not be spawned or awaited.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Command line
        command: String,
        /// Underlying I/O error
        error: io::Error,
    },

    /// A default deriver re-entered a parameter that is still being derived.
    #[error("parameter derivation cycle: {}", chain.join(" -> "))]
    DerivationCycle {
        /// Ids from the outermost fetch to the repeated one
        chain: Vec<String>,
    },

    /// Stored value does not have the descriptor's type.
    #[error("parameter `{id}` holds {found} where {expected} was expected")]
    ParamType {
        /// Parameter id
        id: String,
        /// Descriptor value type
        expected: String,
        /// Stored value type
        found: String,
    },

    /// Raw override text could not be parsed.
    #[error("invalid value {value:?} for parameter `{id}`: {reason}")]
    ParamParse {
        /// Parameter id
        id: String,
        /// Raw text
        value: String,
        /// Parser message
        reason: String,
    },

    /// I/O failure on a known path.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        error: io::Error,
    },

    /// Wrapped error with extra context.
    #[error("{context}: {source}")]
    Context {
        /// Context message
        context: String,
        /// Wrapped error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic I/O error.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// Archive could not be read.
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    /// Directory walk failed.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping failed.
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Invalid regular expression.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Property list could not be written.
    #[error(transparent)]
    Plist(#[from] plist::Error),

    /// Invalid glob pattern.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Anything without a more specific variant.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Configuration error without advice.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            message: message.into(),
            advice: None,
        }
    }

    /// Configuration error with remediation advice.
    pub fn config_with_advice(message: impl Into<String>, advice: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            message: message.into(),
            advice: Some(advice.into()),
        }
    }

    /// Classifies the error for the driver.
    ///
    /// Context wrappers are transparent: the kind of the wrapped bundler error wins.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlatformUnsupported { .. } => ErrorKind::PlatformUnsupported,
            Self::ConfigurationInvalid { .. }
            | Self::DerivationCycle { .. }
            | Self::ParamType { .. }
            | Self::ParamParse { .. } => ErrorKind::ConfigurationInvalid,
            Self::ExternalToolFailure { .. } | Self::CommandFailed { .. } => {
                ErrorKind::ExternalToolFailure
            }
            Self::Context { source, .. } => source
                .downcast_ref::<Error>()
                .map(Error::kind)
                .unwrap_or(ErrorKind::UnexpectedFault),
            _ => ErrorKind::UnexpectedFault,
        }
    }

    /// Remediation advice carried by a configuration error.
    pub fn advice(&self) -> Option<&str> {
        match self {
            Self::ConfigurationInvalid { advice, .. } => advice.as_deref(),
            Self::Context { source, .. } => source.downcast_ref::<Error>().and_then(Error::advice),
            _ => None,
        }
    }
}

/// Attaches a path to I/O failures.
pub trait ErrorExt<T> {
    /// Wraps an I/O error with what was being done and on which path.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Adds a context message to results and options.
pub trait Context<T> {
    /// Wraps the failure with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the failure with a lazily built context.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context {
            context: context.to_string(),
            source: Box::new(e),
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context {
            context: f().to_string(),
            source: Box::new(e),
        })
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
