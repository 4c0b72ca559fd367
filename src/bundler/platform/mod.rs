//! Host platforms and the bundlers that target them.
//!
//! - [`linux`] - application image and Debian package
//! - [`macos`] - `.app` bundle and launchd daemon
//! - [`windows`] - application image and service wrapper

mod arch;
pub mod linux;
pub mod macos;
pub mod windows;

pub use arch::Arch;

use crate::bundler::error::{Error, Result};
use std::{fmt, str::FromStr};

/// Operating system an artifact is produced for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(rename = "macos")]
    MacOs,
    Windows,
    Unknown,
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "mac" | "macos" | "osx" => Ok(Self::MacOs),
            "windows" | "win" => Ok(Self::Windows),
            other => Err(Error::config(format!("unknown platform `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_aliases() {
        assert_eq!("osx".parse::<Platform>().unwrap(), Platform::MacOs);
        assert_eq!("Win".parse::<Platform>().unwrap(), Platform::Windows);
        assert!("beos".parse::<Platform>().is_err());
    }
}
