//! Command line arguments.

use crate::error::CliError;
use clap::Parser;
use std::path::PathBuf;

/// Packages an application and a private runtime into images and installers
#[derive(Parser, Debug)]
#[command(
    name = "runtime_bundler",
    version,
    about = "Packages an application and a private runtime into images and installers",
    long_about = "Builds self-contained application images (application + trimmed runtime + launcher) \
and wraps them into native installers.

Parameters come from a TOML file (--config) and from -D overrides, applied in that order.

Usage:
  runtime_bundler --config bundle.toml
  runtime_bundler -D appResources=build/libs -D applicationClass=com.example.Main --type image
  runtime_bundler --type deb --output dist --report dist/report.json
  runtime_bundler --list

Exit code 0 = at least one artifact was produced (or nothing was requested)."
)]
pub struct Args {
    /// TOML parameter file with [bundle] and [params] sections
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// What to build: none, all, image, installer, or a bundler id such as deb
    #[arg(short = 't', long = "type", value_name = "TYPE", env = "RUNTIME_BUNDLER_TYPE")]
    pub bundle_type: Option<String>,

    /// Directory receiving the artifacts
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Parameter override; repeating an id accumulates values
    #[arg(short = 'D', value_name = "ID=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// Stop at the first failing bundler
    #[arg(long)]
    pub strict: bool,

    /// Write the run report as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// List the available bundlers and exit
    #[arg(long)]
    pub list: bool,
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => {
            Ok((id.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected ID=VALUE, got `{raw}`")),
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Checks that do not need the file system contents.
    pub fn validate(&self) -> Result<(), CliError> {
        if let Some(output) = &self.output {
            if output.is_file() {
                return Err(CliError::InvalidArguments {
                    reason: format!("output {} is a file, not a directory", output.display()),
                });
            }
        }
        if self.list && (!self.defines.is_empty() || self.report.is_some()) {
            return Err(CliError::InvalidArguments {
                reason: "--list does not take parameters or a report".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defines() {
        let args = Args::try_parse_from([
            "runtime_bundler",
            "-D",
            "jvmOptions=-Xmx1g",
            "-Djvm.x=a=b",
            "--type",
            "deb",
        ])
        .unwrap();
        assert_eq!(
            args.defines,
            vec![
                ("jvmOptions".to_string(), "-Xmx1g".to_string()),
                ("jvm.x".to_string(), "a=b".to_string()),
            ]
        );
        assert_eq!(args.bundle_type.as_deref(), Some("deb"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_malformed_define_rejected() {
        assert!(Args::try_parse_from(["runtime_bundler", "-D", "novalue"]).is_err());
        assert!(Args::try_parse_from(["runtime_bundler", "-D", "=x"]).is_err());
    }

    #[test]
    fn test_list_takes_no_parameters() {
        let args = Args::try_parse_from(["runtime_bundler", "--list", "-D", "a=b"]).unwrap();
        assert!(args.validate().is_err());
    }
}
