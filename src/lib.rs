//! Application packager: bundles an application with a private runtime into
//! self-contained images and native installers.
//!
//! The library exposes the packaging core ([`bundler`]); the binary is a thin
//! front end over it ([`cli`]) reading parameter files ([`config`]).

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;

pub use error::{BundlerError, CliError, Result};
