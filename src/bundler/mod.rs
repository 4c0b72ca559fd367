//! Packaging core: parameter resolution, runtime module selection,
//! application images and the bundlers that wrap them.
//!
//! - [`params`] - parameter descriptors and the memoizing store
//! - [`modules`] - module path scanning, classification and resolution
//! - [`image`] - application image assembly
//! - [`bundle`] - bundler lifecycle and installer chaining
//! - [`platform`] - per-platform installers
//! - [`driver`] - runs bundlers and reports their artifacts

pub mod bundle;
pub mod driver;
pub mod error;
pub mod image;
pub mod modules;
pub mod params;
pub mod platform;
pub mod resources;
pub mod tools;
pub mod utils;

pub use bundle::{BundleRequest, BundleType, Bundler, Invocation};
pub use driver::{Artifact, BundleDriver, Outcome, RunReport};
pub use error::{Error, ErrorKind, Result};
pub use params::{ParamStore, standard};
