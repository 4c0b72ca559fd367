//! Packaging runs: bundler selection, execution and reporting.
//!
//! ```no_run
//! use runtime_bundler::bundler::{BundleDriver, BundleRequest};
//! use std::path::Path;
//!
//! # async fn example() -> runtime_bundler::bundler::Result<()> {
//! let driver = BundleDriver::default();
//! let mut store = driver.prepare_store();
//! store.supply_raw("applicationClass", "com.example.Main")?;
//! let report = driver
//!     .run(&mut store, &BundleRequest::parse("image"), Path::new("dist"))
//!     .await?;
//! for (id, artifact) in report.produced() {
//!     println!("{id}: {} ({} bytes)", artifact.path.display(), artifact.size);
//! }
//! # Ok(())
//! # }
//! ```

mod checksum;
mod orchestrator;

pub use checksum::sha256_hex;
pub use orchestrator::{Artifact, BundleDriver, BundlerOutcome, Outcome, RunReport, default_registry};
