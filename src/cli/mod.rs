//! Command line front end over [`BundleDriver`].

mod args;

pub use args::Args;

use crate::{
    bundler::{BundleDriver, BundleRequest, BundleType},
    config::ParamFile,
    error::Result,
};
use anyhow::Context as _;
use path_absolutize::Absolutize;
use std::path::PathBuf;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    execute(Args::parse_args()).await
}

/// Runs one invocation and returns the process exit code.
pub async fn execute(args: Args) -> Result<i32> {
    args.validate()?;
    let file = match &args.config {
        Some(path) => ParamFile::load(path)?,
        None => ParamFile::default(),
    };

    let best_effort = !args.strict && file.bundle.best_effort.unwrap_or(true);
    let driver = BundleDriver::default().best_effort(best_effort);

    if args.list {
        for bundler in driver.bundlers() {
            println!(
                "{:<16} {:<10} {}",
                bundler.id(),
                bundler.bundle_type().to_string(),
                bundler.name()
            );
        }
        return Ok(0);
    }

    let mut store = driver.prepare_store();
    file.apply(&mut store)?;
    for (id, value) in &args.defines {
        store.supply_raw(id, value)?;
    }

    let request = args
        .bundle_type
        .as_deref()
        .map(BundleRequest::parse)
        .or_else(|| file.bundle.request())
        .unwrap_or_default();
    if request == BundleRequest::Nothing {
        log::info!("Nothing to bundle");
        return Ok(0);
    }

    let output = args
        .output
        .clone()
        .or_else(|| file.bundle.output.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let output = output
        .absolutize()
        .with_context(|| format!("resolving output directory {}", output.display()))?
        .into_owned();

    let report = driver.run(&mut store, &request, &output).await?;

    for (id, artifact) in report.produced() {
        println!(
            "✓ {id}: {} ({} bytes, sha256 {})",
            artifact.path.display(),
            artifact.size,
            artifact.sha256
        );
    }
    for (id, error) in report.failures() {
        eprintln!("✗ {id}: {error}");
    }
    if let Some(path) = &args.report {
        let json = report.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?;
    }

    let produced = report.produced().next().is_some();
    if !produced && matches!(request, BundleRequest::Type(BundleType::Installer)) {
        log::warn!("No installer could be produced on this host");
    }
    Ok(if produced { 0 } else { 1 })
}
