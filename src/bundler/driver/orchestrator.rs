//! Runs the selected bundlers against one parameter store.

use super::checksum::sha256_hex;
use crate::bundler::{
    bundle::{BundleRequest, Bundler, Invocation},
    error::{Error, ErrorKind, Result},
    image::AppImageBundler,
    modules::{JlinkAssembler, RuntimeImageAssembler},
    params::{ParamStore, standard},
    platform::{
        linux::DebBundler,
        macos::{DaemonBundler, DmgBundler},
        windows::ServiceBundler,
    },
    tools::{ProcessRunner, ToolRunner},
    utils::fs,
};
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// A produced artifact with its size and digest.
#[derive(Clone, Debug, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    /// Bytes; directories count every file below them.
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug)]
pub enum Outcome {
    Produced(Artifact),
    /// The bundler does not apply on this host or is not configured for
    /// this run; holds the validation error.
    Skipped(Error),
    Failed(Error),
}

/// Result of one bundler in a run.
#[derive(Debug)]
pub struct BundlerOutcome {
    pub id: &'static str,
    pub name: &'static str,
    pub outcome: Outcome,
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    bundler: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<&'a Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    advice: Option<&'a str>,
}

/// Per-bundler outcomes of a run, in registry order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<BundlerOutcome>,
}

impl RunReport {
    pub fn produced(&self) -> impl Iterator<Item = (&'static str, &Artifact)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            Outcome::Produced(artifact) => Some((o.id, artifact)),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &Error)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            Outcome::Failed(error) => Some((o.id, error)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let entries: Vec<ReportEntry<'_>> = self
            .outcomes
            .iter()
            .map(|o| match &o.outcome {
                Outcome::Produced(artifact) => ReportEntry {
                    bundler: o.id,
                    status: "produced",
                    artifact: Some(artifact),
                    message: None,
                    advice: None,
                },
                Outcome::Skipped(reason) => ReportEntry {
                    bundler: o.id,
                    status: "skipped",
                    artifact: None,
                    message: Some(reason.to_string()),
                    advice: reason.advice(),
                },
                Outcome::Failed(error) => ReportEntry {
                    bundler: o.id,
                    status: "failed",
                    artifact: None,
                    message: Some(error.to_string()),
                    advice: error.advice(),
                },
            })
            .collect();
        serde_json::to_string_pretty(&entries)
    }
}

/// Every bundler this crate ships, wired to real tools.
pub fn default_registry() -> Vec<Arc<dyn Bundler>> {
    let runner: Arc<dyn ToolRunner> = Arc::new(ProcessRunner);
    let assembler: Arc<dyn RuntimeImageAssembler> = Arc::new(JlinkAssembler::new(runner.clone()));
    let linux_app: Arc<dyn Bundler> = Arc::new(AppImageBundler::linux(assembler.clone()));
    let mac_app: Arc<dyn Bundler> = Arc::new(AppImageBundler::macos(assembler.clone()));
    let windows_app: Arc<dyn Bundler> = Arc::new(AppImageBundler::windows(assembler));
    vec![
        linux_app.clone(),
        mac_app.clone(),
        windows_app.clone(),
        Arc::new(DebBundler::new(linux_app, runner.clone())),
        Arc::new(DmgBundler::new(mac_app, runner)),
        Arc::new(DaemonBundler::new()),
        Arc::new(ServiceBundler::new(windows_app)),
    ]
}

/// Drives bundlers through validate, execute and cleanup.
#[derive(Debug, Clone)]
pub struct BundleDriver {
    registry: Vec<Arc<dyn Bundler>>,
    best_effort: bool,
}

impl Default for BundleDriver {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

impl BundleDriver {
    pub fn new(registry: Vec<Arc<dyn Bundler>>) -> Self {
        Self {
            registry,
            best_effort: true,
        }
    }

    /// With `false`, the first failing bundler aborts the run.
    pub fn best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    pub fn bundlers(&self) -> &[Arc<dyn Bundler>] {
        &self.registry
    }

    /// Empty store knowing every descriptor of every registered bundler.
    pub fn prepare_store(&self) -> ParamStore {
        let mut store = ParamStore::standard();
        for bundler in &self.registry {
            store.register_all(bundler.params());
        }
        store
    }

    pub fn select(&self, request: &BundleRequest) -> Vec<Arc<dyn Bundler>> {
        self.registry
            .iter()
            .filter(|b| request.matches(b.as_ref()))
            .cloned()
            .collect()
    }

    pub async fn run(
        &self,
        store: &mut ParamStore,
        request: &BundleRequest,
        output_dir: &Path,
    ) -> Result<RunReport> {
        let selected = self.select(request);
        if selected.is_empty() {
            log::warn!("No bundler matches {:?}", request);
        }

        let mut report = RunReport::default();
        for bundler in selected {
            let outcome = self.run_one(bundler.as_ref(), store, output_dir).await;
            if let Outcome::Failed(error) = &outcome {
                log::error!("{} failed: {}", bundler.id(), error);
                if let Some(advice) = error.advice() {
                    log::error!("  Advice to fix: {}", advice);
                }
            }
            match outcome {
                Outcome::Failed(error) if !self.best_effort => {
                    self.remove_build_root(store).await;
                    return Err(error);
                }
                outcome => report.outcomes.push(BundlerOutcome {
                    id: bundler.id(),
                    name: bundler.name(),
                    outcome,
                }),
            }
        }

        self.remove_build_root(store).await;
        Ok(report)
    }

    async fn run_one(
        &self,
        bundler: &dyn Bundler,
        store: &mut ParamStore,
        output_dir: &Path,
    ) -> Outcome {
        if let Err(error) = bundler.validate(store).await {
            return match error.kind() {
                ErrorKind::PlatformUnsupported => {
                    log::debug!("Skipping {}: {}", bundler.id(), error);
                    Outcome::Skipped(error)
                }
                ErrorKind::ConfigurationInvalid => {
                    log::info!(
                        "Bundler {} skipped because of a configuration problem: {}",
                        bundler.name(),
                        error
                    );
                    if let Some(advice) = error.advice() {
                        log::info!("  Advice to fix: {}", advice);
                    }
                    Outcome::Skipped(error)
                }
                _ => Outcome::Failed(error),
            };
        }

        log::info!("Running {} ({})", bundler.name(), bundler.id());
        let produced = bundler.execute(store, output_dir, Invocation::TopLevel).await;
        if let Err(error) = bundler.cleanup(store).await {
            log::error!("Cleanup of {} failed: {}", bundler.id(), error);
        }

        match produced {
            Ok(Some(path)) => match describe(&path).await {
                Ok(artifact) => {
                    log::info!("✓ {} produced {}", bundler.id(), artifact.path.display());
                    Outcome::Produced(artifact)
                }
                Err(error) => Outcome::Failed(error),
            },
            Ok(None) => Outcome::Failed(Error::GenericError(format!(
                "{} did not produce an artifact",
                bundler.id()
            ))),
            Err(error) => Outcome::Failed(error),
        }
    }

    async fn remove_build_root(&self, store: &mut ParamStore) {
        let verbose = store.fetch(&standard::VERBOSE).unwrap_or(false);
        let Ok(Some(build_root)) = store.get(&standard::BUILD_ROOT) else {
            return;
        };
        if verbose {
            log::info!("Build files kept in {}", build_root.display());
            return;
        }
        if let Err(error) = fs::remove_dir_all(&build_root).await {
            log::error!("Cannot remove {}: {}", build_root.display(), error);
        }
    }
}

async fn describe(path: &Path) -> Result<Artifact> {
    Ok(Artifact {
        path: path.to_path_buf(),
        size: fs::disk_usage(path).await?,
        sha256: sha256_hex(path).await?,
    })
}
