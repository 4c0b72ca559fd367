//! Runtime image assembly.

use super::resolver::ModuleSelection;
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    params::{ParamStore, standard},
    tools::{ToolCommand, ToolRunner},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::PathBuf,
    sync::Arc,
};

/// Everything the assembler needs to lay down a runtime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeImageRequest {
    /// Directory the runtime is written to; must not exist yet.
    pub output_dir: PathBuf,
    pub module_path: Vec<PathBuf>,
    pub add_modules: BTreeSet<String>,
    /// Passed through untouched, including names also in `add_modules`.
    pub limit_modules: BTreeSet<String>,
    pub exclude_files: Vec<String>,
    pub strip_native_commands: bool,
    /// Extra `--key=value` options.
    pub options: BTreeMap<String, String>,
}

impl RuntimeImageRequest {
    /// Request for `output_dir` from the store and a resolved selection.
    pub fn from_store(
        store: &mut ParamStore,
        selection: &ModuleSelection,
        output_dir: PathBuf,
    ) -> Result<Self> {
        Ok(Self {
            output_dir,
            module_path: store.fetch(&standard::MODULE_PATH)?,
            add_modules: selection.modules.clone(),
            limit_modules: store.fetch(&standard::LIMIT_MODULES)?,
            exclude_files: store.fetch(&standard::EXCLUDE_FILES)?,
            strip_native_commands: store.fetch(&standard::STRIP_NATIVE_COMMANDS)?,
            options: store.fetch(&standard::JLINK_OPTIONS)?,
        })
    }
}

/// Produces the runtime subtree of an application image.
#[async_trait::async_trait]
pub trait RuntimeImageAssembler: Send + Sync + fmt::Debug {
    /// Fails when the assembler cannot run on this host.
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    async fn assemble(&self, request: &RuntimeImageRequest) -> Result<()>;
}

/// Assembles runtimes with `jlink`.
#[derive(Debug, Clone)]
pub struct JlinkAssembler {
    runner: Arc<dyn ToolRunner>,
}

impl JlinkAssembler {
    pub const TOOL: &'static str = "jlink";

    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    /// Command line for a request.
    pub fn command(&self, request: &RuntimeImageRequest) -> Result<ToolCommand> {
        let module_path = std::env::join_paths(&request.module_path)
            .map_err(|e| Error::config(format!("invalid module path: {e}")))?;

        let mut cmd = ToolCommand::new(Self::TOOL)
            .arg("--output")
            .arg(request.output_dir.display().to_string())
            .arg("--module-path")
            .arg(module_path.to_string_lossy())
            .arg("--add-modules")
            .arg(join(&request.add_modules));
        if !request.limit_modules.is_empty() {
            cmd = cmd.arg("--limit-modules").arg(join(&request.limit_modules));
        }
        if !request.exclude_files.is_empty() {
            let patterns: Vec<String> = request
                .exclude_files
                .iter()
                .map(|p| {
                    if p.starts_with("glob:") || p.starts_with("regex:") {
                        p.clone()
                    } else {
                        format!("regex:{p}")
                    }
                })
                .collect();
            cmd = cmd.arg("--exclude-files").arg(patterns.join(","));
        }
        if request.strip_native_commands {
            cmd = cmd.arg("--strip-native-commands");
        }
        for (key, value) in &request.options {
            let key = key.trim_start_matches('-');
            if value.is_empty() {
                cmd = cmd.arg(format!("--{key}"));
            } else {
                cmd = cmd.arg(format!("--{key}={value}"));
            }
        }
        Ok(cmd)
    }
}

fn join(modules: &BTreeSet<String>) -> String {
    modules.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

#[async_trait::async_trait]
impl RuntimeImageAssembler for JlinkAssembler {
    fn check_available(&self) -> Result<()> {
        match self.runner.probe(Self::TOOL) {
            Some(_) => Ok(()),
            None => Err(Error::config_with_advice(
                "jlink was not found on the PATH.",
                "Install a JDK and make sure its bin directory is on the PATH.",
            )),
        }
    }

    async fn assemble(&self, request: &RuntimeImageRequest) -> Result<()> {
        self.check_available()?;
        if request.output_dir.exists() {
            tokio::fs::remove_dir_all(&request.output_dir)
                .await
                .fs_context("removing stale runtime", &request.output_dir)?;
        }
        if let Some(parent) = request.output_dir.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating runtime parent", parent)?;
        }
        log::debug!(
            "Running jlink [ --output = {} --module-path = {:?} --add-modules = {:?} --limit-modules = {:?} --exclude-files = {:?} --strip-native-commands = {} {:?} ]",
            request.output_dir.display(),
            request.module_path,
            request.add_modules,
            request.limit_modules,
            request.exclude_files,
            request.strip_native_commands,
            request.options
        );
        self.runner.run(&self.command(request)?).await
    }
}
