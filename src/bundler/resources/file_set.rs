//! Application resource sets.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    platform::Platform,
};
use std::path::{Path, PathBuf};

/// Files addressed relative to a base directory.
///
/// File order is preserved: entry-point detection picks the first matching
/// archive. A set may be restricted to one platform and/or architecture.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelativeFileSet {
    base_dir: PathBuf,
    files: Vec<PathBuf>,
    platform: Option<Platform>,
    arch: Option<String>,
}

crate::object_param_type!(RelativeFileSet, Vec<RelativeFileSet>);

impl RelativeFileSet {
    /// New set; duplicate paths are dropped, first occurrence wins.
    pub fn new(base_dir: impl Into<PathBuf>, files: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for file in files {
            if !unique.contains(&file) {
                unique.push(file);
            }
        }
        Self {
            base_dir: base_dir.into(),
            files: unique,
            platform: None,
            arch: None,
        }
    }

    /// Every regular file below `base_dir`, in sorted order.
    pub fn from_dir(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.is_dir() {
            return Err(Error::config_with_advice(
                format!("Resource directory {} does not exist.", base_dir.display()),
                "Point the app resources at an existing directory.",
            ));
        }
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&base_dir).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.path().strip_prefix(&base_dir)?.to_path_buf());
            }
        }
        Ok(Self::new(base_dir, files))
    }

    /// Files below `base_dir` matching a glob pattern relative to it.
    pub fn from_glob(base_dir: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let base_dir = base_dir.into();
        let full = base_dir.join(pattern);
        let mut files = Vec::new();
        for entry in glob::glob(&full.to_string_lossy())? {
            let path = entry.map_err(|e| Error::GenericError(e.to_string()))?;
            if path.is_file() {
                files.push(path.strip_prefix(&base_dir)?.to_path_buf());
            }
        }
        Ok(Self::new(base_dir, files))
    }

    /// Parses `dir`, `dir:pattern`, optionally suffixed with `@platform` or
    /// `@platform/arch`.
    pub fn parse(spec: &str) -> Result<Self> {
        let (body, qualifier) = match spec.rsplit_once('@') {
            Some((body, q)) => (body, Some(q)),
            None => (spec, None),
        };
        // a single-letter prefix before ':' is a windows drive, not a pattern separator
        let split = body
            .char_indices()
            .filter(|(_, c)| *c == ':')
            .map(|(i, _)| i)
            .find(|i| *i != 1);
        let mut set = match split {
            Some(i) => Self::from_glob(&body[..i], &body[i + 1..])?,
            None => Self::from_dir(body)?,
        };
        if let Some(q) = qualifier {
            let (platform, arch) = match q.split_once('/') {
                Some((p, a)) => (p, Some(a.to_string())),
                None => (q, None),
            };
            let platform = platform.parse::<Platform>().map_err(|_| Error::ParamParse {
                id: "appResources".to_string(),
                value: spec.to_string(),
                reason: format!("unknown platform `{platform}`"),
            })?;
            set = set.restricted_to(Some(platform), arch);
        }
        Ok(set)
    }

    pub fn restricted_to(mut self, platform: Option<Platform>, arch: Option<String>) -> Self {
        self.platform = platform;
        self.arch = arch;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn contains(&self, rel: impl AsRef<Path>) -> bool {
        self.files.iter().any(|f| f == rel.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Absolute paths of the files, in order.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.iter().map(|f| self.base_dir.join(f))
    }

    /// True unless the set is qualified for another platform or architecture.
    pub fn applies_to(&self, platform: Platform, arch: &str) -> bool {
        self.platform.is_none_or(|p| p == platform)
            && self.arch.as_deref().is_none_or(|a| a == arch)
    }

    /// Copies every file into `dest`, keeping relative paths.
    pub async fn copy_to(&self, dest: &Path) -> Result<()> {
        for file in &self.files {
            let from = self.base_dir.join(file);
            let to = dest.join(file);
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .fs_context("creating resource directory", parent)?;
            }
            tokio::fs::copy(&from, &to)
                .await
                .fs_context("copying resource", &from)?;
        }
        Ok(())
    }
}
