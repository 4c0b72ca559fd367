//! Lookup of user-customizable resources.

use super::{builtin, template};
use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Where a located resource came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceSource {
    /// `<drop-in root>/<public name>`
    DropIn(PathBuf),
    /// Explicit file supplied for this resource.
    Explicit(PathBuf),
    /// Shipped default.
    BuiltIn(&'static str),
}

/// A request for one customizable resource.
#[derive(Clone, Debug)]
pub struct ResourceRequest<'a> {
    /// File name users drop into the resource root to replace the default.
    pub public_name: &'a str,
    /// Human-readable label used in log lines.
    pub category: &'a str,
    /// Name of the shipped default.
    pub default_name: &'a str,
    pub override_path: Option<&'a Path>,
    pub drop_in_root: Option<&'a Path>,
}

impl<'a> ResourceRequest<'a> {
    pub fn new(public_name: &'a str, category: &'a str, default_name: &'a str) -> Self {
        Self {
            public_name,
            category,
            default_name,
            override_path: None,
            drop_in_root: None,
        }
    }

    pub fn with_override(mut self, path: Option<&'a Path>) -> Self {
        self.override_path = path;
        self
    }

    pub fn with_drop_in_root(mut self, root: Option<&'a Path>) -> Self {
        self.drop_in_root = root;
        self
    }
}

/// Resolves a resource: drop-in root first, then the explicit file, then the
/// shipped default.
pub fn locate(request: &ResourceRequest<'_>) -> Result<(Vec<u8>, ResourceSource)> {
    if let Some(root) = request.drop_in_root {
        let candidate = root.join(request.public_name);
        if candidate.is_file() {
            log::info!(
                "Using custom package resource {} (loaded from {})",
                request.category,
                candidate.display()
            );
            let bytes = std::fs::read(&candidate).fs_context("reading resource", &candidate)?;
            return Ok((bytes, ResourceSource::DropIn(candidate)));
        }
    }

    if let Some(path) = request.override_path {
        if path.is_file() {
            log::debug!(
                "Using custom package resource {} (loaded from file {})",
                request.category,
                path.display()
            );
            let bytes = std::fs::read(path).fs_context("reading resource", path)?;
            return Ok((bytes, ResourceSource::Explicit(path.to_path_buf())));
        }
        log::warn!(
            "{} override {} does not exist, using default",
            request.category,
            path.display()
        );
    }

    match builtin::lookup(request.default_name) {
        Some((name, text)) => {
            log::debug!(
                "Using default package resource {} (add {} to the resource root to customize)",
                request.category,
                request.public_name
            );
            Ok((text.as_bytes().to_vec(), ResourceSource::BuiltIn(name)))
        }
        None => Err(Error::config(format!(
            "No {} found: no default named `{}` and no override supplied",
            request.category, request.default_name
        ))),
    }
}

/// Locates a text resource and expands its tokens.
pub fn preprocess_text_resource(
    request: &ResourceRequest<'_>,
    data: &BTreeMap<String, String>,
) -> Result<String> {
    let (bytes, _) = locate(request)?;
    let text = String::from_utf8(bytes).map_err(|e| {
        Error::config(format!("{} is not valid UTF-8: {}", request.category, e))
    })?;
    Ok(template::preprocess(&text, data))
}

/// Locates a resource and writes it to `dest`.
pub async fn fetch_resource(request: &ResourceRequest<'_>, dest: &Path) -> Result<ResourceSource> {
    let (bytes, source) = locate(request)?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating resource directory", parent)?;
    }
    tokio::fs::write(dest, bytes)
        .await
        .fs_context("writing resource", dest)?;
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_precedence() {
        let root = TempDir::new().unwrap();
        let explicit = root.path().join("mine.list");
        std::fs::write(&explicit, "explicit").unwrap();

        let request = ResourceRequest::new(
            "redistributable.list",
            "redistributable modules",
            "redistributable.list",
        );
        let (_, source) = locate(&request).unwrap();
        assert_eq!(source, ResourceSource::BuiltIn("redistributable.list"));

        let request = request.with_override(Some(&explicit));
        let (bytes, source) = locate(&request).unwrap();
        assert_eq!(bytes, b"explicit");
        assert!(matches!(source, ResourceSource::Explicit(_)));

        std::fs::write(root.path().join("redistributable.list"), "dropped").unwrap();
        let request = request.with_drop_in_root(Some(root.path()));
        let (bytes, source) = locate(&request).unwrap();
        assert_eq!(bytes, b"dropped");
        assert!(matches!(source, ResourceSource::DropIn(_)));
    }

    #[test]
    fn test_unknown_default_is_config_error() {
        let request = ResourceRequest::new("x", "thing", "no-such-default");
        assert!(locate(&request).is_err());
    }
}
