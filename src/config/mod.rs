//! TOML parameter files.
//!
//! ```toml
//! [bundle]
//! type = "installer"
//! output = "dist"
//! best_effort = true
//!
//! [params]
//! "application.name" = "Demo"
//! "jvmOptions" = ["-Xmx512m", "-Dfoo=bar"]
//! "jvmProperties" = { "a" = "1" }
//! "verbose" = true
//! ```

use crate::bundler::{self, BundleRequest, ParamStore, params::ParamValue};
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// `[bundle]`: what to produce and where.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleSection {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub output: Option<PathBuf>,
    pub best_effort: Option<bool>,
}

impl BundleSection {
    pub fn request(&self) -> Option<BundleRequest> {
        self.kind.as_deref().map(BundleRequest::parse)
    }
}

/// A parsed parameter file.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ParamFile {
    #[serde(default)]
    pub bundle: BundleSection,
    #[serde(default)]
    pub params: toml::Table,
}

impl ParamFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::ExecutionFailed {
            command: "read_config".to_string(),
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Supplies every `[params]` entry to `store` as an override.
    pub fn apply(&self, store: &mut ParamStore) -> bundler::Result<()> {
        for (id, value) in &self.params {
            apply_value(store, id, value)?;
        }
        Ok(())
    }
}

fn scalar_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strings go through the descriptor's parser, arrays accumulate element by
/// element, and tables, booleans and integers are stored as typed values.
pub fn apply_value(store: &mut ParamStore, id: &str, value: &toml::Value) -> bundler::Result<()> {
    match value {
        toml::Value::Array(items) => {
            for item in items {
                store.supply_raw(id, &scalar_text(item))?;
            }
        }
        toml::Value::Table(table) => {
            let map = table
                .iter()
                .map(|(k, v)| (k.clone(), scalar_text(v)))
                .collect();
            store.accumulate(id, ParamValue::Map(map));
        }
        toml::Value::Boolean(b) => store.accumulate(id, ParamValue::Bool(*b)),
        toml::Value::Integer(i) => store.accumulate(id, ParamValue::Int(*i)),
        other => store.supply_raw(id, &scalar_text(other))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{BundleType, params::ParamState, standard};

    const SAMPLE: &str = r#"
[bundle]
type = "image"
output = "dist"

[params]
"application.name" = "Demo"
"jvmOptions" = ["-Xmx512m", "-Dfoo=bar"]
"jvmProperties" = { "a" = "1" }
"verbose" = true
"custom.key" = "kept"
"#;

    #[test]
    fn test_bundle_section() {
        let file = ParamFile::parse(SAMPLE).unwrap();
        assert_eq!(file.bundle.request(), Some(BundleRequest::Type(BundleType::Image)));
        assert_eq!(file.bundle.output.as_deref(), Some(Path::new("dist")));
        assert_eq!(file.bundle.best_effort, None);
    }

    #[test]
    fn test_params_reach_the_store() {
        let file = ParamFile::parse(SAMPLE).unwrap();
        let mut store = ParamStore::standard();
        file.apply(&mut store).unwrap();

        assert_eq!(
            store.fetch(&standard::APP_NAME).unwrap().as_deref(),
            Some("Demo")
        );
        assert_eq!(
            store.fetch(&standard::JVM_OPTIONS).unwrap(),
            vec!["-Xmx512m", "-Dfoo=bar"]
        );
        assert_eq!(store.fetch(&standard::JVM_PROPERTIES).unwrap()["a"], "1");
        assert!(store.fetch(&standard::VERBOSE).unwrap());
        assert_eq!(store.state("custom.key"), ParamState::Overridden);
    }

    #[test]
    fn test_unknown_bundle_key_is_rejected() {
        assert!(ParamFile::parse("[bundle]\nformat = \"deb\"\n").is_err());
    }
}
