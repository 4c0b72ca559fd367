//! Module path scanning.

use super::classify::{Module, ModuleClassifier};
use crate::bundler::error::{Error, Result};
use std::{collections::BTreeMap, path::PathBuf};

/// Collects every jmod, modular jar and exploded module found directly in
/// the directories of `module_path`.
///
/// When two directories provide the same module name the earlier one wins.
pub fn scan_module_path(
    classifier: &ModuleClassifier,
    module_path: &[PathBuf],
) -> Result<BTreeMap<String, Module>> {
    let mut found = BTreeMap::new();
    for dir in module_path {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::config_with_advice(
                format!("Can not get modules in directory {}: {}", dir.display(), e),
                "Every module path entry must be an existing directory.",
            )
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();
        for path in paths {
            let module = classifier.classify(&path);
            if module.kind.is_module() {
                found.entry(module.name.clone()).or_insert(module);
            }
        }
    }
    log::trace!("Module path provides {} modules", found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{error::ErrorKind, modules::ModuleKind};
    use tempfile::TempDir;

    #[test]
    fn test_scan_is_one_level_deep() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("java.base.jmod"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/java.sql.jmod"), b"").unwrap();

        let classifier = ModuleClassifier::new();
        let found = scan_module_path(&classifier, &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["java.base"]);
        assert_eq!(found["java.base"].kind, ModuleKind::Jmod);
    }

    #[test]
    fn test_missing_directory_is_configuration_error() {
        let classifier = ModuleClassifier::new();
        let err = scan_module_path(&classifier, &[PathBuf::from("/no/such/jmods")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
    }
}
