//! Classification of module artifacts.

use crate::bundler::params::{ParamDescriptor, ValueType};
use std::{
    collections::HashMap,
    fs::File,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

const MODULE_INFO: &str = "module-info.class";

/// What kind of module artifact a path holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    /// Missing, unreadable, or not a module artifact.
    Unknown,
    /// Archive without a module descriptor; runs on the class path.
    UnnamedJar,
    /// Archive carrying `module-info.class`.
    ModularJar,
    /// Prebuilt `.jmod`.
    Jmod,
    /// Directory containing `module-info.class`.
    ExplodedModule,
}

impl ModuleKind {
    /// True for the kinds a module path scan collects.
    pub fn is_module(&self) -> bool {
        matches!(self, Self::ModularJar | Self::Jmod | Self::ExplodedModule)
    }
}

/// A classified module artifact.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Module {
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub name: String,
}

impl Module {
    fn new(path: &Path, kind: ModuleKind) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            name: module_name(path, kind),
        }
    }
}

/// Module name of an artifact: the directory name for exploded modules,
/// otherwise the file name without its last extension.
pub fn module_name(path: &Path, kind: ModuleKind) -> String {
    let name = match kind {
        ModuleKind::ExplodedModule => path.file_name(),
        _ => path.file_stem(),
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Inspects a path without caching.
pub fn classify_path(path: &Path) -> ModuleKind {
    if path.is_dir() {
        return if path.join(MODULE_INFO).is_file() {
            ModuleKind::ExplodedModule
        } else {
            ModuleKind::Unknown
        };
    }
    if !path.is_file() {
        return ModuleKind::Unknown;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("jmod") => ModuleKind::Jmod,
        Some(ext) if ext.eq_ignore_ascii_case("jar") => classify_jar(path),
        _ => ModuleKind::Unknown,
    }
}

fn classify_jar(path: &Path) -> ModuleKind {
    let archive = File::open(path)
        .map_err(zip::result::ZipError::Io)
        .and_then(zip::ZipArchive::new);
    let archive = match archive {
        Ok(archive) => archive,
        Err(e) => {
            log::debug!("Cannot open {}: {}", path.display(), e);
            return ModuleKind::Unknown;
        }
    };
    if archive.file_names().any(is_module_info_entry) {
        ModuleKind::ModularJar
    } else {
        ModuleKind::UnnamedJar
    }
}

/// `module-info.class` at the root or under `META-INF/versions/<n>/`.
fn is_module_info_entry(name: &str) -> bool {
    if name == MODULE_INFO {
        return true;
    }
    name.strip_prefix("META-INF/versions/")
        .and_then(|rest| rest.split_once('/'))
        .is_some_and(|(version, file)| {
            !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) && file == MODULE_INFO
        })
}

/// Per-run cache of classifications keyed by path.
///
/// Archives are opened at most once per run no matter how many steps ask
/// about them.
#[derive(Debug, Default)]
pub struct ModuleClassifier {
    cache: Mutex<HashMap<PathBuf, ModuleKind>>,
}

impl ModuleClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, path: &Path) -> Module {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let kind = *cache
            .entry(path.to_path_buf())
            .or_insert_with(|| classify_path(path));
        Module::new(path, kind)
    }

    /// Number of distinct paths classified so far.
    pub fn cached(&self) -> usize {
        match self.cache.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

crate::object_param_type!(Arc<ModuleClassifier>);

/// Classifier shared by every step of one run.
pub static MODULE_CLASSIFIER: ParamDescriptor<Arc<ModuleClassifier>> = ParamDescriptor {
    id: "modules.classifier",
    name: "Module classifier",
    description: "Per-run cache of module artifact classifications.",
    value_type: ValueType::Object,
    deriver: |_| Ok(Arc::new(ModuleClassifier::new())),
    parser: None,
};
