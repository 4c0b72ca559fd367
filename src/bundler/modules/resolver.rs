//! Computes the set of modules embedded in the application runtime.

use super::{
    classify::{MODULE_CLASSIFIER, Module, ModuleClassifier, ModuleKind},
    redistributable::{ALL_MODULE_PATH, ALL_RUNTIME, platform_modules, redistributable_modules},
    scanner::scan_module_path,
};
use crate::bundler::{
    error::{Error, Result},
    params::{ParamStore, standard},
    platform::{Arch, Platform},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

/// Inputs of one resolution, gathered from the parameter store.
#[derive(Clone, Debug, Default)]
pub struct ModulePlan {
    /// Requested modules; may contain [`ALL_MODULE_PATH`] and [`ALL_RUNTIME`].
    pub add_modules: BTreeSet<String>,
    /// Archive holding the main class, when there is one.
    pub main_archive: Option<PathBuf>,
    /// Module named by the `module` parameter.
    pub main_module: Option<String>,
    /// Every archive in the application resources that applies to this host.
    pub resource_archives: Vec<PathBuf>,
    pub detect_modules: bool,
}

/// Outcome of a resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleSelection {
    /// Modules to embed; all of them exist on the module path.
    pub modules: BTreeSet<String>,
    /// Requested names that were not found and left out.
    pub dropped: BTreeSet<String>,
    pub main_kind: Option<ModuleKind>,
}

/// Resolves module requests against one module path.
#[derive(Debug)]
pub struct ModuleResolver<'a> {
    classifier: &'a ModuleClassifier,
    module_path: &'a [PathBuf],
    drop_in_root: Option<&'a Path>,
    platform: Option<Platform>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(classifier: &'a ModuleClassifier, module_path: &'a [PathBuf]) -> Self {
        Self {
            classifier,
            module_path,
            drop_in_root: None,
            platform: None,
        }
    }

    /// Adds the platform's drop-in module list to every resolution.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Directory searched for a customized redistributable list.
    pub fn with_drop_in_root(mut self, root: Option<&'a Path>) -> Self {
        self.drop_in_root = root;
        self
    }

    /// Kind of the main archive, as it decides which modules are implied.
    ///
    /// Without an archive the application runs from the class path unless a
    /// main module was named.
    pub fn main_kind(&self, plan: &ModulePlan) -> ModuleKind {
        match (&plan.main_archive, &plan.main_module) {
            (Some(archive), _) => self.classifier.classify(archive).kind,
            (None, None) => ModuleKind::UnnamedJar,
            (None, Some(_)) => ModuleKind::Unknown,
        }
    }

    pub fn resolve(&self, plan: &ModulePlan) -> Result<ModuleSelection> {
        let main_kind = self.main_kind(plan);
        let mut requested = plan.add_modules.clone();

        match main_kind {
            ModuleKind::UnnamedJar if !plan.detect_modules => {
                requested.insert(ALL_RUNTIME.to_string());
            }
            ModuleKind::Unknown | ModuleKind::ModularJar => {
                if let Some(name) = self.main_module_name(plan, main_kind) {
                    requested.insert(name);
                }
                self.reject_modular_resources(plan)?;
            }
            _ => {}
        }

        if !standard::has_base_module(self.module_path) {
            log::warn!("Module java.base could not be found on the module path");
        }

        let available = scan_module_path(self.classifier, self.module_path)?;
        let mut expanded = self.expand(requested, &available)?;
        if let Some(platform) = self.platform {
            expanded.extend(platform_modules(platform, self.drop_in_root)?);
        }

        let mut selection = ModuleSelection {
            main_kind: Some(main_kind),
            ..ModuleSelection::default()
        };
        for name in expanded {
            if available.contains_key(&name) {
                selection.modules.insert(name);
            } else {
                log::info!("Module {} does not exist.", name);
                selection.dropped.insert(name);
            }
        }

        log::info!(
            "Adding modules: {:?} to runtime image.",
            selection.modules
        );
        Ok(selection)
    }

    fn main_module_name(&self, plan: &ModulePlan, main_kind: ModuleKind) -> Option<String> {
        if let Some(name) = &plan.main_module {
            return Some(name.clone());
        }
        match (&plan.main_archive, main_kind) {
            (Some(archive), ModuleKind::ModularJar) => Some(self.classifier.classify(archive).name),
            _ => None,
        }
    }

    /// A modular main archive must be the only modular archive.
    fn reject_modular_resources(&self, plan: &ModulePlan) -> Result<()> {
        let modular: Vec<Module> = plan
            .resource_archives
            .iter()
            .filter(|path| plan.main_archive.as_deref() != Some(path.as_path()))
            .map(|path| self.classifier.classify(path))
            .filter(|module| module.kind == ModuleKind::ModularJar)
            .collect();
        if modular.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = modular.iter().map(|m| m.path.display().to_string()).collect();
        Err(Error::config_with_advice(
            format!("Modules are not allowed in app resources: {}.", names.join(", ")),
            "Put additional modules on the module path instead of the application resources.",
        ))
    }

    fn expand(
        &self,
        requested: BTreeSet<String>,
        available: &BTreeMap<String, Module>,
    ) -> Result<BTreeSet<String>> {
        let mut modules = BTreeSet::new();
        for name in requested {
            match name.as_str() {
                ALL_MODULE_PATH => modules.extend(available.keys().cloned()),
                ALL_RUNTIME => modules.extend(redistributable_modules(self.drop_in_root)?),
                _ => {
                    modules.insert(name);
                }
            }
        }
        Ok(modules)
    }
}

/// Builds the plan from the store's module and resource parameters.
pub fn plan_from_store(store: &mut ParamStore) -> Result<ModulePlan> {
    let main_archive = store
        .fetch(&standard::MAIN_JAR)?
        .and_then(|set| set.files().first().map(|rel| set.base_dir().join(rel)));
    let resource_archives = store
        .fetch(&standard::APP_RESOURCES_LIST)?
        .iter()
        .filter(|set| set.applies_to(Platform::current(), Arch::current().as_str()))
        .flat_map(|set| set.paths().collect::<Vec<_>>())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
        })
        .collect();
    Ok(ModulePlan {
        add_modules: store.fetch(&standard::ADD_MODULES)?,
        main_archive,
        main_module: store.fetch(&standard::MAIN_MODULE)?,
        resource_archives,
        detect_modules: store.fetch(&standard::DETECT_MODULES)?,
    })
}

/// Resolves the modules of the `platform` image for the application
/// described by `store`.
pub fn resolve_modules(store: &mut ParamStore, platform: Platform) -> Result<ModuleSelection> {
    let plan = plan_from_store(store)?;
    let module_path = store.fetch(&standard::MODULE_PATH)?;
    let drop_in_root = store.fetch(&standard::DROP_IN_RESOURCES_ROOT)?;
    let classifier = store.fetch(&MODULE_CLASSIFIER)?;
    ModuleResolver::new(&classifier, &module_path)
        .with_drop_in_root(Some(&drop_in_root))
        .with_platform(platform)
        .resolve(&plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{error::ErrorKind, resources::manifest::tests::write_jar};
    use tempfile::TempDir;

    fn jmods(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::write(dir.path().join(format!("{name}.jmod")), b"").unwrap();
        }
        dir
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_missing_modules_are_pruned() {
        let dir = jmods(&["java.base", "core"]);
        let path = vec![dir.path().to_path_buf()];
        let classifier = ModuleClassifier::new();
        let plan = ModulePlan {
            add_modules: set(&["core", "ghost"]),
            main_module: Some("core".into()),
            ..ModulePlan::default()
        };
        let selection = ModuleResolver::new(&classifier, &path).resolve(&plan).unwrap();
        assert_eq!(selection.modules, set(&["core"]));
        assert_eq!(selection.dropped, set(&["ghost"]));
    }

    #[test]
    fn test_all_runtime_expansion_is_stable() {
        let dir = jmods(&["java.base", "java.sql", "jdk.jfr", "com.internal"]);
        let path = vec![dir.path().to_path_buf()];
        let classifier = ModuleClassifier::new();
        let resolver = ModuleResolver::new(&classifier, &path);
        let plan = ModulePlan {
            add_modules: set(&[ALL_RUNTIME]),
            ..ModulePlan::default()
        };
        let first = resolver.resolve(&plan).unwrap();
        let second = resolver.resolve(&plan).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.modules, set(&["java.base", "java.sql", "jdk.jfr"]));
        assert!(!first.modules.contains("com.internal"));
    }

    #[test]
    fn test_unnamed_main_jar_pulls_in_all_runtime() {
        let dir = jmods(&["java.base", "java.desktop"]);
        let app = TempDir::new().unwrap();
        let jar = app.path().join("app.jar");
        write_jar(&jar, &[("a/Main.class", "")]);
        let path = vec![dir.path().to_path_buf()];
        let classifier = ModuleClassifier::new();
        let resolver = ModuleResolver::new(&classifier, &path);

        let mut plan = ModulePlan {
            main_archive: Some(jar),
            ..ModulePlan::default()
        };
        let selection = resolver.resolve(&plan).unwrap();
        assert_eq!(selection.main_kind, Some(ModuleKind::UnnamedJar));
        assert_eq!(selection.modules, set(&["java.base", "java.desktop"]));

        plan.detect_modules = true;
        plan.add_modules = set(&["java.base"]);
        let selection = resolver.resolve(&plan).unwrap();
        assert_eq!(selection.modules, set(&["java.base"]));
    }

    #[test]
    fn test_all_module_path_includes_modular_main_jar() {
        let dir = jmods(&["java.base"]);
        write_jar(
            &dir.path().join("com.example.app.jar"),
            &[("module-info.class", "")],
        );
        let path = vec![dir.path().to_path_buf()];
        let classifier = ModuleClassifier::new();
        let plan = ModulePlan {
            add_modules: set(&[ALL_MODULE_PATH]),
            main_archive: Some(dir.path().join("com.example.app.jar")),
            ..ModulePlan::default()
        };
        let selection = ModuleResolver::new(&classifier, &path).resolve(&plan).unwrap();
        assert_eq!(selection.main_kind, Some(ModuleKind::ModularJar));
        assert_eq!(selection.modules, set(&["com.example.app", "java.base"]));
    }

    #[test]
    fn test_two_modular_archives_are_ambiguous() {
        let dir = jmods(&["java.base"]);
        let app = TempDir::new().unwrap();
        let first = app.path().join("first.jar");
        let second = app.path().join("second.jar");
        write_jar(&first, &[("module-info.class", "")]);
        write_jar(&second, &[("module-info.class", "")]);
        let path = vec![dir.path().to_path_buf()];
        let classifier = ModuleClassifier::new();
        let plan = ModulePlan {
            main_archive: Some(first.clone()),
            resource_archives: vec![first, second],
            ..ModulePlan::default()
        };
        let err = ModuleResolver::new(&classifier, &path)
            .resolve(&plan)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
        assert!(err.to_string().contains("second.jar"));
    }

    #[test]
    fn test_missing_base_module_only_warns() {
        let dir = jmods(&["core"]);
        let path = vec![dir.path().to_path_buf()];
        let classifier = ModuleClassifier::new();
        let plan = ModulePlan {
            add_modules: set(&["core", "java.base"]),
            main_module: Some("core".into()),
            ..ModulePlan::default()
        };
        let selection = ModuleResolver::new(&classifier, &path).resolve(&plan).unwrap();
        assert_eq!(selection.modules, set(&["core"]));
        assert_eq!(selection.dropped, set(&["java.base"]));
    }

    #[test]
    fn test_resolve_from_store() {
        let dir = jmods(&["java.base", "java.logging"]);
        let mut store = ParamStore::standard();
        store.set(&standard::MODULE_PATH, vec![dir.path().to_path_buf()]);
        store.supply_raw("module", "java.logging/com.example.Main").unwrap();
        store.supply_raw("add-modules", "java.base").unwrap();
        let selection = resolve_modules(&mut store, Platform::Linux).unwrap();
        assert_eq!(selection.main_kind, Some(ModuleKind::Unknown));
        assert_eq!(selection.modules, set(&["java.base", "java.logging"]));
    }

    #[test]
    fn test_platform_list_adds_available_modules() {
        let dir = jmods(&["java.base", "java.logging", "jdk.unsupported"]);
        let drop_in = TempDir::new().unwrap();
        std::fs::write(
            drop_in.path().join("linux-modules.list"),
            "jdk.unsupported\njdk.missing\n",
        )
        .unwrap();
        let mut store = ParamStore::standard();
        store.set(&standard::MODULE_PATH, vec![dir.path().to_path_buf()]);
        store.set(&standard::DROP_IN_RESOURCES_ROOT, drop_in.path().to_path_buf());
        store.supply_raw("module", "java.logging/com.example.Main").unwrap();

        let selection = resolve_modules(&mut store, Platform::Linux).unwrap();
        assert!(selection.modules.contains("jdk.unsupported"));
        assert!(selection.dropped.contains("jdk.missing"));
        let selection = resolve_modules(&mut store, Platform::Windows).unwrap();
        assert!(!selection.modules.contains("jdk.unsupported"));
    }

    #[test]
    fn test_foreign_resources_do_not_count_as_modules() {
        let dir = jmods(&["java.base"]);
        let app = TempDir::new().unwrap();
        let main = app.path().join("main");
        let foreign = app.path().join("foreign");
        write_jar(
            &main.join("com.example.app.jar"),
            &[
                ("META-INF/MANIFEST.MF", "Main-Class: com.example.Main\n"),
                ("module-info.class", ""),
            ],
        );
        write_jar(&foreign.join("native.jar"), &[("module-info.class", "")]);
        let elsewhere = if Platform::current() == Platform::Windows {
            "linux"
        } else {
            "windows"
        };

        let mut store = ParamStore::standard();
        store.set(&standard::MODULE_PATH, vec![dir.path().to_path_buf()]);
        store
            .supply(
                &standard::APP_RESOURCES_LIST,
                &format!(
                    "{}\n{}@{elsewhere}",
                    main.display(),
                    foreign.display()
                ),
            )
            .unwrap();
        store.supply_raw("module", "com.example.app/com.example.Main").unwrap();

        let plan = plan_from_store(&mut store).unwrap();
        assert_eq!(plan.resource_archives, vec![main.join("com.example.app.jar")]);
        resolve_modules(&mut store, Platform::current()).unwrap();
    }
}
