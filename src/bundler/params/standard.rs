//! Parameters understood by every bundler.
//!
//! Defaults form a derivation graph: the application name comes from the main
//! class, which comes from the entry point detected in the app resources, and
//! so on. Overriding any node short-circuits everything derived from it.

use super::{
    FileAssociation, ParamDescriptor, ParamInfo, ParamStore, SecondaryLauncher, ValueType, parse,
};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    platform::{Arch, Platform},
    resources::{EntryPoint, RelativeFileSet},
};
use chrono::Datelike;
use path_absolutize::Absolutize;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

/// Characters that are not allowed in file-system names, besides whitespace.
const FS_NAME_FORBIDDEN: &str = r"\/?:*<>|";

fn to_fs_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !FS_NAME_FORBIDDEN.contains(*c))
        .collect()
}

// ---------------------------------------------------------------------------
// Entry point and identity
// ---------------------------------------------------------------------------

pub static APP_RESOURCES_LIST: ParamDescriptor<Vec<RelativeFileSet>> = ParamDescriptor {
    id: "appResources",
    name: "Resources",
    description: "Ordered resource sets copied into the application directory.",
    value_type: ValueType::Object,
    deriver: |_| Ok(Vec::new()),
    parser: Some(|raw, store| {
        let mut sets = store.get(&APP_RESOURCES_LIST)?.unwrap_or_default();
        for spec in raw.lines().map(str::trim).filter(|s| !s.is_empty()) {
            sets.push(RelativeFileSet::parse(spec)?);
        }
        Ok(sets)
    }),
};

/// Entry point detected from the resource archives.
pub static ENTRY_POINT: ParamDescriptor<EntryPoint> = ParamDescriptor {
    id: "entryPoint",
    name: "Entry point",
    description: "Main archive, class and class path discovered from the resources.",
    value_type: ValueType::Object,
    deriver: |store| {
        let resources: Vec<RelativeFileSet> = store
            .fetch(&APP_RESOURCES_LIST)?
            .into_iter()
            .filter(|set| set.applies_to(Platform::current(), Arch::current().as_str()))
            .collect();
        let main_jar = store.get(&MAIN_JAR)?.flatten();
        let main_class = store.get(&MAIN_CLASS)?.flatten();
        let jar_rel = main_jar.as_ref().and_then(|set| set.files().first().cloned());
        EntryPoint::detect(&resources, jar_rel.as_deref(), main_class.as_deref())
    },
    parser: None,
};

pub static MAIN_JAR: ParamDescriptor<Option<RelativeFileSet>> = ParamDescriptor {
    id: "mainJar",
    name: "Main jar",
    description: "Archive holding the application class, relative to its resource set.",
    value_type: ValueType::Object,
    deriver: |store| Ok(store.fetch(&ENTRY_POINT)?.main_jar),
    parser: Some(|raw, store| {
        let rel = PathBuf::from(raw);
        for set in store.fetch(&APP_RESOURCES_LIST)? {
            if set.contains(&rel) {
                return Ok(Some(RelativeFileSet::new(set.base_dir(), [rel])));
            }
        }
        let path = Path::new(raw);
        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => Ok(Some(RelativeFileSet::new(
                parent,
                [PathBuf::from(name)],
            ))),
            _ => Err(Error::ParamParse {
                id: "mainJar".to_string(),
                value: raw.to_string(),
                reason: "not a file path".to_string(),
            }),
        }
    }),
};

pub static MAIN_CLASS: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "applicationClass",
    name: "Main class",
    description: "Fully qualified name of the class that starts the application.",
    value_type: ValueType::String,
    deriver: |store| {
        if let Some(module) = store.fetch(&MODULE)? {
            if let Some((_, class)) = module.split_once('/') {
                return Ok(Some(class.to_string()));
            }
        }
        Ok(store.fetch(&ENTRY_POINT)?.main_class)
    },
    parser: Some(|raw, _| Ok(Some(raw.trim().to_string()))),
};

pub static CLASSPATH: ParamDescriptor<String> = ParamDescriptor {
    id: "classpath",
    name: "Main jar classpath",
    description: "Class path declared by the main archive.",
    value_type: ValueType::String,
    deriver: |store| Ok(store.fetch(&ENTRY_POINT)?.classpath.unwrap_or_default()),
    parser: Some(|raw, _| Ok(raw.replace([':', ';'], " ").trim().to_string())),
};

pub static PRELOADER: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "preloader",
    name: "Preloader",
    description: "Class shown while the application starts.",
    value_type: ValueType::String,
    deriver: |store| Ok(store.fetch(&ENTRY_POINT)?.preloader),
    parser: Some(|raw, _| Ok(Some(raw.to_string()))),
};

pub static APP_NAME: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "application.name",
    name: "Name",
    description: "Application name; defaults to the simple name of the main class.",
    value_type: ValueType::String,
    deriver: |store| {
        Ok(store
            .fetch(&MAIN_CLASS)?
            .map(|class| match class.rsplit_once('.') {
                Some((_, simple)) => simple.to_string(),
                None => class,
            }))
    },
    parser: Some(|raw, _| Ok(Some(raw.to_string()))),
};

pub static APP_FS_NAME: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "application.fs.name",
    name: "File system name",
    description: "Application name with characters unsafe in file names removed.",
    value_type: ValueType::String,
    deriver: |store| {
        Ok(store
            .fetch(&APP_NAME)?
            .map(|name| to_fs_name(&name)))
    },
    parser: Some(|raw, _| Ok(Some(raw.to_string()))),
};

pub static TITLE: ParamDescriptor<String> = ParamDescriptor {
    id: "application.title",
    name: "Title",
    description: "One-line summary; defaults to the name.",
    value_type: ValueType::String,
    deriver: |store| Ok(store.fetch(&APP_NAME)?.unwrap_or_default()),
    parser: None,
};

pub static VENDOR: ParamDescriptor<String> = ParamDescriptor {
    id: "application.vendor",
    name: "Vendor",
    description: "Organization that ships the application.",
    value_type: ValueType::String,
    deriver: |_| Ok("Unknown".to_string()),
    parser: None,
};

pub static CATEGORY: ParamDescriptor<String> = ParamDescriptor {
    id: "application.category",
    name: "Category",
    description: "Desktop menu category.",
    value_type: ValueType::String,
    deriver: |_| Ok("Unknown".to_string()),
    parser: None,
};

pub static DESCRIPTION: ParamDescriptor<String> = ParamDescriptor {
    id: "application.description",
    name: "Description",
    description: "Longer description; defaults to the name.",
    value_type: ValueType::String,
    deriver: |store| Ok(store.fetch(&APP_NAME)?.unwrap_or_else(|| "none".to_string())),
    parser: None,
};

pub static COPYRIGHT: ParamDescriptor<String> = ParamDescriptor {
    id: "application.copyright",
    name: "Copyright",
    description: "Copyright notice.",
    value_type: ValueType::String,
    deriver: |_| Ok(format!("Copyright (C) {}", chrono::Local::now().year())),
    parser: None,
};

pub static VERSION: ParamDescriptor<String> = ParamDescriptor {
    id: "application.version",
    name: "Version",
    description: "Application version.",
    value_type: ValueType::String,
    deriver: |_| Ok("1.0".to_string()),
    parser: None,
};

pub static LICENSE_TYPE: ParamDescriptor<String> = ParamDescriptor {
    id: "licenseType",
    name: "License type",
    description: "Short license name.",
    value_type: ValueType::String,
    deriver: |_| Ok("Unknown".to_string()),
    parser: None,
};

pub static LICENSE_FILE: ParamDescriptor<Vec<String>> = ParamDescriptor {
    id: "licenseFile",
    name: "License files",
    description: "License files, relative to one of the resource sets.",
    value_type: ValueType::List,
    deriver: |_| Ok(Vec::new()),
    parser: Some(|raw, _| Ok(parse::split_commas(raw))),
};

pub static IDENTIFIER: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "identifier",
    name: "Identifier",
    description: "Reverse-domain identifier; defaults to the main class package.",
    value_type: ValueType::String,
    deriver: |store| {
        Ok(store.fetch(&MAIN_CLASS)?.map(|class| match class.rfind('.') {
            Some(idx) if idx >= 1 => class[..idx].to_string(),
            _ => class,
        }))
    },
    parser: Some(|raw, _| Ok(Some(raw.to_string()))),
};

pub static PREFERENCES_ID: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "preferencesID",
    name: "Preferences id",
    description: "Preferences node; defaults to the identifier with dots as slashes.",
    value_type: ValueType::String,
    deriver: |store| Ok(store.fetch(&IDENTIFIER)?.map(|id| id.replace('.', "/"))),
    parser: Some(|raw, _| Ok(Some(raw.to_string()))),
};

// ---------------------------------------------------------------------------
// Launch
// ---------------------------------------------------------------------------

pub static ARGUMENTS: ParamDescriptor<Vec<String>> = ParamDescriptor {
    id: "arguments",
    name: "Command line arguments",
    description: "Arguments passed to the application on every launch.",
    value_type: ValueType::List,
    deriver: |_| Ok(Vec::new()),
    parser: Some(|raw, _| Ok(parse::split_arguments(raw))),
};

pub static JVM_OPTIONS: ParamDescriptor<Vec<String>> = ParamDescriptor {
    id: "jvmOptions",
    name: "Runtime options",
    description: "Options passed to the runtime before the main class.",
    value_type: ValueType::List,
    deriver: |_| Ok(Vec::new()),
    parser: Some(|raw, _| Ok(parse::split_whitespace(raw))),
};

pub static JVM_PROPERTIES: ParamDescriptor<BTreeMap<String, String>> = ParamDescriptor {
    id: "jvmProperties",
    name: "Runtime system properties",
    description: "System properties set with -D.",
    value_type: ValueType::Map,
    deriver: |_| Ok(BTreeMap::new()),
    parser: Some(|raw, _| Ok(parse::parse_properties(raw))),
};

pub static USER_JVM_OPTIONS: ParamDescriptor<BTreeMap<String, String>> = ParamDescriptor {
    id: "userJvmOptions",
    name: "User runtime options",
    description: "Runtime options users may override, keyed by option.",
    value_type: ValueType::Map,
    deriver: |_| Ok(BTreeMap::new()),
    parser: Some(|raw, _| Ok(parse::parse_properties(raw))),
};

pub static SINGLETON: ParamDescriptor<bool> = ParamDescriptor {
    id: "singleton",
    name: "Single instance",
    description: "Prevents more than one running instance.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(false),
    parser: None,
};

pub static LAUNCHER: ParamDescriptor<Option<PathBuf>> = ParamDescriptor {
    id: "launcher",
    name: "Launcher executable",
    description: "Native launcher copied into the image.",
    value_type: ValueType::Path,
    deriver: |_| Ok(None),
    parser: Some(|raw, _| Ok(Some(PathBuf::from(raw)))),
};

pub static ICON: ParamDescriptor<Option<PathBuf>> = ParamDescriptor {
    id: "icon",
    name: "Icon",
    description: "Application icon.",
    value_type: ValueType::Path,
    deriver: |_| Ok(None),
    parser: Some(|raw, _| Ok(Some(PathBuf::from(raw)))),
};

pub static SECONDARY_LAUNCHERS: ParamDescriptor<Vec<SecondaryLauncher>> = ParamDescriptor {
    id: "secondaryLaunchers",
    name: "Secondary launchers",
    description: "Additional launchers in the same image.",
    value_type: ValueType::Object,
    deriver: |_| Ok(Vec::new()),
    parser: Some(|raw, store| {
        let mut launchers = store.get(&SECONDARY_LAUNCHERS)?.unwrap_or_default();
        launchers.extend(SecondaryLauncher::parse_all(SECONDARY_LAUNCHERS.id, raw)?);
        Ok(launchers)
    }),
};

pub static FILE_ASSOCIATIONS: ParamDescriptor<Vec<FileAssociation>> = ParamDescriptor {
    id: "fileAssociations",
    name: "File associations",
    description: "Document types the application opens.",
    value_type: ValueType::Object,
    deriver: |_| Ok(Vec::new()),
    parser: Some(|raw, store| {
        let mut associations = store.get(&FILE_ASSOCIATIONS)?.unwrap_or_default();
        associations.extend(FileAssociation::parse_all(raw));
        Ok(associations)
    }),
};

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

pub static SYSTEM_WIDE: ParamDescriptor<Option<bool>> = ParamDescriptor {
    id: "systemWide",
    name: "System wide",
    description: "Install for all users; unset lets each installer decide.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(None),
    parser: Some(|raw, _| parse::parse_bool("systemWide", raw).map(Some)),
};

pub static SERVICE_HINT: ParamDescriptor<bool> = ParamDescriptor {
    id: "serviceHint",
    name: "Service hint",
    description: "Install the application as a service or daemon.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(false),
    parser: None,
};

pub static START_ON_INSTALL: ParamDescriptor<bool> = ParamDescriptor {
    id: "startOnInstall",
    name: "Start on install",
    description: "Start the service once installed.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(false),
    parser: None,
};

pub static STOP_ON_UNINSTALL: ParamDescriptor<bool> = ParamDescriptor {
    id: "stopOnUninstall",
    name: "Stop on uninstall",
    description: "Stop the service before it is removed.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(true),
    parser: None,
};

pub static RUN_AT_STARTUP: ParamDescriptor<bool> = ParamDescriptor {
    id: "runAtStartup",
    name: "Run at startup",
    description: "Start the service when the system boots.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(false),
    parser: None,
};

pub static PREDEFINED_APP_IMAGE: ParamDescriptor<Option<PathBuf>> = ParamDescriptor {
    id: "app.image",
    name: "Predefined app image",
    description: "Existing application image to package instead of building one.",
    value_type: ValueType::Path,
    deriver: |_| Ok(None),
    parser: Some(|raw, _| Ok(Some(PathBuf::from(raw)))),
};

// ---------------------------------------------------------------------------
// Build environment
// ---------------------------------------------------------------------------

pub static VERBOSE: ParamDescriptor<bool> = ParamDescriptor {
    id: "verbose",
    name: "Verbose",
    description: "Keep intermediate files and log more.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(false),
    parser: None,
};

pub static BUILD_ROOT: ParamDescriptor<PathBuf> = ParamDescriptor {
    id: "buildRoot",
    name: "Build root",
    description: "Scratch directory for this run; created on first use.",
    value_type: ValueType::Path,
    deriver: |_| {
        let dir = std::env::temp_dir().join(format!("runtime-bundler-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).fs_context("creating build root", &dir)?;
        log::debug!("Build root: {}", dir.display());
        Ok(dir)
    },
    parser: None,
};

pub static IMAGES_ROOT: ParamDescriptor<PathBuf> = ParamDescriptor {
    id: "imagesRoot",
    name: "Images root",
    description: "Where application images are assembled.",
    value_type: ValueType::Path,
    deriver: |store| Ok(store.fetch(&BUILD_ROOT)?.join("images")),
    parser: None,
};

pub static DROP_IN_RESOURCES_ROOT: ParamDescriptor<PathBuf> = ParamDescriptor {
    id: "dropinResourcesRoot",
    name: "Drop-in resources root",
    description: "Directory searched for customized packaging resources.",
    value_type: ValueType::Path,
    deriver: |_| Ok(PathBuf::from(".")),
    parser: None,
};

// ---------------------------------------------------------------------------
// Runtime image
// ---------------------------------------------------------------------------

/// `jmods` directory of the runtime the bundler itself was pointed at.
pub fn default_jmods() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let jmods = PathBuf::from(home).join("jmods");
        if jmods.is_dir() {
            return Some(jmods);
        }
    }
    let java = which::which("java").ok()?;
    let java = std::fs::canonicalize(&java).unwrap_or(java);
    let jmods = java.parent()?.parent()?.join("jmods");
    jmods.is_dir().then_some(jmods)
}

pub(crate) fn has_base_module(path: &[PathBuf]) -> bool {
    path.iter()
        .any(|dir| dir.join("java.base.jmod").is_file() || dir.join("java.base").is_dir())
}

pub static MODULE_PATH: ParamDescriptor<Vec<PathBuf>> = ParamDescriptor {
    id: "module-path",
    name: "Module path",
    description: "Directories searched for runtime modules.",
    value_type: ValueType::Object,
    deriver: |_| Ok(default_jmods().into_iter().collect()),
    parser: Some(|raw, _| {
        let mut path = Vec::new();
        for entry in std::env::split_paths(raw).filter(|p| !p.as_os_str().is_empty()) {
            let absolute = entry
                .absolutize()
                .fs_context("resolving module path", &entry)?
                .into_owned();
            path.push(absolute);
        }
        if !has_base_module(&path) {
            if let Some(jmods) = default_jmods() {
                log::debug!("Adding {} to the module path", jmods.display());
                path.push(jmods);
            }
        }
        Ok(path)
    }),
};

pub static ADD_MODULES: ParamDescriptor<BTreeSet<String>> = ParamDescriptor {
    id: "add-modules",
    name: "Add modules",
    description: "Modules (or macros) to embed in the runtime.",
    value_type: ValueType::List,
    deriver: |_| Ok(BTreeSet::from(["java.base".to_string()])),
    parser: Some(|raw, _| Ok(parse::split_commas(raw).into_iter().collect())),
};

pub static LIMIT_MODULES: ParamDescriptor<BTreeSet<String>> = ParamDescriptor {
    id: "limit-modules",
    name: "Limit modules",
    description: "Upper bound on the observable modules.",
    value_type: ValueType::List,
    deriver: |_| Ok(BTreeSet::new()),
    parser: Some(|raw, _| Ok(parse::split_commas(raw).into_iter().collect())),
};

pub static MODULE: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "module",
    name: "Main module",
    description: "Main module, optionally followed by `/` and the main class.",
    value_type: ValueType::String,
    deriver: |_| Ok(None),
    parser: Some(|raw, _| Ok(Some(raw.trim().to_string()))),
};

pub static MAIN_MODULE: ParamDescriptor<Option<String>> = ParamDescriptor {
    id: "mainModule",
    name: "Main module name",
    description: "Module part of the `module` parameter.",
    value_type: ValueType::String,
    deriver: |store| {
        Ok(store.fetch(&MODULE)?.map(|m| match m.split_once('/') {
            Some((name, _)) => name.to_string(),
            None => m,
        }))
    },
    parser: Some(|raw, _| Ok(Some(raw.to_string()))),
};

pub static STRIP_NATIVE_COMMANDS: ParamDescriptor<bool> = ParamDescriptor {
    id: "strip-native-commands",
    name: "Strip native commands",
    description: "Leave the runtime's native executables out of the image.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(true),
    parser: None,
};

pub static DETECT_MODULES: ParamDescriptor<bool> = ParamDescriptor {
    id: "detect-modules",
    name: "Detect modules",
    description: "Compute modules for unnamed archives instead of embedding all redistributable ones.",
    value_type: ValueType::Boolean,
    deriver: |_| Ok(false),
    parser: None,
};

pub static JLINK_OPTIONS: ParamDescriptor<BTreeMap<String, String>> = ParamDescriptor {
    id: "jlink.options",
    name: "Runtime assembler options",
    description: "Extra `--key=value` options for the runtime assembler.",
    value_type: ValueType::Map,
    deriver: |_| Ok(BTreeMap::new()),
    parser: Some(|raw, _| Ok(parse::parse_properties(raw))),
};

pub static EXCLUDE_FILES: ParamDescriptor<Vec<String>> = ParamDescriptor {
    id: "exclude-files",
    name: "Excluded runtime files",
    description: "Patterns of runtime files left out of the image.",
    value_type: ValueType::List,
    deriver: |_| Ok(vec![r".*\.diz".to_string()]),
    parser: Some(|raw, _| Ok(parse::split_commas(raw))),
};

/// Every standard descriptor, for registries and listings.
pub fn all() -> Vec<&'static dyn ParamInfo> {
    vec![
        &APP_RESOURCES_LIST,
        &ENTRY_POINT,
        &MAIN_JAR,
        &MAIN_CLASS,
        &CLASSPATH,
        &PRELOADER,
        &APP_NAME,
        &APP_FS_NAME,
        &TITLE,
        &VENDOR,
        &CATEGORY,
        &DESCRIPTION,
        &COPYRIGHT,
        &VERSION,
        &LICENSE_TYPE,
        &LICENSE_FILE,
        &IDENTIFIER,
        &PREFERENCES_ID,
        &ARGUMENTS,
        &JVM_OPTIONS,
        &JVM_PROPERTIES,
        &USER_JVM_OPTIONS,
        &SINGLETON,
        &LAUNCHER,
        &ICON,
        &SECONDARY_LAUNCHERS,
        &FILE_ASSOCIATIONS,
        &SYSTEM_WIDE,
        &SERVICE_HINT,
        &START_ON_INSTALL,
        &STOP_ON_UNINSTALL,
        &RUN_AT_STARTUP,
        &PREDEFINED_APP_IMAGE,
        &VERBOSE,
        &BUILD_ROOT,
        &IMAGES_ROOT,
        &DROP_IN_RESOURCES_ROOT,
        &MODULE_PATH,
        &ADD_MODULES,
        &LIMIT_MODULES,
        &MODULE,
        &MAIN_MODULE,
        &STRIP_NATIVE_COMMANDS,
        &DETECT_MODULES,
        &JLINK_OPTIONS,
        &EXCLUDE_FILES,
    ]
}

/// Checks shared by every image bundler.
pub fn validate_image_params(store: &mut ParamStore) -> Result<()> {
    let has_jar = store.fetch(&MAIN_JAR)?.is_some();
    let has_module = store.fetch(&MODULE)?.is_some();
    let has_class = store.fetch(&MAIN_CLASS)?.is_some();
    if !has_jar && !has_module && !has_class {
        return Err(Error::config_with_advice(
            "Main application jar is missing.",
            "Either specify a main jar, a main module, or a main class.",
        ));
    }
    if store.fetch(&APP_NAME)?.is_none() {
        return Err(Error::config_with_advice(
            "Application name could not be determined.",
            format!("Set `{}` or a main class to derive it from.", APP_NAME.id),
        ));
    }
    for (key, value) in store.fetch(&USER_JVM_OPTIONS)? {
        if value.is_empty() {
            return Err(Error::config_with_advice(
                format!("User runtime option `{key}` has no value."),
                "Provide a value for every user runtime option.",
            ));
        }
    }
    Ok(())
}
