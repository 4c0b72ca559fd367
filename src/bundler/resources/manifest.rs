//! Entry-point detection from archive manifests.

use super::RelativeFileSet;
use crate::bundler::error::{ErrorExt, Result};
use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Main attributes of an archive manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JarManifest {
    attributes: HashMap<String, String>,
}

impl JarManifest {
    /// Parses the main section, joining continuation lines.
    pub fn parse(text: &str) -> Self {
        let mut attributes: HashMap<String, String> = HashMap::new();
        let mut last_key: Option<String> = None;
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            if let Some(rest) = line.strip_prefix(' ') {
                if let Some(key) = &last_key {
                    if let Some(value) = attributes.get_mut(key) {
                        value.push_str(rest);
                    }
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim().to_string();
                attributes.insert(key.clone(), value.trim().to_string());
                last_key = Some(key);
            }
        }
        Self { attributes }
    }

    /// Reads the manifest of an archive; `None` when it has none.
    pub fn read(archive: &Path) -> Result<Option<Self>> {
        let file = File::open(archive).fs_context("opening archive", archive)?;
        let mut zip = zip::ZipArchive::new(file)?;
        let mut entry = match zip.by_name(MANIFEST_ENTRY) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .fs_context("reading manifest", archive)?;
        Ok(Some(Self::parse(&text)))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Declared application class, preferring the UI toolkit attribute.
    pub fn main_class(&self) -> Option<&str> {
        self.get("JavaFX-Application-Class")
            .or_else(|| self.get("Main-Class"))
    }
}

/// Where the application starts, as discovered from the resources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryPoint {
    /// Archive holding the main class, relative to its resource set.
    pub main_jar: Option<RelativeFileSet>,
    pub main_class: Option<String>,
    pub classpath: Option<String>,
    pub preloader: Option<String>,
}

crate::object_param_type!(EntryPoint);

impl EntryPoint {
    /// Scans the resource sets in order for the application entry point.
    ///
    /// An explicitly named main jar is the only candidate when given. With an
    /// explicit main class the first archive declaring that class wins;
    /// otherwise the first archive declaring any main class wins. Archives that
    /// cannot be read are skipped.
    pub fn detect(
        resources: &[RelativeFileSet],
        main_jar: Option<&Path>,
        main_class: Option<&str>,
    ) -> Result<EntryPoint> {
        for set in resources {
            for rel in set.files() {
                if !is_archive(rel) {
                    continue;
                }
                if main_jar.is_some_and(|jar| jar != rel.as_path()) {
                    continue;
                }
                let path = set.base_dir().join(rel);
                let manifest = match JarManifest::read(&path) {
                    Ok(Some(m)) => m,
                    Ok(None) => continue,
                    Err(e) => {
                        log::debug!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                };
                let declared = manifest.main_class();
                let matches = match (main_class, declared) {
                    (Some(wanted), Some(found)) => wanted == found,
                    (Some(_), None) => main_jar.is_some(),
                    (None, found) => found.is_some() || main_jar.is_some(),
                };
                if !matches {
                    continue;
                }
                log::debug!("Detected entry point in {}", path.display());
                return Ok(EntryPoint {
                    main_jar: Some(RelativeFileSet::new(
                        set.base_dir(),
                        [PathBuf::from(rel)],
                    )),
                    main_class: main_class.or(declared).map(str::to_string),
                    classpath: manifest.get("Class-Path").map(str::to_string),
                    preloader: manifest.get("JavaFX-Preloader-Class").map(str::to_string),
                });
            }
        }
        Ok(EntryPoint {
            main_class: main_class.map(str::to_string),
            ..EntryPoint::default()
        })
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    /// Writes a jar with the given entries (name, contents).
    pub(crate) fn write_jar(path: &Path, entries: &[(&str, &str)]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_manifest_continuation_lines() {
        let m = JarManifest::parse(
            "Manifest-Version: 1.0\r\nMain-Class: com.example.very.long.pack\r\n age.Main\r\n\r\nName: other\r\n",
        );
        assert_eq!(m.main_class(), Some("com.example.very.long.package.Main"));
        assert_eq!(m.get("Name"), None);
    }

    #[test]
    fn test_detect_first_declaring_archive_wins() {
        let dir = TempDir::new().unwrap();
        write_jar(&dir.path().join("lib/util.jar"), &[("a.txt", "x")]);
        write_jar(
            &dir.path().join("main.jar"),
            &[(MANIFEST_ENTRY, "Main-Class: com.example.Main\nClass-Path: lib/util.jar\n")],
        );
        write_jar(
            &dir.path().join("other.jar"),
            &[(MANIFEST_ENTRY, "Main-Class: com.example.Other\n")],
        );
        let set = RelativeFileSet::from_dir(dir.path()).unwrap();

        let ep = EntryPoint::detect(std::slice::from_ref(&set), None, None).unwrap();
        assert_eq!(ep.main_class.as_deref(), Some("com.example.Main"));
        assert_eq!(ep.classpath.as_deref(), Some("lib/util.jar"));
        assert!(ep.main_jar.unwrap().contains("main.jar"));

        let ep = EntryPoint::detect(&[set], None, Some("com.example.Other")).unwrap();
        assert!(ep.main_jar.unwrap().contains("other.jar"));
    }

    #[test]
    fn test_detect_without_archives_keeps_explicit_class() {
        let ep = EntryPoint::detect(&[], None, Some("a.B")).unwrap();
        assert_eq!(ep.main_class.as_deref(), Some("a.B"));
        assert!(ep.main_jar.is_none());
    }
}
