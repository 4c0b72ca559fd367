//! Launch configuration (`<name>.cfg`) read by the native launcher.
//!
//! A flat INI-like text file:
//!
//! ```text
//! [Application]
//! app.name=Demo
//! app.mainjar=demo.jar
//! app.mainclass=com/example/Main
//!
//! [JVMOptions]
//! -Xmx512m
//!
//! [JVMUserOptions]
//! -Dkey\=with\=equals=value
//!
//! [ArgOptions]
//! --verbose
//! ```

use super::layout::ImageLayout;
use crate::bundler::{
    error::Result,
    params::{ParamStore, standard},
};
use std::fmt::Write as _;

const APPLICATION: &str = "Application";
const JVM_OPTIONS: &str = "JVMOptions";
const JVM_USER_OPTIONS: &str = "JVMUserOptions";
const ARG_OPTIONS: &str = "ArgOptions";

/// Contents of a launch configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    /// `[Application]` entries in file order.
    pub application: Vec<(String, String)>,
    pub jvm_options: Vec<String>,
    /// `[JVMUserOptions]` entries with unescaped keys.
    pub user_options: Vec<(String, String)>,
    pub arguments: Vec<String>,
}

impl LaunchConfig {
    /// Configuration for the launcher described by `store`.
    pub fn from_store(store: &mut ParamStore, layout: &ImageLayout) -> Result<Self> {
        let mut application = Vec::new();
        let mut put = |key: &str, value: String| application.push((key.to_string(), value));

        put("app.name", store.fetch(&standard::APP_NAME)?.unwrap_or_default());
        put("app.version", store.fetch(&standard::VERSION)?);
        put(
            "app.preferences.id",
            store.fetch(&standard::PREFERENCES_ID)?.unwrap_or_default(),
        );
        put("app.runtime", layout.runtime_reference());
        put(
            "app.identifier",
            store.fetch(&standard::IDENTIFIER)?.unwrap_or_default(),
        );
        put("app.classpath", store.fetch(&standard::CLASSPATH)?);
        let instance = if store.fetch(&standard::SINGLETON)? {
            "single"
        } else {
            "multiple"
        };
        put("app.application.instance", instance.to_string());

        match store.fetch(&standard::MODULE)? {
            Some(module) => put("app.mainmodule", module),
            None => {
                if let Some(jar) = store.fetch(&standard::MAIN_JAR)? {
                    let rel = jar
                        .files()
                        .first()
                        .map(|f| f.to_string_lossy().replace('\\', "/"))
                        .unwrap_or_default();
                    put("app.mainjar", rel);
                }
                if let Some(class) = store.fetch(&standard::MAIN_CLASS)? {
                    put("app.mainclass", class.replace('.', "/"));
                }
            }
        }

        let mut jvm_options = store.fetch(&standard::JVM_OPTIONS)?;
        for (key, value) in store.fetch(&standard::JVM_PROPERTIES)? {
            jvm_options.push(format!("-D{key}={value}"));
        }
        if let Some(preloader) = store.fetch(&standard::PRELOADER)? {
            jvm_options.push(format!("-Djavafx.preloader={preloader}"));
        }

        Ok(Self {
            application,
            jvm_options,
            user_options: store.fetch(&standard::USER_JVM_OPTIONS)?.into_iter().collect(),
            arguments: store.fetch(&standard::ARGUMENTS)?,
        })
    }

    /// Value of an `[Application]` key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.application
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[{APPLICATION}]");
        for (key, value) in &self.application {
            let _ = writeln!(out, "{key}={value}");
        }
        let _ = writeln!(out, "\n[{JVM_OPTIONS}]");
        for option in &self.jvm_options {
            let _ = writeln!(out, "{option}");
        }
        let _ = writeln!(out, "\n[{JVM_USER_OPTIONS}]");
        for (key, value) in &self.user_options {
            let _ = writeln!(out, "{}={}", escape_key(key), value);
        }
        let _ = writeln!(out, "\n[{ARG_OPTIONS}]");
        for arg in &self.arguments {
            let _ = writeln!(out, "{}", escape_argument(arg));
        }
        out
    }

    /// Reads a file produced by [`render`](Self::render).
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();
        let mut section = "";
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = match name {
                    APPLICATION => APPLICATION,
                    JVM_OPTIONS => JVM_OPTIONS,
                    JVM_USER_OPTIONS => JVM_USER_OPTIONS,
                    ARG_OPTIONS => ARG_OPTIONS,
                    _ => "",
                };
                continue;
            }
            match section {
                APPLICATION => {
                    if let Some((k, v)) = line.split_once('=') {
                        config.application.push((k.to_string(), v.to_string()));
                    }
                }
                JVM_OPTIONS => config.jvm_options.push(line.to_string()),
                JVM_USER_OPTIONS => {
                    if let Some((k, v)) = split_escaped(line) {
                        config.user_options.push((k, v.to_string()));
                    }
                }
                ARG_OPTIONS => config.arguments.push(unescape_argument(line)),
                _ => log::debug!("Ignoring line outside a known section: {line}"),
            }
        }
        config
    }
}

/// An argument ending in its only `=` would read as an empty key/value pair.
fn escape_argument(arg: &str) -> String {
    match arg.strip_suffix('=') {
        Some(head) if !head.contains('=') => format!("{head}\\="),
        _ => arg.to_string(),
    }
}

fn unescape_argument(line: &str) -> String {
    match line.strip_suffix("\\=") {
        Some(head) if !head.contains('=') => format!("{head}="),
        _ => line.to_string(),
    }
}

/// Escapes `\` and `=` in a user option key.
fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('=', "\\=")
}

/// Splits at the first unescaped `=`, unescaping the key.
fn split_escaped(line: &str) -> Option<(String, &str)> {
    let mut key = String::new();
    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => key.push(escaped),
                None => key.push('\\'),
            },
            '=' => return Some((key, &line[i + 1..])),
            c => key.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{params::ParamValue, platform::Platform};
    use std::{collections::BTreeMap, path::Path};

    fn store() -> ParamStore {
        let mut store = ParamStore::standard();
        store.supply(&standard::MAIN_CLASS, "com.example.Main").unwrap();
        store.supply(&standard::JVM_OPTIONS, "-Xmx512m").unwrap();
        store.supply(&standard::JVM_PROPERTIES, "app.mode=prod").unwrap();
        store.supply(&standard::ARGUMENTS, "--profile= --name=x").unwrap();
        store.set_raw(
            standard::USER_JVM_OPTIONS.id,
            ParamValue::Map(BTreeMap::from([(
                "-Dcolor=blue".to_string(),
                "-Dcolor=green".to_string(),
            )])),
        );
        store
    }

    #[test]
    fn test_user_option_key_round_trips() {
        let layout = ImageLayout::new(Platform::Linux, Path::new("/out"), "Main");
        let config = LaunchConfig::from_store(&mut store(), &layout).unwrap();
        let text = config.render();
        assert!(text.contains("-Dcolor\\=blue=-Dcolor=green\n"));

        let read = LaunchConfig::parse(&text);
        assert_eq!(
            read.user_options,
            vec![("-Dcolor=blue".to_string(), "-Dcolor=green".to_string())]
        );
        assert_eq!(read, config);
    }

    #[test]
    fn test_user_option_key_with_backslash_round_trips() {
        let config = LaunchConfig {
            user_options: vec![
                ("-Dpath=C:\\".to_string(), "-Dpath=D:\\".to_string()),
                ("k\\".to_string(), "v".to_string()),
            ],
            ..LaunchConfig::default()
        };
        let text = config.render();
        assert!(text.contains("k\\\\=v\n"));
        assert!(text.contains("-Dpath\\=C:\\\\=-Dpath=D:\\\n"));
        assert_eq!(LaunchConfig::parse(&text).user_options, config.user_options);
    }

    #[test]
    fn test_sections_and_escaped_argument() {
        let layout = ImageLayout::new(Platform::Linux, Path::new("/out"), "Main");
        let config = LaunchConfig::from_store(&mut store(), &layout).unwrap();
        assert_eq!(config.get("app.name"), Some("Main"));
        assert_eq!(config.get("app.mainclass"), Some("com/example/Main"));
        assert_eq!(config.get("app.runtime"), Some("$APPDIR/runtime"));
        assert_eq!(config.get("app.application.instance"), Some("multiple"));
        assert_eq!(config.jvm_options, vec!["-Xmx512m", "-Dapp.mode=prod"]);

        let text = config.render();
        assert!(text.contains("[ArgOptions]\n--profile\\=\n--name=x\n"));
    }

    #[test]
    fn test_main_module_replaces_jar_and_class() {
        let layout = ImageLayout::new(Platform::Linux, Path::new("/out"), "app");
        let mut store = ParamStore::standard();
        store.supply_raw("module", "com.example/com.example.Main").unwrap();
        let config = LaunchConfig::from_store(&mut store, &layout).unwrap();
        assert_eq!(config.get("app.mainmodule"), Some("com.example/com.example.Main"));
        assert_eq!(config.get("app.mainclass"), None);
    }
}
