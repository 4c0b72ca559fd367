//! Launcher placed at the top of an application image.

use super::layout::ImageLayout;
use crate::bundler::{
    error::{Error, Result},
    params::{ParamStore, standard},
    platform::Platform,
    resources::{ResourceRequest, preprocess_text_resource},
    utils::fs,
};
use std::{collections::BTreeMap, path::PathBuf};

/// Quotes a word for a POSIX shell.
fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c))
    {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

fn shell_join<'a>(words: impl IntoIterator<Item = &'a String>) -> String {
    words
        .into_iter()
        .map(|w| shell_quote(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// What the runtime is told to start: a module or a class on the class path.
fn launch_target(store: &mut ParamStore, layout: &ImageLayout) -> Result<Vec<String>> {
    if let Some(module) = store.fetch(&standard::MODULE)? {
        return Ok(vec!["-m".to_string(), module]);
    }
    let class = store.fetch(&standard::MAIN_CLASS)?.ok_or_else(|| {
        Error::config_with_advice(
            "Main class could not be determined.",
            "Set `applicationClass` or a main jar whose manifest names one.",
        )
    })?;
    let mut classpath: Vec<String> = Vec::new();
    if let Some(jar) = store.fetch(&standard::MAIN_JAR)? {
        classpath.extend(jar.files().iter().map(|f| f.to_string_lossy().into_owned()));
    }
    classpath.extend(
        store
            .fetch(&standard::CLASSPATH)?
            .split_whitespace()
            .map(str::to_string),
    );
    let mut target = Vec::new();
    if !classpath.is_empty() {
        let sep = if layout.platform == Platform::Windows { ";" } else { ":" };
        target.push("-cp".to_string());
        target.push(classpath.join(sep));
    }
    target.push(class);
    Ok(target)
}

/// Script text of a generated POSIX launcher.
pub fn render_script(store: &mut ParamStore, layout: &ImageLayout) -> Result<String> {
    let mut jvm = store.fetch(&standard::JVM_OPTIONS)?;
    for (key, value) in store.fetch(&standard::JVM_PROPERTIES)? {
        jvm.push(format!("-D{key}={value}"));
    }
    // The user options' defaults; users edit the .cfg to change them.
    jvm.extend(store.fetch(&standard::USER_JVM_OPTIONS)?.into_values());

    let target = launch_target(store, layout)?;
    let arguments = store.fetch(&standard::ARGUMENTS)?;
    let name = store.fetch(&standard::APP_NAME)?.unwrap_or_default();

    let data = BTreeMap::from([
        ("APPLICATION_NAME".to_string(), name),
        ("LAUNCHER_APP_DIR".to_string(), layout.app_rel.to_string()),
        ("LAUNCHER_RUNTIME_DIR".to_string(), layout.runtime_rel.to_string()),
        ("LAUNCHER_JVM_OPTIONS".to_string(), shell_join(&jvm)),
        ("LAUNCHER_TARGET".to_string(), shell_join(&target)),
        ("LAUNCHER_ARGUMENTS".to_string(), shell_join(&arguments)),
    ]);
    let drop_in = store.fetch(&standard::DROP_IN_RESOURCES_ROOT)?;
    let request = ResourceRequest::new("launcher.sh", "launcher script", "launcher.sh")
        .with_drop_in_root(Some(&drop_in));
    preprocess_text_resource(&request, &data)
}

/// Writes the launcher for the application described by `store`.
///
/// An explicit `launcher` executable is copied; otherwise a shell launcher
/// is generated, which Windows cannot run.
pub async fn write_launcher(
    store: &mut ParamStore,
    layout: &ImageLayout,
    fs_name: &str,
) -> Result<PathBuf> {
    let dest = layout.launcher_path(fs_name);
    match store.fetch(&standard::LAUNCHER)? {
        Some(launcher) => fs::copy_file(&launcher, &dest).await?,
        None if layout.platform == Platform::Windows => {
            return Err(Error::config_with_advice(
                "A native launcher is required for Windows images.",
                "Set `launcher` to the launcher executable.",
            ));
        }
        None => {
            let script = render_script(store, layout)?;
            fs::write_file(&dest, script).await?;
        }
    }
    fs::set_executable(&dest).await?;
    log::debug!("Launcher written to {}", dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_quoting() {
        assert_eq!(shell_quote("-Xmx512m"), "-Xmx512m");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_script_for_class_path_application() {
        let mut store = ParamStore::standard();
        store.supply(&standard::MAIN_CLASS, "com.example.Main").unwrap();
        store.supply(&standard::MAIN_JAR, "/src/demo.jar").unwrap();
        store.supply(&standard::JVM_OPTIONS, "-Xmx1g").unwrap();
        store.supply(&standard::ARGUMENTS, "\"hello world\"").unwrap();
        let layout = ImageLayout::new(Platform::Linux, Path::new("/out"), "Main");

        let script = render_script(&mut store, &layout).unwrap();
        assert!(script.starts_with("#!/bin/sh\n# Main launcher\n"));
        assert!(script.contains(
            "\"$APPDIR/runtime/bin/java\" -Xmx1g -cp demo.jar com.example.Main 'hello world' \"$@\""
        ));
        assert!(script.contains("cd \"$APPDIR/app\""));
    }

    #[tokio::test]
    async fn test_windows_requires_launcher() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = ParamStore::standard();
        store.supply(&standard::MAIN_CLASS, "a.Main").unwrap();
        let layout = ImageLayout::new(Platform::Windows, dir.path(), "Main");
        let err = write_launcher(&mut store, &layout, "Main").await.unwrap_err();
        assert!(err.advice().unwrap().contains("launcher"));
    }
}
