//! launchd daemon component.
//!
//! Produces `<output>/<name>.daemon/Library/LaunchDaemons/<id>.launchd.plist`,
//! pointing launchd at the launcher of the installed `.app`.

use crate::bundler::{
    bundle::{BundleType, Bundler, Invocation, ensure_host},
    error::{Context, Error, Result},
    params::{ParamInfo, ParamStore, standard},
    platform::Platform,
    utils::fs,
};
use plist::{Dictionary, Value};
use std::path::{Path, PathBuf};

/// Writes launchd configuration for an application installed in
/// `/Applications`.
#[derive(Debug, Clone, Default)]
pub struct DaemonBundler;

impl DaemonBundler {
    pub const ID: &'static str = "mac.daemon";

    pub fn new() -> Self {
        Self
    }

    fn identifier(store: &mut ParamStore) -> Result<String> {
        store
            .fetch(&standard::IDENTIFIER)?
            .map(|id| id.to_lowercase())
            .context("application identifier is not set")
    }

    /// The launchd job description.
    pub fn launchd_plist(store: &mut ParamStore) -> Result<Dictionary> {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        let label = format!("{}.daemon", Self::identifier(store)?);
        let program = format!("/Applications/{fs_name}.app/Contents/MacOS/{fs_name}");

        let mut dict = Dictionary::new();
        dict.insert("Label".into(), Value::String(label));
        dict.insert(
            "ProgramArguments".into(),
            Value::Array(vec![Value::String(program)]),
        );
        dict.insert(
            "RunAtLoad".into(),
            Value::Boolean(store.fetch(&standard::START_ON_INSTALL)?),
        );
        dict.insert(
            "KeepAlive".into(),
            Value::Boolean(store.fetch(&standard::RUN_AT_STARTUP)?),
        );
        Ok(dict)
    }
}

#[async_trait::async_trait]
impl Bundler for DaemonBundler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "Mac Daemon Component"
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        vec![
            &standard::APP_NAME,
            &standard::BUILD_ROOT,
            &standard::IDENTIFIER,
            &standard::START_ON_INSTALL,
            &standard::RUN_AT_STARTUP,
        ]
    }

    async fn validate(&self, store: &mut ParamStore) -> Result<()> {
        ensure_host(self)?;
        if store.fetch(&standard::SYSTEM_WIDE)? == Some(false) {
            return Err(Error::config_with_advice(
                "Bundler doesn't support per-user daemons.",
                "Make sure that the system wide hint is set to true.",
            ));
        }
        if store.fetch(&standard::IDENTIFIER)?.is_none() {
            return Err(Error::config_with_advice(
                "Daemon identifier could not be determined.",
                format!("Set `{}`.", standard::IDENTIFIER.id),
            ));
        }
        Ok(())
    }

    async fn execute(
        &self,
        store: &mut ParamStore,
        output_dir: &Path,
        invocation: Invocation,
    ) -> Result<Option<PathBuf>> {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        let root = output_dir.join(format!("{fs_name}.daemon"));
        fs::create_dir_all(&root, true).await?;
        invocation.announce(&format!("Creating daemon component: {}", root.display()));

        let plist = Self::launchd_plist(store)?;
        let mut xml = Vec::new();
        Value::Dictionary(plist).to_writer_xml(&mut xml)?;
        let target = root
            .join("Library/LaunchDaemons")
            .join(format!("{}.launchd.plist", Self::identifier(store)?));
        fs::write_file(&target, xml).await?;
        log::debug!("launchd configuration written to {}", target.display());
        Ok(Some(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParamStore {
        let mut store = ParamStore::standard();
        store.supply(&standard::MAIN_CLASS, "com.Example.Server").unwrap();
        store.set(&standard::START_ON_INSTALL, true);
        store
    }

    #[test]
    fn test_launchd_job() {
        let dict = DaemonBundler::launchd_plist(&mut store()).unwrap();
        assert_eq!(
            dict.get("Label").and_then(Value::as_string),
            Some("com.example.daemon")
        );
        let args = dict.get("ProgramArguments").and_then(Value::as_array).unwrap();
        assert_eq!(
            args[0].as_string(),
            Some("/Applications/Server.app/Contents/MacOS/Server")
        );
        assert_eq!(dict.get("RunAtLoad").and_then(Value::as_boolean), Some(true));
        assert_eq!(dict.get("KeepAlive").and_then(Value::as_boolean), Some(false));
    }

    #[tokio::test]
    async fn test_component_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = DaemonBundler::new()
            .execute(&mut store(), dir.path(), Invocation::TopLevel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root, dir.path().join("Server.daemon"));
        let plist = root.join("Library/LaunchDaemons/com.example.launchd.plist");
        let value = Value::from_file(plist).unwrap();
        assert!(value.as_dictionary().unwrap().contains_key("Label"));
    }

    #[tokio::test]
    async fn test_per_user_daemon_rejected() {
        if Platform::current() != Platform::MacOs {
            return;
        }
        let mut store = store();
        store.set(&standard::SYSTEM_WIDE, Some(false));
        let err = DaemonBundler::new().validate(&mut store).await.unwrap_err();
        assert!(err.to_string().contains("per-user"));
    }
}
