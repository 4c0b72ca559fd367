//! Windows service wrapper: the application image plus a service launcher
//! (`<fs>Svc.exe`) that installs and runs it as a service.

use crate::bundler::{
    bundle::{BundleType, Bundler, Invocation, ensure_host, prepare_image, validate_image_input},
    error::{Context, Error, Result},
    params::{ParamDescriptor, ParamInfo, ParamStore, ValueType, standard},
    platform::Platform,
    utils::fs,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

pub static SERVICE_LAUNCHER: ParamDescriptor<Option<PathBuf>> = ParamDescriptor {
    id: "win.launcher.service",
    name: "Service launcher",
    description: "Executable copied into the image as `<name>Svc.exe`.",
    value_type: ValueType::Path,
    deriver: |_| Ok(None),
    parser: Some(|raw, _| Ok(Some(PathBuf::from(raw.trim())))),
};

#[derive(Debug, Clone)]
pub struct ServiceBundler {
    image: Arc<dyn Bundler>,
}

impl ServiceBundler {
    pub const ID: &'static str = "windows.service";

    pub fn new(image: Arc<dyn Bundler>) -> Self {
        Self { image }
    }

    /// File name of the service launcher for the application in `store`.
    pub fn service_file_name(store: &mut ParamStore) -> Result<String> {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        Ok(format!("{fs_name}Svc.exe"))
    }
}

#[async_trait::async_trait]
impl Bundler for ServiceBundler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "Windows Service Component"
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Image
    }

    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        let mut params = self.image.params();
        params.push(&SERVICE_LAUNCHER);
        params
    }

    async fn validate(&self, store: &mut ParamStore) -> Result<()> {
        ensure_host(self)?;
        validate_image_input(self.image.as_ref(), store).await?;
        match store.fetch(&SERVICE_LAUNCHER)? {
            Some(path) if path.is_file() => {}
            Some(path) => {
                return Err(Error::config_with_advice(
                    format!("Service launcher {} not found.", path.display()),
                    format!("Point `{}` at an existing executable.", SERVICE_LAUNCHER.id),
                ));
            }
            None => {
                return Err(Error::config_with_advice(
                    "No service launcher was supplied.",
                    format!("Set `{}` to the service launcher executable.", SERVICE_LAUNCHER.id),
                ));
            }
        }
        if store.fetch(&standard::SYSTEM_WIDE)? == Some(false) {
            return Err(Error::config_with_advice(
                "Bundler doesn't support per-user services.",
                "Make sure that the system wide hint is set to true.",
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
        let file_name = Self::service_file_name(store)?;
        invocation.announce(&format!(
            "Creating service bundle: {} in {}",
            file_name,
            output_dir.display()
        ));
        let launcher = store
            .fetch(&SERVICE_LAUNCHER)?
            .context("service launcher is not set")?;

        let root = prepare_image(&self.image, store, output_dir).await?;
        let target = root.join(&file_name);
        fs::copy_file(&launcher, &target).await?;
        fs::set_executable(&target).await?;
        invocation.announce(&format!("Result service bundle: {}", root.display()));
        Ok(Some(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::bundle::tests::MockBundler;

    #[tokio::test]
    async fn test_service_launcher_added_to_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let launcher = dir.path().join("WinLauncherSvc.exe");
        std::fs::write(&launcher, b"MZ").unwrap();
        let predefined = dir.path().join("Prebuilt");
        std::fs::create_dir_all(predefined.join("app")).unwrap();

        let image = Arc::new(MockBundler::new("windows.app", BundleType::Image));
        let bundler = ServiceBundler::new(image.clone());
        let mut store = ParamStore::standard();
        store.set(&standard::APP_NAME, Some("Demo".into()));
        store.set(&SERVICE_LAUNCHER, Some(launcher));
        store.set(&standard::PREDEFINED_APP_IMAGE, Some(predefined));

        let out = dir.path().join("out");
        let root = bundler
            .execute(&mut store, &out, Invocation::TopLevel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            root,
            crate::bundler::image::ImageLayout::new(Platform::current(), &out, "Demo").root
        );
        assert!(root.join("DemoSvc.exe").is_file());
        assert_eq!(image.executions(), 0);
    }

    #[tokio::test]
    async fn test_requires_service_launcher() {
        if Platform::current() != Platform::Windows {
            return;
        }
        let image = Arc::new(MockBundler::new("windows.app", BundleType::Image));
        let mut store = ParamStore::standard();
        store.supply(&standard::MAIN_CLASS, "com.example.Demo").unwrap();
        let err = ServiceBundler::new(image)
            .validate(&mut store)
            .await
            .unwrap_err();
        assert!(err.advice().unwrap().contains(SERVICE_LAUNCHER.id));
    }
}
