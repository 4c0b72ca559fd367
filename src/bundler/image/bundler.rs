use super::builder::ImageBuilder;
use crate::bundler::{
    bundle::{BundleType, Bundler, Invocation, ensure_host},
    error::{Error, Result},
    modules::RuntimeImageAssembler,
    params::{ParamInfo, ParamStore, standard},
    platform::Platform,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Produces the application image for one platform.
#[derive(Debug, Clone)]
pub struct AppImageBundler {
    id: &'static str,
    platform: Platform,
    assembler: Arc<dyn RuntimeImageAssembler>,
}

impl AppImageBundler {
    pub fn linux(assembler: Arc<dyn RuntimeImageAssembler>) -> Self {
        Self {
            id: "linux.app",
            platform: Platform::Linux,
            assembler,
        }
    }

    pub fn macos(assembler: Arc<dyn RuntimeImageAssembler>) -> Self {
        Self {
            id: "mac.app",
            platform: Platform::MacOs,
            assembler,
        }
    }

    pub fn windows(assembler: Arc<dyn RuntimeImageAssembler>) -> Self {
        Self {
            id: "windows.app",
            platform: Platform::Windows,
            assembler,
        }
    }

    fn check_file(path: Option<PathBuf>, what: &str, id: &str) -> Result<()> {
        match path {
            Some(path) if !path.is_file() => Err(Error::config_with_advice(
                format!("The {what} {} does not exist.", path.display()),
                format!("Point `{id}` at an existing file."),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Bundler for AppImageBundler {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        "App Image"
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Image
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        standard::all()
    }

    async fn validate(&self, store: &mut ParamStore) -> Result<()> {
        ensure_host(self)?;
        standard::validate_image_params(store)?;

        let launcher = store.fetch(&standard::LAUNCHER)?;
        if self.platform == Platform::Windows && launcher.is_none() {
            return Err(Error::config_with_advice(
                "A native launcher is required for Windows images.",
                format!("Set `{}` to the launcher executable.", standard::LAUNCHER.id),
            ));
        }
        Self::check_file(launcher, "launcher", standard::LAUNCHER.id)?;
        Self::check_file(store.fetch(&standard::ICON)?, "icon", standard::ICON.id)?;
        self.assembler.check_available()
    }

    async fn execute(
        &self,
        store: &mut ParamStore,
        output_dir: &Path,
        invocation: Invocation,
    ) -> Result<Option<PathBuf>> {
        invocation.announce(&format!("Creating app image in {}", output_dir.display()));
        let layout = ImageBuilder::new(self.platform, self.assembler.as_ref())
            .build(store, output_dir)
            .await?;
        Ok(Some(layout.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        error::ErrorKind,
        image::builder::tests::{FakeAssembler, demo_store},
    };

    fn host_bundler() -> AppImageBundler {
        let assembler: Arc<dyn RuntimeImageAssembler> = Arc::new(FakeAssembler::default());
        match Platform::current() {
            Platform::MacOs => AppImageBundler::macos(assembler),
            Platform::Windows => AppImageBundler::windows(assembler),
            _ => AppImageBundler::linux(assembler),
        }
    }

    #[tokio::test]
    async fn test_validate_requires_entry_point() {
        let bundler = host_bundler();
        let mut store = ParamStore::standard();
        let err = bundler.validate(&mut store).await.unwrap_err();
        if Platform::current() == bundler.platform() {
            assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
            assert!(err.advice().unwrap().contains("main jar"));
        }
    }

    #[tokio::test]
    async fn test_missing_icon_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let bundler = AppImageBundler::linux(Arc::new(FakeAssembler::default()));
        if Platform::current() != Platform::Linux {
            return;
        }
        let mut store = demo_store(dir.path());
        store.set(&standard::ICON, Some(dir.path().join("missing.png")));
        let err = bundler.validate(&mut store).await.unwrap_err();
        assert!(err.to_string().contains("icon"));
    }

    #[tokio::test]
    async fn test_execute_returns_image_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let bundler = AppImageBundler::linux(Arc::new(FakeAssembler::default()));
        let mut store = demo_store(dir.path());
        let root = bundler
            .execute(&mut store, &dir.path().join("images"), Invocation::TopLevel)
            .await
            .unwrap();
        assert_eq!(root, Some(dir.path().join("images/Demo")));
    }
}
