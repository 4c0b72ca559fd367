//! The bundler lifecycle: validate, execute, clean up.
//!
//! Installer bundlers hold the image bundler they package and run it as a
//! [`Invocation::Dependent`] step instead of assembling images themselves.

use crate::bundler::{
    error::{Context, Error, Result},
    image::ImageLayout,
    params::{ParamInfo, ParamStore, standard},
    platform::Platform,
    utils::fs,
};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Kind of artifact a bundler produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    /// Self-contained application directory.
    Image,
    /// Installer or service wrapper built on top of an image.
    Installer,
}

impl fmt::Display for BundleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Image => "image",
            Self::Installer => "installer",
        })
    }
}

/// Whether `execute` was requested by the driver or by another bundler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Invocation {
    TopLevel,
    /// Run on behalf of an installer; progress is logged at debug level.
    Dependent,
}

impl Invocation {
    pub(crate) fn announce(self, message: &str) {
        match self {
            Self::TopLevel => log::info!("{message}"),
            Self::Dependent => log::debug!("{message}"),
        }
    }
}

/// A named unit producing one kind of artifact.
///
/// Bundlers keep no state between runs; everything lives in the store.
#[async_trait::async_trait]
pub trait Bundler: Send + Sync + fmt::Debug {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn bundle_type(&self) -> BundleType;

    /// Platform the artifact targets; bundlers only run on that host.
    fn platform(&self) -> Platform;

    /// Descriptors this bundler understands beyond the standard set.
    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        Vec::new()
    }

    /// Checks that the store describes something this bundler can produce.
    ///
    /// Fails with `PlatformUnsupported` on a foreign host and with
    /// `ConfigurationInvalid` when parameters are missing or contradictory.
    async fn validate(&self, store: &mut ParamStore) -> Result<()>;

    /// Produces the artifact under `output_dir`. `None` means nothing was
    /// produced, which the driver counts as a failure.
    async fn execute(
        &self,
        store: &mut ParamStore,
        output_dir: &Path,
        invocation: Invocation,
    ) -> Result<Option<PathBuf>>;

    /// Removes this bundler's private build tree.
    async fn cleanup(&self, store: &mut ParamStore) -> Result<()> {
        remove_private_root(store, self.id()).await
    }
}

/// Fails unless the host is the bundler's target platform.
pub fn ensure_host(bundler: &dyn Bundler) -> Result<()> {
    let host = Platform::current();
    if bundler.platform() == host {
        Ok(())
    } else {
        Err(Error::PlatformUnsupported {
            bundler: bundler.id().to_string(),
            platform: host.to_string(),
        })
    }
}

/// `<buildRoot>/<id>`: scratch space owned by one bundler.
pub fn private_root(store: &mut ParamStore, id: &str) -> Result<PathBuf> {
    Ok(store.fetch(&standard::BUILD_ROOT)?.join(id))
}

/// Deletes `<buildRoot>/<id>` unless the run is verbose.
pub async fn remove_private_root(store: &mut ParamStore, id: &str) -> Result<()> {
    let Some(build_root) = store.get(&standard::BUILD_ROOT)? else {
        return Ok(());
    };
    let root = build_root.join(id);
    if store.fetch(&standard::VERBOSE)? {
        log::info!("Keeping build files in {}", root.display());
        return Ok(());
    }
    fs::remove_dir_all(&root).await
}

/// Validation of an installer's image input.
///
/// A predefined image must exist and the identity it is packaged under must
/// be known; otherwise the image bundler validates as usual.
pub async fn validate_image_input(image: &dyn Bundler, store: &mut ParamStore) -> Result<()> {
    let Some(predefined) = store.fetch(&standard::PREDEFINED_APP_IMAGE)? else {
        return image.validate(store).await;
    };
    if !predefined.exists() {
        return Err(Error::config_with_advice(
            format!(
                "Specified app image directory {} does not exist.",
                predefined.display()
            ),
            format!(
                "Confirm that the value for {} exists.",
                standard::PREDEFINED_APP_IMAGE.id
            ),
        ));
    }
    if store.fetch(&standard::APP_NAME)?.is_none() {
        return Err(Error::config_with_advice(
            "Application name is required when packaging a predefined image.",
            format!("Set `{}`.", standard::APP_NAME.id),
        ));
    }
    if store.fetch(&standard::IDENTIFIER)?.is_none() {
        return Err(Error::config_with_advice(
            "Application identifier is required when packaging a predefined image.",
            format!("Set `{}`.", standard::IDENTIFIER.id),
        ));
    }
    Ok(())
}

/// Puts an application image into `images_root` and returns its root.
///
/// A predefined image is copied to the root a built image would have, named
/// after the application; otherwise the image bundler runs as a dependent
/// task.
pub async fn prepare_image(
    image: &Arc<dyn Bundler>,
    store: &mut ParamStore,
    images_root: &Path,
) -> Result<PathBuf> {
    if let Some(predefined) = store.fetch(&standard::PREDEFINED_APP_IMAGE)? {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        let dest = ImageLayout::new(image.platform(), images_root, &fs_name).root;
        log::info!(
            "Using predefined app image {} as {}",
            predefined.display(),
            dest.display()
        );
        fs::copy_dir(&predefined, &dest).await?;
        return Ok(dest);
    }
    image
        .execute(store, images_root, Invocation::Dependent)
        .await?
        .ok_or_else(|| Error::GenericError(format!("{} produced no application image", image.id())))
}

/// Which bundlers a run asks for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BundleRequest {
    Nothing,
    All,
    Type(BundleType),
    /// A single bundler by id.
    Id(String),
}

impl BundleRequest {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "false" => Self::Nothing,
            "all" | "true" => Self::All,
            "image" => Self::Type(BundleType::Image),
            "native" | "installer" => Self::Type(BundleType::Installer),
            _ => Self::Id(raw.trim().to_string()),
        }
    }

    pub fn matches(&self, bundler: &dyn Bundler) -> bool {
        match self {
            Self::Nothing => false,
            Self::All => true,
            Self::Type(kind) => bundler.bundle_type() == *kind,
            Self::Id(id) => bundler.id() == id,
        }
    }
}

impl Default for BundleRequest {
    fn default() -> Self {
        Self::Type(BundleType::Installer)
    }
}
