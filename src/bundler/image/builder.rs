//! Assembles an application image: runtime, resources, launchers and
//! launch configuration.

use super::{config::LaunchConfig, info_plist, launcher, layout::ImageLayout};
use crate::bundler::{
    error::{Context, Result},
    modules::{RuntimeImageAssembler, RuntimeImageRequest, resolve_modules},
    params::{ParamStore, standard},
    platform::{Arch, Platform},
    utils::fs,
};
use std::path::Path;

/// Builds application images for one platform.
#[derive(Debug)]
pub struct ImageBuilder<'a> {
    platform: Platform,
    assembler: &'a dyn RuntimeImageAssembler,
}

impl<'a> ImageBuilder<'a> {
    pub fn new(platform: Platform, assembler: &'a dyn RuntimeImageAssembler) -> Self {
        Self {
            platform,
            assembler,
        }
    }

    /// Layout the image for `store` will have under `images_root`.
    pub fn layout(&self, store: &mut ParamStore, images_root: &Path) -> Result<ImageLayout> {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        Ok(ImageLayout::new(self.platform, images_root, &fs_name))
    }

    /// Builds the image under `images_root`, replacing any previous one.
    pub async fn build(&self, store: &mut ParamStore, images_root: &Path) -> Result<ImageLayout> {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        let layout = ImageLayout::new(self.platform, images_root, &fs_name);

        fs::create_dir_all(&layout.root, true).await?;
        fs::create_dir_all(&layout.launcher_dir, false).await?;
        fs::create_dir_all(&layout.app_dir, false).await?;

        let selection = resolve_modules(store, self.platform)?;
        let request =
            RuntimeImageRequest::from_store(store, &selection, layout.runtime_dir.clone())?;
        self.assembler.assemble(&request).await?;
        log::info!("✓ Runtime assembled in {}", layout.runtime_dir.display());

        self.copy_resources(store, &layout).await?;
        self.write_launch_files(store, &layout, &fs_name).await?;

        for secondary in store.fetch(&standard::SECONDARY_LAUNCHERS)? {
            let mut launcher_store = secondary.store_for(store)?;
            let name = launcher_store
                .fetch(&standard::APP_FS_NAME)?
                .context("secondary launcher has no name")?;
            self.write_launch_files(&mut launcher_store, &layout, &name).await?;
            log::debug!("Secondary launcher {} added", name);
        }

        if let Some(icon) = store.fetch(&standard::ICON)? {
            fs::copy_file(&icon, &layout.icon_path(&fs_name)).await?;
        }
        if self.platform == Platform::MacOs {
            info_plist::write_bundle_metadata(store, &layout, &fs_name).await?;
        }

        log::info!("✓ Application image created at {}", layout.root.display());
        Ok(layout)
    }

    async fn copy_resources(&self, store: &mut ParamStore, layout: &ImageLayout) -> Result<()> {
        let arch = Arch::current();
        for set in store.fetch(&standard::APP_RESOURCES_LIST)? {
            if !set.applies_to(Platform::current(), arch.as_str()) {
                log::debug!(
                    "Skipping resources from {} (not for this host)",
                    set.base_dir().display()
                );
                continue;
            }
            set.copy_to(&layout.app_dir).await?;
        }
        Ok(())
    }

    async fn write_launch_files(
        &self,
        store: &mut ParamStore,
        layout: &ImageLayout,
        fs_name: &str,
    ) -> Result<()> {
        launcher::write_launcher(store, layout, fs_name).await?;
        let config = LaunchConfig::from_store(store, layout)?;
        fs::write_file(&layout.config_path(fs_name), config.render()).await
    }
}
