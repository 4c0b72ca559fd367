//! Drag-to-install disk image (`.dmg`) around the macOS application bundle.
//!
//! The volume holds `<fs>.app` next to an `Applications` link. `hdiutil`
//! builds a read-write image from the staging folder, then compresses it into
//! `<output>/<installer name><suffix>.dmg`.

use crate::bundler::{
    bundle::{
        BundleType, Bundler, Invocation, ensure_host, prepare_image, private_root,
        validate_image_input,
    },
    error::{Context, Error, ErrorExt, Result},
    params::{ParamDescriptor, ParamInfo, ParamStore, ValueType, standard},
    platform::Platform,
    tools::{ToolCommand, ToolRunner},
    utils::fs,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

const TOOL_HDIUTIL: &str = "hdiutil";

pub static INSTALLER_NAME: ParamDescriptor<String> = ParamDescriptor {
    id: "mac.installerName",
    name: "Installer name",
    description: "File name of the installer without extension. Defaults to `<name>-<version>`.",
    value_type: ValueType::String,
    deriver: |store| {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        Ok(format!("{fs_name}-{}", store.fetch(&standard::VERSION)?))
    },
    parser: None,
};

pub static INSTALLER_SUFFIX: ParamDescriptor<String> = ParamDescriptor {
    id: "mac.dmg.installerName.suffix",
    name: "Installer suffix",
    description: "Appended to the installer name, before `.dmg`.",
    value_type: ValueType::String,
    deriver: |_| Ok(String::new()),
    parser: None,
};

pub static STAGING_DIR: ParamDescriptor<PathBuf> = ParamDescriptor {
    id: "mac.dmg.stagingDir",
    name: "Volume contents",
    description: "Folder whose contents become the disk image volume.",
    value_type: ValueType::Path,
    deriver: |store| Ok(private_root(store, DmgBundler::ID)?.join("volume")),
    parser: None,
};

#[derive(Debug, Clone)]
pub struct DmgBundler {
    image: Arc<dyn Bundler>,
    runner: Arc<dyn ToolRunner>,
}

impl DmgBundler {
    pub const ID: &'static str = "mac.dmg";

    pub fn new(image: Arc<dyn Bundler>, runner: Arc<dyn ToolRunner>) -> Self {
        Self { image, runner }
    }

    /// `<output>/<installer name><suffix>.dmg`
    pub fn output_file(store: &mut ParamStore, output_dir: &Path) -> Result<PathBuf> {
        Ok(output_dir.join(format!(
            "{}{}.dmg",
            store.fetch(&INSTALLER_NAME)?,
            store.fetch(&INSTALLER_SUFFIX)?
        )))
    }

    async fn stage_volume(&self, store: &mut ParamStore) -> Result<PathBuf> {
        let staging = store.fetch(&STAGING_DIR)?;
        fs::create_dir_all(&staging, true).await?;
        prepare_image(&self.image, store, &staging).await?;
        #[cfg(unix)]
        {
            let link = staging.join("Applications");
            std::os::unix::fs::symlink("/Applications", &link)
                .fs_context("creating Applications symlink", &link)?;
        }
        Ok(staging)
    }

    async fn build_dmg(
        &self,
        store: &mut ParamStore,
        staging: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        let proto = private_root(store, Self::ID)?.join(format!("{fs_name}-tmp.dmg"));
        let out_file = Self::output_file(store, output_dir)?;
        fs::create_dir_all(output_dir, false).await?;
        if out_file.exists() {
            tokio::fs::remove_file(&out_file)
                .await
                .fs_context("removing previous disk image", &out_file)?;
        }
        log::debug!("Creating DMG file: {}", out_file.display());

        self.runner
            .run(
                &ToolCommand::new(TOOL_HDIUTIL)
                    .arg("create")
                    .arg(proto.to_string_lossy())
                    .arg("-srcfolder")
                    .arg(staging.to_string_lossy())
                    .args(["-volname", fs_name.as_str(), "-ov", "-fs", "HFS+J", "-format", "UDRW"]),
            )
            .await?;
        self.runner
            .run(
                &ToolCommand::new(TOOL_HDIUTIL)
                    .arg("convert")
                    .arg(proto.to_string_lossy())
                    .args(["-format", "UDZO", "-o"])
                    .arg(out_file.to_string_lossy()),
            )
            .await?;
        log::info!("✓ Disk image (.dmg) saved to: {}", out_file.display());
        Ok(out_file)
    }
}

#[async_trait::async_trait]
impl Bundler for DmgBundler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "DMG Installer"
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        let mut params = self.image.params();
        params.extend([
            &INSTALLER_NAME as &'static dyn ParamInfo,
            &INSTALLER_SUFFIX,
            &STAGING_DIR,
        ]);
        params
    }

    async fn validate(&self, store: &mut ParamStore) -> Result<()> {
        ensure_host(self)?;
        validate_image_input(self.image.as_ref(), store).await?;
        if self.runner.probe(TOOL_HDIUTIL).is_none() {
            return Err(Error::config_with_advice(
                format!("Can not find {TOOL_HDIUTIL}."),
                "Install the Xcode command line tools.",
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
        invocation.announce(&format!(
            "Building DMG package for {}",
            store.fetch(&standard::APP_NAME)?.unwrap_or_default()
        ));
        let staging = self.stage_volume(store).await?;
        Ok(Some(self.build_dmg(store, &staging, output_dir).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        bundle::tests::MockBundler, error::ErrorKind, image::ImageLayout,
        tools::tests::RecordingRunner,
    };

    fn store(root: &Path) -> ParamStore {
        let predefined = root.join("Prebuilt.app");
        std::fs::create_dir_all(predefined.join("Contents/MacOS")).unwrap();
        std::fs::write(predefined.join("Contents/MacOS/Demo"), b"#!/bin/sh\n").unwrap();
        let mut store = ParamStore::standard();
        store.set(&standard::BUILD_ROOT, root.join("build"));
        store.set(&standard::APP_NAME, Some("Demo".into()));
        store.set(&standard::IDENTIFIER, Some("com.example".into()));
        store.set(&standard::VERSION, "3.0".into());
        store.set(&standard::PREDEFINED_APP_IMAGE, Some(predefined));
        store
    }

    #[test]
    fn test_installer_file_name() {
        let mut store = store(tempfile::TempDir::new().unwrap().path());
        assert_eq!(
            DmgBundler::output_file(&mut store, Path::new("/out")).unwrap(),
            Path::new("/out/Demo-3.0.dmg")
        );
        store.set(&INSTALLER_SUFFIX, "-beta".into());
        assert_eq!(
            DmgBundler::output_file(&mut store, Path::new("/out")).unwrap(),
            Path::new("/out/Demo-3.0-beta.dmg")
        );
    }

    #[tokio::test]
    async fn test_volume_and_hdiutil_invocations() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = RecordingRunner::with_tools(&[TOOL_HDIUTIL]);
        let image = Arc::new(MockBundler::new("mac.app", BundleType::Image));
        let bundler = DmgBundler::new(image.clone(), runner.clone());
        let mut store = store(dir.path());

        let out = dir.path().join("out");
        let artifact = bundler
            .execute(&mut store, &out, Invocation::TopLevel)
            .await
            .unwrap();
        assert_eq!(artifact, Some(out.join("Demo-3.0.dmg")));
        assert_eq!(image.executions(), 0);

        let volume = dir.path().join("build/mac.dmg/volume");
        let app = ImageLayout::new(Platform::current(), &volume, "Demo").root;
        assert!(app.join("Contents/MacOS/Demo").is_file());
        #[cfg(unix)]
        assert_eq!(
            std::fs::read_link(volume.join("Applications")).unwrap(),
            Path::new("/Applications")
        );

        let commands = runner.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].args[0], "create");
        assert!(commands[0].args.contains(&"UDRW".to_string()));
        assert!(commands[0].args.contains(&volume.display().to_string()));
        assert_eq!(commands[1].args[0], "convert");
        assert_eq!(
            commands[1].args.last().unwrap(),
            &out.join("Demo-3.0.dmg").display().to_string()
        );
    }

    #[tokio::test]
    async fn test_missing_hdiutil_is_a_configuration_problem() {
        if Platform::current() != Platform::MacOs {
            return;
        }
        let dir = tempfile::TempDir::new().unwrap();
        let image = Arc::new(MockBundler::new("mac.app", BundleType::Image));
        let bundler = DmgBundler::new(image, RecordingRunner::with_tools(&[]));
        let err = bundler.validate(&mut store(dir.path())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
        assert!(err.to_string().contains("hdiutil"));
    }
}
