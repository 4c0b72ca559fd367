//! Debian package (`.deb`) built around the Linux application image.
//!
//! Package tree, under `<buildRoot>/deb`:
//!
//! ```text
//! <name>-<version>/
//! ├── DEBIAN/      control, maintainer scripts, copyright
//! └── opt/<fs>/    application image, .desktop entry, icon
//! ```
//!
//! `fakeroot dpkg-deb -b` turns the tree into `<output>/<name>-<version>.deb`.

use crate::bundler::{
    bundle::{
        BundleType, Bundler, Invocation, ensure_host, prepare_image, private_root,
        validate_image_input,
    },
    error::{Context, Error, Result},
    params::{ParamDescriptor, ParamInfo, ParamStore, ValueType, standard},
    platform::{Arch, Platform},
    resources::{ResourceRequest, preprocess_text_resource},
    tools::{ToolCommand, ToolRunner},
    utils::fs,
};
use regex::Regex;
use std::{
    collections::BTreeMap,
    fmt::Write as _,
    path::{Path, PathBuf},
    sync::Arc,
};

const TOOL_DPKG: &str = "dpkg-deb";
const TOOL_FAKEROOT: &str = "fakeroot";

/// Debian policy: lower case letters, digits, `+`, `-` and `.`; at least two
/// characters, starting with a letter.
const BUNDLE_NAME_PATTERN: &str = r"^[a-z][a-z\d\+\-\.]+$";

/// Longest package name init scripts accept.
const MAX_SERVICE_NAME: usize = 16;

fn check_bundle_name(name: &str) -> Result<()> {
    if Regex::new(BUNDLE_NAME_PATTERN)?.is_match(name) {
        return Ok(());
    }
    Err(Error::config_with_advice(
        format!("Invalid value \"{name}\" for the package name."),
        format!(
            "Set `{}` to a valid Debian package name: lower case letters, digits, \
             plus and minus signs and periods, at least two characters, starting \
             with a letter.",
            BUNDLE_NAME.id
        ),
    ))
}

pub static BUNDLE_NAME: ParamDescriptor<String> = ParamDescriptor {
    id: "linux.bundleName",
    name: "Package name",
    description: "Debian package name. Defaults to the lower-cased application name.",
    value_type: ValueType::String,
    deriver: |store| {
        let name = store.fetch(&standard::APP_NAME)?.unwrap_or_default();
        Ok(name.to_lowercase().replace([' ', '_'], "-"))
    },
    parser: Some(|raw, _| {
        check_bundle_name(raw)?;
        Ok(raw.to_string())
    }),
};

pub static FULL_PACKAGE_NAME: ParamDescriptor<String> = ParamDescriptor {
    id: "linux.deb.fullPackageName",
    name: "Full package name",
    description: "`<name>-<version>`; names the package tree and the output file.",
    value_type: ValueType::String,
    deriver: |store| {
        Ok(format!(
            "{}-{}",
            store.fetch(&BUNDLE_NAME)?,
            store.fetch(&standard::VERSION)?
        ))
    },
    parser: None,
};

pub static IMAGE_DIR: ParamDescriptor<PathBuf> = ParamDescriptor {
    id: "linux.deb.imageDir",
    name: "Package tree",
    description: "Directory handed to dpkg-deb.",
    value_type: ValueType::Path,
    deriver: |store| {
        let full = store.fetch(&FULL_PACKAGE_NAME)?;
        Ok(private_root(store, DebBundler::ID)?.join(full))
    },
    parser: None,
};

pub static IMAGE_ROOT: ParamDescriptor<PathBuf> = ParamDescriptor {
    id: "linux.deb.imageRoot",
    name: "Installed image parent",
    description: "Directory in the package tree the application image is placed in.",
    value_type: ValueType::Path,
    deriver: |store| Ok(store.fetch(&IMAGE_DIR)?.join("opt")),
    parser: None,
};

pub static CONFIG_DIR: ParamDescriptor<PathBuf> = ParamDescriptor {
    id: "linux.deb.configDir",
    name: "Control directory",
    description: "`DEBIAN` directory of the package tree.",
    value_type: ValueType::Path,
    deriver: |store| Ok(store.fetch(&IMAGE_DIR)?.join("DEBIAN")),
    parser: None,
};

pub static EMAIL: ParamDescriptor<String> = ParamDescriptor {
    id: "linux.deb.email",
    name: "Maintainer email",
    description: "Email address of the package maintainer.",
    value_type: ValueType::String,
    deriver: |_| Ok("Unknown".to_string()),
    parser: None,
};

pub static MAINTAINER: ParamDescriptor<String> = ParamDescriptor {
    id: "linux.deb.maintainer",
    name: "Maintainer",
    description: "`<vendor> <<email>>`",
    value_type: ValueType::String,
    deriver: |store| {
        Ok(format!(
            "{} <{}>",
            store.fetch(&standard::VENDOR)?,
            store.fetch(&EMAIL)?
        ))
    },
    parser: None,
};

pub static LICENSE_TEXT: ParamDescriptor<String> = ParamDescriptor {
    id: "linux.deb.licenseText",
    name: "License text",
    description: "Text of the first license file, or the license type.",
    value_type: ValueType::String,
    deriver: |store| {
        let licenses = store.fetch(&standard::LICENSE_FILE)?;
        if let Some(first) = licenses.first() {
            for set in store.fetch(&standard::APP_RESOURCES_LIST)? {
                if set.contains(first) {
                    let path = set.base_dir().join(first);
                    match std::fs::read_to_string(&path) {
                        Ok(text) => return Ok(text),
                        Err(e) => log::debug!("Cannot read {}: {}", path.display(), e),
                    }
                }
            }
        }
        store.fetch(&standard::LICENSE_TYPE)
    },
    parser: None,
};

pub static XDG_PREFIX: ParamDescriptor<String> = ParamDescriptor {
    id: "linux.deb.xdgPrefix",
    name: "XDG file prefix",
    description: "Prefix of the MIME info and desktop files. Defaults to `<vendor>-<fs name>`.",
    value_type: ValueType::String,
    deriver: |store| {
        let vendor = if store.is_overridden(&standard::VENDOR) {
            store.fetch(&standard::VENDOR)?
        } else {
            env!("CARGO_PKG_NAME").replace('_', "-")
        };
        let fs_name = store.fetch(&standard::APP_FS_NAME)?.unwrap_or_default();
        Ok(format!("{vendor}-{fs_name}")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect())
    },
    parser: None,
};

/// Builds `.deb` packages.
#[derive(Debug, Clone)]
pub struct DebBundler {
    image: Arc<dyn Bundler>,
    runner: Arc<dyn ToolRunner>,
}

impl DebBundler {
    pub const ID: &'static str = "deb";

    pub fn new(image: Arc<dyn Bundler>, runner: Arc<dyn ToolRunner>) -> Self {
        Self { image, runner }
    }

    fn check_tools(&self) -> Result<()> {
        for tool in [TOOL_DPKG, TOOL_FAKEROOT] {
            if self.runner.probe(tool).is_none() {
                return Err(Error::config_with_advice(
                    format!("Can not find {tool}."),
                    "Please install required packages.",
                ));
            }
        }
        Ok(())
    }

    fn check_licenses(store: &mut ParamStore) -> Result<()> {
        if !store.is_overridden(&standard::LICENSE_FILE) {
            log::info!(
                "Debian packages should specify a license. The absence of a license will cause \
                 some linux distributions to complain about the quality of the application."
            );
            return Ok(());
        }
        let resources = store.fetch(&standard::APP_RESOURCES_LIST)?;
        for license in store.fetch(&standard::LICENSE_FILE)? {
            if !resources.iter().any(|set| set.contains(&license)) {
                return Err(Error::config_with_advice(
                    "Specified license file is missing.",
                    format!(
                        "Make sure that \"{license}\" references a file in the app resources, \
                         relative to its base directory."
                    ),
                ));
            }
        }
        Ok(())
    }

    fn check_service(store: &mut ParamStore) -> Result<()> {
        if !store.fetch(&standard::SERVICE_HINT)? {
            return Ok(());
        }
        let name = store.fetch(&BUNDLE_NAME)?;
        if name.len() > MAX_SERVICE_NAME {
            return Err(Error::config_with_advice(
                format!("The bundle name \"{name}\" is too long for a daemon."),
                format!(
                    "Set `{}` to a name shorter than {MAX_SERVICE_NAME} characters.",
                    BUNDLE_NAME.id
                ),
            ));
        }
        if store.fetch(&standard::SYSTEM_WIDE)? == Some(false) {
            return Err(Error::config_with_advice(
                "Bundler doesn't support per-user daemons.",
                "Make sure that the system wide hint is set to true.",
            ));
        }
        Ok(())
    }

    fn check_associations(store: &mut ParamStore) -> Result<()> {
        for (i, association) in store.fetch(&standard::FILE_ASSOCIATIONS)?.iter().enumerate() {
            let problem = match association.mime_types.len() {
                1 => continue,
                0 => "No MIME types were",
                _ => "More than one MIME type was",
            };
            return Err(Error::config_with_advice(
                format!("{problem} specified for file association number {i}."),
                "For Linux bundling specify one and only one MIME type for each file association.",
            ));
        }
        Ok(())
    }

    fn render(
        store: &mut ParamStore,
        public_name: &str,
        category: &str,
        default_name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<String> {
        let drop_in = store.fetch(&standard::DROP_IN_RESOURCES_ROOT)?;
        let request =
            ResourceRequest::new(public_name, category, default_name).with_drop_in_root(Some(&drop_in));
        preprocess_text_resource(&request, data)
    }

    /// Token values shared by the control file, scripts and desktop entries.
    fn replacement_data(store: &mut ParamStore, installed_kb: u64) -> Result<BTreeMap<String, String>> {
        let fs_name = store
            .fetch(&standard::APP_FS_NAME)?
            .context("application name is not set")?;
        let mut data = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            data.insert(key.to_string(), value);
        };
        put("APPLICATION_NAME", store.fetch(&standard::APP_NAME)?.unwrap_or_default());
        put("APPLICATION_FS_NAME", fs_name.clone());
        put("APPLICATION_LAUNCHER_FILENAME", fs_name);
        put("APPLICATION_PACKAGE", store.fetch(&BUNDLE_NAME)?);
        put("APPLICATION_VENDOR", store.fetch(&standard::VENDOR)?);
        put("APPLICATION_MAINTAINER", store.fetch(&MAINTAINER)?);
        put("APPLICATION_VERSION", store.fetch(&standard::VERSION)?);
        put("XDG_PREFIX", store.fetch(&XDG_PREFIX)?);
        put("DEPLOY_BUNDLE_CATEGORY", store.fetch(&standard::CATEGORY)?);
        put("APPLICATION_DESCRIPTION", store.fetch(&standard::DESCRIPTION)?);
        put("APPLICATION_SUMMARY", store.fetch(&standard::TITLE)?);
        put("APPLICATION_COPYRIGHT", store.fetch(&standard::COPYRIGHT)?);
        put("APPLICATION_LICENSE_TYPE", store.fetch(&standard::LICENSE_TYPE)?);
        put("APPLICATION_LICENSE_TEXT", store.fetch(&LICENSE_TEXT)?);
        put("APPLICATION_ARCH", Arch::current().deb_name().to_string());
        put("APPLICATION_INSTALLED_SIZE", installed_kb.to_string());
        put("SERVICE_HINT", store.fetch(&standard::SERVICE_HINT)?.to_string());
        put("START_ON_INSTALL", store.fetch(&standard::START_ON_INSTALL)?.to_string());
        put("STOP_ON_UNINSTALL", store.fetch(&standard::STOP_ON_UNINSTALL)?.to_string());
        put("RUN_AT_STARTUP", store.fetch(&standard::RUN_AT_STARTUP)?.to_string());
        put("FILE_ASSOCIATION_INSTALL", String::new());
        put("FILE_ASSOCIATION_REMOVE", String::new());
        put("DESKTOP_MIMES", String::new());
        Ok(data)
    }

    /// Writes the MIME info file and fills the association tokens.
    async fn register_associations(
        store: &mut ParamStore,
        app_root: &Path,
        data: &mut BTreeMap<String, String>,
    ) -> Result<()> {
        let associations = store.fetch(&standard::FILE_ASSOCIATIONS)?;
        if associations.iter().all(|fa| fa.mime_types.is_empty()) {
            return Ok(());
        }
        let fs_name = data["APPLICATION_FS_NAME"].clone();
        let mime_file = format!("{}-MimeInfo.xml", store.fetch(&XDG_PREFIX)?);

        let mut info = String::from(
            "<?xml version=\"1.0\"?>\n\
             <mime-info xmlns='http://www.freedesktop.org/standards/shared-mime-info'>\n",
        );
        let mut mimes = Vec::new();
        for association in &associations {
            let Some(mime) = association.mime_types.first() else {
                continue;
            };
            let _ = writeln!(info, "  <mime-type type='{}'>", xml_escape(mime));
            if let Some(description) = association.description.as_deref().filter(|d| !d.is_empty()) {
                let _ = writeln!(info, "    <comment>{}</comment>", xml_escape(description));
            }
            for ext in &association.extensions {
                let _ = writeln!(info, "    <glob pattern='*.{}'/>", xml_escape(ext));
            }
            info.push_str("  </mime-type>\n");
            mimes.push(mime.clone());
        }
        info.push_str("</mime-info>");

        fs::write_file(&app_root.join(&mime_file), info).await?;
        data.insert(
            "FILE_ASSOCIATION_INSTALL".into(),
            format!("        xdg-mime install /opt/{fs_name}/{mime_file}\n"),
        );
        data.insert(
            "FILE_ASSOCIATION_REMOVE".into(),
            format!("        xdg-mime uninstall /opt/{fs_name}/{mime_file}\n"),
        );
        data.insert("DESKTOP_MIMES".into(), format!("MimeType={}", mimes.join(";")));
        Ok(())
    }

    /// Desktop entries for secondary launchers plus their install/remove lines.
    async fn secondary_desktop_entries(
        store: &mut ParamStore,
        app_root: &Path,
        data: &mut BTreeMap<String, String>,
        installed_kb: u64,
    ) -> Result<()> {
        let fs_name = data["APPLICATION_FS_NAME"].clone();
        let mut install = String::new();
        let mut remove = String::new();
        for secondary in store.fetch(&standard::SECONDARY_LAUNCHERS)? {
            let mut launcher_store = secondary.store_for(store)?;
            let mut launcher_data = Self::replacement_data(&mut launcher_store, installed_kb)?;
            launcher_data.insert("APPLICATION_FS_NAME".into(), fs_name.clone());
            let file_name = launcher_data["APPLICATION_LAUNCHER_FILENAME"].clone();

            let entry = Self::render(
                store,
                &format!("{file_name}.desktop"),
                "Menu shortcut descriptor",
                "template.desktop",
                &launcher_data,
            )?;
            fs::write_file(&app_root.join(format!("{file_name}.desktop")), entry).await?;

            let _ = writeln!(
                install,
                "        xdg-desktop-menu install --novendor /opt/{fs_name}/{file_name}.desktop"
            );
            let _ = writeln!(
                remove,
                "        xdg-desktop-menu uninstall --novendor /opt/{fs_name}/{file_name}.desktop"
            );
        }
        data.insert("SECONDARY_LAUNCHERS_INSTALL".into(), install);
        data.insert("SECONDARY_LAUNCHERS_REMOVE".into(), remove);
        Ok(())
    }

    /// Writes the control directory and the desktop integration files.
    async fn prepare_project_config(
        store: &mut ParamStore,
        app_root: &Path,
        config_dir: &Path,
    ) -> Result<()> {
        let installed_kb = fs::disk_usage(&store.fetch(&IMAGE_ROOT)?).await? >> 10;
        let mut data = Self::replacement_data(store, installed_kb)?;
        Self::secondary_desktop_entries(store, app_root, &mut data, installed_kb).await?;
        Self::register_associations(store, app_root, &mut data).await?;

        let fs_name = data["APPLICATION_FS_NAME"].clone();
        let desktop = Self::render(
            store,
            &format!("{fs_name}.desktop"),
            "Menu shortcut descriptor",
            "template.desktop",
            &data,
        )?;
        fs::write_file(&app_root.join(format!("{fs_name}.desktop")), desktop).await?;

        let control = Self::render(store, "control", "DEB control file", "template.control", &data)?;
        fs::write_file(&config_dir.join("control"), control).await?;

        for (script, category) in [
            ("preinst", "DEB preinstall script"),
            ("prerm", "DEB prerm script"),
            ("postinst", "DEB postinstall script"),
            ("postrm", "DEB postrm script"),
        ] {
            let text = Self::render(store, script, category, &format!("template.{script}"), &data)?;
            let path = config_dir.join(script);
            fs::write_file(&path, text).await?;
            fs::set_executable(&path).await?;
        }

        let copyright =
            Self::render(store, "copyright", "DEB copyright file", "template.copyright", &data)?;
        fs::write_file(&config_dir.join("copyright"), copyright).await?;

        if store.fetch(&standard::SERVICE_HINT)? {
            let name = format!("{}.init", data["APPLICATION_PACKAGE"]);
            let init = Self::render(store, &name, "DEB init script", "template.init", &data)?;
            let path = app_root.join(name);
            fs::write_file(&path, init).await?;
            fs::set_executable(&path).await?;
        }
        Ok(())
    }

    async fn build_deb(&self, store: &mut ParamStore, output_dir: &Path) -> Result<PathBuf> {
        let full = store.fetch(&FULL_PACKAGE_NAME)?;
        let image_dir = store.fetch(&IMAGE_DIR)?;
        let out_file = output_dir.join(format!("{full}.deb"));
        fs::create_dir_all(output_dir, false).await?;
        log::debug!("Generating DEB for installer to: {}", out_file.display());

        let mut command = ToolCommand::new(TOOL_FAKEROOT)
            .arg(TOOL_DPKG)
            .arg("-b")
            .arg(full)
            .arg(out_file.to_string_lossy());
        if let Some(parent) = image_dir.parent() {
            command = command.current_dir(parent);
        }
        self.runner.run(&command).await?;
        log::info!("✓ Package (.deb) saved to: {}", out_file.display());
        Ok(out_file)
    }
}

#[async_trait::async_trait]
impl Bundler for DebBundler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "Linux DEB Installer"
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        let mut params = self.image.params();
        params.extend([
            &BUNDLE_NAME as &'static dyn ParamInfo,
            &FULL_PACKAGE_NAME,
            &IMAGE_DIR,
            &IMAGE_ROOT,
            &CONFIG_DIR,
            &EMAIL,
            &MAINTAINER,
            &LICENSE_TEXT,
            &XDG_PREFIX,
        ]);
        params
    }

    async fn validate(&self, store: &mut ParamStore) -> Result<()> {
        ensure_host(self)?;
        validate_image_input(self.image.as_ref(), store).await?;
        self.check_tools()?;
        Self::check_licenses(store)?;
        Self::check_service(store)?;
        Self::check_associations(store)?;
        check_bundle_name(&store.fetch(&BUNDLE_NAME)?)
    }

    async fn execute(
        &self,
        store: &mut ParamStore,
        output_dir: &Path,
        invocation: Invocation,
    ) -> Result<Option<PathBuf>> {
        let image_dir = store.fetch(&IMAGE_DIR)?;
        let config_dir = store.fetch(&CONFIG_DIR)?;
        let image_root = store.fetch(&IMAGE_ROOT)?;
        invocation.announce(&format!("Creating DEB package in {}", output_dir.display()));

        fs::create_dir_all(&image_dir, true).await?;
        fs::create_dir_all(&config_dir, false).await?;
        let app_root = prepare_image(&self.image, store, &image_root).await?;
        Self::prepare_project_config(store, &app_root, &config_dir).await?;
        Ok(Some(self.build_deb(store, output_dir).await?))
    }
}

/// Escapes text for XML content and single- or double-quoted attributes.
fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        error::ErrorKind,
        image::{
            AppImageBundler,
            builder::tests::{FakeAssembler, demo_store},
        },
        tools::tests::RecordingRunner,
    };

    fn bundler(runner: Arc<RecordingRunner>) -> DebBundler {
        let image = AppImageBundler::linux(Arc::new(FakeAssembler::default()));
        DebBundler::new(Arc::new(image), runner)
    }

    #[test]
    fn test_bundle_name_rules() {
        let mut store = ParamStore::standard();
        store.set(&standard::APP_NAME, Some("My Fancy_App".into()));
        assert_eq!(store.fetch(&BUNDLE_NAME).unwrap(), "my-fancy-app");

        assert!(check_bundle_name("demo.app+2").is_ok());
        assert!(check_bundle_name("a").is_err());
        assert!(check_bundle_name("Demo").is_err());
        assert!(check_bundle_name("9lives").is_err());
    }

    #[test]
    fn test_derived_package_paths() {
        let mut store = ParamStore::standard();
        store.set(&standard::APP_NAME, Some("Demo".into()));
        store.set(&standard::VERSION, "2.1".into());
        store.set(&standard::BUILD_ROOT, PathBuf::from("/build"));
        assert_eq!(store.fetch(&FULL_PACKAGE_NAME).unwrap(), "demo-2.1");
        assert_eq!(
            store.fetch(&IMAGE_ROOT).unwrap(),
            PathBuf::from("/build/deb/demo-2.1/opt")
        );
        assert_eq!(
            store.fetch(&CONFIG_DIR).unwrap(),
            PathBuf::from("/build/deb/demo-2.1/DEBIAN")
        );
        assert_eq!(store.fetch(&MAINTAINER).unwrap(), "Unknown <Unknown>");
        assert_eq!(store.fetch(&XDG_PREFIX).unwrap(), "runtime-bundler-Demo");
    }

    #[test]
    fn test_license_text_falls_back_to_type() {
        let mut store = ParamStore::standard();
        store.supply(&standard::LICENSE_TYPE, "MIT").unwrap();
        assert_eq!(store.fetch(&LICENSE_TEXT).unwrap(), "MIT");
    }

    #[tokio::test]
    async fn test_validation_rules() {
        if Platform::current() != Platform::Linux {
            return;
        }
        let dir = tempfile::TempDir::new().unwrap();

        let deb = bundler(RecordingRunner::with_tools(&[]));
        let mut store = demo_store(dir.path());
        let err = deb.validate(&mut store).await.unwrap_err();
        assert!(err.to_string().contains("dpkg-deb"));

        let deb = bundler(RecordingRunner::with_tools(&[TOOL_DPKG, TOOL_FAKEROOT]));
        let mut store = demo_store(dir.path());
        deb.validate(&mut store).await.unwrap();

        let mut store = demo_store(dir.path());
        store
            .supply(
                &standard::FILE_ASSOCIATIONS,
                "extension=demo\nmime-type=application/x-demo,text/x-demo",
            )
            .unwrap();
        let err = deb.validate(&mut store).await.unwrap_err();
        assert!(err.to_string().contains("More than one MIME type"));

        let mut store = demo_store(dir.path());
        store.set(&standard::SERVICE_HINT, true);
        store.set(&standard::SYSTEM_WIDE, Some(false));
        let err = deb.validate(&mut store).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);

        let mut store = demo_store(dir.path());
        store.supply(&standard::LICENSE_FILE, "LICENSE.txt").unwrap();
        let err = deb.validate(&mut store).await.unwrap_err();
        assert!(err.to_string().contains("license"));
    }

    #[tokio::test]
    async fn test_package_tree_and_dpkg_invocation() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = RecordingRunner::with_tools(&[TOOL_DPKG, TOOL_FAKEROOT]);
        let deb = bundler(runner.clone());
        let mut store = demo_store(dir.path());
        store.set(&standard::VERSION, "1.2".into());
        store.set(&standard::SERVICE_HINT, true);
        store
            .supply(
                &standard::FILE_ASSOCIATIONS,
                "description=Demo document\nextension=demo\nmime-type=application/x-demo",
            )
            .unwrap();

        let out = dir.path().join("out");
        let artifact = deb
            .execute(&mut store, &out, Invocation::TopLevel)
            .await
            .unwrap();
        assert_eq!(artifact, Some(out.join("demo-1.2.deb")));

        let tree = dir.path().join("build/deb/demo-1.2");
        let control = std::fs::read_to_string(tree.join("DEBIAN/control")).unwrap();
        assert!(control.contains("Package: demo\n"));
        assert!(control.contains("Version: 1.2\n"));
        assert!(tree.join("opt/Demo/Demo").is_file());
        assert!(tree.join("opt/Demo/demo.init").is_file());

        let desktop = std::fs::read_to_string(tree.join("opt/Demo/Demo.desktop")).unwrap();
        assert!(desktop.contains("Exec=/opt/Demo/Demo\n"));
        assert!(desktop.contains("MimeType=application/x-demo"));
        let postinst = std::fs::read_to_string(tree.join("DEBIAN/postinst")).unwrap();
        assert!(postinst.contains("xdg-mime install /opt/Demo/runtime-bundler-Demo-MimeInfo.xml"));

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].program, "fakeroot");
        assert_eq!(commands[0].args[..3], ["dpkg-deb", "-b", "demo-1.2"]);
        assert_eq!(commands[0].cwd.as_deref(), Some(dir.path().join("build/deb").as_path()));
    }

    #[tokio::test]
    async fn test_predefined_image_installed_under_fs_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let predefined = dir.path().join("Prebuilt");
        std::fs::create_dir_all(predefined.join("app")).unwrap();
        std::fs::write(predefined.join("Demo"), b"#!/bin/sh\n").unwrap();

        let runner = RecordingRunner::with_tools(&[TOOL_DPKG, TOOL_FAKEROOT]);
        let deb = bundler(runner);
        let mut store = demo_store(dir.path());
        store.set(&standard::PREDEFINED_APP_IMAGE, Some(predefined));
        store.set(&standard::IDENTIFIER, Some("com.example".into()));
        store.set(&standard::VERSION, "1.0".into());
        deb.execute(&mut store, &dir.path().join("out"), Invocation::TopLevel)
            .await
            .unwrap();

        let tree = dir.path().join("build/deb/demo-1.0");
        let entries: Vec<_> = std::fs::read_dir(tree.join("opt"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["Demo"]);
        assert!(tree.join("opt/Demo/Demo").is_file());
        let desktop = std::fs::read_to_string(tree.join("opt/Demo/Demo.desktop")).unwrap();
        assert!(desktop.contains("Exec=/opt/Demo/Demo\n"));
    }

    #[tokio::test]
    async fn test_mime_info_is_escaped() {
        let dir = tempfile::TempDir::new().unwrap();
        let deb = bundler(RecordingRunner::with_tools(&[TOOL_DPKG, TOOL_FAKEROOT]));
        let mut store = demo_store(dir.path());
        store.set(&standard::VERSION, "1.0".into());
        store
            .supply(
                &standard::FILE_ASSOCIATIONS,
                "description=Tom & Jerry <docs>\nextension=tj\nmime-type=application/x-tj",
            )
            .unwrap();
        deb.execute(&mut store, &dir.path().join("out"), Invocation::TopLevel)
            .await
            .unwrap();

        let info = std::fs::read_to_string(
            dir.path()
                .join("build/deb/demo-1.0/opt/Demo/runtime-bundler-Demo-MimeInfo.xml"),
        )
        .unwrap();
        assert!(info.contains("<comment>Tom &amp; Jerry &lt;docs&gt;</comment>"));
        assert!(!info.contains("Tom & Jerry"));
    }

    #[tokio::test]
    async fn test_dpkg_failure_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner {
            installed: [TOOL_DPKG, TOOL_FAKEROOT].iter().map(|t| t.to_string()).collect(),
            failing: ["fakeroot".to_string()].into_iter().collect(),
            ..RecordingRunner::default()
        });
        let deb = bundler(runner);
        let mut store = demo_store(dir.path());
        let err = deb
            .execute(&mut store, &dir.path().join("out"), Invocation::TopLevel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalToolFailure);
    }
}
