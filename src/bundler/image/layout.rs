//! Directory layout of an application image per platform.

use crate::bundler::platform::Platform;
use std::path::{Path, PathBuf};

/// Where each part of an image lives.
///
/// `*_rel` fields are relative to the launcher directory and are what
/// launchers and configuration files refer to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    pub platform: Platform,
    /// Image root: the directory handed to installers.
    pub root: PathBuf,
    pub launcher_dir: PathBuf,
    pub app_dir: PathBuf,
    pub runtime_dir: PathBuf,
    /// Icons and other platform resources.
    pub resources_dir: PathBuf,
    pub app_rel: &'static str,
    pub runtime_rel: &'static str,
}

impl ImageLayout {
    /// Layout of the image for `fs_name` under `images_root`.
    pub fn new(platform: Platform, images_root: &Path, fs_name: &str) -> Self {
        match platform {
            Platform::MacOs => {
                let root = images_root.join(format!("{fs_name}.app"));
                let contents = root.join("Contents");
                Self {
                    platform,
                    launcher_dir: contents.join("MacOS"),
                    app_dir: contents.join("Java"),
                    runtime_dir: contents.join("PlugIns/Java.runtime/Contents/Home"),
                    resources_dir: contents.join("Resources"),
                    app_rel: "../Java",
                    runtime_rel: "../PlugIns/Java.runtime/Contents/Home",
                    root,
                }
            }
            _ => {
                let root = images_root.join(fs_name);
                Self {
                    platform,
                    launcher_dir: root.clone(),
                    app_dir: root.join("app"),
                    runtime_dir: root.join("runtime"),
                    resources_dir: root.clone(),
                    app_rel: "app",
                    runtime_rel: "runtime",
                    root,
                }
            }
        }
    }

    /// macOS `Contents` directory; the root elsewhere.
    pub fn contents_dir(&self) -> PathBuf {
        match self.platform {
            Platform::MacOs => self.root.join("Contents"),
            _ => self.root.clone(),
        }
    }

    /// File name of the launcher for `fs_name`.
    pub fn launcher_file_name(&self, fs_name: &str) -> String {
        match self.platform {
            Platform::Windows => format!("{fs_name}.exe"),
            _ => fs_name.to_string(),
        }
    }

    pub fn launcher_path(&self, fs_name: &str) -> PathBuf {
        self.launcher_dir.join(self.launcher_file_name(fs_name))
    }

    /// Launch configuration read by the launcher named `fs_name`.
    pub fn config_path(&self, fs_name: &str) -> PathBuf {
        self.app_dir.join(format!("{fs_name}.cfg"))
    }

    pub fn icon_path(&self, fs_name: &str) -> PathBuf {
        let ext = match self.platform {
            Platform::MacOs => "icns",
            Platform::Windows => "ico",
            _ => "png",
        };
        self.resources_dir.join(format!("{fs_name}.{ext}"))
    }

    /// `app.runtime` value of the launch configuration.
    pub fn runtime_reference(&self) -> String {
        format!("$APPDIR/{}", self.runtime_rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_layout() {
        let layout = ImageLayout::new(Platform::Linux, Path::new("/out"), "Demo");
        assert_eq!(layout.root, Path::new("/out/Demo"));
        assert_eq!(layout.launcher_path("Demo"), Path::new("/out/Demo/Demo"));
        assert_eq!(layout.config_path("Demo"), Path::new("/out/Demo/app/Demo.cfg"));
        assert_eq!(layout.icon_path("Demo"), Path::new("/out/Demo/Demo.png"));
        assert_eq!(layout.runtime_reference(), "$APPDIR/runtime");
    }

    #[test]
    fn test_macos_layout() {
        let layout = ImageLayout::new(Platform::MacOs, Path::new("/out"), "Demo");
        assert_eq!(layout.root, Path::new("/out/Demo.app"));
        assert_eq!(
            layout.launcher_path("Demo"),
            Path::new("/out/Demo.app/Contents/MacOS/Demo")
        );
        assert_eq!(
            layout.runtime_dir,
            Path::new("/out/Demo.app/Contents/PlugIns/Java.runtime/Contents/Home")
        );
        assert_eq!(layout.contents_dir(), Path::new("/out/Demo.app/Contents"));
    }

    #[test]
    fn test_windows_launcher_is_exe() {
        let layout = ImageLayout::new(Platform::Windows, Path::new("/out"), "Demo");
        assert_eq!(layout.launcher_file_name("Demo"), "Demo.exe");
        assert_eq!(layout.icon_path("Demo"), Path::new("/out/Demo/Demo.ico"));
    }
}
