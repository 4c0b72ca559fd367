//! Application images: a private runtime plus the application, its
//! launchers and their launch configuration.

pub(crate) mod builder;
mod bundler;
mod config;
mod info_plist;
mod launcher;
mod layout;

pub use builder::ImageBuilder;
pub use bundler::AppImageBundler;
pub use config::LaunchConfig;
pub use info_plist::info_plist;
pub use launcher::write_launcher;
pub use layout::ImageLayout;
