//! Linux packaging: the `.deb` installer.

pub mod debian;

pub use debian::DebBundler;
