//! macOS packaging: the drag-to-install disk image and the launchd daemon
//! component.

pub mod daemon;
pub mod dmg;

pub use daemon::DaemonBundler;
pub use dmg::DmgBundler;
