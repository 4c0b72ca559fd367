//! Application resources and customizable packaging resources.
//!
//! - [`file_set`] - ordered resource sets copied into the image
//! - [`manifest`] - entry-point detection from archive manifests
//! - [`locator`] - drop-in / explicit / built-in resource lookup
//! - [`template`] - literal token replacement

mod builtin;
pub mod file_set;
pub mod locator;
pub mod manifest;
pub mod template;

pub use file_set::RelativeFileSet;
pub use locator::{ResourceRequest, ResourceSource, fetch_resource, locate, preprocess_text_resource};
pub use manifest::{EntryPoint, JarManifest};
