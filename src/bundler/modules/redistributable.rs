//! The list of runtime modules that may ship with an application.

use crate::bundler::{
    error::Result,
    platform::Platform,
    resources::{ResourceRequest, locate},
};
use std::{collections::BTreeSet, path::Path};

/// Expands to every module found on the module path.
pub const ALL_MODULE_PATH: &str = "ALL-MODULE-PATH";
/// Expands to every redistributable runtime module.
pub const ALL_RUNTIME: &str = "ALL-RUNTIME";

const LIST_NAME: &str = "redistributable.list";

/// Parses a module list: one name per line, anything after `;` ignored.
pub fn parse_module_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(|line| match line.split_once(';') {
            Some((name, _)) => name.trim(),
            None => line.trim(),
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loads the redistributable list, preferring a copy in `drop_in_root`.
pub fn redistributable_modules(drop_in_root: Option<&Path>) -> Result<BTreeSet<String>> {
    let request = ResourceRequest::new(LIST_NAME, "redistributable modules", LIST_NAME)
        .with_drop_in_root(drop_in_root);
    let (bytes, _) = locate(&request)?;
    Ok(parse_module_list(&String::from_utf8_lossy(&bytes)))
}

/// Drop-in list of extra modules every image for `platform` carries.
pub fn platform_modules_file(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Linux => Some("linux-modules.list"),
        Platform::MacOs => Some("mac-modules.list"),
        Platform::Windows => Some("windows-modules.list"),
        _ => None,
    }
}

/// Extra modules for `platform`; empty unless its list is in `drop_in_root`.
pub fn platform_modules(platform: Platform, drop_in_root: Option<&Path>) -> Result<BTreeSet<String>> {
    let (Some(name), Some(root)) = (platform_modules_file(platform), drop_in_root) else {
        return Ok(BTreeSet::new());
    };
    if !root.join(name).is_file() {
        return Ok(BTreeSet::new());
    }
    let request = ResourceRequest::new(name, "platform modules", name).with_drop_in_root(Some(root));
    let (bytes, _) = locate(&request)?;
    Ok(parse_module_list(&String::from_utf8_lossy(&bytes)))
}
