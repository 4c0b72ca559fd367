//! Search-path lookup for external tools.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

/// Lookups already done in this process; PATH does not change mid-run.
static PROBES: LazyLock<Mutex<HashMap<String, Option<PathBuf>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Finds `program` on PATH, caching the answer.
pub fn probe(program: &str) -> Option<PathBuf> {
    let mut probes = match PROBES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    probes
        .entry(program.to_string())
        .or_insert_with(|| match which::which(program) {
            Ok(path) => {
                log::debug!("Found {} at: {}", program, path.display());
                Some(path)
            }
            Err(e) => {
                log::debug!("{} not found in PATH: {}", program, e);
                None
            }
        })
        .clone()
}
