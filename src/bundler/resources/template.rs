//! Literal token replacement for config and script templates.

use std::collections::BTreeMap;

/// Replaces every occurrence of each key with its value.
///
/// Longer keys are replaced first so a key that prefixes another (say
/// `APPLICATION_NAME` and `APPLICATION_NAME_LOWER`) never clobbers it.
pub fn preprocess(text: &str, data: &BTreeMap<String, String>) -> String {
    let mut keys: Vec<&String> = data.keys().filter(|k| !k.is_empty()).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let mut out = text.to_string();
    for key in keys {
        out = out.replace(key.as_str(), &data[key]);
    }
    out
}
