//! Secondary launchers and file associations.
//!
//! Both are written as blocks of `key=value` lines separated by blank lines.

use super::{ParamStore, ParamValue, parse, standard};
use crate::bundler::error::{Error, Result};
use std::{collections::BTreeMap, path::PathBuf};

/// An additional launcher placed in the same image as the main one.
///
/// Every entry other than `name` overrides the parameter with that id for
/// this launcher only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecondaryLauncher {
    pub name: String,
    pub overrides: BTreeMap<String, String>,
}

/// Desktop file association.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileAssociation {
    pub description: Option<String>,
    pub extensions: Vec<String>,
    pub mime_types: Vec<String>,
    pub icon: Option<PathBuf>,
}

crate::object_param_type!(Vec<SecondaryLauncher>, Vec<FileAssociation>);

fn blocks(raw: &str) -> Vec<BTreeMap<String, String>> {
    raw.split("\n\n")
        .map(parse::parse_properties)
        .filter(|b| !b.is_empty())
        .collect()
}

impl SecondaryLauncher {
    pub fn parse_all(id: &str, raw: &str) -> Result<Vec<SecondaryLauncher>> {
        blocks(raw)
            .into_iter()
            .map(|mut block| -> Result<SecondaryLauncher> {
                let name = block.remove("name").ok_or_else(|| Error::ParamParse {
                    id: id.to_string(),
                    value: raw.to_string(),
                    reason: "every secondary launcher needs a `name`".to_string(),
                })?;
                Ok(SecondaryLauncher {
                    name,
                    overrides: block,
                })
            })
            .collect()
    }

    /// Store for this launcher: the main store's overrides plus this
    /// launcher's name and overrides.
    pub fn store_for(&self, base: &ParamStore) -> Result<ParamStore> {
        let mut store = base.overlay([]);
        store.remove(standard::APP_FS_NAME.id);
        store.set_raw(standard::APP_NAME.id, ParamValue::Str(self.name.clone()));
        for (id, raw) in &self.overrides {
            let value = match store.descriptor(id) {
                Some(info) => info.parse_value(raw, &mut store)?,
                None => ParamValue::Str(raw.clone()),
            };
            store.set_raw(id.clone(), value);
        }
        Ok(store)
    }
}

impl FileAssociation {
    pub fn parse_all(raw: &str) -> Vec<FileAssociation> {
        blocks(raw)
            .into_iter()
            .map(|block| FileAssociation {
                description: block.get("description").cloned(),
                extensions: block
                    .get("extension")
                    .map(|e| split_list(e))
                    .unwrap_or_default(),
                mime_types: block
                    .get("mime-type")
                    .map(|m| split_list(m))
                    .unwrap_or_default(),
                icon: block.get("icon").map(PathBuf::from),
            })
            .collect()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_launchers() {
        let launchers = SecondaryLauncher::parse_all(
            "secondaryLaunchers",
            "name=Tool\napplicationClass=com.example.Tool\n\nname=Other\n",
        )
        .unwrap();
        assert_eq!(launchers.len(), 2);
        assert_eq!(launchers[0].name, "Tool");
        assert_eq!(launchers[0].overrides["applicationClass"], "com.example.Tool");
        assert!(launchers[1].overrides.is_empty());

        assert!(SecondaryLauncher::parse_all("secondaryLaunchers", "arguments=x").is_err());
    }

    #[test]
    fn test_launcher_store_recomputes_fs_name() {
        let mut base = ParamStore::standard();
        base.set(&standard::APP_NAME, Some("Main App".to_string()));
        assert_eq!(
            base.fetch(&standard::APP_FS_NAME).unwrap().as_deref(),
            Some("MainApp")
        );
        let launcher = SecondaryLauncher {
            name: "Side Tool".into(),
            overrides: BTreeMap::from([("arguments".to_string(), "--side".to_string())]),
        };
        let mut store = launcher.store_for(&base).unwrap();
        assert_eq!(
            store.fetch(&standard::APP_FS_NAME).unwrap().as_deref(),
            Some("SideTool")
        );
        assert_eq!(store.fetch(&standard::ARGUMENTS).unwrap(), vec!["--side"]);
    }

    #[test]
    fn test_parse_associations() {
        let fas = FileAssociation::parse_all(
            "description=Demo doc\nextension=demo, dmo\nmime-type=application/x-demo",
        );
        assert_eq!(fas.len(), 1);
        assert_eq!(fas[0].extensions, vec!["demo", "dmo"]);
        assert_eq!(fas[0].mime_types, vec!["application/x-demo"]);
    }
}
