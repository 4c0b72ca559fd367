//! `Info.plist` and `PkgInfo` of a macOS application bundle.

use super::layout::ImageLayout;
use crate::bundler::{
    error::Result,
    params::{ParamStore, standard},
    utils::fs,
};
use plist::{Dictionary, Value};

fn string(value: impl Into<String>) -> Value {
    Value::String(value.into())
}

/// Builds the bundle's property list.
pub fn info_plist(store: &mut ParamStore, fs_name: &str) -> Result<Dictionary> {
    let name = store.fetch(&standard::APP_NAME)?.unwrap_or_default();
    let version = store.fetch(&standard::VERSION)?;
    let identifier = store
        .fetch(&standard::IDENTIFIER)?
        .unwrap_or_else(|| fs_name.to_string());

    let mut dict = Dictionary::new();
    dict.insert("CFBundleDevelopmentRegion".into(), string("English"));
    dict.insert("CFBundleExecutable".into(), string(fs_name));
    if store.fetch(&standard::ICON)?.is_some() {
        dict.insert("CFBundleIconFile".into(), string(format!("{fs_name}.icns")));
    }
    dict.insert("CFBundleIdentifier".into(), string(identifier));
    dict.insert("CFBundleInfoDictionaryVersion".into(), string("6.0"));
    dict.insert("CFBundleName".into(), string(name));
    dict.insert("CFBundlePackageType".into(), string("APPL"));
    dict.insert("CFBundleShortVersionString".into(), string(version.clone()));
    dict.insert("CFBundleSignature".into(), string("????"));
    dict.insert("CFBundleVersion".into(), string(version));
    dict.insert(
        "LSApplicationCategoryType".into(),
        string(store.fetch(&standard::CATEGORY)?),
    );
    dict.insert(
        "NSHumanReadableCopyright".into(),
        string(store.fetch(&standard::COPYRIGHT)?),
    );
    dict.insert("NSHighResolutionCapable".into(), Value::Boolean(true));

    let associations = store.fetch(&standard::FILE_ASSOCIATIONS)?;
    if !associations.is_empty() {
        let types = associations
            .iter()
            .map(|fa| {
                let mut entry = Dictionary::new();
                if let Some(description) = &fa.description {
                    entry.insert("CFBundleTypeName".into(), string(description.clone()));
                }
                entry.insert("CFBundleTypeRole".into(), string("Editor"));
                entry.insert(
                    "CFBundleTypeExtensions".into(),
                    Value::Array(fa.extensions.iter().cloned().map(Value::String).collect()),
                );
                entry.insert(
                    "CFBundleTypeMIMETypes".into(),
                    Value::Array(fa.mime_types.iter().cloned().map(Value::String).collect()),
                );
                Value::Dictionary(entry)
            })
            .collect();
        dict.insert("CFBundleDocumentTypes".into(), Value::Array(types));
    }
    Ok(dict)
}

/// Writes `Info.plist` and `PkgInfo` into the bundle's `Contents`.
pub async fn write_bundle_metadata(
    store: &mut ParamStore,
    layout: &ImageLayout,
    fs_name: &str,
) -> Result<()> {
    let dict = info_plist(store, fs_name)?;
    let mut xml = Vec::new();
    Value::Dictionary(dict).to_writer_xml(&mut xml)?;
    let contents = layout.contents_dir();
    fs::write_file(&contents.join("Info.plist"), xml).await?;
    fs::write_file(&contents.join("PkgInfo"), "APPL????").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::Platform;

    #[tokio::test]
    async fn test_bundle_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = ParamStore::standard();
        store.supply(&standard::MAIN_CLASS, "com.example.Viewer").unwrap();
        store
            .supply(
                &standard::FILE_ASSOCIATIONS,
                "description=Picture\nextension=pic\nmime-type=image/x-pic",
            )
            .unwrap();
        let layout = ImageLayout::new(Platform::MacOs, dir.path(), "Viewer");
        write_bundle_metadata(&mut store, &layout, "Viewer").await.unwrap();

        let value = Value::from_file(layout.contents_dir().join("Info.plist")).unwrap();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(
            dict.get("CFBundleIdentifier").and_then(Value::as_string),
            Some("com.example")
        );
        assert_eq!(
            dict.get("CFBundleExecutable").and_then(Value::as_string),
            Some("Viewer")
        );
        let types = dict.get("CFBundleDocumentTypes").and_then(Value::as_array).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(
            std::fs::read_to_string(layout.contents_dir().join("PkgInfo")).unwrap(),
            "APPL????"
        );
    }
}
