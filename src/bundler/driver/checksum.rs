//! SHA-256 digests of produced artifacts.
//!
//! Installers are single files; images are directories, hashed as the
//! sequence of (relative path, contents) over every file in sorted order.

use crate::{
    bail,
    bundler::error::{ErrorExt, Result},
};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

const CHUNK: usize = 8192;

/// Hex-encoded SHA-256 of a file or directory tree.
pub async fn sha256_hex(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;
    let mut hasher = Sha256::new();
    if metadata.is_file() {
        feed_file(&mut hasher, path).await?;
    } else if metadata.is_dir() {
        feed_tree(&mut hasher, path).await?;
    } else {
        bail!("Artifact is neither a file nor a directory: {}", path.display());
    }
    Ok(format!("{:x}", hasher.finalize()))
}

async fn feed_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut buffer = vec![0u8; CHUNK];
    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hashing", path)?;
        if n == 0 {
            return Ok(());
        }
        hasher.update(&buffer[..n]);
    }
}

async fn feed_tree(hasher: &mut Sha256, root: &Path) -> Result<()> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    for file in files {
        let rel = file.strip_prefix(root)?;
        hasher.update(rel.to_string_lossy().replace('\\', "/").as_bytes());
        feed_file(hasher, &file).await?;
    }
    Ok(())
}
