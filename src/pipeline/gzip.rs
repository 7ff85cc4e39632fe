use anyhow::Context;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

use crate::assets::manifest::GzipEntry;

/// Populates the precompressed tree and its manifest from an asset tree.
///
/// For every file under `root`, a gzip sibling is written under
/// `gzip_root` at the same relative path — but only when compression
/// actually shrinks it. Files whose recorded mtime is unchanged are left
/// alone, so re-running after an incremental deploy touches only what
/// changed. Entries and compressed files whose source is gone are pruned.
pub fn populate(root: &Path, gzip_root: &Path, manifest_path: &Path) -> anyhow::Result<()> {
    let mut manifest: BTreeMap<String, GzipEntry> = match std::fs::read_to_string(manifest_path) {
        Ok(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", manifest_path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read {}", manifest_path.display()));
        }
    };

    let sources = walk_files(root)?;

    // Prune entries whose source file is gone
    manifest.retain(|rel, _| {
        let keep = sources.iter().any(|(r, _)| r == rel);
        if !keep {
            let stale = gzip_root.join(rel);
            if stale.exists() {
                let _ = std::fs::remove_file(&stale);
            }
            debug!(path = %rel, "pruned stale entry");
        }
        keep
    });

    let mut packed = 0usize;
    for (rel, path) in &sources {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let gz_path = gzip_root.join(rel);
        if let Some(entry) = manifest.get(rel) {
            if entry.mtime == mtime && gz_path.is_file() {
                continue;
            }
            manifest.remove(rel);
            let _ = std::fs::remove_file(&gz_path);
        }

        let content = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let compressed = compress(&content)?;

        // A gzip variant that is not smaller is dead weight; skip it and
        // the server will always send the original.
        if compressed.len() >= content.len() {
            continue;
        }

        if let Some(parent) = gz_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&gz_path, &compressed)
            .with_context(|| format!("failed to write {}", gz_path.display()))?;

        manifest.insert(
            rel.clone(),
            GzipEntry {
                mtime,
                size: content.len() as u64,
                gzipped_size: compressed.len() as u64,
            },
        );
        packed += 1;
    }

    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(manifest_path, json)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    info!(
        packed,
        total = manifest.len(),
        manifest = %manifest_path.display(),
        "gzip tree updated"
    );
    Ok(())
}

pub fn compress(content: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}

/// All files under `root` as (root-relative key, absolute path) pairs.
fn walk_files(root: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to read {}", dir.display()))?
                .path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect::<Vec<_>>()
                .join("/");
            if rel.is_empty() {
                continue;
            }
            files.push((rel, path));
        }
    }

    Ok(files)
}
