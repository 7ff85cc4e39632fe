use crate::config::AssetConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::debug;

/// Fatal start-up errors. The process must not begin serving with a
/// manifest it could not fully cross-check.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to scan asset root {path}: {source}")]
    Scan {
        path: String,
        source: std::io::Error,
    },
    #[error("gzip manifest entry {path} has no matching file under the asset root")]
    MissingSource { path: String },
    #[error("gzip manifest entry {path} has no compressed file under the gzip root")]
    MissingVariant { path: String },
    #[error("asset path {path} is not valid UTF-8")]
    NonUtf8Path { path: String },
}

/// One entry of the gzip manifest file, as written by the gzpack tool.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GzipEntry {
    pub mtime: i64,
    pub size: u64,
    pub gzipped_size: u64,
}

/// Precomputed compressed form of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipVariant {
    /// Byte length of the compressed file
    pub size: u64,
}

/// Serving metadata for one asset path, immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    /// Root-relative path with forward slashes; the manifest key
    pub path: String,
    /// MIME type, identical whichever representation is served
    pub content_type: String,
    /// Byte length of the uncompressed file
    pub size: u64,
    /// Present iff a precompressed sibling exists under the gzip root
    pub gzip: Option<GzipVariant>,
    /// Weak validator, stable across restarts while the source is unchanged
    pub etag: String,
}

impl AssetRecord {
    pub fn has_variant(&self) -> bool {
        self.gzip.is_some()
    }
}

/// The immutable path → record mapping built once per start-up.
#[derive(Debug)]
pub struct Manifest {
    records: HashMap<String, AssetRecord>,
}

impl Manifest {
    /// Loads the MIME table and gzip manifest and cross-references both
    /// against the asset root.
    ///
    /// Every file under the root becomes a record; every gzip manifest
    /// entry must name an existing source file and an existing compressed
    /// sibling, otherwise loading fails.
    pub fn load(cfg: &AssetConfig) -> Result<Self, ManifestError> {
        let mime_table: HashMap<String, String> = read_json(&cfg.mime_table)?;
        let gzip_manifest: HashMap<String, GzipEntry> = read_json(&cfg.gzip_manifest)?;

        let mut records = HashMap::new();
        let mut stack = vec![cfg.root.clone()];

        while let Some(dir) = stack.pop() {
            let entries = std::fs::read_dir(&dir).map_err(|source| ManifestError::Scan {
                path: dir.display().to_string(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| ManifestError::Scan {
                    path: dir.display().to_string(),
                    source,
                })?;
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }

                let rel = relative_key(&cfg.root, &path)?;
                let meta = std::fs::metadata(&path).map_err(|source| ManifestError::Scan {
                    path: path.display().to_string(),
                    source,
                })?;
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                let size = meta.len();

                let content_type = mime_table
                    .get(&extension_of(&rel))
                    .cloned()
                    .unwrap_or_else(|| cfg.default_type.clone());

                records.insert(
                    rel.clone(),
                    AssetRecord {
                        path: rel,
                        content_type,
                        size,
                        gzip: None,
                        etag: format!("W/\"{:x}-{:x}\"", mtime, size),
                    },
                );
            }
        }

        // Attach variants; every manifest entry must be backed by real files.
        for (path, entry) in &gzip_manifest {
            let record = records
                .get_mut(path)
                .ok_or_else(|| ManifestError::MissingSource { path: path.clone() })?;
            if !cfg.gzip_root.join(path).is_file() {
                return Err(ManifestError::MissingVariant { path: path.clone() });
            }
            record.gzip = Some(GzipVariant {
                size: entry.gzipped_size,
            });
        }

        debug!(
            assets = records.len(),
            compressed = gzip_manifest.len(),
            "asset records built"
        );
        Ok(Self { records })
    }

    pub fn get(&self, key: &str) -> Option<&AssetRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds a manifest from pre-made records. Test seam; production code
    /// always goes through [`Manifest::load`].
    pub fn from_records(records: impl IntoIterator<Item = AssetRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.path.clone(), r)).collect(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ManifestError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Root-relative key with forward slashes, e.g. "css/nav.css".
fn relative_key(root: &Path, path: &Path) -> Result<String, ManifestError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut key = String::new();
    for component in rel.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| ManifestError::NonUtf8Path {
                path: path.display().to_string(),
            })?;
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(part);
    }
    Ok(key)
}

/// Lowercased extension with its leading dot, matching the table keys the
/// mimetable tool writes ("nav.css" -> ".css"). Files without an extension
/// map to the empty string, which the table never contains.
fn extension_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[pos..].to_ascii_lowercase(),
        _ => String::new(),
    }
}
