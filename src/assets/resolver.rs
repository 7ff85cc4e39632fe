use crate::assets::manifest::{AssetRecord, Manifest};
use percent_encoding::percent_decode_str;

/// Maps a raw request target to an asset record.
///
/// Lookup is exact-match against the manifest keys; anything the
/// normalization rejects is a plain miss, indistinguishable from a path
/// that was never published. NotFound here is a first-class result the
/// dispatcher turns into a 404.
pub fn resolve<'a>(
    manifest: &'a Manifest,
    raw_path: &str,
    index_file: &str,
) -> Option<&'a AssetRecord> {
    let key = normalize(raw_path, index_file)?;
    manifest.get(&key)
}

/// Turns a request target into a manifest key, or rejects it.
///
/// Steps, in order: drop the query string, percent-decode, require a
/// leading slash, walk segments collapsing empty ones and refusing any
/// traversal (`..`), backslash, or NUL; a trailing slash maps to the index
/// file name, applied once.
pub fn normalize(raw_path: &str, index_file: &str) -> Option<String> {
    let path = raw_path.split('?').next().unwrap_or(raw_path);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    if !decoded.starts_with('/') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains('\\') || segment.contains('\0') {
            return None;
        }
        segments.push(segment);
    }

    if decoded.ends_with('/') || segments.is_empty() {
        segments.push(index_file);
    }

    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_rejected_not_resolved() {
        assert_eq!(normalize("/../secret", "index.html"), None);
        assert_eq!(normalize("/a/%2e%2e/b", "index.html"), None);
        assert_eq!(normalize("/a/..%2fb", "index.html"), None);
    }
}
