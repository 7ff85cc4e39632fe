use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// MIME type for one file extension (lowercased, with leading dot).
///
/// The table deliberately covers only what a static site ships; anything
/// else falls back to application/octet-stream at serve time.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        // Text
        ".html" | ".htm" => "text/html",
        ".css" => "text/css",
        ".js" | ".mjs" => "text/javascript",
        ".json" => "application/json",
        ".xml" => "application/xml",
        ".txt" => "text/plain",
        ".md" => "text/markdown",
        ".csv" => "text/csv",

        // Images
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".gif" => "image/gif",
        ".svg" => "image/svg+xml",
        ".ico" => "image/x-icon",
        ".webp" => "image/webp",
        ".avif" => "image/avif",

        // Audio/Video
        ".mp3" => "audio/mpeg",
        ".ogg" => "audio/ogg",
        ".wav" => "audio/wav",
        ".mp4" => "video/mp4",
        ".webm" => "video/webm",

        // Fonts
        ".woff" => "font/woff",
        ".woff2" => "font/woff2",
        ".ttf" => "font/ttf",
        ".otf" => "font/otf",

        // Documents and misc
        ".pdf" => "application/pdf",
        ".wasm" => "application/wasm",
        ".zip" => "application/zip",
        ".gz" => "application/gzip",

        _ => return None,
    };
    Some(mime)
}

/// Walks an asset tree and maps every file extension found in it to a MIME
/// type. Extensions the table does not know map to octet-stream, with a
/// warning so the build is told about the gap.
pub fn scan_extensions(root: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let mut table = BTreeMap::new();
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

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let ext = match name.rfind('.') {
                Some(pos) if pos > 0 => name[pos..].to_ascii_lowercase(),
                _ => continue,
            };

            let mime = match mime_for_extension(&ext) {
                Some(mime) => mime,
                None => {
                    warn!(extension = %ext, file = %path.display(), "unknown extension");
                    "application/octet-stream"
                }
            };
            table.entry(ext).or_insert_with(|| mime.to_string());
        }
    }

    Ok(table)
}

/// Writes the extension table the manifest loader consumes.
pub fn write_table(root: &Path, output: &Path) -> anyhow::Result<()> {
    let table = scan_extensions(root)?;
    let json = serde_json::to_string_pretty(&table)?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}
