//! Storage directory walk and content-type detection

use crate::error::{DeployError, Result};
use ginger_types::StorageObject;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

const TEXT_PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for an object: magic bytes first, then the extension,
/// then a UTF-8 check. Parameters such as `; charset=` are stripped.
pub fn sniff_mime_type(key: &str, data: &[u8]) -> String {
    let detected = infer::get(data)
        .map(|kind| kind.mime_type().to_string())
        .or_else(|| {
            mime_guess::from_path(key)
                .first()
                .map(|mime| mime.essence_str().to_string())
        })
        .unwrap_or_else(|| {
            if std::str::from_utf8(data).is_ok() {
                TEXT_PLAIN.to_string()
            } else {
                OCTET_STREAM.to_string()
            }
        });

    match detected.split_once(';') {
        Some((essence, _)) => essence.trim().to_string(),
        None => detected,
    }
}

/// Every regular file under `dir`, keyed by its `/`-separated relative path.
///
/// A missing directory yields no objects.
pub fn collect_objects(dir: &Path) -> Result<Vec<StorageObject>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut objects = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            DeployError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let data = std::fs::read(entry.path()).map_err(|source| DeployError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let mime_type = sniff_mime_type(&key, &data);
        debug!(key = %key, mime_type = %mime_type, size = data.len(), "Storage object");
        objects.push(StorageObject::new(key, data, mime_type));
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_magic_bytes_win_over_extension() {
        assert_eq!(sniff_mime_type("logo.txt", PNG_MAGIC), "image/png");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(sniff_mime_type("site.css", b"body { margin: 0 }"), "text/css");
        assert_eq!(sniff_mime_type("data.json", b"{}"), "application/json");
    }

    #[test]
    fn test_text_and_binary_fallback() {
        assert_eq!(sniff_mime_type("README", b"plain words"), "text/plain");
        assert_eq!(
            sniff_mime_type("blob", &[0xc3, 0x28, 0xa0, 0xa1]),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_collect_objects_uses_relative_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("img/logo.png"), PNG_MAGIC).unwrap();

        let objects = collect_objects(dir.path()).unwrap();
        let keys: Vec<&str> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["img/logo.png", "index.html"]);
        assert_eq!(objects[0].mime_type, "image/png");
        assert_eq!(objects[1].mime_type, "text/html");
        assert_eq!(objects[1].size, 13);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_objects(&dir.path().join("nope")).unwrap().is_empty());
    }
}
