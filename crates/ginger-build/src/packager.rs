//! Deployment archive packaging

use crate::error::Result;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Permission bits stored on the archived artifact
pub const ARTIFACT_MODE: u32 = 0o755;

/// Wraps a compiled artifact into a single-entry deflate archive.
///
/// Output depends only on the entry name and artifact bytes: the timestamp
/// and permissions are fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Packager;

impl Packager {
    pub fn new() -> Self {
        Self
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(ARTIFACT_MODE)
            .last_modified_time(DateTime::default())
    }

    /// Package the artifact file under an entry named after the function
    pub fn package(&self, function: &str, artifact: &Path) -> Result<Vec<u8>> {
        let bytes = std::fs::read(artifact)?;
        self.package_bytes(function, &bytes)
    }

    pub fn package_bytes(&self, function: &str, artifact: &[u8]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(function, Self::options())?;
        writer.write_all(artifact)?;
        let archive = writer.finish()?.into_inner();
        debug!(
            function,
            artifact_bytes = artifact.len(),
            archive_bytes = archive.len(),
            "Artifact packaged"
        );
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_single_entry_named_after_function() {
        let archive = Packager::new().package_bytes("hello", b"\x7fELF binary").unwrap();
        let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
        assert_eq!(zip.len(), 1);

        let mut entry = zip.by_index(0).unwrap();
        assert_eq!(entry.name(), "hello");
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert_eq!(entry.unix_mode().map(|m| m & 0o777), Some(ARTIFACT_MODE));

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"\x7fELF binary");
    }

    #[test]
    fn test_package_reads_artifact_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("hello");
        std::fs::write(&artifact, b"compiled").unwrap();

        let packager = Packager::new();
        let from_file = packager.package("hello", &artifact).unwrap();
        let from_bytes = packager.package_bytes("hello", b"compiled").unwrap();
        assert_eq!(from_file, from_bytes);
        assert!(packager.package("hello", &dir.path().join("missing")).is_err());
    }

    proptest! {
        #[test]
        fn property_packaging_is_deterministic(
            name in "[a-z][a-z0-9_-]{0,15}",
            bytes in proptest::collection::vec(any::<u8>(), 0..2048),
        ) {
            let packager = Packager::new();
            let first = packager.package_bytes(&name, &bytes).unwrap();
            let second = packager.package_bytes(&name, &bytes).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
