//! Zip archive extractor.

use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

use super::error::AcquireError;
use super::traits::Extractor;

/// Extracts raw product files from zip archives.
///
/// Only members whose extension matches `raw_extension` are written; their
/// directory structure inside the archive is flattened.
#[derive(Debug, Clone)]
pub struct ZipExtractor {
    raw_extension: String,
}

impl ZipExtractor {
    pub fn new(raw_extension: impl Into<String>) -> Self {
        Self {
            raw_extension: raw_extension.into().trim_start_matches('.').to_string(),
        }
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.raw_extension))
    }

    fn extract_blocking(&self, archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, AcquireError> {
        let file = File::open(archive)?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| AcquireError::decode(archive, format!("failed to open archive: {e}")))?;

        std::fs::create_dir_all(dest_dir)?;

        let mut extracted = Vec::new();
        for index in 0..zip.len() {
            let mut member = zip
                .by_index(index)
                .map_err(|e| AcquireError::decode(archive, format!("unreadable member {index}: {e}")))?;
            if member.is_dir() {
                continue;
            }

            let Some(name) = member.enclosed_name().map(|p| p.to_path_buf()) else {
                return Err(AcquireError::decode(
                    archive,
                    format!("member {} escapes the archive", member.name()),
                ));
            };
            if !self.matches_extension(&name) {
                continue;
            }
            let Some(file_name) = name.file_name() else {
                continue;
            };

            let target = dest_dir.join(file_name);
            let mut out = BufWriter::new(File::create(&target)?);
            io::copy(&mut member, &mut out).map_err(|e| {
                if e.kind() == io::ErrorKind::InvalidData {
                    AcquireError::decode(archive, format!("corrupt member {}: {e}", name.display()))
                } else {
                    AcquireError::Io(e)
                }
            })?;
            debug!(member = %name.display(), "Extracted raw product");
            extracted.push(target);
        }

        if extracted.is_empty() {
            return Err(AcquireError::decode(
                archive,
                format!("no .{} files found", self.raw_extension),
            ));
        }

        extracted.sort();
        Ok(extracted)
    }
}

#[async_trait]
impl Extractor for ZipExtractor {
    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, AcquireError> {
        let this = self.clone();
        let archive = archive.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();
        tokio::task::spawn_blocking(move || this.extract_blocking(&archive, &dest_dir))
            .await
            .map_err(|e| AcquireError::Io(io::Error::other(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in members {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[tokio::test]
    async fn test_extracts_only_matching_members_sorted() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("product.zip");
        write_zip(
            &archive,
            &[
                ("manifest.xml", b"<xml/>"),
                ("data/MSG4-B.nat", b"second"),
                ("MSG4-A.NAT", b"first"),
            ],
        );
        let dest = temp.path().join("out");

        let files = ZipExtractor::new("nat").extract(&archive, &dest).await.unwrap();

        assert_eq!(files, vec![dest.join("MSG4-A.NAT"), dest.join("MSG4-B.nat")]);
        assert_eq!(std::fs::read(&files[1]).unwrap(), b"second");
        assert!(!dest.join("manifest.xml").exists());
    }

    #[tokio::test]
    async fn test_archive_without_raw_files_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("product.zip");
        write_zip(&archive, &[("manifest.xml", b"<xml/>")]);

        let err = ZipExtractor::new(".nat")
            .extract(&archive, &temp.path().join("out"))
            .await
            .unwrap_err();

        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_garbage_archive_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("product.zip");
        std::fs::write(&archive, b"this is not a zip file").unwrap();

        let err = ZipExtractor::new("nat")
            .extract(&archive, &temp.path().join("out"))
            .await
            .unwrap_err();

        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_missing_archive_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = ZipExtractor::new("nat")
            .extract(&temp.path().join("missing.zip"), &temp.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::Io(_)));
    }
}
