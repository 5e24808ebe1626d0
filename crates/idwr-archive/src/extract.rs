use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use idwr_fs::StagedFile;
use idwr_verify::{Sha256Hasher, VerifiedReader};
use tracing::debug;

use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::report::{ExtractReport, ExtractedEntry};
use crate::sanitize::sanitize_path_with_options;

/// Extract every member of the zip at `archive` into `dest`.
///
/// Member names are sanitized before anything is written; each file is
/// staged beside its target and renamed into place, replacing any file of
/// the same name.
pub fn extract_zip(archive: &Path, dest: &Path, options: &ExtractOptions) -> Result<ExtractReport> {
    let file = File::open(archive).map_err(|source| Error::Open {
        path: archive.to_path_buf(),
        source,
    })?;
    let corrupted = |e: zip::result::ZipError| Error::Corrupted {
        path:   archive.to_path_buf(),
        reason: e.to_string(),
    };

    let mut zip = zip::ZipArchive::new(file).map_err(corrupted)?;
    idwr_fs::ensure_dir(dest)?;

    let mut report = ExtractReport::default();
    for index in 0..zip.len() {
        let mut member = zip.by_index(index).map_err(corrupted)?;
        let name = PathBuf::from(member.name());
        let target = sanitize_path_with_options(&name, dest, options)?.resolved;

        if member.is_dir() {
            idwr_fs::ensure_dir(&target)?;
            report.record(ExtractedEntry {
                original_path: name,
                target_path:   target,
                size:          0,
                sha256:        None,
                is_directory:  true,
            });
            continue;
        }

        if let Some(parent) = target.parent() {
            idwr_fs::ensure_dir(parent)?;
        }
        let (size, sha256) = write_member(&mut member, &target)?;
        debug!(member = %name.display(), size, sha256 = %sha256, "extracted");
        report.record(ExtractedEntry {
            original_path: name,
            target_path: target,
            size,
            sha256: Some(sha256),
            is_directory: false,
        });
    }

    Ok(report)
}

/// Copy one member into place, returning its size and hex SHA-256.
fn write_member(reader: &mut impl io::Read, target: &Path) -> Result<(u64, String)> {
    let failed = |source| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source,
    };

    let staged = StagedFile::new(target)?;
    let mut out = File::create(staged.path()).map_err(failed)?;
    let mut hashing = VerifiedReader::new(reader, Sha256Hasher::new());
    let size = io::copy(&mut hashing, &mut out).map_err(failed)?;
    drop(out);
    staged.commit()?;
    Ok((size, hex::encode(hashing.into_digest())))
}
