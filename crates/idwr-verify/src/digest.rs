use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{Hasher, Result, Sha256Hasher, VerifyError};

/// Bytes read per chunk when hashing a file.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Lowercase hex SHA-256 of the file at `path`.
///
/// The file is read in [`CHUNK_SIZE`] chunks, so arbitrarily large assets
/// hash in constant memory.
pub fn digest_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let read_err = |source| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha256Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(read_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a computed hex digest against a manifest value, ignoring case.
pub fn digest_matches(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_digest_file_matches_in_memory_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("asset.parquet");
        std::fs::write(&path, b"PAR1").unwrap();

        assert_eq!(digest_file(&path).unwrap(), Sha256Hasher::hex_digest(b"PAR1"));
    }

    #[test]
    fn test_digest_file_spanning_several_chunks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.bin");
        let content: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        assert_eq!(digest_file(&path).unwrap(), Sha256Hasher::hex_digest(&content));
    }

    #[test]
    fn test_digest_file_missing_path() {
        let dir = tempdir().unwrap();
        let err = digest_file(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, VerifyError::Read { .. }));
    }

    #[test]
    fn test_digest_matches_is_case_insensitive() {
        assert!(digest_matches("abcdef", "ABCDEF"));
        assert!(digest_matches("abcdef", " abcdef\n"));
        assert!(!digest_matches("abcdef", "abcdee"));
    }
}
