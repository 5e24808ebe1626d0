use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("hash mismatch: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    HashMismatch { expected: Vec<u8>, actual: Vec<u8> },

    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
