use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A sibling path reserved for writing `destination` in place.
///
/// Data is streamed into [`StagedFile::path`] and moved over the destination
/// with a single rename on [`StagedFile::commit`]. Dropping an uncommitted
/// stage removes whatever was written.
#[derive(Debug)]
pub struct StagedFile {
    staging:     PathBuf,
    destination: PathBuf,
    committed:   bool,
}

impl StagedFile {
    pub fn new(destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let parent = destination
            .parent()
            .ok_or_else(|| Error::NoParent(destination.clone()))?;
        let name = destination
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::NoFileName(destination.clone()))?;

        let staging = parent.join(format!(".{name}.{}.part", uuid::Uuid::new_v4()));

        Ok(Self {
            staging,
            destination,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path { &self.staging }

    pub fn destination(&self) -> &Path { &self.destination }

    pub fn commit(mut self) -> Result<PathBuf> {
        fs::rename(&self.staging, &self.destination).map_err(|e| Error::Rename {
            from:   self.staging.clone(),
            to:     self.destination.clone(),
            source: e,
        })?;
        self.committed = true;
        Ok(self.destination.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.staging);
        }
    }
}
