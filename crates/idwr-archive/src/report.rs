use std::path::PathBuf;

#[derive(Clone, Debug, Default)]
pub struct ExtractReport {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub entries:     Vec<ExtractedEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub original_path: PathBuf,
    pub target_path:   PathBuf,
    pub size:          u64,
    /// Lowercase hex SHA-256; `None` for directories.
    pub sha256:        Option<String>,
    pub is_directory:  bool,
}

impl ExtractReport {
    pub(crate) fn record(&mut self, entry: ExtractedEntry) {
        self.entry_count += 1;
        self.total_bytes += entry.size;
        self.entries.push(entry);
    }

    /// Target paths of the regular files written.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries
            .iter()
            .filter(|e| !e.is_directory)
            .map(|e| &e.target_path)
    }
}
