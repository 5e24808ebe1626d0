/// Extraction settings.
#[derive(Clone, Debug, Default)]
pub struct ExtractOptions {
    /// Leading path components dropped from every member name.
    pub strip_components: usize,
}

impl ExtractOptions {
    pub fn strip_components(mut self, count: usize) -> Self {
        self.strip_components = count;
        self
    }
}
