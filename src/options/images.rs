use serde::{Deserialize, Serialize};

/// Input file naming: `{prefix}{N}.{extension}` for `N` in
/// `0..candidate_count`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageOptions {
    /// File name stem before the index.
    pub prefix: String,
    /// File extension without the dot.
    pub extension: String,
    /// How many indices to probe.
    pub candidate_count: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            prefix: "image".into(),
            extension: "png".into(),
            candidate_count: 10,
        }
    }
}

impl ImageOptions {
    /// File name for candidate `index`.
    #[must_use]
    pub fn file_name(&self, index: u32) -> String {
        format!("{}{index}.{}", self.prefix, self.extension)
    }
}
