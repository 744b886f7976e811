use serde::{Deserialize, Serialize};

/// A snapshot of one file's full text as last submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    uri: String,
    text: String,
    version: i32,
}

impl Document {
    pub fn new(uri: impl Into<String>, text: impl Into<String>, version: i32) -> Self {
        Self {
            uri: uri.into(),
            text: text.into(),
            version,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Size in bytes of the document
    pub fn size(&self) -> usize {
        self.text.len()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}
