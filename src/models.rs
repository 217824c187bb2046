use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PageInfoQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordSummary {
    pub total_count: usize,
    pub top_words: Vec<WordCount>,
}

/// Result of one page-info request. When `error` is non-empty it is the
/// authoritative outcome and `images`/`words` stay at their defaults.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub images: Vec<ImageRecord>,
    pub words: WordSummary,
    pub error: String,
}

impl PageResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}
