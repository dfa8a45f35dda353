use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Table,
}

/// One unit of extracted section content, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub content: String,
}

impl ContentItem {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Text,
            content: content.into(),
        }
    }

    pub fn table(content: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Table,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub sec_id: String,
    pub sec_title: String,
    pub sec_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub doc_name: String,
    pub doc_code: String,
    pub pub_date: String,
    pub corp_code: String,
    pub corp_name: String,
    pub induty_code: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The first `TITLE` names a subtype that is never indexed.
    ExcludedSubtype(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ExcludedSubtype(title) => write!(f, "excluded document subtype '{}'", title),
        }
    }
}

/// Result of assembling one filing. Parse failures are reported as `Err`
/// by the assembler, so a skip is never confused with a broken document.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    Record(DocumentRecord),
    Skipped(SkipReason),
}

impl Assembled {
    pub fn record(self) -> Option<DocumentRecord> {
        match self {
            Assembled::Record(record) => Some(record),
            Assembled::Skipped(_) => None,
        }
    }
}
