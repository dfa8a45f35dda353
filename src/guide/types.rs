use serde::{Deserialize, Serialize};

/// Article id carried by section-level entries.
pub const SECTION_LEVEL_ARTICLE: &str = "0";

/// One addressable unit of the reference guide: a section body
/// (`art_id == "0"`) or a numbered article inside a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideEntry {
    pub chap_id: String,
    pub chap_name: Option<String>,
    pub sec_id: String,
    pub sec_name: Option<String>,
    pub art_id: String,
    pub content: String,
}

impl GuideEntry {
    /// Stable index id, e.g. `7-1-0`.
    pub fn doc_id(&self) -> String {
        format!("{}-{}-{}", self.chap_id, self.sec_id, self.art_id)
    }
}
