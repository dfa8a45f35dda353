use anyhow::{anyhow, Result};
use std::path::Path;

use crate::guide::{scan_lines, GuideEntry};
use crate::search::{ensure_index, schema, BulkAction, BulkOutcome, SearchIndex};
use crate::utils::encoding::read_text_file;
use crate::utils::jsonl::JsonlWriter;

pub const GUIDE_INDEX: &str = "risk_standard";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideStats {
    pub entries: usize,
    pub indexed: usize,
    pub failed: usize,
}

/// Entries of the extracted guide text at `path`.
pub fn read_guide(path: &Path) -> Result<Vec<GuideEntry>> {
    if !path.is_file() {
        return Err(anyhow!("Guide text {:?} does not exist", path));
    }
    let text = read_text_file(path)?;
    let entries = scan_lines(text.lines());
    log::info!("Scanned {} guide entries from {:?}", entries.len(), path);
    Ok(entries)
}

pub fn guide_actions(entries: &[GuideEntry]) -> Result<Vec<BulkAction>> {
    entries
        .iter()
        .map(|entry| {
            Ok(BulkAction::new(
                GUIDE_INDEX,
                &entry.doc_id(),
                serde_json::to_value(entry)?,
            ))
        })
        .collect()
}

/// Scans the guide and writes every entry in one bulk request.
pub async fn ingest_guide(
    path: &Path,
    store: &dyn SearchIndex,
    output: Option<&mut JsonlWriter>,
) -> Result<GuideStats> {
    let entries = read_guide(path)?;
    if let Some(writer) = output {
        for entry in &entries {
            writer.write(entry)?;
        }
    }

    ensure_index(store, GUIDE_INDEX, &schema::guide_index_body()).await?;
    let actions = guide_actions(&entries)?;
    let outcome = match store.bulk(&actions).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Bulk request for the guide failed: {:#}", e);
            return Ok(GuideStats {
                entries: entries.len(),
                indexed: 0,
                failed: actions.len(),
            });
        }
    };
    log_failures(&outcome);

    Ok(GuideStats {
        entries: entries.len(),
        indexed: outcome.succeeded(),
        failed: outcome.failed(),
    })
}

fn log_failures(outcome: &BulkOutcome) {
    for item in outcome.failures() {
        log::error!("Failed to index guide entry {}: {}", item.id, item.error.as_deref().unwrap_or(""));
    }
}
