use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::dart::industry::IndustryLookup;
use crate::dart::parsing::{assemble_document, Assembled, DocumentRecord};
use crate::dart::report::ReportKind;
use crate::search::{ensure_index, schema, BulkAction, SearchIndex};
use crate::utils::encoding::read_text_file;
use crate::utils::jsonl::JsonlWriter;
use crate::utils::progress::IngestProgress;

/// Report folders under the report root, in processing order.
pub const REPORT_ROOTS: &[&str] = &["1분기", "3분기", "반기", "사업", "증권"];

/// Documents per bulk request.
pub const BULK_CHUNK_SIZE: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub files: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub parse_failed: usize,
    pub indexed: usize,
    pub index_failed: usize,
    /// Indexed documents per report folder.
    pub per_folder: BTreeMap<String, usize>,
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("xml"))
}

/// All `*.xml` files below `dir`, sorted. A missing directory yields none.
pub fn collect_xml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_xml(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Reads, decodes and assembles one filing.
pub fn parse_report_file(path: &Path, industry: &dyn IndustryLookup) -> Result<Assembled> {
    let raw = read_text_file(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid file name {:?}", path))?;
    assemble_document(&raw, file_name, industry)
}

pub fn index_action(record: &DocumentRecord) -> Result<BulkAction> {
    let kind = ReportKind::from_doc_code(&record.doc_code);
    Ok(BulkAction::new(
        kind.index_name(),
        &record.doc_id,
        serde_json::to_value(record)?,
    ))
}

/// Parses every filing under the report roots and writes the records to
/// their per-kind indices. Only a missing `root` is an error; broken files
/// and failed writes are counted and logged.
pub async fn ingest_reports(
    root: &Path,
    store: &dyn SearchIndex,
    industry: &dyn IndustryLookup,
    mut output: Option<&mut JsonlWriter>,
    progress: &IngestProgress,
) -> Result<ReportStats> {
    if !root.is_dir() {
        return Err(anyhow!("Report directory {:?} does not exist", root));
    }

    let body = schema::report_index_body();
    for index in ReportKind::all_indices() {
        ensure_index(store, index, &body).await?;
    }

    let mut folders = Vec::new();
    for folder in REPORT_ROOTS {
        let dir = root.join(folder);
        if !dir.is_dir() {
            log::warn!("Report folder {:?} not found, skipping", dir);
            continue;
        }
        folders.push((folder.to_string(), collect_xml_files(&dir)?));
    }

    let mut stats = ReportStats {
        files: folders.iter().map(|(_, files)| files.len()).sum(),
        ..ReportStats::default()
    };
    progress.total.start(stats.files as u64, "files");
    progress.index.start(stats.files as u64, "indexed");
    log::info!("Found {} report files under {:?}", stats.files, root);

    let mut batch = Batch::default();
    for (folder, files) in &folders {
        progress.dir.start(files.len() as u64, folder);
        for path in files {
            match parse_report_file(path, industry) {
                Ok(Assembled::Record(record)) => {
                    stats.parsed += 1;
                    if let Some(writer) = output.as_deref_mut() {
                        writer.write(&record)?;
                    }
                    match index_action(&record) {
                        Ok(action) => batch.push(action, folder),
                        Err(e) => {
                            log::error!("Failed to serialise {}: {:#}", record.doc_id, e);
                            stats.parse_failed += 1;
                        }
                    }
                }
                Ok(Assembled::Skipped(reason)) => {
                    log::warn!("Skipping {:?}: {}", path, reason);
                    stats.skipped += 1;
                }
                Err(e) => {
                    log::error!("Failed to parse {:?}: {:#}", path, e);
                    stats.parse_failed += 1;
                }
            }

            if batch.len() >= BULK_CHUNK_SIZE {
                batch.flush(store, &mut stats, progress).await;
            }
            progress.dir.increment(1);
            progress.total.increment(1);
        }
        progress.dir.finish(folder);
    }
    batch.flush(store, &mut stats, progress).await;

    progress.total.finish("done");
    progress.index.finish("done");
    log::info!(
        "Indexed {} documents ({} failed, {} skipped, {} unparseable)",
        stats.indexed,
        stats.index_failed,
        stats.skipped,
        stats.parse_failed
    );
    Ok(stats)
}

/// Pending bulk actions and the folder each came from.
#[derive(Default)]
struct Batch {
    actions: Vec<BulkAction>,
    folders: Vec<String>,
}

impl Batch {
    fn push(&mut self, action: BulkAction, folder: &str) {
        self.actions.push(action);
        self.folders.push(folder.to_string());
    }

    fn len(&self) -> usize {
        self.actions.len()
    }

    async fn flush(&mut self, store: &dyn SearchIndex, stats: &mut ReportStats, progress: &IngestProgress) {
        if self.actions.is_empty() {
            return;
        }
        let actions = std::mem::take(&mut self.actions);
        let folders = std::mem::take(&mut self.folders);

        match store.bulk(&actions).await {
            Ok(outcome) => {
                for (item, folder) in outcome.items.iter().zip(&folders) {
                    match &item.error {
                        None => {
                            stats.indexed += 1;
                            *stats.per_folder.entry(folder.clone()).or_default() += 1;
                        }
                        Some(error) => {
                            log::error!("Failed to index {}: {}", item.id, error);
                            stats.index_failed += 1;
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("Bulk request for {} documents failed: {:#}", actions.len(), e);
                stats.index_failed += actions.len();
            }
        }
        progress.index.increment(actions.len() as u64);
    }
}
