use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use super::{BulkAction, BulkOutcome, ItemOutcome, SearchIndex};

#[derive(Debug, Default, Clone)]
struct StoredIndex {
    body: Value,
    mappings: Vec<Value>,
    docs: BTreeMap<String, Value>,
}

/// Search index kept in process memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    indices: RwLock<HashMap<String, StoredIndex>>,
    rejected_ids: HashSet<String>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk items with these ids are reported as failed.
    pub fn rejecting<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected_ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.read(|indices| indices.get(index).and_then(|i| i.docs.get(id).cloned()))
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.read(|indices| indices.get(index).map_or(0, |i| i.docs.len()))
    }

    pub fn mappings(&self, index: &str) -> Vec<Value> {
        self.read(|indices| indices.get(index).map(|i| i.mappings.clone()).unwrap_or_default())
    }

    pub fn settings(&self, index: &str) -> Option<Value> {
        self.read(|indices| indices.get(index).map(|i| i.body.clone()))
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<String, StoredIndex>) -> T) -> T {
        let guard = self.indices.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut HashMap<String, StoredIndex>) -> T) -> T {
        let mut guard = self.indices.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.read(|indices| indices.contains_key(index)))
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<()> {
        self.write(|indices| {
            if indices.contains_key(index) {
                return Err(anyhow!("resource_already_exists_exception: {}", index));
            }
            indices.insert(
                index.to_string(),
                StoredIndex {
                    body: body.clone(),
                    ..StoredIndex::default()
                },
            );
            Ok(())
        })
    }

    async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<()> {
        self.write(|indices| {
            let stored = indices
                .get_mut(index)
                .ok_or_else(|| anyhow!("index_not_found_exception: {}", index))?;
            stored.mappings.push(mapping.clone());
            Ok(())
        })
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkOutcome> {
        self.write(|indices| {
            let items = actions
                .iter()
                .map(|action| {
                    let error = if self.rejected_ids.contains(&action.id) {
                        Some("rejected".to_string())
                    } else {
                        // Bulk indexing auto-creates missing indices.
                        indices
                            .entry(action.index.clone())
                            .or_default()
                            .docs
                            .insert(action.id.clone(), action.source.clone());
                        None
                    };
                    ItemOutcome {
                        id: action.id.clone(),
                        error,
                    }
                })
                .collect();
            Ok(BulkOutcome { items })
        })
    }

    async fn distinct_values(&self, index: &str, field: &str, size: usize) -> Result<Vec<String>> {
        Ok(self.read(|indices| {
            indices
                .get(index)
                .map(|stored| {
                    stored
                        .docs
                        .values()
                        .filter_map(|doc| doc.get(field).and_then(Value::as_str))
                        .map(str::to_string)
                        .collect::<BTreeSet<_>>()
                        .into_iter()
                        .take(size)
                        .collect()
                })
                .unwrap_or_default()
        }))
    }

    async fn update_by_term(
        &self,
        index: &str,
        term_field: &str,
        term_value: &str,
        target_field: &str,
        value: &Value,
    ) -> Result<u64> {
        self.write(|indices| {
            let stored = indices
                .get_mut(index)
                .ok_or_else(|| anyhow!("index_not_found_exception: {}", index))?;
            let mut updated = 0;
            for doc in stored.docs.values_mut() {
                if doc.get(term_field).and_then(Value::as_str) != Some(term_value) {
                    continue;
                }
                if let Some(object) = doc.as_object_mut() {
                    object.insert(target_field.to_string(), value.clone());
                    updated += 1;
                }
            }
            Ok(updated)
        })
    }
}
