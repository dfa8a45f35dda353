use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod memory;
pub mod opensearch;
pub mod schema;

pub use self::memory::InMemoryIndex;
pub use self::opensearch::OpenSearchClient;

/// One document to index (or replace) under an explicit id.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    pub index: String,
    pub id: String,
    pub source: Value,
}

impl BulkAction {
    pub fn new(index: &str, id: &str, source: Value) -> Self {
        Self {
            index: index.to_string(),
            id: id.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub id: String,
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-item results of one bulk request, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub items: Vec<ItemOutcome>,
}

impl BulkOutcome {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|i| !i.is_ok())
    }
}

/// The operations the ingestion jobs need from a search cluster.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn index_exists(&self, index: &str) -> Result<bool>;

    async fn create_index(&self, index: &str, body: &Value) -> Result<()>;

    /// Adds fields to an existing index mapping.
    async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<()>;

    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkOutcome>;

    /// Distinct values of a keyword field, at most `size` of them.
    async fn distinct_values(&self, index: &str, field: &str, size: usize) -> Result<Vec<String>>;

    /// Sets `target_field` to `value` on every document whose `term_field`
    /// equals `term_value`. Returns the number of updated documents.
    async fn update_by_term(
        &self,
        index: &str,
        term_field: &str,
        term_value: &str,
        target_field: &str,
        value: &Value,
    ) -> Result<u64>;
}

/// Creates `index` unless it already exists. Returns whether it was created.
pub async fn ensure_index(store: &dyn SearchIndex, index: &str, body: &Value) -> Result<bool> {
    if store.index_exists(index).await? {
        log::debug!("Index {} already exists", index);
        return Ok(false);
    }
    store.create_index(index, body).await?;
    log::info!("Created index {}", index);
    Ok(true)
}
