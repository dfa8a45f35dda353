use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use super::{BulkAction, BulkOutcome, ItemOutcome, SearchIndex};
use crate::core::config::IndexConfig;
use crate::utils::retry::RetryPolicy;

const NDJSON: &str = "application/x-ndjson";

/// REST client for an OpenSearch cluster. Requests rotate over the
/// configured hosts; transport errors, 429 and 5xx answers are retried.
pub struct OpenSearchClient {
    client: Client,
    hosts: Vec<Url>,
    credentials: Option<(String, String)>,
    retry: RetryPolicy,
    next_host: AtomicUsize,
}

impl OpenSearchClient {
    pub fn new(config: &IndexConfig, retry: RetryPolicy) -> Result<Self> {
        if config.hosts.is_empty() {
            return Err(anyhow!("No search hosts configured"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        Ok(Self {
            client,
            hosts: config.hosts.clone(),
            credentials,
            retry,
            next_host: AtomicUsize::new(0),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let host = &self.hosts[self.next_host.fetch_add(1, Ordering::Relaxed) % self.hosts.len()];
        host.join(path)
            .with_context(|| format!("Invalid request path {}", path))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        content_type: &str,
        body: Option<String>,
    ) -> Result<Response> {
        let label = format!("{} {}", method, path);
        self.retry
            .run(&label, move || {
                let method = method.clone();
                let body = body.clone();
                async move {
                    let url = self.url(path)?;
                    log::debug!("{} {}", method, url);
                    let mut request = self
                        .client
                        .request(method, url)
                        .header(reqwest::header::ACCEPT, mime::APPLICATION_JSON.as_ref());
                    if let Some((user, pass)) = &self.credentials {
                        request = request.basic_auth(user, Some(pass));
                    }
                    if let Some(body) = body {
                        request = request
                            .header(reqwest::header::CONTENT_TYPE, content_type)
                            .body(body);
                    }
                    let response = request.send().await?;
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        return Err(anyhow!("Search cluster answered {}", status));
                    }
                    Ok(response)
                }
            })
            .await
    }

    async fn send_json(&self, method: Method, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .send(
                method,
                path,
                mime::APPLICATION_JSON.as_ref(),
                Some(body.to_string()),
            )
            .await?;
        read_json(response, path).await
    }
}

async fn read_json(response: Response, path: &str) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(anyhow!("{} failed with status {}: {}", path, status, text));
    }
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON from {}", path))
}

/// Action and source lines for the `_bulk` endpoint.
pub fn bulk_body(actions: &[BulkAction]) -> String {
    let mut body = String::new();
    for action in actions {
        body.push_str(&json!({ "index": { "_index": action.index, "_id": action.id } }).to_string());
        body.push('\n');
        body.push_str(&action.source.to_string());
        body.push('\n');
    }
    body
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<std::collections::HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

pub fn parse_bulk_response(actions: &[BulkAction], body: &str) -> Result<BulkOutcome> {
    let response: BulkResponse =
        serde_json::from_str(body).context("Invalid bulk response")?;
    let mut items: Vec<ItemOutcome> = response
        .items
        .into_iter()
        .filter_map(|entry| entry.into_values().next())
        .map(|item| {
            let error = match (&item.error, item.status) {
                (Some(err), _) => Some(err.to_string()),
                (None, status) if status >= 300 => Some(format!("status {}", status)),
                _ => None,
            };
            ItemOutcome { id: item.id, error }
        })
        .collect();
    // Actions the cluster did not report back on count as failed.
    for action in actions.iter().skip(items.len()) {
        items.push(ItemOutcome {
            id: action.id.clone(),
            error: Some("missing from bulk response".to_string()),
        });
    }
    Ok(BulkOutcome { items })
}

/// Keys of the `unique` terms aggregation.
pub fn parse_terms_buckets(response: &Value) -> Vec<String> {
    response["aggregations"]["unique"]["buckets"]
        .as_array()
        .map(|buckets| {
            buckets
                .iter()
                .filter_map(|b| match &b["key"] {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl SearchIndex for OpenSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self.send(Method::HEAD, index, "", None).await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(anyhow!("HEAD {} answered {}", index, status)),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<()> {
        let response = self.send_json(Method::PUT, index, body).await?;
        log::debug!("Create {}: {}", index, response);
        Ok(())
    }

    async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<()> {
        let path = format!("{}/_mapping", index);
        let response = self.send_json(Method::PUT, &path, mapping).await?;
        if response["acknowledged"].as_bool() != Some(true) {
            return Err(anyhow!("Mapping update for {} not acknowledged: {}", index, response));
        }
        Ok(())
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<BulkOutcome> {
        if actions.is_empty() {
            return Ok(BulkOutcome::default());
        }
        let response = self
            .send(Method::POST, "_bulk", NDJSON, Some(bulk_body(actions)))
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!("Bulk request failed with status {}: {}", status, text));
        }
        parse_bulk_response(actions, &text)
    }

    async fn distinct_values(&self, index: &str, field: &str, size: usize) -> Result<Vec<String>> {
        let query = json!({
            "size": 0,
            "aggs": { "unique": { "terms": { "field": field, "size": size } } }
        });
        let path = format!("{}/_search", index);
        let response = self.send_json(Method::POST, &path, &query).await?;
        Ok(parse_terms_buckets(&response))
    }

    async fn update_by_term(
        &self,
        index: &str,
        term_field: &str,
        term_value: &str,
        target_field: &str,
        value: &Value,
    ) -> Result<u64> {
        let body = json!({
            "script": {
                "source": format!("ctx._source.{} = params.value", target_field),
                "lang": "painless",
                "params": { "value": value }
            },
            "query": { "term": { term_field: term_value } }
        });
        let path = format!("{}/_update_by_query?conflicts=proceed", index);
        let response = self.send_json(Method::POST, &path, &body).await?;
        Ok(response["updated"].as_u64().unwrap_or(0))
    }
}
