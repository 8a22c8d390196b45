//! Thin REST client for an OpenSearch-compatible vector index.
//!
//! Uses the plain HTTP API (index create, `_doc` upserts, `_search` with a
//! `knn` clause and terms aggregations) so the same code runs against managed
//! clusters and local single-node containers.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::errors::retrieval_error::RetrievalError;
use crate::structs::retrieval_config::RetrievalConfig;
use crate::structs::search_hit::{ChunkRecord, SearchHit, SourceStats};

/// Embedding dimensionality of the index mapping (Titan text embeddings).
pub const EMBEDDING_DIM: usize = 1536;

/// Client bound to one index on one cluster.
pub struct VectorIndex {
    client: reqwest::Client,
    index_url: String,
}

impl VectorIndex {
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                RetrievalError::InvalidFormat {
                    var: "OPENSEARCH_API_KEY",
                    reason: "contains characters not valid in a header",
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            index_url: format!("{}/{}", config.endpoint, config.index),
        })
    }

    /// Creates the index with the knn mapping if it does not exist yet.
    pub async fn ensure_index(&self) -> Result<(), RetrievalError> {
        let head = self.client.head(&self.index_url).send().await?;
        match head.status() {
            StatusCode::OK => return Ok(()),
            StatusCode::NOT_FOUND => {}
            status => {
                return Err(RetrievalError::HttpStatus {
                    status,
                    url: self.index_url.clone(),
                    snippet: String::new(),
                });
            }
        }

        info!(target: "retrieval", url = %self.index_url, "creating vector index");
        let resp = self
            .client
            .put(&self.index_url)
            .json(&index_mapping())
            .send()
            .await?;
        self.expect_success(resp).await?;
        Ok(())
    }

    /// Upserts one chunk document, keyed by its chunk id.
    pub async fn index_chunk(&self, chunk: &ChunkRecord) -> Result<(), RetrievalError> {
        let url = format!("{}/_doc/{}", self.index_url, chunk.chunk_id);
        let resp = self.client.put(&url).json(chunk).send().await?;
        self.expect_success(resp).await?;
        debug!(target: "retrieval", chunk_id = %chunk.chunk_id, "indexed chunk");
        Ok(())
    }

    /// knn search over chunk embeddings, optionally restricted to sources.
    pub async fn knn_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        source_filter: Option<&[String]>,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        let url = format!("{}/_search", self.index_url);
        let body = build_knn_query(embedding, top_k, source_filter);
        let resp = self.client.post(&url).json(&body).send().await?;
        let doc: Value = self.expect_success(resp).await?;
        parse_hits(&doc)
    }

    /// Per-source document counts via a terms aggregation.
    pub async fn source_stats(&self) -> Result<SourceStats, RetrievalError> {
        let url = format!("{}/_search", self.index_url);
        let body = json!({
            "size": 0,
            "aggs": {
                "sources": { "terms": { "field": "source", "size": 20 } }
            }
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        let doc: Value = self.expect_success(resp).await?;
        parse_source_stats(&doc)
    }

    /* --- Internals --- */

    async fn expect_success(&self, resp: reqwest::Response) -> Result<Value, RetrievalError> {
        let status = resp.status();
        let url = resp.url().to_string();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(240).collect();
            return Err(RetrievalError::HttpStatus {
                status,
                url,
                snippet,
            });
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| RetrievalError::Decode(e.to_string()))
    }
}

/// Index settings and mapping for hnsw-backed knn over 1536-dim vectors.
fn index_mapping() -> Value {
    json!({
        "settings": {
            "index": { "knn": true }
        },
        "mappings": {
            "properties": {
                "embedding": {
                    "type": "knn_vector",
                    "dimension": EMBEDDING_DIM,
                    "method": {
                        "name": "hnsw",
                        "space_type": "cosinesimil",
                        "engine": "nmslib"
                    }
                },
                "text":        { "type": "text" },
                "document_id": { "type": "keyword" },
                "chunk_id":    { "type": "keyword" },
                "chunk_index": { "type": "integer" },
                "source":      { "type": "keyword" },
                "source_url":  { "type": "keyword" },
                "title":       { "type": "text" },
                "timestamp":   { "type": "date" }
            }
        }
    })
}

/// Builds the `_search` body. Without a filter this is a plain knn clause;
/// with one, the knn clause moves under `bool.must` next to a terms filter.
pub fn build_knn_query(embedding: &[f32], top_k: usize, source_filter: Option<&[String]>) -> Value {
    let knn = json!({
        "knn": {
            "embedding": {
                "vector": embedding,
                "k": top_k
            }
        }
    });

    let query = match source_filter {
        Some(sources) if !sources.is_empty() => json!({
            "bool": {
                "must": [knn],
                "filter": [{ "terms": { "source": sources } }]
            }
        }),
        _ => knn,
    };

    json!({
        "size": top_k,
        "query": query,
        "_source": ["text", "title", "source", "source_url", "document_id"]
    })
}

fn parse_hits(doc: &Value) -> Result<Vec<SearchHit>, RetrievalError> {
    let hits = doc
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| RetrievalError::Decode("missing hits.hits".to_string()))?;

    let mut out = Vec::with_capacity(hits.len());
    for hit in hits {
        let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
        let source = hit
            .get("_source")
            .ok_or_else(|| RetrievalError::Decode("hit without _source".to_string()))?;
        out.push(SearchHit {
            text: str_field(source, "text"),
            title: str_field(source, "title"),
            source: str_field(source, "source"),
            source_url: str_field(source, "source_url"),
            document_id: str_field(source, "document_id"),
            score,
        });
    }
    Ok(out)
}

fn parse_source_stats(doc: &Value) -> Result<SourceStats, RetrievalError> {
    let total = doc
        .pointer("/hits/total/value")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let buckets = doc
        .pointer("/aggregations/sources/buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| RetrievalError::Decode("missing sources aggregation".to_string()))?;

    let mut sources = BTreeMap::new();
    for bucket in buckets {
        let key = str_field(bucket, "key");
        let count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);
        sources.insert(key, count);
    }

    Ok(SourceStats {
        sources,
        total_documents: total,
    })
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
