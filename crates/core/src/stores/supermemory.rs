use crate::http::{decode_body, join_url, read_success_body};
use crate::stores::BACKEND;
use crate::traits::MemoryStore;
use crate::{Document, MemoryAck, SearchOptions, SearchResponse, SearchResult, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

/// Memory adapter that posts document text as JSON to `/memories` and
/// searches `/search` for the single best match.
pub struct SupermemoryStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl SupermemoryStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }
}

#[async_trait]
impl MemoryStore for SupermemoryStore {
    async fn ingest(&self, document: &Document) -> Result<MemoryAck, ServiceError> {
        info!(source = %document.name, bytes = document.bytes.len(), "sending document content as json");

        let response = self
            .client
            .post(join_url(&self.base_url, "memories"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "content": document.text(),
                "source": document.name,
            }))
            .send()
            .await?;

        let body = read_success_body(BACKEND, response).await?;
        let ack = MemoryAck::from_value(decode_body(BACKEND, &body)?);
        info!(source = %document.name, id = ?ack.id, status = ?ack.status, "document accepted");
        Ok(ack)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ServiceError> {
        info!(query, "searching memory service");

        let response = self
            .client
            .post(join_url(&self.base_url, "search"))
            .bearer_auth(&self.api_key)
            .json(&SearchOptions::top_match(query))
            .send()
            .await?;

        let body = read_success_body(BACKEND, response).await?;
        let parsed: SearchResponse = decode_body(BACKEND, &body)?;
        info!(result_count = parsed.results.len(), "received search results");
        Ok(parsed.results)
    }
}
