use crate::http::{decode_body, join_url, read_success_body};
use crate::stores::BACKEND;
use crate::traits::MemoryStore;
use crate::{Document, MemoryAck, SearchOptions, SearchResponse, SearchResult, ServiceError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::info;

/// Memory adapter that uploads raw file bytes tagged with the file name and
/// searches with relevance thresholds and reranking.
pub struct SupermemoryFileStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl SupermemoryFileStore {
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
impl MemoryStore for SupermemoryFileStore {
    async fn ingest(&self, document: &Document) -> Result<MemoryAck, ServiceError> {
        info!(source = %document.name, bytes = document.bytes.len(), "uploading document file");

        let container_tags = serde_json::to_string(&[document.name.as_str()])?;
        let form = Form::new()
            .part(
                "file",
                Part::bytes(document.bytes.clone()).file_name(document.name.clone()),
            )
            .text("containerTags", container_tags);

        let response = self
            .client
            .post(join_url(&self.base_url, "documents/file"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let body = read_success_body(BACKEND, response).await?;
        let ack = MemoryAck::from_value(decode_body(BACKEND, &body)?);
        info!(source = %document.name, id = ?ack.id, status = ?ack.status, "document file accepted");
        Ok(ack)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ServiceError> {
        info!(query, "searching memory service documents");

        let response = self
            .client
            .post(join_url(&self.base_url, "search"))
            .bearer_auth(&self.api_key)
            .json(&SearchOptions::reranked(query))
            .send()
            .await?;

        let body = read_success_body(BACKEND, response).await?;
        let parsed: SearchResponse = decode_body(BACKEND, &body)?;
        info!(result_count = parsed.results.len(), "received search results");
        Ok(parsed.results)
    }
}
