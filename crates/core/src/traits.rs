use crate::{Document, MemoryAck, SearchResult, ServiceError};
use async_trait::async_trait;

#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn ingest(&self, document: &Document) -> Result<MemoryAck, ServiceError>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ServiceError>;
}

#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        question: &str,
        context: &str,
        source_label: &str,
    ) -> Result<String, ServiceError>;
}
