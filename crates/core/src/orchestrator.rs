use crate::config::{AppConfig, MemoryAdapter};
use crate::gemini::GeminiSynthesizer;
use crate::stores::{SupermemoryFileStore, SupermemoryStore};
use crate::traits::{AnswerSynthesizer, MemoryStore};
use crate::{Answer, ConfigError, Document, MemoryAck, ServiceError};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Ingest and question-answering flow over one memory adapter and one
/// answer synthesizer. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct QaService {
    memory: Arc<dyn MemoryStore>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
}

impl QaService {
    pub fn from_parts(
        memory: Arc<dyn MemoryStore>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
    ) -> Self {
        Self {
            memory,
            synthesizer,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let supermemory_key = config.supermemory_key()?;
        let gemini_key = config.gemini_key()?;

        let client = Client::builder()
            .user_agent(concat!("docqa/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let memory: Arc<dyn MemoryStore> = match config.memory_adapter {
            MemoryAdapter::Json => Arc::new(SupermemoryStore::with_client(
                client.clone(),
                &config.supermemory_base_url,
                supermemory_key,
            )),
            MemoryAdapter::FileUpload => Arc::new(SupermemoryFileStore::with_client(
                client.clone(),
                &config.supermemory_base_url,
                supermemory_key,
            )),
        };
        let synthesizer = Arc::new(GeminiSynthesizer::with_client(
            client,
            &config.gemini_base_url,
            &config.gemini_model,
            gemini_key,
        ));

        info!(adapter = %config.memory_adapter, model = %config.gemini_model, "qa service configured");
        Ok(Self::from_parts(memory, synthesizer))
    }

    pub async fn ingest_document(&self, document: &Document) -> Result<MemoryAck, ServiceError> {
        if document.name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "document name is empty".to_string(),
            ));
        }

        self.memory.ingest(document).await
    }

    /// Answers from the first chunk of the top search result. An empty result
    /// list or a top result without chunks yields [`Answer::NoInformation`]
    /// and the synthesizer is not called.
    pub async fn answer(&self, question: &str) -> Result<Answer, ServiceError> {
        if question.trim().is_empty() {
            return Err(ServiceError::InvalidArgument("question is empty".to_string()));
        }

        let results = self.memory.search(question).await?;
        let Some(top) = results.first() else {
            info!("no search results");
            return Ok(Answer::NoInformation);
        };
        let Some(chunk) = top.first_chunk() else {
            info!(source = top.source_label(), "top search result has no chunks");
            return Ok(Answer::NoInformation);
        };

        let text = self
            .synthesizer
            .synthesize(question, &chunk.content, top.source_label())
            .await?;

        Ok(Answer::Generated(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SearchChunk, SearchResult, NO_INFORMATION_ANSWER};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeMemory {
        results: Vec<SearchResult>,
        fail_status: Option<u16>,
        ingested: Mutex<Vec<String>>,
        searches: AtomicUsize,
    }

    #[derive(Default)]
    struct FakeSynthesizer {
        calls: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl MemoryStore for FakeMemory {
        async fn ingest(&self, document: &Document) -> Result<MemoryAck, ServiceError> {
            if let Some(status) = self.fail_status {
                return Err(ServiceError::Upstream {
                    backend: "supermemory".to_string(),
                    status,
                    body: "rejected".to_string(),
                });
            }
            self.ingested.lock().unwrap().push(document.name.clone());
            Ok(MemoryAck::from_value(serde_json::json!({"id": "mem_1"})))
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, ServiceError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.clone())
        }
    }

    #[async_trait]
    impl AnswerSynthesizer for FakeSynthesizer {
        async fn synthesize(
            &self,
            question: &str,
            context: &str,
            source_label: &str,
        ) -> Result<String, ServiceError> {
            self.calls.lock().unwrap().push((
                question.to_string(),
                context.to_string(),
                source_label.to_string(),
            ));
            Ok("Refunds take up to 14 days.".to_string())
        }
    }

    fn result(title: Option<&str>, chunks: &[&str]) -> SearchResult {
        SearchResult {
            title: title.map(str::to_string),
            chunks: chunks
                .iter()
                .map(|content| SearchChunk {
                    content: content.to_string(),
                    ..SearchChunk::default()
                })
                .collect(),
            ..SearchResult::default()
        }
    }

    fn service(memory: FakeMemory) -> (QaService, Arc<FakeMemory>, Arc<FakeSynthesizer>) {
        let memory = Arc::new(memory);
        let synthesizer = Arc::new(FakeSynthesizer::default());
        (
            QaService::from_parts(memory.clone(), synthesizer.clone()),
            memory,
            synthesizer,
        )
    }

    #[tokio::test]
    async fn answer_uses_first_chunk_and_title_of_top_result() {
        let (service, _memory, synthesizer) = service(FakeMemory {
            results: vec![
                result(
                    Some("policy.txt"),
                    &["Refunds are processed within 14 days.", "Second chunk."],
                ),
                result(Some("other.txt"), &["Unrelated."]),
            ],
            ..FakeMemory::default()
        });

        let answer = service.answer("What is the refund policy?").await.unwrap();

        assert_eq!(answer, Answer::Generated("Refunds take up to 14 days.".to_string()));
        let calls = synthesizer.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                "What is the refund policy?".to_string(),
                "Refunds are processed within 14 days.".to_string(),
                "policy.txt".to_string(),
            )]
        );
    }

    #[tokio::test]
    async fn empty_results_yield_no_information_without_synthesis() {
        let (service, memory, synthesizer) = service(FakeMemory::default());

        let answer = service.answer("anything?").await.unwrap();

        assert_eq!(answer, Answer::NoInformation);
        assert_eq!(answer.text(), NO_INFORMATION_ANSWER);
        assert_eq!(memory.searches.load(Ordering::SeqCst), 1);
        assert!(synthesizer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn top_result_without_chunks_yields_no_information() {
        let (service, _memory, synthesizer) = service(FakeMemory {
            results: vec![
                result(Some("empty.txt"), &[]),
                result(Some("later.txt"), &["has content"]),
            ],
            ..FakeMemory::default()
        });

        let answer = service.answer("anything?").await.unwrap();

        assert_eq!(answer, Answer::NoInformation);
        assert!(synthesizer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn untitled_result_uses_default_source_label() {
        let (service, _memory, synthesizer) = service(FakeMemory {
            results: vec![result(None, &["context"])],
            ..FakeMemory::default()
        });

        service.answer("question?").await.unwrap();

        let calls = synthesizer.calls.lock().unwrap();
        assert_eq!(calls[0].2, crate::DEFAULT_SOURCE_LABEL);
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_search() {
        let (service, memory, _synthesizer) = service(FakeMemory::default());

        let error = service.answer("   ").await.unwrap_err();

        assert!(matches!(error, ServiceError::InvalidArgument(_)));
        assert_eq!(memory.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ingest_propagates_upstream_errors() {
        let (service, memory, _synthesizer) = service(FakeMemory {
            fail_status: Some(500),
            ..FakeMemory::default()
        });

        let error = service
            .ingest_document(&Document::new("a.txt", "x"))
            .await
            .unwrap_err();

        assert_eq!(error.upstream_status(), Some(500));
        assert!(memory.ingested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ingest_rejects_unnamed_documents() {
        let (service, memory, _synthesizer) = service(FakeMemory::default());

        let error = service
            .ingest_document(&Document::new("", "x"))
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::InvalidArgument(_)));
        assert!(memory.ingested.lock().unwrap().is_empty());
    }

    #[test]
    fn from_config_requires_both_keys() {
        let config = AppConfig {
            supermemory_api_key: Some("sm".to_string()),
            ..AppConfig::default()
        };
        assert!(matches!(
            QaService::from_config(&config),
            Err(ConfigError::MissingCredential("GEMINI_API_KEY"))
        ));

        let config = AppConfig {
            gemini_api_key: Some("gm".to_string()),
            memory_adapter: MemoryAdapter::FileUpload,
            ..config
        };
        assert!(QaService::from_config(&config).is_ok());
    }
}
