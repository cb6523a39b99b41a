pub mod config;
pub mod error;
pub mod gemini;
mod http;
pub mod models;
pub mod orchestrator;
pub mod stores;
pub mod traits;

pub use config::{
    AppConfig, MemoryAdapter, DEFAULT_GEMINI_BASE_URL, DEFAULT_SUPERMEMORY_BASE_URL,
};
pub use error::{ConfigError, ServiceError};
pub use gemini::{build_prompt, GeminiSynthesizer, DEFAULT_GEMINI_MODEL};
pub use models::{
    Answer, Document, MemoryAck, SearchChunk, SearchOptions, SearchResponse, SearchResult,
    DEFAULT_SOURCE_LABEL, NO_INFORMATION_ANSWER,
};
pub use orchestrator::QaService;
pub use stores::{SupermemoryFileStore, SupermemoryStore};
pub use traits::{AnswerSynthesizer, MemoryStore};
