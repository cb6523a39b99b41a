use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

pub const NO_INFORMATION_ANSWER: &str =
    "I'm sorry, I couldn't find any information in your documents related to that question.";

pub const DEFAULT_SOURCE_LABEL: &str = "an uploaded document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, crate::ServiceError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                crate::ServiceError::InvalidArgument(format!(
                    "path has no file name: {}",
                    path.display()
                ))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { name, bytes })
    }

    /// UTF-8 view of the payload; invalid byte sequences are dropped.
    pub fn text(&self) -> String {
        self.bytes
            .utf8_chunks()
            .map(|chunk| chunk.valid())
            .collect()
    }
}

/// Acknowledgement returned by the memory service after ingestion.
///
/// The body is opaque: any JSON value is accepted, and `id`/`status` are
/// picked out when they are present as strings or numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryAck {
    pub id: Option<String>,
    pub status: Option<String>,
    pub raw: Value,
}

impl MemoryAck {
    pub fn from_value(raw: Value) -> Self {
        Self {
            id: scalar_field(&raw, "id"),
            status: scalar_field(&raw, "status"),
            raw,
        }
    }
}

fn scalar_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub q: String,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_threshold: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rerank: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_summary: bool,
}

impl SearchOptions {
    /// Single best match, no thresholds.
    pub fn top_match(query: impl Into<String>) -> Self {
        Self {
            q: query.into(),
            limit: 1,
            document_threshold: None,
            chunk_threshold: None,
            rerank: false,
            include_summary: false,
        }
    }

    pub fn reranked(query: impl Into<String>) -> Self {
        Self {
            q: query.into(),
            limit: 3,
            document_threshold: Some(0.5),
            chunk_threshold: Some(0.5),
            rerank: true,
            include_summary: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunks: Vec<SearchChunk>,
}

impl SearchResult {
    pub fn source_label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_SOURCE_LABEL)
    }

    pub fn first_chunk(&self) -> Option<&SearchChunk> {
        self.chunks.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchChunk {
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub is_relevant: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Generated(String),
    NoInformation,
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::NoInformation => NO_INFORMATION_ANSWER,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Answer::Generated(text) => text,
            Answer::NoInformation => NO_INFORMATION_ANSWER.to_string(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
