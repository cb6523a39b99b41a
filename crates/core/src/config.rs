use crate::ConfigError;
use std::fmt;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_SUPERMEMORY_BASE_URL: &str = "https://api.supermemory.ai/v3";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Which memory-service adapter handles ingestion and search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemoryAdapter {
    /// Document text as JSON to `/memories`, single-result search.
    #[default]
    Json,
    /// Raw file upload with a container tag, thresholded reranked search.
    FileUpload,
}

impl FromStr for MemoryAdapter {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "file-upload" | "file_upload" | "file" => Ok(Self::FileUpload),
            other => Err(ConfigError::UnknownAdapter(other.to_string())),
        }
    }
}

impl fmt::Display for MemoryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::FileUpload => f.write_str("file-upload"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub supermemory_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub supermemory_base_url: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub memory_adapter: MemoryAdapter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supermemory_api_key: None,
            gemini_api_key: None,
            supermemory_base_url: DEFAULT_SUPERMEMORY_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: crate::gemini::DEFAULT_GEMINI_MODEL.to_string(),
            memory_adapter: MemoryAdapter::default(),
        }
    }
}

impl AppConfig {
    pub fn supermemory_key(&self) -> Result<&str, ConfigError> {
        non_empty(self.supermemory_api_key.as_deref())
            .ok_or(ConfigError::MissingCredential("SUPERMEMORY_API_KEY"))
    }

    pub fn gemini_key(&self) -> Result<&str, ConfigError> {
        non_empty(self.gemini_api_key.as_deref()).ok_or(ConfigError::MissingCredential("GEMINI_API_KEY"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.supermemory_key()?;
        self.gemini_key()?;
        parse_url("supermemory base url", &self.supermemory_base_url)?;
        parse_url("gemini base url", &self.gemini_base_url)?;
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })
}
