use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("API Error: {status} - {body}")]
    Upstream {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("Could not parse the response from {backend}. Error: {details}")]
    Parse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Request URLs can carry credentials, so they are stripped before the
/// error is displayed or returned to a caller.
impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.without_url())
    }
}

impl ServiceError {
    pub fn parse(backend: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::Parse {
            backend: backend.into(),
            details: details.to_string(),
        }
    }

    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid url for {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("unknown memory adapter '{0}' (expected 'json' or 'file-upload')")]
    UnknownAdapter(String),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}
