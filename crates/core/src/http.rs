use crate::ServiceError;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Reads the body of an upstream response, turning any non-2xx status into
/// [`ServiceError::Upstream`] carrying the status code and body text.
pub(crate) async fn read_success_body(
    backend: &str,
    response: Response,
) -> Result<String, ServiceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(backend, status = status.as_u16(), "upstream request failed");
        return Err(ServiceError::Upstream {
            backend: backend.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

pub(crate) fn decode_body<T: DeserializeOwned>(backend: &str, body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|error| ServiceError::parse(backend, error))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
