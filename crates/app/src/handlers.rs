//! Request handlers for the upload/ask web surface.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use docqa_core::{Document, QaService, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::server::AppState;

const INDEX_PAGE: &str = include_str!("../static/index.html");
const CONFIG_ERROR_PAGE: &str =
    "<h1>Configuration Error: API keys are missing. Please check your .env file.</h1>";
const CONFIG_ERROR_MESSAGE: &str = "Configuration Error: API keys are missing.";

/// Request body for POST /query.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub question: Option<String>,
}

/// Response body for POST /upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Response {
    if state.service.is_none() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Html(CONFIG_ERROR_PAGE)).into_response();
    }
    Html(INDEX_PAGE).into_response()
}

/// POST /upload
///
/// Input problems are answered with 4xx before any upstream call is made;
/// a body over the upload limit gets 413.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return upload_failure(rejection.status(), rejection.body_text()),
    };

    let document = match read_file_part(&mut multipart).await {
        Ok(FilePart::File(document)) => document,
        Ok(FilePart::Missing) => return upload_failure(StatusCode::BAD_REQUEST, "No file part"),
        Ok(FilePart::Unnamed) => {
            return upload_failure(StatusCode::BAD_REQUEST, "No selected file")
        }
        Err(error) => return upload_failure(error.status(), error.body_text()),
    };

    let Some(service) = state.service.as_ref() else {
        return upload_failure(StatusCode::INTERNAL_SERVER_ERROR, CONFIG_ERROR_MESSAGE);
    };

    match service.ingest_document(&document).await {
        Ok(_) => {
            info!(source = %document.name, "upload stored");
            (
                StatusCode::OK,
                Json(UploadResponse {
                    success: true,
                    message: Some(format!(
                        "'{}' was successfully added to Supermemory.",
                        document.name
                    )),
                    error: None,
                }),
            )
                .into_response()
        }
        Err(error) => {
            warn!(source = %document.name, %error, "upload failed");
            upload_failure(status_for(&error), error.to_string())
        }
    }
}

/// POST /query
///
/// An empty search result is a normal 200 answer, not an error.
pub async fn query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let question = body
        .ok()
        .and_then(|Json(request)| request.question)
        .filter(|question| !question.trim().is_empty());
    let Some(question) = question else {
        return error_response(StatusCode::BAD_REQUEST, "Question is required.");
    };

    let Some(service) = state.service.as_ref() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, CONFIG_ERROR_MESSAGE);
    };

    answer_question(service, &question).await
}

async fn answer_question(service: &QaService, question: &str) -> Response {
    match service.answer(question).await {
        Ok(answer) => (
            StatusCode::OK,
            Json(AnswerResponse {
                answer: answer.into_text(),
            }),
        )
            .into_response(),
        Err(error) => {
            warn!(%error, "query failed");
            error_response(status_for(&error), error.to_string())
        }
    }
}

enum FilePart {
    Missing,
    Unnamed,
    File(Document),
}

/// Finds the first field named `file` that carries a filename.
async fn read_file_part(multipart: &mut Multipart) -> Result<FilePart, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            return Ok(FilePart::Unnamed);
        }

        let bytes = field.bytes().await?;
        return Ok(FilePart::File(Document::new(file_name, bytes.to_vec())));
    }

    Ok(FilePart::Missing)
}

fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn upload_failure(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(UploadResponse {
            success: false,
            message: None,
            error: Some(error.into()),
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}
