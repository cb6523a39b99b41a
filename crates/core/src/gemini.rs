use crate::http::{decode_body, join_url, read_success_body};
use crate::traits::AnswerSynthesizer;
use crate::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const BACKEND: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiSynthesizer {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl GeminiSynthesizer {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_client(Client::new(), base_url, model, api_key)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn generate_url(&self) -> String {
        join_url(
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", self.model),
        )
    }
}

#[async_trait]
impl AnswerSynthesizer for GeminiSynthesizer {
    async fn synthesize(
        &self,
        question: &str,
        context: &str,
        source_label: &str,
    ) -> Result<String, ServiceError> {
        info!(model = %self.model, source = source_label, "requesting answer synthesis");

        let prompt = build_prompt(question, context, source_label);
        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await?;

        let body = read_success_body(BACKEND, response).await?;
        let parsed: GenerateContentResponse = decode_body(BACKEND, &body)?;
        let answer = parsed.first_text().ok_or_else(|| {
            ServiceError::parse(BACKEND, "missing candidates[0].content.parts[0].text")
        })?;

        info!(chars = answer.len(), "received generated answer");
        Ok(answer)
    }
}

/// Instruction template restricting the model to the retrieved context.
pub fn build_prompt(question: &str, context: &str, source_label: &str) -> String {
    format!(
        "You are an expert assistant. Your task is to answer the user's question based *only* on \
the following context retrieved from the document named '{source_label}'.
Do not use any outside knowledge. If the answer is not in the context, state that clearly.

**Context:**
---
{context}
---

**User's Question:** {question}

**Answer:**
"
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_synthesizer(server: &MockServer) -> GeminiSynthesizer {
        GeminiSynthesizer::new(server.uri(), DEFAULT_GEMINI_MODEL, "gemini-key")
    }

    #[test]
    fn prompt_embeds_question_context_and_source() {
        let prompt = build_prompt(
            "What is the refund policy?",
            "Refunds are processed within 14 days.",
            "policy.txt",
        );

        assert!(prompt.contains("document named 'policy.txt'"));
        assert!(prompt.contains("---\nRefunds are processed within 14 days.\n---"));
        assert!(prompt.contains("**User's Question:** What is the refund policy?"));
        assert!(prompt.contains("If the answer is not in the context, state that clearly."));
        assert!(prompt.trim_end().ends_with("**Answer:**"));
    }

    #[tokio::test]
    async fn synthesize_returns_first_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "gemini-key"))
            .and(body_string_contains("Refunds are processed within 14 days."))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "Refunds take up to 14 days."}]}},
                    {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = test_synthesizer(&server)
            .synthesize(
                "What is the refund policy?",
                "Refunds are processed within 14 days.",
                "policy.txt",
            )
            .await
            .unwrap();

        assert_eq!(answer, "Refunds take up to 14 days.");
    }

    #[tokio::test]
    async fn synthesize_fails_on_missing_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}})),
            )
            .mount(&server)
            .await;

        let error = test_synthesizer(&server)
            .synthesize("q", "c", "s")
            .await
            .unwrap_err();

        match error {
            ServiceError::Parse { backend, details } => {
                assert_eq!(backend, "gemini");
                assert!(details.contains("candidates[0]"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_does_not_reveal_api_key() {
        let synthesizer =
            GeminiSynthesizer::new("http://127.0.0.1:1", DEFAULT_GEMINI_MODEL, "SECRET-GEMINI-KEY");

        let error = synthesizer.synthesize("q", "c", "s").await.unwrap_err();

        assert!(matches!(error, ServiceError::Http(_)));
        assert!(!error.to_string().contains("SECRET-GEMINI-KEY"));
        assert!(!format!("{error:?}").contains("SECRET-GEMINI-KEY"));
    }

    #[tokio::test]
    async fn synthesize_surfaces_upstream_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let error = test_synthesizer(&server)
            .synthesize("q", "c", "s")
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "API Error: 429 - quota exceeded");
    }
}
