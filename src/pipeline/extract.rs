//! Extraction: send the PDF to the Gemini API and parse the response into a
//! [`FinancialRecord`].
//!
//! This is the only pipeline stage with network I/O. The whole document goes
//! up in a single `generateContent` request with the PDF attached as base64
//! `inline_data`, so there is no page-level partial success — extraction
//! either yields a record or fails the request.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 5xx from the model API are transient and frequent under load.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids
//! thundering-herd: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s. Auth errors (401/403) and other 4xx are permanent and
//! surface immediately without retrying.
//!
//! ## Response Parsing
//!
//! The model is asked for bare JSON but routinely wraps it in prose or a
//! code fence. [`locate_json_span`] finds the first balanced `{…}` object in
//! the text; failing to find or parse one is fatal for the request — the
//! pipeline never substitutes a default record for a response it could not
//! read.

use crate::config::AnalysisConfig;
use crate::error::CreditsheetError;
use crate::prompts::EXTRACTION_PROMPT;
use crate::record::FinancialRecord;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Base URL of the Gemini REST API.
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// A successful extraction: the parsed record plus token accounting.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The structured financial data the model pulled out of the PDF.
    pub record: FinancialRecord,
    /// Prompt tokens consumed, as reported by the API (0 when unknown).
    pub input_tokens: u64,
    /// Completion tokens generated, as reported by the API (0 when unknown).
    pub output_tokens: u64,
}

/// The extraction seam: anything that turns PDF bytes into an [`Extraction`].
///
/// The production implementation is [`GeminiExtractor`]; tests inject canned
/// implementations via [`crate::config::AnalysisConfig::extractor`].
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract structured financial data from raw PDF bytes.
    ///
    /// Failures are fatal and non-retryable for the request: an unreadable
    /// document, an API error after retries, or a response that could not be
    /// parsed into the expected shape.
    async fn extract(&self, pdf: &[u8]) -> Result<Extraction, CreditsheetError>;
}

/// Extractor backed by the Gemini `generateContent` endpoint.
#[derive(Debug)]
pub struct GeminiExtractor {
    client: reqwest::Client,
    model: String,
    api_key: String,
    prompt: String,
    temperature: f32,
    max_output_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl GeminiExtractor {
    /// Build an extractor from the analysis config.
    ///
    /// The API key comes from `config.api_key`, falling back to the
    /// `GEMINI_API_KEY` environment variable. Missing both is a fatal
    /// configuration error.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, CreditsheetError> {
        let api_key = match config.api_key.clone() {
            Some(key) if !key.is_empty() => key,
            _ => std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or(CreditsheetError::ApiKeyMissing)?,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| CreditsheetError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            api_key,
            prompt: config
                .extraction_prompt
                .clone()
                .unwrap_or_else(|| EXTRACTION_PROMPT.to_string()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }

    fn request_body(&self, pdf: &[u8]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: self.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "application/pdf".to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(pdf),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    /// One API round-trip. Classifies failures into retryable and permanent.
    async fn call_once(&self, body: &GenerateContentRequest) -> Result<Extraction, CallFailure> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CallFailure::Timeout
                } else {
                    CallFailure::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let detail = response.text().await.unwrap_or_default();
            return Err(CallFailure::Permanent(CreditsheetError::AuthError {
                detail: format!("HTTP {status}: {detail}"),
            }));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(CallFailure::RateLimited(retry_after));
        }
        if status.is_server_error() {
            return Err(CallFailure::Transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CallFailure::Permanent(CreditsheetError::ExtractionFailed {
                message: format!("HTTP {status}: {detail}"),
            }));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CallFailure::Transient(format!("response body: {e}")))?;

        let text = parsed.candidate_text().ok_or_else(|| {
            CallFailure::Permanent(CreditsheetError::MalformedResponse {
                detail: "response contained no candidate text".into(),
            })
        })?;

        let record = parse_record(&text).map_err(CallFailure::Permanent)?;

        let (input_tokens, output_tokens) = parsed
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        Ok(Extraction {
            record,
            input_tokens,
            output_tokens,
        })
    }
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(&self, pdf: &[u8]) -> Result<Extraction, CreditsheetError> {
        let start = Instant::now();
        let body = self.request_body(pdf);
        debug!(
            "Extracting via {} ({} PDF bytes)",
            self.model,
            pdf.len()
        );

        let mut last_failure: Option<CallFailure> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Extraction retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.call_once(&body).await {
                Ok(extraction) => {
                    debug!(
                        "Extraction succeeded: {} input tokens, {} output tokens, {:?}",
                        extraction.input_tokens,
                        extraction.output_tokens,
                        start.elapsed()
                    );
                    return Ok(extraction);
                }
                Err(CallFailure::Permanent(err)) => return Err(err),
                Err(failure) => {
                    warn!("Extraction attempt {} failed: {}", attempt + 1, failure);
                    last_failure = Some(failure);
                }
            }
        }

        // All retries exhausted — map the last transient failure.
        Err(match last_failure {
            Some(CallFailure::Timeout) => CreditsheetError::ApiTimeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            },
            Some(CallFailure::RateLimited(retry_after_secs)) => {
                CreditsheetError::RateLimitExceeded {
                    model: self.model.clone(),
                    retry_after_secs,
                }
            }
            Some(CallFailure::Transient(detail)) => CreditsheetError::ExtractionFailed {
                message: format!("after {} retries: {detail}", self.max_retries),
            },
            // Unreachable: permanent failures return early above.
            _ => CreditsheetError::Internal("retry loop exited without a failure".into()),
        })
    }
}

/// Failure classification for one API round-trip.
enum CallFailure {
    /// Worth retrying: network blip, 5xx, unreadable body.
    Transient(String),
    /// Worth retrying, with an optional server-specified delay.
    RateLimited(Option<u64>),
    /// The request-level timeout fired.
    Timeout,
    /// Do not retry; surface as-is.
    Permanent(CreditsheetError),
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallFailure::Transient(s) => write!(f, "{s}"),
            CallFailure::RateLimited(Some(s)) => write!(f, "rate limited (retry after {s}s)"),
            CallFailure::RateLimited(None) => write!(f, "rate limited"),
            CallFailure::Timeout => write!(f, "request timed out"),
            CallFailure::Permanent(e) => write!(f, "{e}"),
        }
    }
}

/// Parse the model's text output into a [`FinancialRecord`].
///
/// Locates the first balanced JSON object in the text, then deserialises.
pub fn parse_record(text: &str) -> Result<FinancialRecord, CreditsheetError> {
    let span = locate_json_span(text).ok_or_else(|| CreditsheetError::MalformedResponse {
        detail: "no JSON object found in model response".into(),
    })?;
    serde_json::from_str(span).map_err(|e| CreditsheetError::MalformedResponse {
        detail: format!("JSON did not match the expected record shape: {e}"),
    })
}

/// Find the first balanced `{…}` span in `text`.
///
/// Brace counting is string-aware: braces inside JSON string literals
/// (including escaped quotes) do not affect nesting depth. Returns `None`
/// when no opening brace exists or the object never closes (e.g. the model
/// output was truncated).
pub fn locate_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inline_data")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate, if any.
    fn candidate_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::keys;

    #[test]
    fn locate_span_plain_object() {
        assert_eq!(locate_json_span(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn locate_span_inside_prose() {
        let text = "Here is the data you asked for:\n\n{\"a\": {\"b\": 2}}\n\nLet me know!";
        assert_eq!(locate_json_span(text), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn locate_span_ignores_braces_in_strings() {
        let text = r#"{"note": "uses { and } freely", "n": 1}"#;
        assert_eq!(locate_json_span(text), Some(text));
    }

    #[test]
    fn locate_span_handles_escaped_quotes() {
        let text = r#"{"note": "she said \"hi}\"", "n": 1}"#;
        assert_eq!(locate_json_span(text), Some(text));
    }

    #[test]
    fn locate_span_rejects_truncated_object() {
        assert_eq!(locate_json_span(r#"{"a": {"b": 2}"#), None);
        assert_eq!(locate_json_span("no json here"), None);
    }

    #[test]
    fn parse_record_from_fenced_response() {
        let text = "```json\n{\"incomeStatement\": {\"Revenue\": 800}, \"notes\": [\"x\"]}\n```";
        let record = parse_record(text).unwrap();
        assert_eq!(record.income_statement.amount(keys::REVENUE), 800.0);
        assert_eq!(record.notes, vec!["x"]);
    }

    #[test]
    fn parse_record_rejects_wrong_shape() {
        let err = parse_record(r#"{"incomeStatement": "not a map"}"#).unwrap_err();
        assert!(matches!(err, CreditsheetError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_record_rejects_no_json() {
        let err = parse_record("I could not read the document, sorry.").unwrap_err();
        assert!(matches!(err, CreditsheetError::MalformedResponse { .. }));
    }

    #[test]
    fn request_body_carries_pdf_inline() {
        let config = AnalysisConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap();
        let extractor = GeminiExtractor::from_config(&config).unwrap();
        let body = extractor.request_body(b"%PDF-1.4 tiny");
        let json = serde_json::to_value(&body).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("incomeStatement"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "application/pdf");
        let data = parts[1]["inline_data"]["data"].as_str().unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(data)
            .unwrap();
        assert_eq!(decoded, b"%PDF-1.4 tiny");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn from_config_requires_api_key() {
        // Guard against ambient credentials leaking into the test.
        let had_key = std::env::var("GEMINI_API_KEY").is_ok();
        if had_key {
            return; // cannot safely unset process-wide env in parallel tests
        }
        let config = AnalysisConfig::default();
        assert!(matches!(
            GeminiExtractor::from_config(&config).unwrap_err(),
            CreditsheetError::ApiKeyMissing
        ));
    }

    #[test]
    fn candidate_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{"content": {"parts": [{"text": "{\"notes\""}, {"text": ": []}"}]}}],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5}
            }"#,
        )
        .unwrap();
        assert_eq!(response.candidate_text().unwrap(), "{\"notes\": []}");
        let usage = response.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 12);
        assert_eq!(usage.candidates_token_count, 5);
    }

    #[test]
    fn empty_candidates_yield_no_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.candidate_text().is_none());
    }
}
