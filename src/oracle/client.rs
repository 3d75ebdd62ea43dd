//! Core `OracleClient` trait and `GeminiClient` implementation.
//!
//! `GeminiClient` speaks the Gemini REST API (`generateContent` for text,
//! speech and image editing, `:predict` for Imagen generation).  All
//! connection details — base URL, API key, model names, voice — come from
//! [`OracleConfig`]; nothing reads the process environment at call time.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::OracleConfig;
use crate::journal::{DreamContext, SourceLink, SymbolSearch, UserProfile};

use super::prompt;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Any failure from the external AI service.
///
/// Every variant is recoverable: the orchestrator notifies the user and
/// abandons the one operation, the session continues.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("oracle request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse oracle response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// OracleClient trait
// ---------------------------------------------------------------------------

/// Async interface to the hosted generative-AI service.
///
/// All five calls are fallible, single-shot and non-streaming.  The
/// `Option` returns mirror the service contract: speech and image models
/// may legitimately produce nothing, which is not an error.
///
/// Implementors must be `Send + Sync` so the client can be shared behind an
/// `Arc<dyn OracleClient>`.
#[async_trait]
pub trait OracleClient: Send + Sync {
    /// Interpret a dream.  No partial results — text or [`ServiceError`].
    async fn interpret_dream(
        &self,
        profile: &UserProfile,
        dream: &DreamContext,
    ) -> Result<String, ServiceError>;

    /// Narrate `text`.  Returns raw headerless PCM — 24 000 Hz, mono,
    /// 16-bit LE by contract with [`crate::audio::decode_pcm`] — or `None`
    /// when the voice is unavailable.
    async fn synthesize_speech(&self, text: &str) -> Result<Option<Vec<u8>>, ServiceError>;

    /// Generate an image for a dream description, or `None`.
    async fn generate_image(&self, description: &str) -> Result<Option<Vec<u8>>, ServiceError>;

    /// Apply an edit instruction to `image`, or `None` when the model
    /// returned no image part.
    async fn edit_image(
        &self,
        image: &[u8],
        instruction: &str,
    ) -> Result<Option<Vec<u8>>, ServiceError>;

    /// Web-grounded symbolism lookup with cited sources.
    async fn search_symbol(&self, query: &str) -> Result<SymbolSearch, ServiceError>;
}

// ---------------------------------------------------------------------------
// Response extraction helpers
// ---------------------------------------------------------------------------

/// First candidate text part of a `generateContent` response.
fn extract_text(body: &Value) -> Option<String> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First inline-data payload (base64) of a `generateContent` response,
/// scanning all parts because models interleave text and data parts.
fn extract_inline_data(body: &Value) -> Result<Option<Vec<u8>>, ServiceError> {
    let parts = match body["candidates"][0]["content"]["parts"].as_array() {
        Some(parts) => parts,
        None => return Ok(None),
    };
    for part in parts {
        if let Some(data) = part["inlineData"]["data"].as_str() {
            let bytes = BASE64
                .decode(data)
                .map_err(|e| ServiceError::Parse(format!("invalid base64 inline data: {e}")))?;
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

/// First generated image of an Imagen `:predict` response.
fn extract_prediction(body: &Value) -> Result<Option<Vec<u8>>, ServiceError> {
    match body["predictions"][0]["bytesBase64Encoded"].as_str() {
        Some(data) => BASE64
            .decode(data)
            .map(Some)
            .map_err(|e| ServiceError::Parse(format!("invalid base64 image data: {e}"))),
        None => Ok(None),
    }
}

/// Grounding sources of a search-grounded response.  Chunks without a URI
/// are skipped; a missing title falls back to the original journal's label.
fn extract_sources(body: &Value) -> Vec<SourceLink> {
    let chunks = body["candidates"][0]["groundingMetadata"]["groundingChunks"].as_array();
    chunks
        .into_iter()
        .flatten()
        .filter_map(|chunk| {
            let uri = chunk["web"]["uri"].as_str()?;
            Some(SourceLink {
                title: chunk["web"]["title"]
                    .as_str()
                    .unwrap_or("Enlace Externo")
                    .to_string(),
                uri: uri.to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Spanish fallback shown when the model produced no interpretation text.
const NO_INTERPRETATION: &str = "No se pudo generar la interpretación.";

/// Production client for the Gemini REST API.
///
/// Constructed explicitly from [`OracleConfig`] — credentials are injected,
/// never read implicitly from the environment.
pub struct GeminiClient {
    client: reqwest::Client,
    config: OracleConfig,
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &OracleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, model: &str, verb: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.config.base_url, model, verb)
    }

    /// POST `body` and parse the response as JSON.
    ///
    /// The `x-goog-api-key` header is attached only when `api_key` is a
    /// non-empty string, so local emulators needing no auth keep working.
    async fn post(&self, url: &str, body: &Value) -> Result<Value, ServiceError> {
        let mut req = self.client.post(url).json(body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.header("x-goog-api-key", key);
        }

        let response = req.send().await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl OracleClient for GeminiClient {
    async fn interpret_dream(
        &self,
        profile: &UserProfile,
        dream: &DreamContext,
    ) -> Result<String, ServiceError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt::interpretation(profile, dream) }] }],
            "generationConfig": {
                "thinkingConfig": { "thinkingBudget": self.config.thinking_budget }
            }
        });

        let url = self.endpoint(&self.config.interpret_model, "generateContent");
        let response = self.post(&url, &body).await?;

        Ok(extract_text(&response).unwrap_or_else(|| NO_INTERPRETATION.to_string()))
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.tts_voice }
                    }
                }
            }
        });

        let url = self.endpoint(&self.config.tts_model, "generateContent");
        let response = self.post(&url, &body).await?;
        extract_inline_data(&response)
    }

    async fn generate_image(&self, description: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        let body = json!({
            "instances": [{ "prompt": prompt::dream_image(description) }],
            "parameters": {
                "sampleCount": 1,
                "outputMimeType": "image/jpeg",
                "aspectRatio": "4:3"
            }
        });

        let url = self.endpoint(&self.config.image_model, "predict");
        let response = self.post(&url, &body).await?;
        extract_prediction(&response)
    }

    async fn edit_image(
        &self,
        image: &[u8],
        instruction: &str,
    ) -> Result<Option<Vec<u8>>, ServiceError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "image/jpeg", "data": BASE64.encode(image) } },
                    { "text": instruction }
                ]
            }],
            "generationConfig": { "responseModalities": ["IMAGE"] }
        });

        let url = self.endpoint(&self.config.edit_model, "generateContent");
        let response = self.post(&url, &body).await?;
        extract_inline_data(&response)
    }

    async fn search_symbol(&self, query: &str) -> Result<SymbolSearch, ServiceError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt::symbolism(query) }] }],
            "tools": [{ "googleSearch": {} }]
        });

        let url = self.endpoint(&self.config.search_model, "generateContent");
        let response = self.post(&url, &body).await?;

        Ok(SymbolSearch {
            text: extract_text(&response).unwrap_or_default(),
            sources: extract_sources(&response),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> OracleConfig {
        OracleConfig {
            api_key: api_key.map(|s| s.to_string()),
            ..OracleConfig::default()
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _client = GeminiClient::from_config(&make_config(None));
        let _client = GeminiClient::from_config(&make_config(Some("")));
        let _client = GeminiClient::from_config(&make_config(Some("test-key-1234")));
    }

    /// Verify that `GeminiClient` is object-safe (usable as `dyn OracleClient`).
    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn OracleClient> = Box::new(GeminiClient::from_config(&make_config(None)));
        drop(client);
    }

    #[test]
    fn endpoint_combines_base_url_model_and_verb() {
        let client = GeminiClient::from_config(&make_config(None));
        let url = client.endpoint("gemini-2.5-flash", "generateContent");
        assert!(url.ends_with("/v1beta/models/gemini-2.5-flash:generateContent"));
    }

    // ---- response extraction ---

    #[test]
    fn extract_text_reads_first_candidate() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "  La revelación.  " }] } }]
        });
        assert_eq!(extract_text(&body).as_deref(), Some("La revelación."));
    }

    #[test]
    fn extract_text_treats_blank_as_missing() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] } }]
        });
        assert!(extract_text(&body).is_none());
        assert!(extract_text(&json!({})).is_none());
    }

    #[test]
    fn extract_inline_data_decodes_base64() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "aquí tienes" },
                { "inlineData": { "mimeType": "audio/pcm", "data": BASE64.encode([1u8, 2, 3]) } }
            ] } }]
        });
        assert_eq!(extract_inline_data(&body).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn extract_inline_data_missing_is_none_not_error() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "sin audio" }] } }]
        });
        assert_eq!(extract_inline_data(&body).unwrap(), None);
        assert_eq!(extract_inline_data(&json!({})).unwrap(), None);
    }

    #[test]
    fn extract_inline_data_rejects_bad_base64() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "data": "!!not-base64!!" } }
            ] } }]
        });
        assert!(matches!(
            extract_inline_data(&body),
            Err(ServiceError::Parse(_))
        ));
    }

    #[test]
    fn extract_prediction_decodes_generated_image() {
        let body = json!({
            "predictions": [{ "bytesBase64Encoded": BASE64.encode([9u8, 9]) }]
        });
        assert_eq!(extract_prediction(&body).unwrap(), Some(vec![9, 9]));
        assert_eq!(extract_prediction(&json!({})).unwrap(), None);
    }

    #[test]
    fn extract_sources_keeps_order_and_falls_back_on_title() {
        let body = json!({
            "candidates": [{ "groundingMetadata": { "groundingChunks": [
                { "web": { "uri": "https://a.example", "title": "Símbolos" } },
                { "web": { "uri": "https://b.example" } },
                { "web": { "title": "sin uri — se descarta" } }
            ] } }]
        });
        let sources = extract_sources(&body);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "Símbolos");
        assert_eq!(sources[0].uri, "https://a.example");
        assert_eq!(sources[1].title, "Enlace Externo");
    }

    #[test]
    fn extract_sources_without_grounding_is_empty() {
        assert!(extract_sources(&json!({})).is_empty());
    }
}
