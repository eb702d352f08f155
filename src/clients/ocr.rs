//! OCR service adapter
//!
//! Black-box call: image bytes in, structured text-annotation result out.
//! The production impl posts base64 content to the Vision REST endpoint with
//! `DOCUMENT_TEXT_DETECTION`. Failures are retryable-later by contract; the
//! caller decides what to skip, never this module.

use crate::error::OcrError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

/// Result of recognizing one page image
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OcrOutcome {
    /// Structured text-annotation payload (the full service response)
    Recognized(Value),
    /// The page produced no text annotation
    Blank,
}

/// OCR collaborator interface
#[async_trait]
pub trait OcrClient: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutcome, OcrError>;
}

/// `OcrClient` backed by the Google Vision `images:annotate` endpoint
pub struct VisionOcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl VisionOcrClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn build_request(&self, image: &[u8]) -> Value {
        json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }]
            }]
        })
    }
}

#[async_trait]
impl OcrClient for VisionOcrClient {
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutcome, OcrError> {
        let url = format!("{}?key={}", self.endpoint, self.api_key);

        let response = self
            .http
            .post(&url)
            .json(&self.build_request(image))
            .send()
            .await
            .map_err(|e| OcrError::service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OcrError::service(format!(
                "status code: {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OcrError::BadResponse { source: Box::new(e) })?;

        let page = body
            .pointer("/responses/0")
            .cloned()
            .ok_or_else(|| OcrError::service("empty responses array"))?;

        if let Some(error) = page.get("error") {
            return Err(OcrError::service(error.to_string()));
        }

        if page.get("fullTextAnnotation").is_none() {
            return Ok(OcrOutcome::Blank);
        }

        Ok(OcrOutcome::Recognized(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let client = VisionOcrClient::new("https://vision.invalid/annotate", "k");
        let request = client.build_request(&[1, 2, 3]);

        let feature = request
            .pointer("/requests/0/features/0/type")
            .and_then(|v| v.as_str());
        assert_eq!(feature, Some("DOCUMENT_TEXT_DETECTION"));

        let content = request
            .pointer("/requests/0/image/content")
            .and_then(|v| v.as_str())
            .unwrap();
        assert_eq!(STANDARD.decode(content).unwrap(), vec![1, 2, 3]);
    }
}
