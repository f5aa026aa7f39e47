// src/ai/gemini.rs
use anyhow::Result;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AiConnector, ConnectorError};
use crate::config::Settings;
use crate::convert::ConversionRequest;

//Gemini generateContent over plain HTTPS, one shot, no streaming
pub struct GeminiModel {
    api_base_url: String,
    api_key: String,
    model_name: String,
    client: Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

impl GeminiModel {
    pub fn new(settings: &Settings) -> Result<Self> {
        info!("Initializing Gemini model: {} at {}", settings.model, settings.api_base_url);

        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            api_base_url: settings.api_base_url.clone(),
            api_key: settings.api_key.clone(),
            model_name: settings.model.clone(),
            client,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Models visible to the configured key. Used to check the key works.
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, ConnectorError> {
        let url = format!("{}/v1beta/models", self.api_base_url);
        let response = self.client.get(&url).header("x-goog-api-key", &self.api_key).send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let list: ModelList =
            serde_json::from_str(&body).map_err(|e| ConnectorError::MalformedResponse(e.to_string()))?;
        Ok(list.models)
    }
}

impl AiConnector for GeminiModel {
    fn process_image(&self, request: &ConversionRequest) -> Result<String, ConnectorError> {
        info!("Sending {} image to Gemini model: {}", request.media_type(), self.model_name);

        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base_url, self.model_name);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        debug!("Gemini answered with {} bytes", body.len());
        extract_text(&body)
    }
}

fn request_body(request: &ConversionRequest) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: request.media_type(),
                        data: request.payload(),
                    },
                },
                Part::Text { text: request.instruction() },
            ],
        }],
    }
}

// No candidates at all (e.g. a blocked prompt) reads as empty text.
fn extract_text(body: &str) -> Result<String, ConnectorError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ConnectorError::MalformedResponse(e.to_string()))?;

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();
    Ok(text)
}

fn api_error(status: u16, body: &str) -> ConnectorError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    ConnectorError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = ConversionRequest::new(b"abc", "image/png");
        let json = serde_json::to_value(request_body(&request)).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "YWJj");
        assert_eq!(parts[1]["text"], request.instruction());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"\\frac{1}"},{"text":"{2}"}],"role":"model"}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "\\frac{1}{2}");
    }

    #[test]
    fn test_extract_text_without_candidates_is_empty() {
        assert_eq!(extract_text(r#"{"promptFeedback":{"blockReason":"OTHER"}}"#).unwrap(), "");
        assert_eq!(extract_text(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap(), "");
    }

    #[test]
    fn test_extract_text_rejects_garbage() {
        assert!(matches!(extract_text("<html>"), Err(ConnectorError::MalformedResponse(_))));
    }

    #[test]
    fn test_api_error_uses_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err = api_error(400, body);
        assert!(err.is_invalid_credential());
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        match api_error(503, "  upstream unavailable \n") {
            ConnectorError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
