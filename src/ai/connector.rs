// src/ai/connector.rs
use crate::convert::ConversionRequest;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ConnectorError {
    /// Whether the service turned down the configured key.
    pub fn is_invalid_credential(&self) -> bool {
        match self {
            ConnectorError::Api { status, message } => {
                *status == 401 || message.contains("API key not valid") || message.contains("API_KEY_INVALID")
            }
            _ => false,
        }
    }
}

/// Trait defining the interface for image-to-text inference
pub trait AiConnector: Send + Sync {
    /// Send one image plus instruction and return the model's raw text.
    fn process_image(&self, request: &ConversionRequest) -> Result<String, ConnectorError>;
}
