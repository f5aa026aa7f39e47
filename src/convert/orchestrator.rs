// src/convert/orchestrator.rs
use log::{error, info, warn};

use super::outcome::{ConversionOutcome, FailureKind};
use super::request::ConversionRequest;
use crate::ai::AiConnector;
use crate::input::SelectedImage;

/// Read, encode, send, reduce. Strictly in that order, one remote call at
/// most, and every error folded into the returned outcome.
pub fn generate(image: Option<&SelectedImage>, connector: &dyn AiConnector) -> ConversionOutcome {
    let Some(image) = image else {
        return ConversionOutcome::failure(FailureKind::NoImageSelected);
    };

    let bytes = match image.read_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read '{}': {}", image.name(), e);
            return ConversionOutcome::failure(FailureKind::ReadFailure);
        }
    };

    let request = ConversionRequest::new(&bytes, image.media_type());
    info!("Converting '{}' ({} bytes)", image.name(), bytes.len());

    match connector.process_image(&request) {
        Ok(text) => {
            let outcome = ConversionOutcome::from_model_text(&text);
            if outcome.failure_kind() == Some(FailureKind::EmptyResult) {
                warn!("Model returned no text for '{}'", image.name());
            }
            outcome
        }
        Err(e) if e.is_invalid_credential() => {
            error!("Gemini rejected the API key: {}", e);
            ConversionOutcome::failure(FailureKind::InvalidCredential)
        }
        Err(e) => {
            error!("Gemini request failed: {}", e);
            ConversionOutcome::failure(FailureKind::RemoteFailure)
        }
    }
}
