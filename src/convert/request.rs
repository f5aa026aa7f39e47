// src/convert/request.rs
use base64::{engine::general_purpose, Engine as _};

pub const LATEX_INSTRUCTION: &str = "Extract the LaTeX code for the equation in this image. Only return the raw LaTeX code itself, without any surrounding text, explanations, or markdown formatting.";

/// One image ready for the wire. Built and consumed inside a single
/// conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    payload: String,
    media_type: String,
}

impl ConversionRequest {
    pub fn new(image_bytes: &[u8], media_type: &str) -> Self {
        Self {
            payload: general_purpose::STANDARD.encode(image_bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Base64 of the image bytes.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn instruction(&self) -> &'static str {
        LATEX_INSTRUCTION
    }
}
