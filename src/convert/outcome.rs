// src/convert/outcome.rs

/// Every way a conversion (or the input feeding it) can go wrong. Each kind
/// has exactly one message shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    NoImageSelected,
    ReadFailure,
    EmptyResult,
    InvalidCredential,
    RemoteFailure,
}

impl FailureKind {
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "Please select or paste a valid image file.",
            FailureKind::NoImageSelected => "Please upload an image first.",
            FailureKind::ReadFailure => "Failed to read the image file.",
            FailureKind::EmptyResult => {
                "Gemini returned an empty response. The equation might not be clear in the image."
            }
            FailureKind::InvalidCredential => "Invalid API Key. Please check your configuration.",
            FailureKind::RemoteFailure => {
                "Failed to generate LaTeX from the image. Please try again with a clearer image."
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Trimmed, never empty.
    Success(String),
    Failure { kind: FailureKind, message: String },
}

impl ConversionOutcome {
    pub fn failure(kind: FailureKind) -> Self {
        ConversionOutcome::Failure {
            kind,
            message: kind.message().to_string(),
        }
    }

    /// Trims the text; blank text becomes an `EmptyResult` failure.
    pub fn from_model_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::failure(FailureKind::EmptyResult)
        } else {
            ConversionOutcome::Success(trimmed.to_string())
        }
    }

    pub fn latex(&self) -> Option<&str> {
        match self {
            ConversionOutcome::Success(text) => Some(text),
            ConversionOutcome::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ConversionOutcome::Success(_) => None,
            ConversionOutcome::Failure { message, .. } => Some(message),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ConversionOutcome::Success(_) => None,
            ConversionOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_text_is_trimmed() {
        let outcome = ConversionOutcome::from_model_text(" \\frac{1}{2} \n");
        assert_eq!(outcome, ConversionOutcome::Success("\\frac{1}{2}".into()));
    }

    #[test]
    fn test_blank_model_text_is_empty_result() {
        for text in ["", "   ", "\n\t"] {
            let outcome = ConversionOutcome::from_model_text(text);
            assert_eq!(outcome.failure_kind(), Some(FailureKind::EmptyResult));
            assert_eq!(
                outcome.error_message(),
                Some("Gemini returned an empty response. The equation might not be clear in the image.")
            );
        }
    }

    #[test]
    fn test_failure_carries_fixed_message() {
        let outcome = ConversionOutcome::failure(FailureKind::InvalidCredential);
        assert_eq!(outcome.error_message(), Some("Invalid API Key. Please check your configuration."));
        assert!(outcome.latex().is_none());
    }
}
