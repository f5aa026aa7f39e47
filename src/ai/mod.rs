pub mod connector;
pub mod gemini;

pub use connector::{AiConnector, ConnectorError};
pub use gemini::GeminiModel;
