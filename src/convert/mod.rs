pub mod orchestrator;
pub mod outcome;
pub mod request;

pub use orchestrator::generate;
pub use outcome::{ConversionOutcome, FailureKind};
pub use request::ConversionRequest;
