use thiserror::Error;

/// Engine error classification.
///
/// Insufficient evidence is deliberately NOT an error: a candidate with no
/// qualifying history gets a low-confidence verdict, never an `Err`.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
