use thiserror::Error;

/// Why an augmentation stage produced nothing usable.
///
/// None of these stop the pipeline: the stage falls back to the data it had
/// before the collaborator was called.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AugmentError {
    /// The collaborator is disabled or its call failed.
    #[error("augmentation unavailable: {0}")]
    Unavailable(String),

    #[error("augmentation timed out after {0}s")]
    Timeout(u64),

    #[error("augmentation response is not valid JSON: {0}")]
    InvalidJson(String),

    /// Valid JSON that does not have the expected keys or shapes.
    #[error("augmentation response does not match schema: {0}")]
    SchemaMismatch(String),
}

impl AugmentError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        AugmentError::Unavailable(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        AugmentError::SchemaMismatch(msg.into())
    }
}
