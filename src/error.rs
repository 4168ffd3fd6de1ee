use std::path::PathBuf;

/// Failures that stop a run. Every other condition is reported through
/// [`crate::models::ExtractionResult`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("debug output failed for {}: {reason}", .path.display())]
    DebugOutput { path: PathBuf, reason: String },
}

impl ExtractionError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    pub fn debug_output(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DebugOutput {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = ExtractionError> = std::result::Result<T, E>;
