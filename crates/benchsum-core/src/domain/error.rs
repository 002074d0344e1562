//! Error taxonomy for benchsum.

use std::path::PathBuf;

/// Errors produced while aggregating benchmark summaries.
///
/// Coverage and consistency problems are not errors; they surface as
/// [`crate::Diagnostic`] values and never abort a pass.
#[derive(Debug, thiserror::Error)]
pub enum BenchsumError {
    #[error("data directory '{}' does not exist", .0.display())]
    MissingDataDir(PathBuf),

    #[error("data directory '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("malformed input {source_id}: {reason}")]
    MalformedInput { source_id: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchsumError {
    pub fn malformed(source_id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::MalformedInput {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised before any output is produced (bad input location).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingDataDir(_) | Self::NotADirectory(_))
    }
}

/// Result type for benchsum operations.
pub type Result<T> = std::result::Result<T, BenchsumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_name_the_path() {
        let err = BenchsumError::MissingDataDir(PathBuf::from("runs/data"));
        assert!(err.is_configuration());
        assert!(err.to_string().contains("runs/data"));
        assert!(err.to_string().contains("does not exist"));

        let err = BenchsumError::NotADirectory(PathBuf::from("runs/data.json"));
        assert!(err.is_configuration());
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_malformed_input_display() {
        let err = BenchsumError::malformed("a_id1_summary.json", "expected a JSON object");
        assert!(!err.is_configuration());
        let msg = err.to_string();
        assert!(msg.contains("a_id1_summary.json"));
        assert!(msg.contains("expected a JSON object"));
    }
}
