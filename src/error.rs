/// Errors the scoring core surfaces to its caller.
///
/// Everything else in the pipeline is total: sparse inputs resolve to
/// defaults and arithmetic edges are guarded, so scoring itself cannot fail.
#[derive(Debug)]
pub enum ScoreError {
    /// No model bundle has been installed; the caller should surface this
    /// as a service-unavailable condition, not a scoring result.
    ModelUnavailable,
    /// The payload did not decode into a scoring request at the transport
    /// boundary. Sparse-but-valid records are not malformed.
    MalformedInput(String),
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::ModelUnavailable => write!(f, "model bundle not loaded"),
            ScoreError::MalformedInput(detail) => write!(f, "malformed input: {}", detail),
        }
    }
}

impl std::error::Error for ScoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ScoreError::ModelUnavailable.to_string(),
            "model bundle not loaded"
        );
        assert_eq!(
            ScoreError::MalformedInput("not a record".to_string()).to_string(),
            "malformed input: not a record"
        );
    }
}
