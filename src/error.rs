/// Verification failures surfaced to users as plain text
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Claim text is empty")]
    EmptyClaim,

    /// The API answered with a non-2xx status
    #[error("API error: {0}")]
    Api(u16),

    /// Network-level failure, message kept as the browser reported it
    #[error("{0}")]
    Transport(String),

    /// 2xx body that was not valid JSON
    #[error("{0}")]
    Payload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strings() {
        assert_eq!(VerifyError::Api(500).to_string(), "API error: 500");
        assert_eq!(
            VerifyError::Transport("Failed to fetch".to_string()).to_string(),
            "Failed to fetch"
        );
        assert_eq!(VerifyError::EmptyClaim.to_string(), "Claim text is empty");
    }
}
