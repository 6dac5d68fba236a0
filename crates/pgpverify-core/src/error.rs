//! Error types for download verification.

use crate::policy::FormatError;

/// Verification errors.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Signature stream, key bundle or trust anchor could not be decoded.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Key or signature uses a version, algorithm or size outside the whitelist.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// No valid delegation from the master key, or the signer was revoked.
    #[error("trust chain rejected key {key_id}: {reason}")]
    TrustChain { key_id: String, reason: String },

    /// An eligible candidate failed the cryptographic check.
    #[error("signature verification failed for key {key_id}: {reason}")]
    CryptoVerification { key_id: String, reason: String },

    /// Every candidate signature was skipped or its signer was absent.
    #[error("no keys matched any of {candidates} signature(s)")]
    NoMatch { candidates: usize },

    /// Checksum file does not follow `<sha256-hex> <filename>`.
    #[error("checksum file does not match the expected format: ~~~{content}~~~")]
    ChecksumSyntax { content: String },

    /// Checksum file names another file.
    #[error("expected file name '{expected}', but got '{actual}' in checksum file")]
    FilenameMismatch { expected: String, actual: String },

    /// Artifact digest differs from the one recorded in the checksum file.
    #[error("SHA-256 checksum mismatch: the actual value is {actual}, but {expected} was expected")]
    ChecksumMismatch { expected: String, actual: String },

    /// Reading an input stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the verification.
    #[error("verification cancelled")]
    Cancelled,

    /// Fetching the key bundle failed.
    #[error("network error: {message}")]
    Network { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl VerifyError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Input / config issues
            Self::MalformedInput { .. } => 1,
            Self::Config { .. } => 1,
            Self::Io(_) => 1,

            // Policy rejections
            Self::Format(_) => 2,
            Self::TrustChain { .. } => 3,
            Self::NoMatch { .. } => 3,

            // Tamper evidence
            Self::CryptoVerification { .. } => 4,
            Self::ChecksumSyntax { .. } => 4,
            Self::FilenameMismatch { .. } => 4,
            Self::ChecksumMismatch { .. } => 4,

            // Network/transient
            Self::Network { .. } => 5,

            Self::Cancelled => 6,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for verification operations.
pub type VerifyResult<T> = Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_separate_tampering_from_policy() {
        let crypto = VerifyError::CryptoVerification {
            key_id: "B327B7600089647B".to_string(),
            reason: "bad signature".to_string(),
        };
        let trust = VerifyError::TrustChain {
            key_id: "B327B7600089647B".to_string(),
            reason: "revoked".to_string(),
        };
        assert_eq!(crypto.exit_code(), 4);
        assert_eq!(trust.exit_code(), 3);
        assert_eq!(VerifyError::NoMatch { candidates: 2 }.exit_code(), 3);
        assert_eq!(VerifyError::malformed("empty").exit_code(), 1);
    }

    #[test]
    fn test_only_network_errors_are_retryable() {
        let network = VerifyError::Network {
            message: "connection reset".to_string(),
        };
        assert!(network.is_retryable());
        assert!(!VerifyError::Cancelled.is_retryable());
        assert!(!VerifyError::NoMatch { candidates: 0 }.is_retryable());
    }

    #[test]
    fn test_display_mentions_both_file_names() {
        let err = VerifyError::FilenameMismatch {
            expected: "lorem-ipsum.txt".to_string(),
            actual: "lorem-ipsum2.txt".to_string(),
        };
        assert!(err
            .to_string()
            .starts_with("expected file name 'lorem-ipsum.txt', but got 'lorem-ipsum2.txt'"));
    }
}
