//! Process exit codes for `pgpverify`.
//! Non-zero codes mirror `VerifyError::exit_code()` and are part of the public contract.

use pgpverify_core::VerifyError;

pub const SUCCESS: i32 = 0;
pub const INPUT_ERROR: i32 = 1; // Unreadable file, bad argument, config error
pub const FORMAT_ERROR: i32 = 2; // Key or signature outside the accepted algorithm set
pub const UNTRUSTED: i32 = 3; // No candidate signer chains to the master key
pub const TAMPERED: i32 = 4; // Signature or checksum does not match the artifact
pub const NETWORK_ERROR: i32 = 5; // Key bundle could not be fetched
pub const CANCELLED: i32 = 6;

/// Exit code for a failed verification.
pub fn for_error(err: &VerifyError) -> i32 {
    match err {
        VerifyError::MalformedInput { .. } | VerifyError::Config { .. } | VerifyError::Io(_) => {
            INPUT_ERROR
        }
        VerifyError::Format(_) => FORMAT_ERROR,
        VerifyError::TrustChain { .. } | VerifyError::NoMatch { .. } => UNTRUSTED,
        VerifyError::CryptoVerification { .. }
        | VerifyError::ChecksumSyntax { .. }
        | VerifyError::FilenameMismatch { .. }
        | VerifyError::ChecksumMismatch { .. } => TAMPERED,
        VerifyError::Network { .. } => NETWORK_ERROR,
        VerifyError::Cancelled => CANCELLED,
    }
}
