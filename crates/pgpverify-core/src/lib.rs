//! PGP trust-chain verification for downloaded artifacts.
//!
//! An artifact is authentic when a detached signature over its bytes was made
//! by a subkey that a long-lived master key has delegated signing authority to,
//! and that the master key had not revoked at signing time. Subkeys come from
//! an untrusted bundle, so they can rotate without the master key changing.
//!
//! - Detached signature verification ([`verify_signature`])
//! - Signed checksum file fallback ([`verify_checksum_and_signature`])
//! - Key bundle download ([`KeysClient`])
//!
//! # Quick Start
//!
//! ```no_run
//! use std::fs::File;
//! use pgpverify_core::{verify_signature, DOWNLOADS_MASTER_PUBLIC_KEY};
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut artifact = File::open("idea-2021.1.tar.gz")?;
//! let signature = std::fs::read("idea-2021.1.tar.gz.asc")?;
//! let keys = std::fs::read("KEYS")?;
//!
//! let verified = verify_signature(
//!     &mut artifact,
//!     &signature,
//!     &keys,
//!     DOWNLOADS_MASTER_PUBLIC_KEY.as_bytes(),
//! )?;
//! println!("signed by {}", verified.signer_key_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `PGPVERIFY_KEYS_URL` | Key bundle URL (default: `https://download.jetbrains.com/KEYS`) |
//! | `PGPVERIFY_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `PGPVERIFY_MAX_RETRIES` | Max retries for transient failures (default: 3) |

use std::io::{Read, Seek};

pub mod anchor;
pub mod checksum;
mod digest;
pub mod error;
pub mod extract;
pub mod keyring;
pub mod keys;
pub mod policy;
pub mod trust;
pub mod types;
pub mod verify;

// Re-export main types
pub use anchor::{MasterKey, DOWNLOADS_KEYS_URL, DOWNLOADS_MASTER_PUBLIC_KEY};
pub use checksum::{parse_checksum_file, ChecksumVerifier};
pub use error::{VerifyError, VerifyResult};
pub use extract::extract_signatures;
pub use keyring::{CandidateSubKey, KeyRing};
pub use keys::KeysClient;
pub use policy::{check_public_key_format, check_signature_format, FormatError};
pub use trust::TrustValidator;
pub use types::{CancellationFlag, ChecksumRecord, VerifiedSignature, VerifierConfig};
pub use verify::SignatureVerifier;

/// Verify a detached signature over `artifact`.
///
/// `untrusted_keys` is the subkey bundle; `trusted_master_key` is the
/// armored or binary trust anchor.
pub fn verify_signature<R: Read + Seek>(
    artifact: &mut R,
    detached_signature: &[u8],
    untrusted_keys: &[u8],
    trusted_master_key: &[u8],
) -> VerifyResult<VerifiedSignature> {
    let signatures = extract_signatures(detached_signature)?;
    let keyring = KeyRing::from_bytes(untrusted_keys)?;
    let master = MasterKey::from_bytes(trusted_master_key)?;

    SignatureVerifier::new(master).verify(artifact, &signatures, &keyring)
}

/// Verify `artifact` through a signed SHA-256 checksum file that must name `expected_filename`.
pub fn verify_checksum_and_signature<R: Read + Seek>(
    artifact: &mut R,
    checksum_signature: &[u8],
    checksum_file: &[u8],
    expected_filename: &str,
    untrusted_keys: &[u8],
    trusted_master_key: &[u8],
) -> VerifyResult<ChecksumRecord> {
    let signatures = extract_signatures(checksum_signature)?;
    let keyring = KeyRing::from_bytes(untrusted_keys)?;
    let master = MasterKey::from_bytes(trusted_master_key)?;

    ChecksumVerifier::new(SignatureVerifier::new(master)).verify(
        artifact,
        &signatures,
        checksum_file,
        expected_filename,
        &keyring,
    )
}
