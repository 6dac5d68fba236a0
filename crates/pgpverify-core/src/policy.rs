//! Algorithm and key-format whitelist.
//!
//! Every accept/reject decision about *shape* (versions, algorithms, sizes,
//! lifetimes) is a constant or a pure predicate in this module. Trust
//! decisions (who signed what) live in [`crate::trust`].

use std::time::Duration;

use sequoia_openpgp::packet::key::{KeyParts, KeyRole};
use sequoia_openpgp::packet::{Key, Signature};
use sequoia_openpgp::types::{HashAlgorithm, PublicKeyAlgorithm};

/// Hash algorithms accepted for any signature (RFC 4880 §9.4).
pub const ACCEPTED_HASH_ALGORITHMS: [HashAlgorithm; 3] = [
    HashAlgorithm::SHA256,
    HashAlgorithm::SHA384,
    HashAlgorithm::SHA512,
];

/// The only accepted public-key algorithm: RSA (Encrypt or Sign), id 1.
pub const ACCEPTED_KEY_ALGORITHM: PublicKeyAlgorithm = PublicKeyAlgorithm::RSAEncryptSign;

/// Accepted key packet version.
pub const REQUIRED_KEY_VERSION: u8 = 4;

/// Accepted signature packet version.
pub const REQUIRED_SIGNATURE_VERSION: u8 = 4;

/// Smallest accepted modulus, in bits.
pub const MIN_KEY_BITS: usize = 2048;

/// Largest accepted modulus, in bits.
pub const MAX_KEY_BITS: usize = 100_000;

const DAY: u64 = 24 * 60 * 60;

/// Longest validity a binding certificate may declare (6 × 365 days).
pub const MAX_BINDING_VALIDITY: Duration = Duration::from_secs(6 * 365 * DAY);

/// Oldest binding certificate still considered (30 × 365 days).
pub const MAX_BINDING_AGE: Duration = Duration::from_secs(30 * 365 * DAY);

/// Why a key or signature was rejected by the whitelist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("only PGP public keys version 4 are supported, got version {version}. KeyID={key_id}")]
    UnsupportedKeyVersion { key_id: String, version: u8 },

    #[error("only PGP public keys with 2048..=100000 bits are supported, got {bits}. KeyID={key_id}")]
    KeySizeOutOfRange { key_id: String, bits: usize },

    #[error("only signature packets version 4 are supported, got version {version}")]
    UnsupportedSignatureVersion { version: u8 },

    #[error("only hash algorithms SHA256/384/512 are supported, got {algorithm}. See https://tools.ietf.org/html/rfc4880#section-9.4")]
    UnsupportedHashAlgorithm { algorithm: String },

    #[error("only key algorithm 1 (RSA (Encrypt or Sign)) is supported, got {algorithm}. See https://tools.ietf.org/html/rfc4880#section-9.1")]
    UnsupportedKeyAlgorithm { algorithm: String },
}

/// Check a public key against the version and size whitelist.
pub fn check_public_key_format<P, R>(key: &Key<P, R>) -> Result<(), FormatError>
where
    P: KeyParts,
    R: KeyRole,
{
    let version = key.version();
    if version != REQUIRED_KEY_VERSION {
        return Err(FormatError::UnsupportedKeyVersion {
            key_id: key.keyid().to_hex(),
            version,
        });
    }

    let bits = key.mpis().bits().unwrap_or(0);
    if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
        return Err(FormatError::KeySizeOutOfRange {
            key_id: key.keyid().to_hex(),
            bits,
        });
    }

    Ok(())
}

/// Check a signature against the version and algorithm whitelist.
pub fn check_signature_format(sig: &Signature) -> Result<(), FormatError> {
    let version = sig.version();
    if version != REQUIRED_SIGNATURE_VERSION {
        return Err(FormatError::UnsupportedSignatureVersion { version });
    }

    if !ACCEPTED_HASH_ALGORITHMS.contains(&sig.hash_algo()) {
        return Err(FormatError::UnsupportedHashAlgorithm {
            algorithm: sig.hash_algo().to_string(),
        });
    }

    if sig.pk_algo() != ACCEPTED_KEY_ALGORITHM {
        return Err(FormatError::UnsupportedKeyAlgorithm {
            algorithm: sig.pk_algo().to_string(),
        });
    }

    Ok(())
}
