//! Signed checksum file fallback.
//!
//! Some downloads ship a signed `<file>.sha256` instead of a signature over
//! the file itself. The checksum file is verified like any artifact, then its
//! digest is compared with the real file.

use std::io::{Cursor, Read, Seek};

use once_cell::sync::Lazy;
use regex::Regex;
use sequoia_openpgp::packet::Signature;
use tracing::{debug, error};

use crate::digest::sha256_hex_reader;
use crate::error::{VerifyError, VerifyResult};
use crate::keyring::KeyRing;
use crate::types::ChecksumRecord;
use crate::verify::SignatureVerifier;

/// `<sha256 hex> <whitespace> [*]<file name> [trailing whitespace]`, anchored at both ends.
static CHECKSUM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9a-f]{64})[\t ]+\*?([a-zA-Z0-9_\-.*]+)\s*$").expect("checksum regex is valid")
});

/// Parse the full content of a checksum file.
pub fn parse_checksum_file(content: &[u8]) -> VerifyResult<ChecksumRecord> {
    let text = std::str::from_utf8(content).map_err(|_| VerifyError::ChecksumSyntax {
        content: String::from_utf8_lossy(content).into_owned(),
    })?;

    let captures = CHECKSUM_LINE
        .captures(text)
        .ok_or_else(|| VerifyError::ChecksumSyntax {
            content: text.to_string(),
        })?;

    Ok(ChecksumRecord {
        digest: captures[1].to_string(),
        filename: captures[2].to_string(),
    })
}

/// Verifies an artifact through a signed checksum file.
#[derive(Debug, Clone)]
pub struct ChecksumVerifier {
    signatures: SignatureVerifier,
}

impl ChecksumVerifier {
    pub fn new(signatures: SignatureVerifier) -> Self {
        Self { signatures }
    }

    /// Verify `checksum_file` against `checksum_signature`, then check that it
    /// names `expected_filename` and records the SHA-256 of `artifact`.
    pub fn verify<R: Read + Seek>(
        &self,
        artifact: &mut R,
        checksum_signature: &[Signature],
        checksum_file: &[u8],
        expected_filename: &str,
        keyring: &KeyRing,
    ) -> VerifyResult<ChecksumRecord> {
        self.signatures
            .verify(&mut Cursor::new(checksum_file), checksum_signature, keyring)?;

        let record = parse_checksum_file(checksum_file)?;
        if record.filename != expected_filename {
            let err = VerifyError::FilenameMismatch {
                expected: expected_filename.to_string(),
                actual: record.filename,
            };
            error!(error = %err, "checksum file rejected");
            return Err(err);
        }

        let actual = sha256_hex_reader(
            artifact,
            self.signatures.chunk_size(),
            self.signatures.cancellation(),
        )?;
        if actual != record.digest {
            let err = VerifyError::ChecksumMismatch {
                expected: record.digest,
                actual,
            };
            error!(error = %err, "checksum verification failed");
            return Err(err);
        }

        debug!(filename = %record.filename, "checksum verified");
        Ok(record)
    }
}
