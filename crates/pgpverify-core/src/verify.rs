//! Detached signature verification.
//!
//! Candidates are tried in extraction order. Ineligible candidates are
//! skipped; the first eligible one decides the outcome:
//!
//! 1. Signature format (v4, SHA-2, RSA, binary or text document, creation time)
//! 2. Signer lookup in the key bundle (subkeys only)
//! 3. Signer key format
//! 4. Binding from the master key
//! 5. No revocation at or before the signature time
//! 6. Cryptographic check over the artifact bytes

use std::io::{Read, Seek, SeekFrom};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use sequoia_openpgp::packet::Signature;
use sequoia_openpgp::types::SignatureType;
use tracing::{debug, error, info};

use crate::anchor::MasterKey;
use crate::digest::{hash_reader, SignedDataHasher};
use crate::error::{VerifyError, VerifyResult};
use crate::keyring::{issuer_key_ids, CandidateSubKey, KeyRing};
use crate::policy::{check_public_key_format, check_signature_format};
use crate::trust::TrustValidator;
use crate::types::{CancellationFlag, VerifiedSignature, VerifierConfig};

/// Verifies detached signatures against one trust anchor.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    master: MasterKey,
    trust: TrustValidator,
    chunk_size: usize,
    cancel: Option<CancellationFlag>,
}

impl SignatureVerifier {
    pub fn new(master: MasterKey) -> Self {
        Self {
            master,
            trust: TrustValidator::new(),
            chunk_size: VerifierConfig::default().chunk_size,
            cancel: None,
        }
    }

    /// Evaluate binding expirations as of `time`.
    pub fn with_reference_time(mut self, time: SystemTime) -> Self {
        self.trust = self.trust.with_reference_time(time);
        self
    }

    /// Read buffer size used when hashing the artifact.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Apply hashing settings from `config`.
    pub fn with_config(self, config: &VerifierConfig) -> Self {
        self.with_chunk_size(config.chunk_size)
    }

    pub fn master(&self) -> &MasterKey {
        &self.master
    }

    pub(crate) fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub(crate) fn cancellation(&self) -> Option<&CancellationFlag> {
        self.cancel.as_ref()
    }

    /// Verify that `artifact`, read from its current position to the end, is
    /// signed by one of `signatures` through a subkey delegated by the master key.
    pub fn verify<R: Read + Seek>(
        &self,
        artifact: &mut R,
        signatures: &[Signature],
        keyring: &KeyRing,
    ) -> VerifyResult<VerifiedSignature> {
        let start = artifact.stream_position()?;
        let mut trust_rejection: Option<VerifyError> = None;

        for sig in signatures {
            if let Err(e) = check_signature_format(sig) {
                info!(reason = %e, "signature skipped");
                continue;
            }
            if !matches!(sig.typ(), SignatureType::Binary | SignatureType::Text) {
                info!(signature_type = %sig.typ(), "signature skipped: not a document signature");
                continue;
            }
            let Some(created) = sig.signature_creation_time() else {
                info!("signature skipped: no creation time");
                continue;
            };

            let issuers = issuer_key_ids(sig);
            let Some(subkey) = issuers.iter().find_map(|id| keyring.get(id)) else {
                match issuers.iter().find(|id| keyring.is_primary(id)) {
                    Some(id) => {
                        info!(key_id = %id, "signature skipped: made by a primary key, only subkeys may sign")
                    }
                    None => debug!(issuers = ?issuers, "signature skipped: signer not in key bundle"),
                }
                continue;
            };
            let key_id = subkey.key_id().to_hex();

            if let Err(e) = check_public_key_format(subkey.key()) {
                info!(key_id = %key_id, reason = %e, "key skipped");
                continue;
            }

            if !self.trust.is_eligible_for_signing(subkey, &self.master) {
                info!(key_id = %key_id, "key skipped: no valid signing binding from master key");
                trust_rejection = Some(VerifyError::TrustChain {
                    key_id,
                    reason: format!(
                        "no valid signing binding from master key {}",
                        self.master.key_id().to_hex()
                    ),
                });
                continue;
            }

            if self.trust.is_revoked_before(subkey, &self.master, created) {
                info!(key_id = %key_id, "key was revoked before signature timestamp");
                trust_rejection = Some(VerifyError::TrustChain {
                    key_id,
                    reason: "revoked before signature timestamp".to_string(),
                });
                continue;
            }

            // Eligible signer: any mismatch from here on is tampering.
            artifact.seek(SeekFrom::Start(start))?;
            if let Err(e) = self.check_artifact(artifact, sig, subkey) {
                error!(key_id = %key_id, error = %e, "signature verification failed");
                return Err(e);
            }

            debug!(key_id = %key_id, "signature verified");
            return Ok(VerifiedSignature {
                signer_key_id: key_id,
                master_key_id: self.master.key_id().to_hex(),
                created_at: DateTime::<Utc>::from(created),
                hash_algorithm: sig.hash_algo().to_string(),
            });
        }

        let err = trust_rejection.unwrap_or(VerifyError::NoMatch {
            candidates: signatures.len(),
        });
        error!(error = %err, "no signature could be verified");
        Err(err)
    }

    fn check_artifact<R: Read>(
        &self,
        artifact: &mut R,
        sig: &Signature,
        subkey: &CandidateSubKey,
    ) -> VerifyResult<()> {
        let mut hasher = SignedDataHasher::for_signature(sig)?;
        let read = hash_reader(
            artifact,
            |chunk| hasher.update(chunk),
            self.chunk_size,
            self.cancel.as_ref(),
        )?;
        debug!(bytes = read, text = sig.typ() == SignatureType::Text, "artifact hashed");

        sig.verify_hash(subkey.key(), hasher.into_context())
            .map_err(|e| VerifyError::CryptoVerification {
                key_id: subkey.key_id().to_hex(),
                reason: e.to_string(),
            })
    }
}
