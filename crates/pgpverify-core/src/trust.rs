//! Subkey delegation and revocation checks.
//!
//! A subkey may sign artifacts only while the master key vouches for it: a
//! master-issued binding certificate granting the signing capability with a
//! bounded expiration, and no master-issued revocation dated at or before the
//! signature.

use std::time::SystemTime;

use sequoia_openpgp::packet::Signature;
use sequoia_openpgp::types::SignatureType;
use tracing::{info, warn};

use crate::anchor::MasterKey;
use crate::keyring::{is_issued_by, CandidateSubKey};
use crate::policy::{check_signature_format, MAX_BINDING_AGE, MAX_BINDING_VALIDITY};

/// Decides whether a subkey is delegated by the master key.
#[derive(Debug, Clone, Default)]
pub struct TrustValidator {
    reference_time: Option<SystemTime>,
}

impl TrustValidator {
    /// Validator that uses the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate expirations as of `time` instead of now.
    pub fn with_reference_time(mut self, time: SystemTime) -> Self {
        self.reference_time = Some(time);
        self
    }

    /// The instant expirations are evaluated at.
    pub fn reference_time(&self) -> SystemTime {
        self.reference_time.unwrap_or_else(SystemTime::now)
    }

    /// Whether `subkey` carries at least one valid signing binding from `master`.
    pub fn is_eligible_for_signing(&self, subkey: &CandidateSubKey, master: &MasterKey) -> bool {
        let now = self.reference_time();
        let master_id = master.key_id();

        for binding in subkey.signatures() {
            if binding.typ() != SignatureType::SubkeyBinding || !is_issued_by(binding, &master_id)
            {
                continue;
            }

            if let Err(reason) = check_binding(binding, now) {
                info!(
                    key_id = %subkey.key_id(),
                    reason = %reason,
                    "binding signature skipped"
                );
                continue;
            }

            match binding
                .clone()
                .verify_subkey_binding(master.key(), master.key(), subkey.key())
            {
                Ok(()) => return true,
                Err(e) => {
                    info!(
                        key_id = %subkey.key_id(),
                        reason = %e,
                        "binding signature does not verify against master key"
                    );
                }
            }
        }

        false
    }

    /// Whether `master` revoked `subkey` at or before `signature_time`.
    ///
    /// Revocations that do not verify against the master key are ignored.
    pub fn is_revoked_before(
        &self,
        subkey: &CandidateSubKey,
        master: &MasterKey,
        signature_time: SystemTime,
    ) -> bool {
        for revocation in subkey.signatures() {
            if revocation.typ() != SignatureType::SubkeyRevocation {
                continue;
            }
            let Some(revoked_at) = revocation.signature_creation_time() else {
                continue;
            };
            if revoked_at > signature_time {
                continue;
            }

            match revocation
                .clone()
                .verify_subkey_revocation(master.key(), master.key(), subkey.key())
            {
                Ok(()) => return true,
                Err(e) => {
                    warn!(
                        key_id = %subkey.key_id(),
                        error = %e,
                        "ignoring revocation not signed by the master key"
                    );
                }
            }
        }

        false
    }
}

/// Capability, format and lifetime checks for a binding certificate.
fn check_binding(binding: &Signature, now: SystemTime) -> Result<(), String> {
    let can_sign = binding
        .key_flags()
        .map(|flags| flags.for_signing())
        .unwrap_or(false);
    if !can_sign {
        return Err("binding does not grant the signing capability".to_string());
    }

    check_signature_format(binding).map_err(|e| format!("wrong format: {}", e))?;

    let validity = match binding.key_validity_period() {
        None => return Err("expiration is missing in signature".to_string()),
        Some(d) if d.is_zero() => return Err("signature must have an expiration".to_string()),
        Some(d) => d,
    };
    if validity > MAX_BINDING_VALIDITY {
        return Err("signature expiration must not be more than 6 years".to_string());
    }

    let created = binding
        .signature_creation_time()
        .ok_or_else(|| "signature creation time is missing".to_string())?;
    if created >= now {
        return Err("signature creation time must be in the past".to_string());
    }
    let age = now.duration_since(created).unwrap_or_default();
    if age > MAX_BINDING_AGE {
        return Err(
            "signature created more than 30 years in the past, this is not supported".to_string(),
        );
    }

    if created + validity <= now {
        return Err("signature expired".to_string());
    }

    Ok(())
}
