//! Untrusted key bundle.
//!
//! Nothing loaded here is trusted. The bundle only tells the verifier which
//! subkeys exist and which certificates travel with them; every certificate
//! is checked against the master key later.

use std::collections::{HashMap, HashSet};

use sequoia_openpgp::packet::key::{PublicParts, SubordinateRole};
use sequoia_openpgp::packet::{Key, Signature};
use sequoia_openpgp::parse::{PacketParser, PacketParserResult, Parse};
use sequoia_openpgp::types::PublicKeyAlgorithm;
use sequoia_openpgp::{KeyID, Packet};
use tracing::{debug, warn};

use crate::error::{VerifyError, VerifyResult};
use crate::extract::armor_blocks;

/// A subkey from the bundle, with the signatures that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSubKey {
    key: Key<PublicParts, SubordinateRole>,
    signatures: Vec<Signature>,
}

impl CandidateSubKey {
    pub fn new(key: Key<PublicParts, SubordinateRole>) -> Self {
        Self {
            key,
            signatures: Vec::new(),
        }
    }

    pub fn key_id(&self) -> KeyID {
        self.key.keyid()
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.key.pk_algo()
    }

    /// Modulus size in bits, when the algorithm has one.
    pub fn bits(&self) -> Option<usize> {
        self.key.mpis().bits()
    }

    /// Binding and revocation certificates attached to this subkey, in bundle order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn key(&self) -> &Key<PublicParts, SubordinateRole> {
        &self.key
    }
}

/// Key-ID indexed view of an untrusted key bundle.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    subkeys: HashMap<KeyID, CandidateSubKey>,
    primary_ids: HashSet<KeyID>,
}

impl KeyRing {
    /// Decode an armored or binary bundle of transferable public keys.
    pub fn from_bytes(bytes: &[u8]) -> VerifyResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(VerifyError::malformed("key bundle is empty"));
        }

        let mut ring = Self::default();
        let mut current: Option<CandidateSubKey> = None;
        let blocks = armor_blocks(bytes);
        if blocks.len() > 1 {
            debug!(blocks = blocks.len(), "key bundle has several armored blocks");
        }

        for block in blocks {
            let mut ppr = PacketParser::from_bytes(block).map_err(parse_error)?;

            while let PacketParserResult::Some(pp) = ppr {
                let (packet, next) = pp.next().map_err(parse_error)?;
                ppr = next;

                match packet {
                    Packet::PublicKey(key) => {
                        ring.flush(current.take());
                        ring.primary_ids.insert(key.keyid());
                    }
                    Packet::SecretKey(key) => {
                        ring.flush(current.take());
                        ring.primary_ids.insert(key.keyid());
                    }
                    Packet::PublicSubkey(key) => {
                        ring.flush(current.take());
                        current = Some(CandidateSubKey::new(key));
                    }
                    Packet::SecretSubkey(key) => {
                        ring.flush(current.take());
                        current = Some(CandidateSubKey::new(key.parts_into_public()));
                    }
                    Packet::UserID(_) | Packet::UserAttribute(_) => {
                        ring.flush(current.take());
                    }
                    Packet::Signature(sig) => {
                        if let Some(subkey) = current.as_mut() {
                            subkey.signatures.push(sig);
                        }
                    }
                    Packet::CompressedData(_) => {
                        return Err(VerifyError::malformed(
                            "compressed data is not allowed in a key bundle",
                        ));
                    }
                    other => {
                        debug!(tag = %other.tag(), "ignoring packet in key bundle");
                    }
                }
            }
        }
        ring.flush(current.take());

        debug!(
            subkeys = ring.subkeys.len(),
            primaries = ring.primary_ids.len(),
            "loaded untrusted key bundle"
        );
        Ok(ring)
    }

    fn flush(&mut self, subkey: Option<CandidateSubKey>) {
        let Some(subkey) = subkey else {
            return;
        };
        let key_id = subkey.key_id();
        if self.subkeys.contains_key(&key_id) {
            warn!(key_id = %key_id, "duplicate subkey in key bundle, keeping the first one");
            return;
        }
        self.subkeys.insert(key_id, subkey);
    }

    /// Look up a subkey. Primary keys are never returned.
    pub fn get(&self, key_id: &KeyID) -> Option<&CandidateSubKey> {
        self.subkeys.get(key_id)
    }

    /// Whether `key_id` names a primary key in the bundle.
    pub fn is_primary(&self, key_id: &KeyID) -> bool {
        self.primary_ids.contains(key_id)
    }

    pub fn subkeys(&self) -> impl Iterator<Item = &CandidateSubKey> {
        self.subkeys.values()
    }

    pub fn len(&self) -> usize {
        self.subkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subkeys.is_empty()
    }
}

/// Key IDs a signature names as its issuer, from issuer and issuer-fingerprint subpackets.
pub(crate) fn issuer_key_ids(sig: &Signature) -> Vec<KeyID> {
    let mut ids: Vec<KeyID> = Vec::new();
    let named = sig
        .issuers()
        .cloned()
        .chain(sig.issuer_fingerprints().map(KeyID::from));
    for id in named {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

pub(crate) fn is_issued_by(sig: &Signature, key_id: &KeyID) -> bool {
    issuer_key_ids(sig).iter().any(|id| id == key_id)
}

fn parse_error(err: anyhow::Error) -> VerifyError {
    VerifyError::malformed(format!("cannot decode key bundle: {}", err))
}
