//! Trusted master key.
//!
//! The master key is the root of trust. It never expires; subkeys signed by
//! it are rotated and revoked through the untrusted key bundle instead.

use sequoia_openpgp::packet::key::{PrimaryRole, PublicParts};
use sequoia_openpgp::packet::Key;
use sequoia_openpgp::parse::{PacketParser, PacketParserResult, Parse};
use sequoia_openpgp::{Fingerprint, KeyID, Packet};

use crate::error::{VerifyError, VerifyResult};
use crate::extract::armor_blocks;
use crate::policy::check_public_key_format;

/// download@jetbrains.com master public key (bare key packet, no expiration).
pub const DOWNLOADS_MASTER_PUBLIC_KEY: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----

mQGNBGBP58sBDADYRZmxLOkqrz0QZ/yESRpv7IeHGLqDE1a8QfFtFb14MJCLSAAS
3nMD6Szi9mEjEqYdJURRcMjbUBhePgbhzGa3FYkjAB8lj6IKbu+ogCwVm1S8+caZ
C6HNP1CIefa1wQgi/6FNWEBKbKefUr/DoG1fBAWUvTPC2BjiYOHDaU1xFWwhF3Np
p0gEoK2KNgGgy/aSCi9Rb1M1ynPF7CcY8vKpAo6YfJpoNnput3t5FoF0uPnIac0F
gikw6Iz8knUoYeqW2MTKNBxgQrtS+Ji1J0EgzT2Nq1SBMPfmq4/h1+XOQweWY/NR
GNQTzcR3v+FkLkqCIaywcWUMXkhFXB8U3TdPa4bCEbFlP/AUkEw0X/obxm0isshU
w7MRMPoBXR3FkEApkxB+bFptY3ZbBYhu5PCf4FWBE8+FkYEJ31IS+nABC2u9Jcav
o5TqVd0y4e8VZ2qz18ez3j2G+nVthHz2OZ3AdEmq60K6iD57RY0H8zQK7xeEe3Ye
VoRmpZdS8Eyk2aEAEQEAAQ==
=MhMZ
-----END PGP PUBLIC KEY BLOCK-----
";

/// Where the untrusted subkey bundle for [`DOWNLOADS_MASTER_PUBLIC_KEY`] is published.
pub const DOWNLOADS_KEYS_URL: &str = "https://download.jetbrains.com/KEYS";

/// The trust anchor: a validated v4 RSA primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKey {
    key: Key<PublicParts, PrimaryRole>,
}

impl MasterKey {
    /// Load a master key from an armored or binary key block.
    ///
    /// Only the leading key packet is used; user IDs and signatures after it
    /// are discarded. A second key of any kind, in the same armored block or
    /// a concatenated one, is an error.
    pub fn from_bytes(bytes: &[u8]) -> VerifyResult<Self> {
        let mut master: Option<Key<PublicParts, PrimaryRole>> = None;

        for block in armor_blocks(bytes) {
            let mut ppr = PacketParser::from_bytes(block).map_err(parse_error)?;

            while let PacketParserResult::Some(pp) = ppr {
                let (packet, next) = pp.next().map_err(parse_error)?;
                ppr = next;

                match (packet, master.is_some()) {
                    (Packet::PublicKey(key), false) => master = Some(key),
                    (Packet::PublicSubkey(key), false) => {
                        return Err(VerifyError::malformed(format!(
                            "key {} must be a master key",
                            key.keyid().to_hex()
                        )));
                    }
                    (Packet::SecretKey(_) | Packet::SecretSubkey(_), _) => {
                        return Err(VerifyError::malformed(
                            "trusted master key must be a public key, found secret key material",
                        ));
                    }
                    (Packet::PublicKey(_) | Packet::PublicSubkey(_), true) => {
                        return Err(VerifyError::malformed(
                            "trusted master key block contains more than one key",
                        ));
                    }
                    (other, false) => {
                        return Err(VerifyError::malformed(format!(
                            "expected a public key packet, got {}",
                            other.tag()
                        )));
                    }
                    (_, true) => {}
                }
            }
        }

        let key = master.ok_or_else(|| VerifyError::malformed("no key in trusted master key block"))?;
        check_public_key_format(&key)?;

        tracing::debug!(key_id = %key.keyid(), "loaded trusted master key");
        Ok(Self { key })
    }

    /// Load the compiled-in [`DOWNLOADS_MASTER_PUBLIC_KEY`].
    pub fn embedded() -> VerifyResult<Self> {
        Self::from_bytes(DOWNLOADS_MASTER_PUBLIC_KEY.as_bytes())
    }

    pub fn key_id(&self) -> KeyID {
        self.key.keyid()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.key.fingerprint()
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.key.mpis().bits().unwrap_or(0)
    }

    pub(crate) fn key(&self) -> &Key<PublicParts, PrimaryRole> {
        &self.key
    }
}

fn parse_error(err: anyhow::Error) -> VerifyError {
    VerifyError::malformed(format!("cannot decode trusted master key: {}", err))
}
