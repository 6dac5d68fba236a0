//! OpenPGP fixtures for integration tests.
//!
//! Secret keys live under `tests/data/` (created 2010-01-01 by GnuPG, no
//! passphrase). Certificates and signatures are built here with explicit
//! timestamps so every scenario is deterministic.

#![allow(dead_code)]

use std::time::{Duration, SystemTime};

use chrono::{TimeZone, Utc};
use sequoia_openpgp as openpgp;

use openpgp::armor;
use openpgp::cert::Cert;
use openpgp::crypto::KeyPair;
use openpgp::packet::key::{PrimaryRole, PublicParts, SubordinateRole};
use openpgp::packet::signature::SignatureBuilder;
use openpgp::packet::{Key, Signature};
use openpgp::parse::Parse;
use openpgp::serialize::stream::{Compressor, Message};
use openpgp::serialize::{Serialize, SerializeInto};
use openpgp::types::{CompressionAlgorithm, HashAlgorithm, KeyFlags, SignatureType};
use openpgp::Packet;

pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub fn days(n: u64) -> Duration {
    DAY * n as u32
}

pub fn years(n: u64) -> Duration {
    days(365 * n)
}

pub fn at(year: i32, month: u32, day: u32) -> SystemTime {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap()
        .into()
}

/// Fixed "now" for scenario tests.
pub fn now() -> SystemTime {
    at(2015, 6, 1)
}

pub fn data_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn read_data(name: &str) -> Vec<u8> {
    std::fs::read(data_path(name)).unwrap()
}

/// A GnuPG-generated secret key, usable either as a master or as a subkey.
pub struct Fixture {
    cert: Cert,
}

impl Fixture {
    pub fn load(name: &str) -> Self {
        let cert = Cert::from_file(data_path(name)).unwrap();
        Self { cert }
    }

    pub fn master() -> Self {
        Self::load("master.tsk.asc")
    }

    pub fn signer_a() -> Self {
        Self::load("signer-a.tsk.asc")
    }

    pub fn signer_b() -> Self {
        Self::load("signer-b.tsk.asc")
    }

    pub fn rogue_master() -> Self {
        Self::load("rogue-master.tsk.asc")
    }

    pub fn weak_signer() -> Self {
        Self::load("weak-signer.tsk.asc")
    }

    pub fn ed_signer() -> Self {
        Self::load("ed-signer.tsk.asc")
    }

    pub fn key_id(&self) -> String {
        self.cert.keyid().to_hex()
    }

    pub fn primary_public(&self) -> Key<PublicParts, PrimaryRole> {
        self.cert.primary_key().key().clone()
    }

    /// The same key material presented as a subkey.
    pub fn subkey_public(&self) -> Key<PublicParts, SubordinateRole> {
        self.primary_public().role_into_subordinate()
    }

    pub fn keypair(&self) -> KeyPair {
        self.cert
            .primary_key()
            .key()
            .clone()
            .parts_into_secret()
            .unwrap()
            .into_keypair()
            .unwrap()
    }

    /// Bare public key packet, the shape of the embedded anchor.
    pub fn anchor_bytes(&self) -> Vec<u8> {
        Packet::from(self.primary_public()).to_vec().unwrap()
    }
}

/// Binding certificate parameters.
#[derive(Clone)]
pub struct BindingOptions {
    pub created: SystemTime,
    pub validity: Option<Duration>,
    pub flags: KeyFlags,
    pub hash: HashAlgorithm,
    pub backsig: bool,
}

impl BindingOptions {
    pub fn signing(created: SystemTime, validity: Duration) -> Self {
        Self {
            created,
            validity: Some(validity),
            flags: KeyFlags::empty().set_signing(),
            hash: HashAlgorithm::SHA256,
            backsig: true,
        }
    }
}

/// Binding of `sub` made by `issuer` (normally the master).
pub fn binding_with(issuer: &Fixture, sub: &Fixture, opts: BindingOptions) -> Signature {
    let issuer_public = issuer.primary_public();
    let sub_public = sub.subkey_public();

    let mut builder = SignatureBuilder::new(SignatureType::SubkeyBinding)
        .set_signature_creation_time(opts.created)
        .unwrap()
        .set_key_flags(opts.flags.clone())
        .unwrap()
        .set_hash_algo(opts.hash);
    if let Some(validity) = opts.validity {
        builder = builder.set_key_validity_period(validity).unwrap();
    }
    if opts.backsig {
        let backsig = SignatureBuilder::new(SignatureType::PrimaryKeyBinding)
            .set_signature_creation_time(opts.created)
            .unwrap()
            .set_hash_algo(HashAlgorithm::SHA256)
            .sign_primary_key_binding(&mut sub.keypair(), &issuer_public, &sub_public)
            .unwrap();
        builder = builder.set_embedded_signature(backsig).unwrap();
    }

    builder
        .sign_subkey_binding(&mut issuer.keypair(), &issuer_public, &sub_public)
        .unwrap()
}

/// Signing binding of `sub` by `master`, with a back-signature.
pub fn binding(master: &Fixture, sub: &Fixture, created: SystemTime, validity: Duration) -> Signature {
    binding_with(master, sub, BindingOptions::signing(created, validity))
}

/// Revocation of `sub` made by `issuer`.
pub fn revocation(issuer: &Fixture, sub: &Fixture, created: SystemTime) -> Signature {
    let issuer_public = issuer.primary_public();
    SignatureBuilder::new(SignatureType::SubkeyRevocation)
        .set_signature_creation_time(created)
        .unwrap()
        .set_hash_algo(HashAlgorithm::SHA256)
        .sign_subkey_binding(&mut issuer.keypair(), &issuer_public, &sub.subkey_public())
        .unwrap()
}

/// Detached binary-document signature over `data`.
pub fn detached(signer: &Fixture, data: &[u8], created: SystemTime) -> Signature {
    detached_with(signer, data, created, SignatureType::Binary, HashAlgorithm::SHA256)
}

pub fn detached_with(
    signer: &Fixture,
    data: &[u8],
    created: SystemTime,
    typ: SignatureType,
    hash: HashAlgorithm,
) -> Signature {
    SignatureBuilder::new(typ)
        .set_signature_creation_time(created)
        .unwrap()
        .set_hash_algo(hash)
        .sign_message(&mut signer.keypair(), data)
        .unwrap()
}

/// `data` with LF line endings turned into CRLF, as a text signature is computed.
pub fn crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 8);
    for &byte in data {
        if byte == b'\n' {
            out.push(b'\r');
        }
        out.push(byte);
    }
    out
}

/// Detached text-document signature over `data`, signed the way GnuPG does with `--textmode`.
pub fn detached_text(signer: &Fixture, data: &[u8], created: SystemTime) -> Signature {
    detached_with(
        signer,
        &crlf(data),
        created,
        SignatureType::Text,
        HashAlgorithm::SHA256,
    )
}

/// Binary signature stream.
pub fn sig_bytes(sigs: &[Signature]) -> Vec<u8> {
    let mut out = Vec::new();
    for sig in sigs {
        Packet::from(sig.clone()).serialize(&mut out).unwrap();
    }
    out
}

/// ASCII-armored signature stream.
pub fn armored_sigs(sigs: &[Signature]) -> Vec<u8> {
    let mut writer = armor::Writer::new(Vec::new(), armor::Kind::Signature).unwrap();
    for sig in sigs {
        Packet::from(sig.clone()).serialize(&mut writer).unwrap();
    }
    writer.finalize().unwrap()
}

/// Signature stream wrapped in `levels` compressed containers.
pub fn compressed_sigs(sigs: &[Signature], levels: usize) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut message = Message::new(&mut out);
        for _ in 0..levels {
            message = Compressor::new(message)
                .algo(CompressionAlgorithm::Zip)
                .build()
                .unwrap();
        }
        for sig in sigs {
            Packet::from(sig.clone()).serialize(&mut message).unwrap();
        }
        message.finalize().unwrap();
    }
    out
}

/// Untrusted key bundle under construction.
pub struct Bundle {
    packets: Vec<Packet>,
}

impl Bundle {
    /// Bundle starting with `master`'s public key packet.
    pub fn new(master: &Fixture) -> Self {
        Self {
            packets: vec![Packet::from(master.primary_public())],
        }
    }

    pub fn empty() -> Self {
        Self {
            packets: Vec::new(),
        }
    }

    pub fn primary(mut self, key: &Fixture) -> Self {
        self.packets.push(Packet::from(key.primary_public()));
        self
    }

    pub fn subkey(mut self, sub: &Fixture, sigs: Vec<Signature>) -> Self {
        self.packets.push(Packet::from(sub.subkey_public()));
        self.packets.extend(sigs.into_iter().map(Packet::from));
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for packet in &self.packets {
            packet.serialize(&mut out).unwrap();
        }
        out
    }

    pub fn armored(&self) -> Vec<u8> {
        let mut writer = armor::Writer::new(Vec::new(), armor::Kind::PublicKey).unwrap();
        for packet in &self.packets {
            packet.serialize(&mut writer).unwrap();
        }
        writer.finalize().unwrap()
    }
}

pub const ARTIFACT: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n\
Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.\n";
