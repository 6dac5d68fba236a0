//! Detached signature extraction.
//!
//! A detached signature file is either a run of signature packets, or a
//! single compressed container holding such a run. Anything deeper is
//! rejected.

use sequoia_openpgp::packet::{Signature, Tag};
use sequoia_openpgp::parse::{PacketParser, PacketParserResult, Parse};
use sequoia_openpgp::Packet;

use crate::error::{VerifyError, VerifyResult};

/// Coarse classification of a decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PacketKind {
    Compressed,
    Signature,
    Other(Tag),
}

impl PacketKind {
    pub(crate) fn of(packet: &Packet) -> Self {
        match packet {
            Packet::CompressedData(_) => Self::Compressed,
            Packet::Signature(_) => Self::Signature,
            other => Self::Other(other.tag()),
        }
    }
}

/// Decode `bytes` (armored or binary) into the signatures they carry, in encounter order.
pub fn extract_signatures(bytes: &[u8]) -> VerifyResult<Vec<Signature>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(VerifyError::malformed("PGP signature stream is empty"));
    }

    let mut ppr = PacketParser::from_bytes(bytes).map_err(parse_error)?;
    let mut signatures = Vec::new();
    // Nesting level of the signature list, fixed by its first packet.
    let mut list_depth: Option<isize> = None;

    while let PacketParserResult::Some(pp) = ppr {
        let depth = pp.recursion_depth();
        let kind = PacketKind::of(&pp.packet);

        if let Some(list_depth) = list_depth {
            if depth != list_depth || kind != PacketKind::Signature {
                break;
            }
        }

        match kind {
            PacketKind::Compressed if depth > 0 => {
                return Err(VerifyError::malformed(
                    "compressed data nested inside compressed data",
                ));
            }
            PacketKind::Compressed => {
                tracing::debug!("unwrapping compressed signature container");
                let (_, next) = pp.recurse().map_err(parse_error)?;
                ppr = next;
            }
            PacketKind::Signature => {
                let (packet, next) = pp.next().map_err(parse_error)?;
                if let Packet::Signature(sig) = packet {
                    signatures.push(sig);
                }
                list_depth = Some(depth);
                ppr = next;
            }
            PacketKind::Other(tag) => {
                return Err(VerifyError::malformed(format!(
                    "expected a signature list, got {} packet",
                    tag
                )));
            }
        }
    }

    if signatures.is_empty() {
        return Err(VerifyError::malformed("no signature list found"));
    }

    tracing::debug!(count = signatures.len(), "extracted detached signatures");
    Ok(signatures)
}

const ARMOR_BEGIN: &[u8] = b"-----BEGIN PGP ";

/// Split `bytes` into its ASCII-armored blocks.
///
/// Exported key files are often concatenated, and an armor reader stops at
/// the first `-----END` line. Binary input, or text with at most one armor
/// header, is returned whole.
pub(crate) fn armor_blocks(bytes: &[u8]) -> Vec<&[u8]> {
    let binary = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| b & 0x80 != 0);
    if binary {
        return vec![bytes];
    }

    let starts: Vec<usize> = bytes
        .windows(ARMOR_BEGIN.len())
        .enumerate()
        .filter(|(_, window)| *window == ARMOR_BEGIN)
        .map(|(i, _)| i)
        .collect();
    if starts.len() <= 1 {
        return vec![bytes];
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(bytes.len());
            &bytes[start..end]
        })
        .collect()
}

fn parse_error(err: anyhow::Error) -> VerifyError {
    VerifyError::malformed(format!("cannot decode OpenPGP data: {}", err))
}
