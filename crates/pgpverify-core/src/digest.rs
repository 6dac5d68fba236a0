use std::io::Read;

use sequoia_openpgp::crypto::hash::Digest;
use sequoia_openpgp::packet::Signature;
use sequoia_openpgp::types::SignatureType;
use sha2::Sha256;

use crate::error::{VerifyError, VerifyResult};
use crate::policy::FormatError;
use crate::types::CancellationFlag;

/// Hash context for the data a detached signature covers.
///
/// Text signatures are computed over the data with every line ending
/// (`\r\n`, `\r` or `\n`) replaced by `\r\n`. A line ending split across two
/// `update` calls is handled.
pub(crate) struct SignedDataHasher {
    ctx: Box<dyn Digest>,
    text: bool,
    last_was_cr: bool,
}

impl SignedDataHasher {
    pub(crate) fn for_signature(sig: &Signature) -> VerifyResult<Self> {
        let ctx = sig.hash_algo().context().map_err(|_| {
            VerifyError::Format(FormatError::UnsupportedHashAlgorithm {
                algorithm: sig.hash_algo().to_string(),
            })
        })?;
        Ok(Self {
            ctx,
            text: sig.typ() == SignatureType::Text,
            last_was_cr: false,
        })
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        if !self.text {
            self.ctx.update(data);
            return;
        }

        let mut run_start = 0;
        for (i, &byte) in data.iter().enumerate() {
            match byte {
                b'\r' => {
                    self.ctx.update(&data[run_start..i]);
                    self.ctx.update(b"\r\n");
                    run_start = i + 1;
                    self.last_was_cr = true;
                }
                b'\n' => {
                    self.ctx.update(&data[run_start..i]);
                    if !self.last_was_cr {
                        self.ctx.update(b"\r\n");
                    }
                    run_start = i + 1;
                    self.last_was_cr = false;
                }
                _ => self.last_was_cr = false,
            }
        }
        self.ctx.update(&data[run_start..]);
    }

    /// The context to hand to `Signature::verify_hash`, which appends the signature trailer.
    pub(crate) fn into_context(self) -> Box<dyn Digest> {
        self.ctx
    }
}

/// Feed `reader` to `update` in `chunk_size` pieces, checking `cancel` between chunks.
pub(crate) fn hash_reader<R: Read>(
    mut reader: R,
    mut update: impl FnMut(&[u8]),
    chunk_size: usize,
    cancel: Option<&CancellationFlag>,
) -> VerifyResult<u64> {
    let mut buf = vec![0_u8; chunk_size.max(1)];
    let mut total = 0_u64;

    loop {
        if cancel.is_some_and(CancellationFlag::is_cancelled) {
            return Err(VerifyError::Cancelled);
        }
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        update(&buf[..n]);
        total += n as u64;
    }

    Ok(total)
}

pub(crate) fn sha256_hex_reader<R: Read>(
    reader: R,
    chunk_size: usize,
    cancel: Option<&CancellationFlag>,
) -> VerifyResult<String> {
    let mut hash = <Sha256 as sha2::Digest>::new();
    hash_reader(
        reader,
        |chunk| sha2::Digest::update(&mut hash, chunk),
        chunk_size,
        cancel,
    )?;
    Ok(hex::encode(sha2::Digest::finalize(hash)))
}
