//! Verification results, configuration and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anchor::DOWNLOADS_KEYS_URL;

/// The signature that authenticated an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSignature {
    /// Key ID of the subkey that made the signature (16 uppercase hex digits).
    pub signer_key_id: String,

    /// Key ID of the trust anchor the subkey chains to.
    pub master_key_id: String,

    /// Signature creation time.
    pub created_at: DateTime<Utc>,

    /// Hash algorithm of the signature (e.g., "SHA256").
    pub hash_algorithm: String,
}

/// Parsed content of a `.sha256` checksum file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRecord {
    /// Lowercase hex SHA-256 digest (64 characters).
    pub digest: String,

    /// File name the digest was recorded for.
    pub filename: String,
}

/// Verifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// URL of the untrusted key bundle.
    #[serde(default = "default_keys_url")]
    pub keys_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Read buffer size when hashing artifacts.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_keys_url() -> String {
    DOWNLOADS_KEYS_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_chunk_size() -> usize {
    16 * 1024
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            keys_url: default_keys_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl VerifierConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `PGPVERIFY_KEYS_URL` | Key bundle URL |
    /// | `PGPVERIFY_TIMEOUT` | Request timeout in seconds |
    /// | `PGPVERIFY_MAX_RETRIES` | Retries for transient fetch failures |
    pub fn from_env() -> Self {
        Self {
            keys_url: std::env::var("PGPVERIFY_KEYS_URL").unwrap_or_else(|_| default_keys_url()),
            timeout_secs: std::env::var("PGPVERIFY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("PGPVERIFY_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
            chunk_size: default_chunk_size(),
        }
    }

    /// Set the key bundle URL.
    pub fn with_keys_url(mut self, url: impl Into<String>) -> Self {
        self.keys_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the hashing buffer size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Shared flag a caller sets to abort a running verification.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next chunk boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
