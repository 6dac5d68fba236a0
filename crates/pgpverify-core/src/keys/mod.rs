//! Key bundle download.
//!
//! The bundle is untrusted, so fetching it needs no authentication and no
//! integrity checks of its own. Trust is established later against the
//! master key.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::{VerifyError, VerifyResult};
use crate::keyring::KeyRing;
use crate::types::VerifierConfig;

mod http;

use http::HttpBackend;

const USER_AGENT_VALUE: &str = concat!("pgpverify/", env!("CARGO_PKG_VERSION"));

/// Downloads the untrusted key bundle.
#[derive(Debug, Clone)]
pub struct KeysClient {
    http: HttpBackend,
    url: String,
}

impl KeysClient {
    pub fn new(config: &VerifierConfig) -> VerifyResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| VerifyError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                max_retries: config.max_retries,
            },
            url: config.keys_url.clone(),
        })
    }

    pub fn from_env() -> VerifyResult<Self> {
        Self::new(&VerifierConfig::from_env())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw bundle bytes.
    pub async fn fetch(&self) -> VerifyResult<Vec<u8>> {
        debug!(url = %self.url, "fetching key bundle");
        self.http.get_bytes(&self.url).await
    }

    /// Fetch and decode the bundle.
    pub async fn fetch_keyring(&self) -> VerifyResult<KeyRing> {
        let bytes = self.fetch().await?;
        KeyRing::from_bytes(&bytes)
    }
}
