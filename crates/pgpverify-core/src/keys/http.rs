//! HTTP layer: status mapping and retry.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::{VerifyError, VerifyResult};

/// Longest pause between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Why a single attempt failed, and whether another attempt may help.
#[derive(Debug)]
pub(crate) struct AttemptError {
    pub(crate) error: VerifyError,
    pub(crate) transient: bool,
    pub(crate) retry_after: Option<Duration>,
}

impl AttemptError {
    fn fatal(error: VerifyError) -> Self {
        Self {
            error,
            transient: false,
            retry_after: None,
        }
    }

    fn transient(error: VerifyError, retry_after: Option<Duration>) -> Self {
        Self {
            error,
            transient: true,
            retry_after,
        }
    }
}

/// `2^retries` seconds, capped at [`MAX_BACKOFF`].
fn exponential_backoff(retries: u32) -> Duration {
    let secs = 1_u64.checked_shl(retries).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) max_retries: u32,
}

impl HttpBackend {
    /// GET `url`, retrying transient failures with jittered exponential backoff.
    pub(crate) async fn get_bytes(&self, url: &str) -> VerifyResult<Vec<u8>> {
        use rand::Rng;

        let mut retries = 0;

        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.transient && retries < self.max_retries => {
                    retries += 1;

                    let backoff = match e.retry_after {
                        Some(retry_after) => {
                            let base_ms = retry_after.min(MAX_BACKOFF).as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        None => {
                            let jittered_ms = rand::thread_rng()
                                .gen_range(0..=exponential_backoff(retries).as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e.error,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying key bundle request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e.error),
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = VerifyError::from(e);
                let transient = error.is_retryable();
                return Err(AttemptError {
                    error,
                    transient,
                    retry_after: None,
                });
            }
        };
        let status = response.status();

        match status.as_u16() {
            200..=299 => {
                let body = response.bytes().await.map_err(|e| {
                    AttemptError::transient(
                        VerifyError::Network {
                            message: format!("failed to read response body: {}", e),
                        },
                        None,
                    )
                })?;
                debug!(bytes = body.len(), "key bundle downloaded");
                Ok(body.to_vec())
            }

            404 => Err(AttemptError::fatal(VerifyError::Network {
                message: format!("key bundle not found: {}", url),
            })),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(AttemptError::transient(
                    VerifyError::Network {
                        message: "rate limited (HTTP 429)".to_string(),
                    },
                    retry_after,
                ))
            }

            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| status.to_string());
                let error = VerifyError::Network {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                };
                if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
                    Err(AttemptError::transient(error, None))
                } else {
                    Err(AttemptError::fatal(error))
                }
            }
        }
    }
}
