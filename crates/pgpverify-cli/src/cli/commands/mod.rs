use super::args::{Cli, Command, TrustArgs};
use crate::exit_codes;
use anyhow::Context;
use pgpverify_core::{
    KeyRing, KeysClient, MasterKey, SignatureVerifier, VerifierConfig, VerifyError,
};
use std::path::Path;
use std::time::SystemTime;

pub mod checksum;
pub mod signature;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let result = match cli.cmd {
        Command::Signature(args) => signature::run(args).await,
        Command::Checksum(args) => checksum::run(args).await,
    };
    Ok(match result {
        Ok(code) => code,
        Err(e) => report(&e),
    })
}

/// Print a failed verification and map it to its exit code.
fn report(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<VerifyError>() {
        Some(verify_err) => {
            eprintln!("verification failed: {err:#}");
            exit_codes::for_error(verify_err)
        }
        None => {
            eprintln!("error: {err:#}");
            exit_codes::INPUT_ERROR
        }
    }
}

pub(crate) fn read_file(path: &Path, what: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {what}: {}", path.display()))
}

/// Key material and verifier shared by both subcommands.
pub(crate) struct TrustSetup {
    pub keyring: KeyRing,
    pub verifier: SignatureVerifier,
}

impl TrustSetup {
    pub(crate) async fn load(args: &TrustArgs) -> anyhow::Result<Self> {
        let config = VerifierConfig::from_env();

        let master = match &args.master_key {
            Some(path) => MasterKey::from_bytes(&read_file(path, "master key")?)
                .with_context(|| format!("invalid master key: {}", path.display()))?,
            None => MasterKey::embedded()?,
        };
        tracing::debug!(key_id = %master.key_id(), bits = master.bits(), "trust anchor loaded");

        let keyring = match &args.keys {
            Some(path) => KeyRing::from_bytes(&read_file(path, "key bundle")?)
                .with_context(|| format!("invalid key bundle: {}", path.display()))?,
            None => {
                let client = KeysClient::new(&config)?;
                tracing::info!(url = %client.url(), "fetching key bundle");
                client
                    .fetch_keyring()
                    .await
                    .with_context(|| format!("failed to fetch key bundle from {}", client.url()))?
            }
        };

        let mut verifier = SignatureVerifier::new(master).with_config(&config);
        if let Some(at) = args.at {
            verifier = verifier.with_reference_time(SystemTime::from(at));
        }

        Ok(Self { keyring, verifier })
    }
}
