use super::super::args::SignatureArgs;
use super::{read_file, TrustSetup};
use crate::exit_codes;
use anyhow::Context;
use pgpverify_core::extract_signatures;

pub async fn run(args: SignatureArgs) -> anyhow::Result<i32> {
    let signatures = extract_signatures(&read_file(&args.signature, "signature")?)
        .with_context(|| format!("invalid signature file: {}", args.signature.display()))?;
    let setup = TrustSetup::load(&args.trust).await?;

    let mut artifact = std::fs::File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let verified = setup
        .verifier
        .verify(&mut artifact, &signatures, &setup.keyring)?;

    if args.trust.json {
        println!("{}", serde_json::to_string_pretty(&verified)?);
    } else {
        println!(
            "OK: {} signed by {} (master {}) at {}",
            args.file.display(),
            verified.signer_key_id,
            verified.master_key_id,
            verified.created_at.to_rfc3339()
        );
    }
    Ok(exit_codes::SUCCESS)
}
