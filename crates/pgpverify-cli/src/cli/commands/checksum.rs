use super::super::args::ChecksumArgs;
use super::{read_file, TrustSetup};
use crate::exit_codes;
use anyhow::Context;
use pgpverify_core::{extract_signatures, ChecksumVerifier};

pub async fn run(args: ChecksumArgs) -> anyhow::Result<i32> {
    let expected_name = match &args.expected_name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("cannot derive a file name from {}", args.file.display()))?,
    };

    let checksum_file = read_file(&args.checksum, "checksum file")?;
    let signatures = extract_signatures(&read_file(&args.signature, "signature")?)
        .with_context(|| format!("invalid signature file: {}", args.signature.display()))?;
    let setup = TrustSetup::load(&args.trust).await?;

    let mut artifact = std::fs::File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let record = ChecksumVerifier::new(setup.verifier).verify(
        &mut artifact,
        &signatures,
        &checksum_file,
        &expected_name,
        &setup.keyring,
    )?;

    if args.trust.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "OK: {} matches signed checksum {}",
            args.file.display(),
            record.digest
        );
    }
    Ok(exit_codes::SUCCESS)
}
