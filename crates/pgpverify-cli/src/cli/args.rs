use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pgpverify",
    version,
    about = "Verify downloaded artifacts against a PGP master key and its signing subkeys"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify a detached signature over a file
    Signature(SignatureArgs),
    /// Verify a file through a signed SHA-256 checksum file
    Checksum(ChecksumArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TrustArgs {
    /// Untrusted key bundle (armored or binary). Fetched from PGPVERIFY_KEYS_URL when omitted
    #[arg(long, value_name = "BUNDLE")]
    pub keys: Option<PathBuf>,

    /// Trusted master public key. The embedded download key is used when omitted
    #[arg(long = "master-key", value_name = "ASC")]
    pub master_key: Option<PathBuf>,

    /// Evaluate key validity as of this RFC 3339 time instead of now
    #[arg(long, value_name = "TIME")]
    pub at: Option<DateTime<Utc>>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SignatureArgs {
    /// File to verify
    pub file: PathBuf,

    /// Detached signature (armored or binary)
    #[arg(long, value_name = "SIG")]
    pub signature: PathBuf,

    #[command(flatten)]
    pub trust: TrustArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ChecksumArgs {
    /// File to verify
    pub file: PathBuf,

    /// Checksum file (`<sha256>  <name>`)
    #[arg(long, value_name = "SHA256")]
    pub checksum: PathBuf,

    /// Detached signature over the checksum file
    #[arg(long, value_name = "SIG")]
    pub signature: PathBuf,

    /// File name the checksum file must record. Defaults to the name of FILE
    #[arg(long = "expected-name", value_name = "NAME")]
    pub expected_name: Option<String>,

    #[command(flatten)]
    pub trust: TrustArgs,
}
