//! Exit code contract, exercised against the GnuPG material shipped with pgpverify-core.
#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

const AS_OF: &str = "2011-01-01T00:00:00Z";

fn interop(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../pgpverify-core/tests/data/interop")
        .join(name)
}

fn pgpverify() -> Command {
    let mut cmd = Command::cargo_bin("pgpverify").expect("pgpverify binary");
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn signature_cmd(signature: &str) -> Command {
    let mut cmd = pgpverify();
    cmd.arg("signature")
        .arg(interop("artifact.txt"))
        .arg("--signature")
        .arg(interop(signature))
        .arg("--keys")
        .arg(interop("KEYS.asc"))
        .arg("--master-key")
        .arg(interop("anchor.asc"));
    cmd
}

fn checksum_cmd(checksum: &str) -> Command {
    let mut cmd = pgpverify();
    cmd.arg("checksum")
        .arg(interop("artifact.txt"))
        .arg("--checksum")
        .arg(interop(checksum))
        .arg("--signature")
        .arg(interop(&format!("{checksum}.asc")))
        .arg("--keys")
        .arg(interop("KEYS.asc"))
        .arg("--master-key")
        .arg(interop("anchor.asc"))
        .arg("--at")
        .arg(AS_OF);
    cmd
}

#[test]
fn signature_verifies_as_of_signing_window() {
    signature_cmd("artifact.txt.sig")
        .arg("--at")
        .arg(AS_OF)
        .assert()
        .success()
        .stdout(predicate::str::contains("EC793F202D0B0154"));
}

#[test]
fn signature_json_output() {
    let output = signature_cmd("artifact.txt.asc")
        .arg("--at")
        .arg(AS_OF)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(v["signer_key_id"], "EC793F202D0B0154");
    assert_eq!(v["master_key_id"], "5FEE33BBA5FEFD5C");
}

#[test]
fn expired_binding_exits_untrusted() {
    // The signing subkey binding lapsed in 2012.
    signature_cmd("artifact.txt.sig").assert().code(3);
}

#[test]
fn revoked_signer_exits_untrusted() {
    signature_cmd("artifact.txt.revoked.asc")
        .arg("--at")
        .arg(AS_OF)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("DEE922459B678BE9"));
}

#[test]
fn signature_over_other_content_exits_tampered() {
    signature_cmd("artifact.txt.sha256.asc")
        .arg("--at")
        .arg(AS_OF)
        .assert()
        .code(4);
}

#[test]
fn missing_signature_file_exits_input_error() {
    signature_cmd("does-not-exist.sig").assert().code(1);
}

#[test]
fn checksum_defaults_expected_name_to_file_name() {
    checksum_cmd("artifact.txt.sha256")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "c098f9056f310b01c75b47c88903ce13d6a85cb9875782c6131f5daae3446a0f",
        ));
}

#[test]
fn checksum_for_other_file_name_exits_tampered() {
    checksum_cmd("renamed.sha256")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("other.txt"));
}

#[test]
fn checksum_expected_name_override() {
    checksum_cmd("renamed.sha256")
        .arg("--expected-name")
        .arg("other.txt")
        .assert()
        .success();
}

#[test]
fn checksum_with_wrong_digest_exits_tampered() {
    checksum_cmd("wrongdigest.sha256").assert().code(4);
}

#[test]
fn unparseable_master_key_exits_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let master = dir.path().join("master.asc");
    std::fs::write(&master, b"not a key").unwrap();

    pgpverify()
        .arg("signature")
        .arg(interop("artifact.txt"))
        .arg("--signature")
        .arg(interop("artifact.txt.sig"))
        .arg("--keys")
        .arg(interop("KEYS.asc"))
        .arg("--master-key")
        .arg(&master)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid master key"));
}
