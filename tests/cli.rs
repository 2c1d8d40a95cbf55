use std::fs;

use assert_cmd::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TEXT: &str = "It was the best of times, it was the worst of times,\n\
it was the age of wisdom, it was the age of foolishness.\n";

/// `huff` running inside `dir`, with RUST_LOG cleared so stderr is predictable.
fn huff_cmd(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("huff");
    cmd.current_dir(dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn roundtrip_with_default_paths() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("tale.txt"), TEXT).unwrap();

    for symbols in ["char", "word"] {
        huff_cmd(&tmp)
            .args(["compress", "--symbols", symbols, "tale.txt"])
            .assert()
            .success();
        assert!(tmp.path().join("tale.txt.huf").is_file());

        huff_cmd(&tmp)
            .args(["decompress", "tale.txt.huf"])
            .assert()
            .success();
        let restored = fs::read_to_string(tmp.path().join("tale-decompressed.txt")).unwrap();
        assert_eq!(restored, TEXT);
    }
}

#[test]
fn explicit_output_and_inspect() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("in.txt"), "aaab").unwrap();

    huff_cmd(&tmp)
        .args(["compress", "-s", "char", "in.txt", "-o", "packed.bin"])
        .assert()
        .success();

    huff_cmd(&tmp)
        .args(["inspect", "packed.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("granularity:  char"))
        .stdout(predicate::str::contains("bits:         4"))
        .stdout(predicate::str::contains("padding bits: 4"))
        .stdout(predicate::str::contains("\"a\""));

    huff_cmd(&tmp)
        .args(["decompress", "packed.bin", "-o", "out.txt", "--symbols", "char"])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(tmp.path().join("out.txt")).unwrap(), "aaab");
}

#[test]
fn stage_timers_logged_by_default() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("in.txt"), TEXT).unwrap();

    huff_cmd(&tmp)
        .args(["compress", "-s", "word", "in.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("TIME (SymbolModel)"))
        .stderr(predicate::str::contains("TIME (Encoding)"));

    huff_cmd(&tmp)
        .args(["decompress", "in.txt.huf"])
        .assert()
        .success()
        .stderr(predicate::str::contains("TIME (Decompressing)"));
}

#[test]
fn stage_timers_silenced_at_warn() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("in.txt"), TEXT).unwrap();

    huff_cmd(&tmp)
        .args(["--log-level", "warn", "compress", "-s", "word", "in.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("TIME").not());
}

#[test]
fn missing_symbols_is_usage_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("in.txt"), "abc").unwrap();

    huff_cmd(&tmp)
        .args(["compress", "in.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--symbols"));
}

#[test]
fn granularity_mismatch_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("in.txt"), "one two").unwrap();

    huff_cmd(&tmp)
        .args(["compress", "-s", "word", "in.txt"])
        .assert()
        .success();
    huff_cmd(&tmp)
        .args(["decompress", "-s", "char", "in.txt.huf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("word"));
}

#[test]
fn empty_input_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("empty.txt"), "").unwrap();

    huff_cmd(&tmp)
        .args(["compress", "-s", "char", "empty.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty input"));
    assert!(!tmp.path().join("empty.txt.huf").exists());
}

#[test]
fn corrupt_artifact_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("junk.huf"), b"not an artifact").unwrap();

    huff_cmd(&tmp)
        .args(["decompress", "junk.huf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid artifact"));
}
