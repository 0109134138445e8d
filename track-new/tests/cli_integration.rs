//! CLI integration tests for track-new
//!
//! Only paths that fail before any network request are exercised here.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn track_new(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("track-new").unwrap();
    cmd.env("HOME", temp.path())
        .env("TRACKCAST_CONFIG", temp.path().join("missing.toml"))
        .env_remove("MARKDOWN_OUTPUT_PATH")
        .env_remove("IMAGE_OUTPUT_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_flag_output() {
    let temp = TempDir::new().unwrap();
    track_new(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bandcamp"))
        .stdout(predicate::str::contains("--no-post"));
}

#[test]
fn test_rejects_non_http_url() {
    let temp = TempDir::new().unwrap();
    track_new(&temp)
        .arg("bandcamp.com/track/x")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not an http(s) URL"));
}

#[test]
fn test_prompted_url_is_validated() {
    let temp = TempDir::new().unwrap();
    track_new(&temp)
        .write_stdin("ftp://example.com/track\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Bandcamp track URL"))
        .stderr(predicate::str::contains("not an http(s) URL"));
}

#[test]
fn test_missing_output_directories() {
    let temp = TempDir::new().unwrap();
    track_new(&temp)
        .arg("https://artist.bandcamp.com/track/song")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to create a document"));
}
