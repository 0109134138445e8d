//! CLI integration tests for track-post

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const DOCUMENT: &str = r#"---
title: "Bmptbmp"
artist: "James Shinra"
artistLink: "https://jamesshinra.bandcamp.com"
label: "Afterlife Records"
labelLink: "https://afterlifeRecords.bandcamp.com"
heroImage: "https://static.kdzu.org/images/tracks/bmptbmp.jpg"
pubDate: 2024-03-01
bandcamp: "https://afterlifeRecords.bandcamp.com/track/bmptbmp"
youtube: ""
spotify: "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"
---

Glassy pads over a rolling kick.
"#;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Temp dir with a config (no platform sections), artwork and one document
fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();

    let tracks = temp_dir.path().join("tracks");
    let images = temp_dir.path().join("images");
    fs::create_dir_all(&tracks).unwrap();
    fs::create_dir_all(&images).unwrap();
    fs::write(images.join("bmptbmp.jpg"), b"\xFF\xD8\xFF").unwrap();

    let config_path = temp_dir.path().join("config.toml");
    let config_content = format!(
        r#"
[paths]
markdown_dir = "{}"
image_dir = "{}"
"#,
        escape_path_for_toml(&tracks.to_string_lossy()),
        escape_path_for_toml(&images.to_string_lossy())
    );
    fs::write(&config_path, config_content).unwrap();

    let document = tracks.join("bmptbmp.md");
    fs::write(&document, DOCUMENT).unwrap();

    (temp_dir, config_path, document)
}

fn track_post(config_path: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("track-post").unwrap();
    cmd.env("TRACKCAST_CONFIG", config_path)
        .env_remove("MARKDOWN_OUTPUT_PATH")
        .env_remove("IMAGE_OUTPUT_PATH")
        .env_remove("MORE_TRACKS_URL")
        .env_remove("MASTODON_URL")
        .env_remove("BLUESKY_HANDLE")
        .env_remove("INSTAGRAM_USER_ID")
        .env_remove("RUST_LOG")
        .arg("--no-prompt");
    cmd
}

#[test]
fn test_help_flag_output() {
    let mut cmd = Command::cargo_bin("track-post").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--platform"))
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_dry_run_selected_platforms() {
    let (_temp, config, document) = setup_test_env();

    track_post(&config)
        .arg(&document)
        .args(["--dry-run", "--platform", "bluesky,mastodon", "-t", "techno", "-t", "#ambient"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== bluesky ("))
        .stdout(predicate::str::contains("=== mastodon ("))
        .stdout(predicate::str::contains("=== instagram").not())
        .stdout(predicate::str::contains("Bmptbmp by James Shinra"))
        .stdout(predicate::str::contains("#techno #ambient"))
        .stdout(predicate::str::contains("##").not());
}

#[test]
fn test_dry_run_json_uses_default_platforms() {
    let (_temp, config, document) = setup_test_env();

    let output = track_post(&config)
        .arg(&document)
        .args(["--dry-run", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let previews: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let previews = previews.as_array().unwrap();
    assert_eq!(previews.len(), 3);

    let names: Vec<&str> = previews
        .iter()
        .map(|p| p["platform"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["instagram", "mastodon", "bluesky"]);

    for preview in previews {
        assert!(preview["text"].as_str().unwrap().contains("Bmptbmp"));
        assert!(preview["within_limit"].as_bool().unwrap());
        assert!(preview["length"].as_u64().unwrap() > 0);
    }
}

#[test]
fn test_dry_run_long_review_is_shortened_for_bluesky() {
    let (_temp, config, document) = setup_test_env();
    let long = DOCUMENT.replace(
        "Glassy pads over a rolling kick.",
        &"Glassy pads over a rolling kick. ".repeat(12),
    );
    fs::write(&document, long).unwrap();

    track_post(&config)
        .arg(&document)
        .args(["--dry-run", "-p", "bsky"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/300 chars, shortened)"))
        .stdout(predicate::str::contains("BC: https://afterlifeRecords.bandcamp.com/track/bmptbmp"));
}

#[test]
fn test_malformed_document_exit_code() {
    let (_temp, config, document) = setup_test_env();
    fs::write(&document, "---\ntitle: \"Broken\"\n\nno closing delimiter\n").unwrap();

    track_post(&config)
        .arg(&document)
        .arg("--dry-run")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Malformed"));
}

#[test]
fn test_missing_document_exit_code() {
    let (temp, config, _document) = setup_test_env();

    track_post(&config)
        .arg(temp.path().join("nope.md"))
        .arg("--dry-run")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_unknown_platform_exit_code() {
    let (_temp, config, document) = setup_test_env();

    track_post(&config)
        .arg(&document)
        .args(["--dry-run", "--platform", "myspace"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Unknown platform"));
}

#[test]
fn test_posting_without_configured_platforms() {
    let (_temp, config, document) = setup_test_env();

    track_post(&config)
        .arg(&document)
        .args(["--platform", "mastodon"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("track-setup"));
}

#[test]
fn test_invalid_format() {
    let (_temp, config, document) = setup_test_env();

    track_post(&config)
        .arg(&document)
        .args(["--dry-run", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
