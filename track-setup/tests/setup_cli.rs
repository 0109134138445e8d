//! CLI integration tests for track-setup

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn track_setup(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("track-setup").unwrap();
    cmd.env("HOME", temp.path())
        .env("TRACKCAST_CONFIG", temp.path().join("config").join("config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_non_interactive_writes_default_config() {
    let temp = TempDir::new().unwrap();

    track_setup(&temp)
        .arg("--non-interactive")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration saved"))
        .stdout(predicate::str::contains("MASTODON_ACCESS_TOKEN"))
        .stdout(predicate::str::contains("BLUESKY_PASSWORD"))
        .stdout(predicate::str::contains("INSTAGRAM_ACCESS_TOKEN"));

    let config = fs::read_to_string(temp.path().join("config").join("config.toml")).unwrap();
    assert!(config.contains("[paths]"));
    assert!(config.contains("[site]"));
    assert!(config.contains("timezone = \"US/Pacific\""));

    assert!(temp.path().join(".local/share/trackcast/tracks").is_dir());
    assert!(temp.path().join(".local/share/trackcast/images").is_dir());
}

#[test]
fn test_existing_config_is_kept() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        r#"
[site]
more_info_url = "https://example.org/more"

[mastodon]
instance = "https://mastodon.example"
"#,
    )
    .unwrap();

    track_setup(&temp)
        .arg("--non-interactive")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found existing configuration"))
        .stdout(predicate::str::contains("Mastodon   [configured]"));

    let config = fs::read_to_string(config_dir.join("config.toml")).unwrap();
    assert!(config.contains("https://example.org/more"));
    assert!(config.contains("https://mastodon.example"));
}

#[test]
fn test_force_starts_from_defaults() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[mastodon]\ninstance = \"https://mastodon.example\"\n",
    )
    .unwrap();

    track_setup(&temp)
        .args(["--non-interactive", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Creating new configuration"));

    let config = fs::read_to_string(config_dir.join("config.toml")).unwrap();
    assert!(!config.contains("mastodon.example"));
}

#[test]
fn test_unreadable_config_fails() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "this is = = not toml").unwrap();

    track_setup(&temp)
        .arg("--non-interactive")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Setup failed"));
}
