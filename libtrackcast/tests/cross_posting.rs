//! Cross-posting workflow tests against mock platforms

use anyhow::Result;
use libtrackcast::compose::{Destination, MoreInfo, BLUESKY_CHAR_LIMIT};
use libtrackcast::config::Config;
use libtrackcast::platforms::mock::{MockConfig, MockPlatform};
use libtrackcast::platforms::Platform;
use libtrackcast::poster::resolve_destinations;
use libtrackcast::{CrossPoster, FrontmatterParser, TrackRecord};
use tempfile::TempDir;

const PREFIX: &str = "https://static.kdzu.org/images/tracks/";

const DOCUMENT: &str = r#"---
title: "Bmptbmp"
artist: "James Shinra"
artistLink: "https://jamesshinra.bandcamp.com"
label: "Afterlife Records"
labelLink: "https://afterlifeRecords.bandcamp.com"
heroImage: "https://static.kdzu.org/images/tracks/bmptbmp.jpg"
pubDate: 2024-03-01
bandcamp: "https://afterlifeRecords.bandcamp.com/track/bmptbmp"
youtube: "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
spotify: ""
---

Glassy pads over a rolling kick. Patient build, no drop, all tension.
"#;

/// Parse the fixture document with its artwork present in `temp`
fn load_record(temp: &TempDir) -> Result<TrackRecord> {
    std::fs::write(temp.path().join("bmptbmp.jpg"), b"\xFF\xD8\xFF\xE0")?;
    Ok(FrontmatterParser::new(PREFIX, temp.path()).parse(DOCUMENT)?)
}

fn tags() -> Vec<String> {
    vec!["techno".to_string(), "#newmusic".to_string()]
}

#[tokio::test]
async fn test_post_to_all_platforms() -> Result<()> {
    let temp = TempDir::new()?;
    let record = load_record(&temp)?;

    let mastodon = MockPlatform::success("mastodon");
    let bluesky = MockPlatform::with_limit("bluesky", BLUESKY_CHAR_LIMIT);
    let mastodon_posts = mastodon.posted_handle();
    let bluesky_posts = bluesky.posted_handle();

    let platforms: Vec<Box<dyn Platform>> = vec![Box::new(mastodon), Box::new(bluesky)];
    let mut poster = CrossPoster::new(platforms, MoreInfo::default());

    let results = poster.publish(&record, &tags()).await?;

    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(result.success, "{} should succeed", result.platform);
        assert!(result.platform_post_id.is_some());
    }

    let mastodon_posts = mastodon_posts.lock().unwrap();
    let text = &mastodon_posts[0].content;
    assert!(text.starts_with("Bmptbmp by James Shinra"));
    assert!(text.contains("#techno #newmusic"));
    assert!(!text.contains("##"));
    assert!(!text.contains("Spot:"));

    let bluesky_posts = bluesky_posts.lock().unwrap();
    let post = &bluesky_posts[0];
    assert!(post.content.chars().count() <= BLUESKY_CHAR_LIMIT);
    let attachment = post.attachment.as_ref().unwrap();
    assert_eq!(attachment.file_path, temp.path().join("bmptbmp.jpg"));
    assert_eq!(attachment.alt_text, "Album artwork for Bmptbmp by James Shinra");

    for span in &post.spans {
        assert!(post.content.is_char_boundary(span.byte_start));
        assert!(post.content.is_char_boundary(span.byte_end));
    }
    Ok(())
}

#[tokio::test]
async fn test_partial_failure_keeps_going() -> Result<()> {
    let temp = TempDir::new()?;
    let record = load_record(&temp)?;

    let last = MockPlatform::success("bluesky");
    let last_posts = last.posted_handle();

    let platforms: Vec<Box<dyn Platform>> = vec![
        Box::new(MockPlatform::post_failure("instagram", "media container rejected")),
        Box::new(MockPlatform::auth_failure("mastodon", "token revoked")),
        Box::new(last),
    ];
    let mut poster = CrossPoster::new(platforms, MoreInfo::default());

    let results = poster.publish(&record, &[]).await?;

    let outcome: Vec<(&str, bool)> = results
        .iter()
        .map(|r| (r.platform.as_str(), r.success))
        .collect();
    assert_eq!(
        outcome,
        vec![("instagram", false), ("mastodon", false), ("bluesky", true)]
    );
    assert_eq!(last_posts.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_auth_is_attempted_once_per_platform() -> Result<()> {
    let temp = TempDir::new()?;
    let record = load_record(&temp)?;

    let config = MockConfig {
        name: "mastodon".to_string(),
        ..Default::default()
    };
    let auth_calls = config.auth_call_count.clone();
    let post_calls = config.post_call_count.clone();

    let mut poster = CrossPoster::new(
        vec![Box::new(MockPlatform::new(config))],
        MoreInfo::default(),
    );
    poster.publish(&record, &tags()).await?;

    assert_eq!(*auth_calls.lock().unwrap(), 1);
    assert_eq!(*post_calls.lock().unwrap(), 1);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_preview_touches_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    let record = load_record(&temp)?;

    let platform = MockPlatform::with_limit("bluesky", BLUESKY_CHAR_LIMIT);
    let posted = platform.posted_handle();
    let poster = CrossPoster::new(
        vec![Box::new(platform)],
        MoreInfo::new("More tracks", "https://kdzu.org/tracks"),
    );

    let previews = poster.preview(&record, &tags());

    assert_eq!(previews.len(), 1);
    assert!(previews[0].within_limit);
    assert!(previews[0].post.text.contains("https://kdzu.org/tracks"));
    assert!(posted.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn test_configured_default_platforms() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[defaults]
platforms = ["bluesky", "mastodon"]
"#,
    )?;

    let config = Config::load_from_path(&path)?;
    let destinations = resolve_destinations(&config, &[])?;
    assert_eq!(destinations, vec![Destination::Bluesky, Destination::Mastodon]);

    let explicit = resolve_destinations(&config, &["ig".to_string()])?;
    assert_eq!(explicit, vec![Destination::Instagram]);
    Ok(())
}
