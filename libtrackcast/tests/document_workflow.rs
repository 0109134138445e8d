//! Document lifecycle tests
//!
//! A document is written the way `track-new` writes it, filled in with links
//! and a review, then parsed back the way `track-post` reads it.

use anyhow::Result;
use libtrackcast::creator::{attach_links, attach_review, write_new_document};
use libtrackcast::error::{DocumentError, TrackcastError};
use libtrackcast::frontmatter::{render_document, REVIEW_PLACEHOLDER};
use libtrackcast::{FrontmatterParser, TrackRecord};
use tempfile::TempDir;

const PREFIX: &str = "https://static.kdzu.org/images/tracks/";

fn record() -> TrackRecord {
    TrackRecord {
        title: "Bmptbmp".to_string(),
        artist: "James Shinra".to_string(),
        artist_link: "https://jamesshinra.bandcamp.com".to_string(),
        label: "Afterlife Records".to_string(),
        label_link: "https://afterlifeRecords.bandcamp.com".to_string(),
        hero_image: format!("{}bmptbmp.jpg", PREFIX),
        pub_date: "2024-03-01".to_string(),
        review: String::new(),
        bandcamp_url: Some("https://afterlifeRecords.bandcamp.com/track/bmptbmp".to_string()),
        spotify_url: None,
        youtube_url: None,
        image_path: None,
    }
}

#[test]
fn test_render_then_parse_round_trip() -> Result<()> {
    let temp = TempDir::new()?;
    let parser = FrontmatterParser::new(PREFIX, temp.path());

    let mut original = record();
    original.review = "Glassy pads over a rolling kick.".to_string();
    original.youtube_url = Some("https://www.youtube.com/watch?v=abc".to_string());

    let parsed = parser.parse(&render_document(&original))?;

    assert_eq!(parsed.image_path, Some(temp.path().join("bmptbmp.jpg")));
    assert_eq!(
        TrackRecord {
            image_path: None,
            ..parsed
        },
        original
    );
    Ok(())
}

#[test]
fn test_new_document_parses_with_empty_review() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("bmptbmp.md");
    write_new_document(&path, &record())?;

    let text = std::fs::read_to_string(&path)?;
    assert!(text.starts_with("---\ntitle: \"Bmptbmp\"\n"));
    assert!(text.contains(REVIEW_PLACEHOLDER));

    let parsed = FrontmatterParser::new(PREFIX, temp.path()).parse_file(&path)?;
    assert_eq!(parsed.review, "");
    assert_eq!(parsed.spotify_url, None);
    Ok(())
}

#[test]
fn test_links_and_review_survive_reparse() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("bmptbmp.md");
    write_new_document(&path, &record())?;

    attach_links(
        &path,
        Some("https://www.youtube.com/watch?v=abc"),
        Some("https://open.spotify.com/track/xyz"),
    )?;
    attach_review(&path, "First paragraph.\n\nSecond paragraph.")?;

    let parsed = FrontmatterParser::new(PREFIX, temp.path()).parse_file(&path)?;
    assert_eq!(
        parsed.youtube_url.as_deref(),
        Some("https://www.youtube.com/watch?v=abc")
    );
    assert_eq!(
        parsed.spotify_url.as_deref(),
        Some("https://open.spotify.com/track/xyz")
    );
    assert_eq!(parsed.review, "First paragraph.\n\nSecond paragraph.");
    assert_eq!(parsed.label, "Afterlife Records");
    Ok(())
}

#[test]
fn test_document_without_closing_delimiter() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("broken.md");
    std::fs::write(&path, "---\ntitle: \"Broken\"\n\nNo closing delimiter.\n")?;

    let err = FrontmatterParser::new(PREFIX, temp.path())
        .parse_file(&path)
        .unwrap_err();
    assert!(matches!(err, DocumentError::Malformed(_)));
    assert!(err.to_string().contains("broken.md"));
    assert_eq!(TrackcastError::from(err).exit_code(), 3);
    Ok(())
}

#[test]
fn test_hero_image_outside_prefix_has_no_local_path() -> Result<()> {
    let temp = TempDir::new()?;
    let mut original = record();
    original.hero_image = "https://elsewhere.example/art.jpg".to_string();

    let parsed = FrontmatterParser::new(PREFIX, temp.path()).parse(&render_document(&original))?;
    assert_eq!(parsed.image_path, None);
    assert!(parsed.require_image().is_err());
    Ok(())
}
