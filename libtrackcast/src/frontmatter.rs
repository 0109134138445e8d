//! Track document frontmatter: parsing, rendering and in-place edits
//!
//! A track document is a `---` delimited block of `key: value` lines followed
//! by the review text:
//!
//! ```text
//! ---
//! title: "Bmptbmp (2025 Rework)"
//! artist: "James Shinra"
//! heroImage: "https://static.kdzu.org/images/tracks/bmptbmp_2025_rework.jpg"
//! pubDate: 2025-06-21
//! bandcamp: "https://analogicalforce.bandcamp.com/track/bmptbmp-2025-rework"
//! youtube: ""
//! spotify: ""
//! ---
//!
//! Review text.
//! ```
//!
//! The dialect is deliberately not YAML: values are single-line, quotes are
//! stripped rather than interpreted, and `#` lines are comments.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{DocumentError, Result};
use crate::types::TrackRecord;

pub const DELIMITER: &str = "---";

/// Body text written by `track-new` before a review exists
pub const REVIEW_PLACEHOLDER: &str = "Write your track review here. Keep it concise but descriptive. Focus on the sound, mood, and impact of the track.";

/// Parses track documents into [`TrackRecord`]s
///
/// Holds the two settings needed to map a public hero image URL back onto
/// the local artwork directory.
#[derive(Debug, Clone)]
pub struct FrontmatterParser {
    image_url_prefix: String,
    image_dir: PathBuf,
}

impl FrontmatterParser {
    pub fn new(image_url_prefix: impl Into<String>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_url_prefix: image_url_prefix.into(),
            image_dir: image_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.site.image_url_prefix.clone(),
            config.image_dir()?,
        ))
    }

    /// Parse document text
    ///
    /// # Errors
    ///
    /// `DocumentError::Malformed` when the text has fewer than two `---`
    /// delimiters. Absent fields are not errors; they default to empty.
    pub fn parse(&self, text: &str) -> std::result::Result<TrackRecord, DocumentError> {
        let (header, body) = split_document(text)?;
        let mut fields = parse_header(header);

        let mut field = |key: &str| -> String {
            fields.remove(key).unwrap_or_else(|| {
                tracing::debug!(field = key, "frontmatter field missing, defaulting to empty");
                String::new()
            })
        };

        let title = field("title");
        let artist = field("artist");
        let artist_link = field("artistLink");
        let label = field("label");
        let label_link = field("labelLink");
        let hero_image = field("heroImage");
        let pub_date = field("pubDate");
        let bandcamp = field("bandcamp");
        let spotify = field("spotify");
        let youtube = field("youtube");

        let review = body.trim().replace(REVIEW_PLACEHOLDER, "").trim().to_string();
        let image_path = self.resolve_image(&hero_image);

        Ok(TrackRecord {
            title,
            artist,
            artist_link,
            label,
            label_link,
            hero_image,
            pub_date,
            review,
            bandcamp_url: non_empty(bandcamp),
            spotify_url: non_empty(spotify),
            youtube_url: non_empty(youtube),
            image_path,
        })
    }

    /// Read and parse a document from disk
    pub fn parse_file(&self, path: &Path) -> std::result::Result<TrackRecord, DocumentError> {
        let text = std::fs::read_to_string(path)?;
        self.parse(&text).map_err(|e| match e {
            DocumentError::Malformed(reason) => {
                DocumentError::Malformed(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })
    }

    /// Map a hero image URL under the static prefix onto the artwork directory
    pub fn resolve_image(&self, hero_image: &str) -> Option<PathBuf> {
        if !hero_image.starts_with(&self.image_url_prefix) {
            return None;
        }

        let filename = hero_image.rsplit('/').next().unwrap_or_default();
        if filename.is_empty() {
            return None;
        }

        Some(self.image_dir.join(filename))
    }
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

/// Split a document into its raw header and body
///
/// The text is cut at the first two occurrences of `---`; anything before the
/// first one is ignored, and further delimiters stay in the body.
pub fn split_document(text: &str) -> std::result::Result<(&str, &str), DocumentError> {
    let mut parts = text.splitn(3, DELIMITER);
    let _leading = parts.next();

    match (parts.next(), parts.next()) {
        (Some(header), Some(body)) => Ok((header, body)),
        _ => Err(DocumentError::Malformed(
            "missing frontmatter delimiters".to_string(),
        )),
    }
}

/// Parse `key: value` header lines into a map
///
/// Lines without a colon and `#` comments are skipped. Later keys win.
pub fn parse_header(header: &str) -> HashMap<String, String> {
    header
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), strip_quotes(value).to_string()))
        .collect()
}

fn strip_quotes(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'')
}

/// Reject header values that would not survive a render then parse
///
/// A `---` would close the header early and a line break would split the
/// field. Surrounding quotes are stripped on parse, inner ones are kept.
pub fn check_header_value(key: &str, value: &str) -> std::result::Result<(), DocumentError> {
    if value.contains(DELIMITER) || value.contains(['\n', '\r']) {
        return Err(DocumentError::Malformed(format!(
            "{} cannot contain '{}' or a line break: {:?}",
            key, DELIMITER, value
        )));
    }
    Ok(())
}

/// [`check_header_value`] for every header field of a record
pub fn check_header(record: &TrackRecord) -> std::result::Result<(), DocumentError> {
    let fields = [
        ("title", record.title.as_str()),
        ("artist", record.artist.as_str()),
        ("artistLink", record.artist_link.as_str()),
        ("label", record.label.as_str()),
        ("labelLink", record.label_link.as_str()),
        ("heroImage", record.hero_image.as_str()),
        ("pubDate", record.pub_date.as_str()),
        ("bandcamp", record.bandcamp_url.as_deref().unwrap_or_default()),
        ("youtube", record.youtube_url.as_deref().unwrap_or_default()),
        ("spotify", record.spotify_url.as_deref().unwrap_or_default()),
    ];

    fields
        .iter()
        .try_for_each(|(key, value)| check_header_value(key, value))
}

/// Render a record in the on-disk document format
///
/// An empty review is written as [`REVIEW_PLACEHOLDER`], which parsing
/// removes again.
pub fn render_document(record: &TrackRecord) -> String {
    let review = if record.review.is_empty() {
        REVIEW_PLACEHOLDER
    } else {
        record.review.as_str()
    };

    format!(
        "---\n\
         title: \"{title}\"\n\
         artist: \"{artist}\"\n\
         artistLink: \"{artist_link}\"\n\
         label: \"{label}\"\n\
         labelLink: \"{label_link}\"\n\
         heroImage: \"{hero_image}\"\n\
         pubDate: {pub_date}\n\
         bandcamp: \"{bandcamp}\"\n\
         youtube: \"{youtube}\"\n\
         spotify: \"{spotify}\"\n\
         ---\n\
         \n\
         {review}\n",
        title = record.title,
        artist = record.artist,
        artist_link = record.artist_link,
        label = record.label,
        label_link = record.label_link,
        hero_image = record.hero_image,
        pub_date = record.pub_date,
        bandcamp = record.bandcamp_url.as_deref().unwrap_or_default(),
        youtube = record.youtube_url.as_deref().unwrap_or_default(),
        spotify = record.spotify_url.as_deref().unwrap_or_default(),
        review = review,
    )
}

/// Byte offsets of the header (between the delimiters) and of the body
fn header_bounds(text: &str) -> std::result::Result<(usize, usize, usize), DocumentError> {
    let malformed = || DocumentError::Malformed("missing frontmatter delimiters".to_string());

    let open = text.find(DELIMITER).ok_or_else(malformed)?;
    let header_start = open + DELIMITER.len();
    let header_end = text[header_start..]
        .find(DELIMITER)
        .map(|offset| header_start + offset)
        .ok_or_else(malformed)?;
    let body_start = header_end + DELIMITER.len();

    Ok((header_start, header_end, body_start))
}

/// Set one header field, keeping every other line untouched
///
/// An existing `key:` line is replaced; otherwise the field is appended just
/// before the closing delimiter. The value is written double-quoted.
pub fn set_field(text: &str, key: &str, value: &str) -> std::result::Result<String, DocumentError> {
    check_header_value(key, value)?;
    let (header_start, header_end, _) = header_bounds(text)?;
    let header = &text[header_start..header_end];
    let new_line = format!("{}: \"{}\"", key, value);

    let mut replaced = false;
    let mut new_header = String::with_capacity(header.len() + new_line.len() + 1);

    for line in header.split_inclusive('\n') {
        let trimmed = line.trim();
        let matches = !trimmed.starts_with('#')
            && trimmed
                .split_once(':')
                .is_some_and(|(k, _)| k.trim() == key);

        if matches && !replaced {
            new_header.push_str(&new_line);
            if line.ends_with('\n') {
                new_header.push('\n');
            }
            replaced = true;
        } else {
            new_header.push_str(line);
        }
    }

    if !replaced {
        if !new_header.ends_with('\n') {
            new_header.push('\n');
        }
        new_header.push_str(&new_line);
        new_header.push('\n');
    }

    Ok(format!(
        "{}{}{}",
        &text[..header_start],
        new_header,
        &text[header_end..]
    ))
}

/// Replace the body of a document with `review`
pub fn replace_review(text: &str, review: &str) -> std::result::Result<String, DocumentError> {
    let (_, _, body_start) = header_bounds(text)?;
    Ok(format!("{}\n\n{}\n", &text[..body_start], review.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://static.kdzu.org/images/tracks/";

    fn parser() -> FrontmatterParser {
        FrontmatterParser::new(PREFIX, "/srv/art")
    }

    fn sample_document() -> String {
        format!(
            r#"---
title: "Bmptbmp (2025 Rework)"
artist: "James Shinra"
artistLink: "https://analogicalforce.bandcamp.com"
label: "Analogicalforce"
labelLink: "https://analogicalforce.bandcamp.com"
heroImage: "https://static.kdzu.org/images/tracks/bmptbmp_2025_rework.jpg"
pubDate: 2025-06-21
bandcamp: "https://analogicalforce.bandcamp.com/track/bmptbmp-2025-rework"
youtube: ""
spotify: "https://open.spotify.com/track/abc"
---

{}
"#,
            REVIEW_PLACEHOLDER
        )
    }

    #[test]
    fn test_parse_full_document() {
        let record = parser().parse(&sample_document()).unwrap();

        assert_eq!(record.title, "Bmptbmp (2025 Rework)");
        assert_eq!(record.artist, "James Shinra");
        assert_eq!(record.label, "Analogicalforce");
        assert_eq!(record.pub_date, "2025-06-21");
        assert_eq!(
            record.bandcamp_url.as_deref(),
            Some("https://analogicalforce.bandcamp.com/track/bmptbmp-2025-rework")
        );
        assert_eq!(record.youtube_url, None);
        assert_eq!(
            record.spotify_url.as_deref(),
            Some("https://open.spotify.com/track/abc")
        );
        assert_eq!(record.review, "");
        assert_eq!(
            record.image_path,
            Some(PathBuf::from("/srv/art/bmptbmp_2025_rework.jpg"))
        );
    }

    #[test]
    fn test_missing_second_delimiter_is_malformed() {
        let text = "---\ntitle: \"Open ended\"\nartist: \"Nobody\"\n";
        match parser().parse(text) {
            Err(DocumentError::Malformed(_)) => {}
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_no_delimiters_is_malformed() {
        assert!(matches!(
            parser().parse("just a review"),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record = parser().parse("---\ntitle: Lonely\n---\nBody").unwrap();
        assert_eq!(record.title, "Lonely");
        assert_eq!(record.artist, "");
        assert_eq!(record.bandcamp_url, None);
        assert_eq!(record.image_path, None);
        assert_eq!(record.review, "Body");
    }

    #[test]
    fn test_comments_and_colonless_lines_are_skipped() {
        let text = "---\n# title: \"Commented\"\nnot a field\ntitle: 'Single'\n---\n";
        let record = parser().parse(text).unwrap();
        assert_eq!(record.title, "Single");
    }

    #[test]
    fn test_value_keeps_inner_colons() {
        let text = "---\nbandcamp: \"https://x.bandcamp.com/track/y\"\n---\n";
        let record = parser().parse(text).unwrap();
        assert_eq!(
            record.bandcamp_url.as_deref(),
            Some("https://x.bandcamp.com/track/y")
        );
    }

    #[test]
    fn test_later_duplicate_key_wins() {
        let text = "---\ntitle: \"First\"\ntitle: \"Second\"\n---\n";
        assert_eq!(parser().parse(text).unwrap().title, "Second");
    }

    #[test]
    fn test_placeholder_removed_but_review_kept() {
        let text = format!("---\ntitle: \"T\"\n---\n\nDeep and dubby.\n{}\n", REVIEW_PLACEHOLDER);
        let record = parser().parse(&text).unwrap();
        assert_eq!(record.review, "Deep and dubby.");
    }

    #[test]
    fn test_body_may_contain_delimiter() {
        let text = "---\ntitle: \"T\"\n---\nPart one\n---\nPart two";
        let record = parser().parse(text).unwrap();
        assert_eq!(record.review, "Part one\n---\nPart two");
    }

    #[test]
    fn test_resolve_image_outside_prefix_is_absent() {
        let p = parser();
        assert_eq!(p.resolve_image("https://f4.bcbits.com/img/a1_16.jpg"), None);
        assert_eq!(p.resolve_image("images/tracks/x.jpg"), None);
        assert_eq!(p.resolve_image(PREFIX), None);
        assert_eq!(
            p.resolve_image(&format!("{}x.png", PREFIX)),
            Some(PathBuf::from("/srv/art/x.png"))
        );
    }

    #[test]
    fn test_render_matches_document_format() {
        let record = parser().parse(&sample_document()).unwrap();
        assert_eq!(render_document(&record), sample_document());
    }

    #[test]
    fn test_render_parse_round_trip() {
        let record = TrackRecord {
            title: "Night Drive".to_string(),
            artist: "Ensemble".to_string(),
            artist_link: "https://ensemble.bandcamp.com".to_string(),
            label: "Tape Loop".to_string(),
            label_link: "https://tapeloop.bandcamp.com".to_string(),
            hero_image: format!("{}night_drive.jpg", PREFIX),
            pub_date: "2025-01-02".to_string(),
            review: "Warm pads, restless hats.\n\nA slow burner.".to_string(),
            bandcamp_url: Some("https://tapeloop.bandcamp.com/track/night-drive".to_string()),
            spotify_url: None,
            youtube_url: Some("https://www.youtube.com/watch?v=abc123".to_string()),
            image_path: Some(PathBuf::from("/srv/art/night_drive.jpg")),
        };

        let reparsed = parser().parse(&render_document(&record)).unwrap();
        assert_eq!(reparsed, record);
        assert!(check_header(&record).is_ok());
    }

    #[test]
    fn test_check_header_rejects_delimiter_and_line_breaks() {
        let mut record = parser().parse(&sample_document()).unwrap();
        record.title = "Side A --- Side B".to_string();
        let err = check_header(&record).unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
        assert!(err.to_string().contains("title"));

        record.title = "Side A".to_string();
        record.youtube_url = Some("https://youtu.be/x\nartist: y".to_string());
        assert!(check_header(&record).unwrap_err().to_string().contains("youtube"));

        record.youtube_url = None;
        record.artist = "The \"Quoted\" Band - live".to_string();
        assert!(check_header(&record).is_ok());
        assert_eq!(
            parser().parse(&render_document(&record)).unwrap().artist,
            "The \"Quoted\" Band - live"
        );
    }

    #[test]
    fn test_set_field_rejects_delimiter() {
        assert!(matches!(
            set_field(&sample_document(), "spotify", "https://x---y"),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_set_field_replaces_existing_line() {
        let updated = set_field(
            &sample_document(),
            "youtube",
            "https://www.youtube.com/watch?v=xyz",
        )
        .unwrap();

        assert!(updated.contains("youtube: \"https://www.youtube.com/watch?v=xyz\"\n"));
        assert!(!updated.contains("youtube: \"\""));
        let record = parser().parse(&updated).unwrap();
        assert_eq!(
            record.youtube_url.as_deref(),
            Some("https://www.youtube.com/watch?v=xyz")
        );
        assert_eq!(record.title, "Bmptbmp (2025 Rework)");
    }

    #[test]
    fn test_set_field_appends_missing_key() {
        let text = "---\ntitle: \"T\"\n---\n\nReview\n";
        let updated = set_field(text, "spotify", "https://open.spotify.com/track/1").unwrap();
        assert_eq!(
            updated,
            "---\ntitle: \"T\"\nspotify: \"https://open.spotify.com/track/1\"\n---\n\nReview\n"
        );
    }

    #[test]
    fn test_set_field_ignores_commented_key() {
        let text = "---\n# spotify: old\ntitle: \"T\"\n---\n";
        let updated = set_field(text, "spotify", "new").unwrap();
        assert!(updated.contains("# spotify: old\n"));
        assert!(updated.contains("spotify: \"new\"\n---"));
    }

    #[test]
    fn test_set_field_on_malformed_document() {
        assert!(matches!(
            set_field("no header", "title", "x"),
            Err(DocumentError::Malformed(_))
        ));
    }

    #[test]
    fn test_replace_review() {
        let updated = replace_review(&sample_document(), "  Hypnotic rework.  ").unwrap();
        assert!(updated.ends_with("---\n\nHypnotic rework.\n"));
        assert!(!updated.contains(REVIEW_PLACEHOLDER));

        let record = parser().parse(&updated).unwrap();
        assert_eq!(record.review, "Hypnotic rework.");
        assert_eq!(record.artist, "James Shinra");
    }
}
