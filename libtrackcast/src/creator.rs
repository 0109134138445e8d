//! Creating a new track document from a Bandcamp URL
//!
//! Scrapes the page, saves the artwork, and writes `<stem>.md` with the
//! review placeholder. Links and the review are filled in afterwards with
//! [`attach_links`] and [`attach_review`].

use chrono::Utc;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};

use crate::config::{Config, SiteConfig};
use crate::error::{DocumentError, Result, TrackcastError};
use crate::frontmatter::{check_header, render_document, replace_review, set_field};
use crate::lookup::bandcamp::{BandcampClient, BandcampTrack};
use crate::types::TrackRecord;

/// A freshly written track document
#[derive(Debug, Clone)]
pub struct CreatedTrack {
    pub record: TrackRecord,
    pub markdown_path: PathBuf,
}

/// `YYYY-MM-DD` for the current moment in `timezone`
pub fn today_in(timezone: &str) -> Result<String> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| TrackcastError::InvalidInput(format!("unknown timezone '{}'", timezone)))?;
    Ok(Utc::now().with_timezone(&tz).format("%Y-%m-%d").to_string())
}

/// Build the record for a scraped track
///
/// The review stays empty so the document gets the placeholder.
pub fn record_from_track(
    track: &BandcampTrack,
    site: &SiteConfig,
    pub_date: String,
) -> Result<TrackRecord> {
    Ok(TrackRecord {
        title: track.title.clone(),
        artist: track.artist.clone(),
        artist_link: track.artist_link.clone(),
        label: track.label()?,
        label_link: track.label_link(),
        hero_image: format!("{}{}.jpg", site.image_url_prefix, track.file_stem()),
        pub_date,
        review: String::new(),
        bandcamp_url: Some(track.url.clone()),
        spotify_url: None,
        youtube_url: None,
        image_path: None,
    })
}

pub struct TrackCreator<'a> {
    config: &'a Config,
    bandcamp: BandcampClient,
}

impl<'a> TrackCreator<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            bandcamp: BandcampClient::new()?,
        })
    }

    /// Scrape `url`, save its artwork and write the markdown document
    pub async fn create(&self, url: &str) -> Result<CreatedTrack> {
        self.config.validate_output_dirs()?;

        let track = self.bandcamp.fetch_track(url).await?;
        let pub_date = today_in(&self.config.site.timezone)?;
        let mut record = record_from_track(&track, &self.config.site, pub_date)?;
        check_header(&record)?;
        let stem = track.file_stem();

        match &track.artwork_url {
            Some(artwork_url) => {
                let path = self
                    .bandcamp
                    .download_artwork(artwork_url, &self.config.image_dir()?, &stem)
                    .await?;
                record.image_path = Some(path);
            }
            None => tracing::warn!("No artwork downloaded for {}", track.title),
        }

        let markdown_path = self.config.markdown_dir()?.join(format!("{}.md", stem));
        write_new_document(&markdown_path, &record)?;

        Ok(CreatedTrack {
            record,
            markdown_path,
        })
    }
}

/// Write a rendered record, replacing any existing file at `path`
///
/// Header values containing `---` or a line break are rejected before
/// anything is written.
pub fn write_new_document(path: &Path, record: &TrackRecord) -> Result<()> {
    check_header(record)?;
    if path.exists() {
        tracing::warn!("Overwriting existing document {}", path.display());
    }
    std::fs::write(path, render_document(record)).map_err(DocumentError::Io)?;
    tracing::info!("Markdown file created: {}", path.display());
    Ok(())
}

/// Store the chosen YouTube/Spotify links in the document's header
pub fn attach_links(path: &Path, youtube: Option<&str>, spotify: Option<&str>) -> Result<()> {
    let mut text = std::fs::read_to_string(path).map_err(DocumentError::Io)?;

    if let Some(url) = youtube {
        text = set_field(&text, "youtube", url)?;
    }
    if let Some(url) = spotify {
        text = set_field(&text, "spotify", url)?;
    }

    std::fs::write(path, text).map_err(DocumentError::Io)?;
    Ok(())
}

/// Replace the document body with the review
pub fn attach_review(path: &Path, review: &str) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(DocumentError::Io)?;
    let text = replace_review(&text, review)?;
    std::fs::write(path, text).map_err(DocumentError::Io)?;
    Ok(())
}

/// Gather review lines until two consecutive empty lines (or end of input)
///
/// Single blank lines are kept as paragraph breaks; the terminating blank
/// lines are not part of the review.
pub fn collect_review<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut collected: Vec<String> = Vec::new();

    for line in lines {
        let line: String = line.into();
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if line.is_empty() && collected.last().is_some_and(|last| last.is_empty()) {
            break;
        }
        collected.push(line);
    }

    collected.join("\n").trim().to_string()
}
