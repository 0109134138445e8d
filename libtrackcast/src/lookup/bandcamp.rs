//! Bandcamp track page scraping

use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};

use crate::error::LookupError;
use crate::lookup::http_client;

/// Metadata scraped from a Bandcamp track page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandcampTrack {
    /// The page URL, as given
    pub url: String,
    pub title: String,
    pub artist: String,
    pub artist_link: String,
    /// Full-size artwork URL, when the page exposes one
    pub artwork_url: Option<String>,
}

impl BandcampTrack {
    pub fn label(&self) -> Result<String, LookupError> {
        label_from_url(&self.url)
    }

    pub fn label_link(&self) -> String {
        label_link(&self.url)
    }

    /// File stem shared by the markdown document and the artwork
    ///
    /// Titles with no ASCII letters or digits fall back to the URL slug,
    /// then to `track`.
    pub fn file_stem(&self) -> String {
        [
            sanitize_filename(&self.title.to_lowercase()),
            sanitize_filename(&track_slug(&self.url).to_lowercase()),
        ]
        .into_iter()
        .find(|stem| stem.chars().any(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
    }
}

const FALLBACK_STEM: &str = "track";

/// The path segment after `/track/`, or an empty string
fn track_slug(url: &str) -> &str {
    url.split_once("/track/")
        .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or_default())
        .unwrap_or_default()
}

pub struct BandcampClient {
    http: reqwest::Client,
}

impl BandcampClient {
    pub fn new() -> Result<Self, LookupError> {
        Ok(Self {
            http: http_client()?,
        })
    }

    /// Fetch and parse a track page
    pub async fn fetch_track(&self, url: &str) -> Result<BandcampTrack, LookupError> {
        let url = url.trim();
        tracing::debug!(url = %url, "Fetching Bandcamp page");

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Http(format!("{} returned HTTP {}", url, status)));
        }

        let html = response.text().await?;
        let track = parse_track_page(&html, url)?;

        tracing::info!(
            title = %track.title,
            artist = %track.artist,
            "Scraped Bandcamp track"
        );

        Ok(track)
    }

    /// Download artwork to `<dir>/<stem>.jpg`, creating `dir` if needed
    pub async fn download_artwork(
        &self,
        artwork_url: &str,
        dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, LookupError> {
        let response = self.http.get(artwork_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Http(format!(
                "artwork {} returned HTTP {}",
                artwork_url, status
            )));
        }

        let bytes = response.bytes().await?;
        let path = dir.join(format!("{}.jpg", stem));

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| LookupError::Http(format!("failed to create {}: {}", dir.display(), e)))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| LookupError::Http(format!("failed to write {}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved artwork");

        Ok(path)
    }
}

fn selector(css: &str) -> Result<Selector, LookupError> {
    Selector::parse(css).map_err(|e| LookupError::Parse(format!("bad selector {}: {}", css, e)))
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract track metadata from page HTML
///
/// Title, artist and artist link are required; artwork is optional.
pub fn parse_track_page(html: &str, url: &str) -> Result<BandcampTrack, LookupError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("#name-section h2.trackTitle")?)
        .next()
        .map(collapsed_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| LookupError::Parse("could not find the track title".to_string()))?;

    let link = selector("a")?;
    let artist_anchor = document
        .select(&selector("#name-section h3.albumTitle span")?)
        .last()
        .and_then(|span| span.select(&link).next());

    let artist = artist_anchor
        .map(collapsed_text)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| LookupError::Parse("could not find the artist name".to_string()))?;

    let artist_link = artist_anchor
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .ok_or_else(|| LookupError::Parse("could not find the artist link".to_string()))?;

    let artwork_url = document
        .select(&selector("a.popupImage")?)
        .next()
        .and_then(|a| a.value().attr("href"))
        .or_else(|| {
            selector("div.tralbumArt img").ok().and_then(|img| {
                document
                    .select(&img)
                    .next()
                    .and_then(|img| img.value().attr("src"))
            })
        })
        .map(|src| src.trim().to_string())
        .filter(|src| !src.is_empty());

    if artwork_url.is_none() {
        tracing::warn!("No artwork found on {}", url);
    }

    Ok(BandcampTrack {
        url: url.to_string(),
        title,
        artist,
        artist_link,
        artwork_url,
    })
}

/// Label name from the page's subdomain
///
/// `warpRecords.bandcamp.com` becomes "Warp Records" and
/// `ninja_tune.bandcamp.com` becomes "Ninja Tune".
pub fn label_from_url(url: &str) -> Result<String, LookupError> {
    let subdomain = subdomain(url)
        .ok_or_else(|| LookupError::Parse(format!("URL has no host: {}", url)))?;

    let mut spaced = String::with_capacity(subdomain.len() + 4);
    let mut prev: Option<char> = None;
    for c in subdomain.chars() {
        if c.is_ascii_uppercase() && prev.is_some_and(|p| p.is_ascii_lowercase()) {
            spaced.push(' ');
        }
        spaced.push(if c == '_' { ' ' } else { c });
        prev = Some(c);
    }

    Ok(title_case(&spaced))
}

/// First host label, case preserved (URL parsers lowercase the host)
fn subdomain(url: &str) -> Option<&str> {
    let (_, rest) = url.trim().split_once("://")?;
    let host = rest.split(['/', '?', '#', ':']).next()?;
    host.split('.').next().filter(|label| !label.is_empty())
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// The label's page: everything before `/track/`
pub fn label_link(url: &str) -> String {
    let url = url.trim();
    url.split("/track/").next().unwrap_or(url).to_string()
}

/// Spaces become `_`, then only `[A-Za-z0-9_-]` is kept
pub fn sanitize_filename(name: &str) -> String {
    name.replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
