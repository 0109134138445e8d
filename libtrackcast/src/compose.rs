//! Post composition for every destination
//!
//! All layouts start from a [`PostDraft`], the normalized view of a
//! [`TrackRecord`] plus the hashtags chosen for this post. Lengths are
//! counted in Unicode scalar values.

use serde::Serialize;
use std::str::FromStr;

use crate::config::{SiteConfig, DEFAULT_MORE_INFO_LABEL, DEFAULT_MORE_INFO_URL};
use crate::types::TrackRecord;

pub const BLUESKY_CHAR_LIMIT: usize = 300;
pub const MASTODON_DEFAULT_CHAR_LIMIT: usize = 500;
pub const INSTAGRAM_CAPTION_LIMIT: usize = 2200;

/// Slack required before hashtags are kept in the short form
const SHORT_FORM_HASHTAG_SLACK: usize = 50;
/// Slack required before a Spotify/YouTube line is kept in the short form
const SHORT_FORM_LINK_SLACK: usize = 10;

const TRAILING_URL_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Normalize one hashtag: `techno`, `#techno` and `##techno` all become `#techno`
///
/// Returns `None` for input that is empty once whitespace and `#` are removed.
pub fn normalize_hashtag(tag: &str) -> Option<String> {
    let bare = tag.trim().trim_start_matches('#').trim();
    if bare.is_empty() {
        return None;
    }
    Some(format!("#{}", bare))
}

pub fn normalize_hashtags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|tag| normalize_hashtag(tag.as_ref()))
        .collect()
}

/// Split a typed hashtag line on whitespace and commas
///
/// `electronicmusic, techno` yields `["electronicmusic", "techno"]`;
/// normalization happens later in [`PostDraft::new`].
pub fn split_hashtag_input(line: &str) -> Vec<String> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a link: force `https://` and drop trailing punctuation
///
/// `example.com/x.` becomes `https://example.com/x`; empty input is `None`.
pub fn normalize_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let url = if url.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", url)
    };

    let url = url.trim_end_matches(TRAILING_URL_PUNCTUATION);
    if url == "https://" {
        return None;
    }
    Some(url.to_string())
}

/// Normalized inputs shared by every layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub artist: String,
    pub review: String,
    pub bandcamp_url: Option<String>,
    pub spotify_url: Option<String>,
    pub youtube_url: Option<String>,
    pub hashtags: Vec<String>,
}

impl PostDraft {
    pub fn new<S: AsRef<str>>(record: &TrackRecord, hashtags: &[S]) -> Self {
        Self {
            title: record.title.trim().to_string(),
            artist: record.artist.trim().to_string(),
            review: record.review.trim().to_string(),
            bandcamp_url: record.bandcamp_url.as_deref().and_then(normalize_url),
            spotify_url: record.spotify_url.as_deref().and_then(normalize_url),
            youtube_url: record.youtube_url.as_deref().and_then(normalize_url),
            hashtags: normalize_hashtags(hashtags),
        }
    }

    pub fn headline(&self) -> String {
        format!("{} by {}", self.title, self.artist)
    }

    pub fn hashtag_line(&self) -> String {
        self.hashtags.join(" ")
    }

    /// Every URL that may appear in a post, in priority order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        [&self.bandcamp_url, &self.spotify_url, &self.youtube_url]
            .into_iter()
            .filter_map(|url| url.as_deref())
    }
}

/// Footer pointing at the site's track list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreInfo {
    pub label: String,
    pub url: String,
}

impl MoreInfo {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn from_site(site: &SiteConfig) -> Self {
        Self::new(site.more_info_label.clone(), site.more_info_url.clone())
    }

    fn line(&self) -> String {
        format!("{}: {}", self.label, self.url)
    }
}

impl Default for MoreInfo {
    fn default() -> Self {
        Self::new(DEFAULT_MORE_INFO_LABEL, DEFAULT_MORE_INFO_URL)
    }
}

/// Final text for one destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedPost {
    pub text: String,
    pub length: usize,
    /// Whether the short template replaced the long form
    pub shortened: bool,
}

impl ComposedPost {
    fn new(text: String, shortened: bool) -> Self {
        Self {
            length: char_len(&text),
            text,
            shortened,
        }
    }
}

/// Builds the labelled-link layout (`BC:`, `Spot:`, `YT:`) with an optional budget
///
/// Over budget, the long form is replaced by a short template filled greedily
/// in a fixed priority order: headline, Bandcamp link, hashtags, Spotify,
/// YouTube, footer. Each optional part is kept only when its budget check
/// passes at the moment it is considered.
#[derive(Debug, Clone)]
pub struct PostComposer {
    more_info: MoreInfo,
    max_length: Option<usize>,
}

impl PostComposer {
    pub fn new(more_info: MoreInfo, max_length: Option<usize>) -> Self {
        Self {
            more_info,
            max_length,
        }
    }

    pub fn bluesky(more_info: MoreInfo) -> Self {
        Self::new(more_info, Some(BLUESKY_CHAR_LIMIT))
    }

    pub fn compose(&self, draft: &PostDraft) -> ComposedPost {
        let long = self.long_form(draft);

        match self.max_length {
            Some(max) if char_len(&long) > max => {
                let short = self.short_form(draft, max);
                tracing::debug!(
                    long = char_len(&long),
                    short = char_len(&short),
                    max,
                    "post over budget, using short form"
                );
                ComposedPost::new(short, true)
            }
            _ => ComposedPost::new(long, false),
        }
    }

    fn long_form(&self, draft: &PostDraft) -> String {
        let mut text = draft.headline();

        if !draft.review.is_empty() {
            text.push_str("\n\n");
            text.push_str(&draft.review);
        }

        if !draft.hashtags.is_empty() {
            text.push_str("\n\n");
            text.push_str(&draft.hashtag_line());
        }

        let mut lines = link_lines(draft);
        lines.push(self.more_info.line());
        text.push_str("\n\n");
        text.push_str(&lines.join("\n"));

        text
    }

    fn short_form(&self, draft: &PostDraft, max: usize) -> String {
        let mut text = draft.headline();

        if !draft.hashtags.is_empty() {
            let tags = draft.hashtag_line();
            let bandcamp_len = draft.bandcamp_url.as_deref().map(char_len).unwrap_or(0);
            let needed = char_len(&text)
                + char_len(&tags)
                + bandcamp_len
                + char_len(&self.more_info.url)
                + SHORT_FORM_HASHTAG_SLACK;
            if needed < max {
                text.push_str("\n\n");
                text.push_str(&tags);
            }
        }

        let mut separator = "\n\n";

        if let Some(url) = &draft.bandcamp_url {
            text.push_str(separator);
            text.push_str(&format!("BC: {}", url));
            separator = "\n";
        }

        for (label, url) in [("Spot", &draft.spotify_url), ("YT", &draft.youtube_url)] {
            let Some(url) = url else { continue };
            let line = format!("{}{}: {}", separator, label, url);
            if char_len(&text) + char_len(&line) + SHORT_FORM_LINK_SLACK < max {
                text.push_str(&line);
                separator = "\n";
            }
        }

        let footer = format!("{}{}", separator, self.more_info.line());
        if char_len(&text) + char_len(&footer) <= max {
            text.push_str(&footer);
        }

        truncate_chars(&text, max)
    }
}

fn link_lines(draft: &PostDraft) -> Vec<String> {
    [
        ("BC", &draft.bandcamp_url),
        ("Spot", &draft.spotify_url),
        ("YT", &draft.youtube_url),
    ]
    .into_iter()
    .filter_map(|(label, url)| url.as_ref().map(|url| format!("{}: {}", label, url)))
    .collect()
}

/// Cut `text` to at most `max` characters, marking the cut with `…`
fn truncate_chars(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

/// Mastodon status: prose links, hashtags last, no truncation
pub fn mastodon_status(draft: &PostDraft) -> ComposedPost {
    let mut text = draft.headline();

    if !draft.review.is_empty() {
        text.push_str("\n\n");
        text.push_str(&draft.review);
    }

    let links: Vec<String> = [
        ("Listen on Bandcamp", &draft.bandcamp_url),
        ("Spotify", &draft.spotify_url),
        ("YouTube", &draft.youtube_url),
    ]
    .into_iter()
    .filter_map(|(label, url)| url.as_ref().map(|url| format!("{}: {}", label, url)))
    .collect();

    if !links.is_empty() {
        text.push_str("\n\n");
        text.push_str(&links.join("\n"));
    }

    if !draft.hashtags.is_empty() {
        text.push_str("\n\n");
        text.push_str(&draft.hashtag_line());
    }

    ComposedPost::new(text, false)
}

/// Instagram caption: links are not clickable there, so point at the bio
pub fn instagram_caption(draft: &PostDraft) -> ComposedPost {
    let mut text = draft.headline();

    if !draft.review.is_empty() {
        text.push_str("\n\n");
        text.push_str(&draft.review);
    }

    text.push_str("\n\nListen on Bandcamp, Spotify, and YouTube\nLink in bio 🔗");

    if !draft.hashtags.is_empty() {
        text.push_str("\n\n");
        text.push_str(&draft.hashtag_line());
    }

    ComposedPost::new(text, false)
}

/// The platforms a track can be posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Instagram,
    Mastodon,
    Bluesky,
}

impl Destination {
    pub const ALL: [Destination; 3] = [
        Destination::Instagram,
        Destination::Mastodon,
        Destination::Bluesky,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Destination::Instagram => "instagram",
            Destination::Mastodon => "mastodon",
            Destination::Bluesky => "bluesky",
        }
    }

    /// Default character limit; Mastodon instances may report their own
    pub fn character_limit(&self) -> usize {
        match self {
            Destination::Instagram => INSTAGRAM_CAPTION_LIMIT,
            Destination::Mastodon => MASTODON_DEFAULT_CHAR_LIMIT,
            Destination::Bluesky => BLUESKY_CHAR_LIMIT,
        }
    }

    pub fn compose(&self, draft: &PostDraft, more_info: &MoreInfo) -> ComposedPost {
        match self {
            Destination::Instagram => instagram_caption(draft),
            Destination::Mastodon => mastodon_status(draft),
            Destination::Bluesky => PostComposer::bluesky(more_info.clone()).compose(draft),
        }
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" | "ig" => Ok(Destination::Instagram),
            "mastodon" => Ok(Destination::Mastodon),
            "bluesky" | "bsky" => Ok(Destination::Bluesky),
            other => Err(format!(
                "Unknown platform: '{}'. Valid options: instagram, mastodon, bluesky",
                other
            )),
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A rich-text span in a composed post, in UTF-8 byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub byte_start: usize,
    pub byte_end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    Link(String),
    /// Tag text without the leading `#`
    Tag(String),
}

/// Locate links and hashtags in the final text for Bluesky facets
///
/// Each URL and hashtag is marked at its first occurrence; parts dropped by
/// the short form simply produce no span. A hashtag only matches where it is
/// not the prefix of a longer tag (`#tech` does not match inside `#techno`).
pub fn rich_text_spans(text: &str, draft: &PostDraft, more_info: &MoreInfo) -> Vec<TextSpan> {
    let mut spans = Vec::new();

    let urls = draft.urls().chain(std::iter::once(more_info.url.as_str()));
    for url in urls {
        if url.is_empty() {
            continue;
        }
        if let Some(start) = text.find(url) {
            spans.push(TextSpan {
                byte_start: start,
                byte_end: start + url.len(),
                kind: SpanKind::Link(url.to_string()),
            });
        }
    }

    for tag in &draft.hashtags {
        if let Some(start) = find_whole_tag(text, tag) {
            spans.push(TextSpan {
                byte_start: start,
                byte_end: start + tag.len(),
                kind: SpanKind::Tag(tag.trim_start_matches('#').to_string()),
            });
        }
    }

    spans
}

fn find_whole_tag(text: &str, tag: &str) -> Option<usize> {
    text.match_indices(tag).map(|(start, _)| start).find(|&start| {
        text[start + tag.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}
