//! Remote lookups feeding a new track document
//!
//! - `bandcamp`: scrape title, artist and artwork from a track page
//! - `youtube` / `spotify`: search for the same track and offer candidates
//!
//! Choosing among candidates is an injected [`Selection`]; nothing in this
//! module reads from the terminal.

use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::LookupError;

pub mod bandcamp;
pub mod spotify;
pub mod youtube;

const USER_AGENT: &str = concat!("trackcast/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of candidates requested from each search API
pub const SEARCH_LIMIT: usize = 5;

pub(crate) fn http_client() -> Result<reqwest::Client, LookupError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| LookupError::Http(e.to_string()))
}

/// One search hit offered for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub title: String,
    /// Channel name (YouTube) or artist names (Spotify)
    pub detail: String,
    pub url: String,
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}: {}", self.title, self.url)
        } else {
            write!(f, "{} - {}: {}", self.title, self.detail, self.url)
        }
    }
}

/// Which candidate to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 1-based position in the candidate list
    Index(usize),
    Skip,
}

impl Selection {
    /// Resolve the selection; out-of-range indices select nothing
    pub fn pick<'a>(&self, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
        match *self {
            Selection::Index(n) if n >= 1 => candidates.get(n - 1),
            _ => None,
        }
    }
}

impl FromStr for Selection {
    type Err = String;

    /// `1`..`n` pick a candidate; empty input, `0`, `s` or `skip` skip
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "" | "0" | "s" | "skip" => Ok(Selection::Skip),
            _ => s
                .parse::<usize>()
                .map(Selection::Index)
                .map_err(|_| format!("Invalid selection '{}': enter a number or 's' to skip", s)),
        }
    }
}

/// Search query used for both YouTube and Spotify
pub fn search_query(title: &str, artist: &str) -> String {
    format!("{} {}", title.trim(), artist.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate {
                title: "Bmptbmp".to_string(),
                detail: "James Shinra".to_string(),
                url: "https://www.youtube.com/watch?v=abc".to_string(),
            },
            Candidate {
                title: "Bmptbmp (Live)".to_string(),
                detail: String::new(),
                url: "https://www.youtube.com/watch?v=def".to_string(),
            },
        ]
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("2".parse::<Selection>(), Ok(Selection::Index(2)));
        assert_eq!(" 1 ".parse::<Selection>(), Ok(Selection::Index(1)));
        assert_eq!("".parse::<Selection>(), Ok(Selection::Skip));
        assert_eq!("0".parse::<Selection>(), Ok(Selection::Skip));
        assert_eq!("Skip".parse::<Selection>(), Ok(Selection::Skip));
        assert!("two".parse::<Selection>().is_err());
    }

    #[test]
    fn test_selection_pick() {
        let candidates = candidates();
        assert_eq!(
            Selection::Index(2).pick(&candidates).map(|c| c.url.as_str()),
            Some("https://www.youtube.com/watch?v=def")
        );
        assert_eq!(Selection::Index(3).pick(&candidates), None);
        assert_eq!(Selection::Index(0).pick(&candidates), None);
        assert_eq!(Selection::Skip.pick(&candidates), None);
    }

    #[test]
    fn test_candidate_display() {
        let candidates = candidates();
        assert_eq!(
            candidates[0].to_string(),
            "Bmptbmp - James Shinra: https://www.youtube.com/watch?v=abc"
        );
        assert_eq!(
            candidates[1].to_string(),
            "Bmptbmp (Live): https://www.youtube.com/watch?v=def"
        );
    }

    #[test]
    fn test_search_query() {
        assert_eq!(search_query(" Bmptbmp ", "James Shinra"), "Bmptbmp James Shinra");
    }
}
