//! Spotify Web API search with client-credentials auth

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Config;
use crate::credentials::SecretSource;
use crate::error::{LookupError, Result};
use crate::lookup::{http_client, Candidate, SEARCH_LIMIT};

pub const CLIENT_SECRET_ENV: &str = "SPOTIPY_CLIENT_SECRET";

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistItem>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

pub struct SpotifySearch {
    http: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl SpotifySearch {
    pub fn new(
        client_id: String,
        client_secret: SecretString,
    ) -> std::result::Result<Self, LookupError> {
        Ok(Self {
            http: http_client()?,
            client_id,
            client_secret,
        })
    }

    /// `Ok(None)` unless both the client id and secret are available
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(spotify) = config.spotify.as_ref() else {
            return Ok(None);
        };
        if spotify.client_id.trim().is_empty() {
            return Ok(None);
        }

        let source = SecretSource::new(
            "Spotify client secret",
            CLIENT_SECRET_ENV,
            spotify.client_secret_file.as_deref(),
        );
        let Some(secret) = source.lookup()? else {
            return Ok(None);
        };

        Ok(Some(Self::new(spotify.client_id.trim().to_string(), secret)?))
    }

    async fn access_token(&self) -> std::result::Result<String, LookupError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LookupError::MissingCredentials(
                "Spotify rejected the client id/secret".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(LookupError::Http(format!(
                "Spotify token request returned HTTP {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    pub async fn search(&self, query: &str) -> std::result::Result<Vec<Candidate>, LookupError> {
        tracing::debug!(query = %query, "Searching Spotify");

        let token = self.access_token().await?;
        let limit = SEARCH_LIMIT.to_string();

        let response = self
            .http
            .get(SEARCH_URL)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LookupError::Http(format!(
                "Spotify search returned HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let candidates = parse_search_response(&body)?;
        tracing::debug!(count = candidates.len(), "Spotify candidates");
        Ok(candidates)
    }
}

/// Turn a search response body into candidates, skipping tracks without a URL
pub fn parse_search_response(body: &str) -> std::result::Result<Vec<Candidate>, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;

    let items = response.tracks.map(|page| page.items).unwrap_or_default();

    Ok(items
        .into_iter()
        .filter_map(|track| {
            let url = track.external_urls.spotify?;
            let artists = track
                .artists
                .iter()
                .map(|artist| artist.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Some(Candidate {
                title: track.name,
                detail: artists,
                url,
            })
        })
        .collect())
}
