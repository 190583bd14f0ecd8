// SPDX-License-Identifier: MPL-2.0

use reqwest::{Client, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use super::types::{
    DownloadResponse, Page, Playlist, Resource, StreamUrlResponse, Track, User,
};
use crate::config::Config;

/// Maximum number of ids accepted by one batch track lookup
pub const BATCH_SIZE: usize = 50;

/// SoundCloud API error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{status}: {body}")]
    Status { status: u16, body: String },
    #[error(
        "This track is not available (e.g. restricted in your country or disabled for API access)."
    )]
    NotAvailable,
    #[error("401: {0} (invalid or expired token)")]
    Unauthorized(String),
    #[error(
        "Stream URL is missing. This track may not be available for streaming or download in your region."
    )]
    MissingStreamUrl,
    #[error("Invalid stream URL {0}. This track may not be available.")]
    InvalidStreamUrl(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Region or API-access restriction rather than a real failure
    pub fn is_restricted(&self) -> bool {
        matches!(
            self,
            Self::NotAvailable | Self::Status { status: 403, .. }
        )
    }
}

/// SoundCloud API client
#[derive(Clone)]
pub struct SoundCloudClient {
    http: Client,
    oauth_token: String,
    api_base: String,
    max_pages: usize,
}

impl SoundCloudClient {
    /// Create a new client with OAuth token
    pub fn new(oauth_token: impl Into<String>, config: &Config) -> Result<Self, ApiError> {
        let token = oauth_token.into();
        // Strip "OAuth " prefix if present
        let clean_token = token
            .strip_prefix("OAuth ")
            .unwrap_or(&token)
            .trim()
            .to_string();

        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;

        let mut api_base = config.api_base.clone();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }

        Ok(Self {
            http,
            oauth_token: clean_token,
            api_base,
            max_pages: config.max_pages,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.oauth_token
    }

    /// Build authorization header value
    pub fn auth_header(&self) -> String {
        format!("OAuth {}", self.oauth_token)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        if is_absolute(endpoint) {
            endpoint.to_string()
        } else {
            format!("{}{}", self.api_base, endpoint.trim_start_matches('/'))
        }
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if matches!(status.as_u16(), 200..=202) {
            return Ok(response);
        }
        match status {
            StatusCode::FORBIDDEN => Err(ApiError::NotAvailable),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized(
                response.text().await.unwrap_or_default(),
            )),
            _ => Err(ApiError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// GET an endpoint relative to the API base, or an absolute URL.
    /// Query parameters only apply to relative endpoints.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint);
        debug!("GET {url}");

        let mut request = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, self.auth_header());
        if !is_absolute(endpoint) && !params.is_empty() {
            request = request.query(params);
        }

        let response = Self::check_status(request.send().await?).await?;
        let text = response.text().await?;
        trace!(
            "response from {url}: {}",
            text.chars().take(500).collect::<String>()
        );
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch every item of a collection endpoint, following `next_href`
    /// for at most `max_pages` pages.
    async fn get_collection<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut next_href: Option<String> = None;

        for _ in 0..self.max_pages {
            let page: Value = match &next_href {
                Some(href) => self.get(href, &[]).await?,
                None => self.get(endpoint, params).await?,
            };
            let (collection, next) = split_page(page);
            items.extend(collection.into_iter().filter_map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| debug!("skipping collection item from {endpoint}: {e}"))
                    .ok()
            }));

            match next {
                Some(href) => next_href = Some(href),
                None => break,
            }
        }

        Ok(items)
    }

    /// Resolve a soundcloud.com URL to the object it points at
    pub async fn resolve_url(&self, url: &str) -> Result<Resource, ApiError> {
        self.get("resolve", &[("url", url.to_string())]).await
    }

    /// Search one of `tracks`, `users`, `albums`, `playlists_without_albums`
    pub async fn search(
        &self,
        endpoint: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Resource>, ApiError> {
        let page: Page<Value> = self
            .get(
                &format!("search/{endpoint}"),
                &[
                    ("limit", limit.to_string()),
                    ("top_results", "v2".to_string()),
                    ("q", query.to_string()),
                ],
            )
            .await?;

        Ok(page
            .collection
            .into_iter()
            .filter_map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| debug!("skipping search result: {e}"))
                    .ok()
            })
            .collect())
    }

    pub async fn get_track(&self, track_id: u64) -> Result<Track, ApiError> {
        self.get(&format!("tracks/{track_id}"), &[]).await
    }

    pub async fn get_playlist(&self, playlist_id: u64) -> Result<Playlist, ApiError> {
        self.get(&format!("playlists/{playlist_id}"), &[]).await
    }

    /// Get any user's profile by ID
    pub async fn get_user(&self, user_id: u64) -> Result<User, ApiError> {
        self.get(&format!("users/{user_id}"), &[]).await
    }

    /// Look up full track objects, [`BATCH_SIZE`] ids per request
    pub async fn get_tracks(&self, track_ids: &[u64]) -> Result<Vec<Track>, ApiError> {
        let mut tracks = Vec::with_capacity(track_ids.len());
        for chunk in track_ids.chunks(BATCH_SIZE) {
            let ids = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let batch: Vec<Track> = self.get("tracks", &[("ids", ids)]).await?;
            tracks.extend(batch);
        }
        Ok(tracks)
    }

    /// Replace stub tracks (as embedded in playlists) by full track objects,
    /// keeping playlist order
    pub async fn complete_tracklist(&self, tracks: Vec<Track>) -> Result<Vec<Track>, ApiError> {
        let stub_ids: Vec<u64> = tracks
            .iter()
            .filter(|t| !t.is_complete())
            .map(|t| t.id)
            .collect();
        if stub_ids.is_empty() {
            return Ok(tracks);
        }

        debug!("fetching {} stub tracks", stub_ids.len());
        let mut fetched: HashMap<u64, Track> = self
            .get_tracks(&stub_ids)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        Ok(tracks
            .into_iter()
            .filter_map(|t| {
                if t.is_complete() {
                    return Some(t);
                }
                let full = fetched.remove(&t.id);
                if full.is_none() {
                    warn!("track {} missing from batch lookup, dropping it", t.id);
                }
                full
            })
            .collect())
    }

    /// Get a user's albums
    pub async fn get_user_albums(&self, user_id: u64) -> Result<Vec<Playlist>, ApiError> {
        self.get_collection(
            &format!("users/{user_id}/albums"),
            &[("limit", "200".to_string())],
        )
        .await
    }

    /// Get a user's uploaded tracks
    pub async fn get_user_tracks(&self, user_id: u64) -> Result<Vec<Track>, ApiError> {
        self.get_collection(
            &format!("users/{user_id}/tracks"),
            &[("limit", "200".to_string())],
        )
        .await
    }

    /// URL of the original upload of a downloadable track
    pub async fn get_track_download(&self, track_id: u64) -> Result<String, ApiError> {
        let response: DownloadResponse =
            self.get(&format!("tracks/{track_id}/download"), &[]).await?;
        Ok(response.redirect_uri)
    }

    /// Resolve a transcoding lookup URL to the actual stream (or playlist) URL
    pub async fn get_stream_url(
        &self,
        transcoding_url: Option<&str>,
        track_authorization: Option<&str>,
    ) -> Result<String, ApiError> {
        let url = transcoding_url
            .filter(|u| !u.is_empty())
            .ok_or(ApiError::MissingStreamUrl)?;
        let endpoint = url
            .strip_prefix(self.api_base.as_str())
            .ok_or_else(|| ApiError::InvalidStreamUrl(url.to_string()))?;

        let params: Vec<(&str, String)> = track_authorization
            .map(|auth| vec![("track_authorization", auth.to_string())])
            .unwrap_or_default();

        let response: StreamUrlResponse = self.get(endpoint, &params).await?;
        Ok(response.url)
    }

    /// `Content-Type` of a remote file, empty when the server sends none
    pub async fn content_type(&self, url: &str) -> Result<String, ApiError> {
        let response = self.http.head(url).send().await?;
        Ok(response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string())
    }

    /// Fetch a text resource (e.g. an m3u8 playlist) with the auth header
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Download `url` into `path` with the auth header, returning bytes written
    pub async fn download_to(&self, url: &str, path: &Path) -> Result<u64, ApiError> {
        debug!("downloading {} to {}", url, path.display());
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        let mut response = Self::check_status(response).await?;

        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// A directly playable URL for previews: the first resolvable progressive
    /// transcoding, else the first HLS one. Failures yield `None`.
    pub async fn preview_stream_url(&self, track_id: u64) -> Option<String> {
        let track = match self.get_track(track_id).await {
            Ok(t) => t,
            Err(e) => {
                warn!("Error getting preview stream for {track_id}: {e}");
                return None;
            }
        };
        if !track.is_streamable() {
            return None;
        }

        let auth = track.track_authorization.as_deref();
        let mut hls_fallback = None;
        for transcoding in track.transcodings() {
            let Some(url) = transcoding.url.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            match transcoding.format.protocol.as_str() {
                "progressive" => match self.get_stream_url(Some(url), auth).await {
                    Ok(resolved) => return Some(resolved),
                    Err(e) => debug!("progressive preview failed: {e}"),
                },
                "hls" if hls_fallback.is_none() => hls_fallback = Some(url),
                _ => {}
            }
        }

        let url = hls_fallback?;
        self.get_stream_url(Some(url), auth)
            .await
            .map_err(|e| debug!("hls preview failed: {e}"))
            .ok()
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Split a collection response into items and the next cursor. Responses are
/// either a bare list or `{collection, next_href}`; items without an `id` are
/// dropped.
fn split_page(page: Value) -> (Vec<Value>, Option<String>) {
    let (collection, next) = match page {
        Value::Array(items) => (items, None),
        Value::Object(mut obj) => {
            let items = match obj.remove("collection") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            let next = obj
                .remove("next_href")
                .and_then(|v| v.as_str().map(str::to_string))
                .filter(|s| !s.is_empty());
            (items, next)
        }
        _ => (Vec::new(), None),
    };

    let collection = collection
        .into_iter()
        .filter(|item| item.get("id").is_some())
        .collect();
    (collection, next)
}
