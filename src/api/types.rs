// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};

/// SoundCloud user profile
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub permalink: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub followers_count: u32,
    #[serde(default)]
    pub track_count: u32,
    #[serde(default)]
    pub playlist_count: u32,
    pub permalink_url: Option<String>,
}

/// Simplified user info embedded in tracks and playlists
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackUser {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub username: String,
    pub permalink: Option<String>,
    pub avatar_url: Option<String>,
}

/// Audio transcoding format
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TranscodingFormat {
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub mime_type: String,
}

/// Audio transcoding option
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transcoding {
    /// Lookup URL on the API host; resolves to the actual media URL
    pub url: Option<String>,
    #[serde(default)]
    pub preset: String,
    #[serde(default)]
    pub format: TranscodingFormat,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub snipped: bool,
}

/// Media container with transcoding options
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Media {
    #[serde(default)]
    pub transcodings: Vec<Transcoding>,
}

/// Label-supplied metadata attached to some tracks
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PublisherMetadata {
    pub artist: Option<String>,
    pub album_title: Option<String>,
    pub explicit: Option<bool>,
    pub writer_composer: Option<String>,
    pub p_line: Option<String>,
    pub upc_or_ean: Option<String>,
    pub isrc: Option<String>,
}

/// SoundCloud track
/// Note: Playlists may return "stub" tracks with only id - use is_complete() to check
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    pub id: u64,
    /// Title may be missing for stub tracks in playlists
    #[serde(default)]
    pub title: String,
    /// User may be missing for stub tracks
    #[serde(default)]
    pub user: TrackUser,
    pub artwork_url: Option<String>,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: u64,
    pub media: Option<Media>,
    pub permalink_url: Option<String>,
    /// Absent on stub tracks
    pub streamable: Option<bool>,
    #[serde(default)]
    pub downloadable: bool,
    #[serde(default)]
    pub has_downloads_left: bool,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub display_date: Option<String>,
    pub created_at: Option<String>,
    pub publisher_metadata: Option<PublisherMetadata>,
    /// JWT token for authorizing stream access
    pub track_authorization: Option<String>,
}

impl Track {
    /// Check if this is a complete track (not a stub from playlist response)
    /// Stub tracks only have id and need to be fetched separately
    pub fn is_complete(&self) -> bool {
        self.streamable.is_some()
    }

    pub fn is_streamable(&self) -> bool {
        self.streamable.unwrap_or(false)
    }

    /// Direct download of the original upload is possible
    pub fn has_direct_download(&self) -> bool {
        self.downloadable && self.has_downloads_left
    }

    pub fn transcodings(&self) -> &[Transcoding] {
        self.media
            .as_ref()
            .map(|m| m.transcodings.as_slice())
            .unwrap_or_default()
    }
}

/// SoundCloud playlist; albums are playlists with `is_album` set
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Playlist {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub user: TrackUser,
    pub artwork_url: Option<String>,
    pub calculated_artwork_url: Option<String>,
    #[serde(default)]
    pub is_album: bool,
    #[serde(default)]
    pub track_count: u32,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub release_date: Option<String>,
    pub display_date: Option<String>,
    pub created_at: Option<String>,
    pub permalink_url: Option<String>,
}

/// Anything the resolve and search endpoints can return
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum Resource {
    #[serde(rename = "track")]
    Track(Track),
    #[serde(rename = "playlist")]
    Playlist(Playlist),
    #[serde(rename = "user")]
    User(User),
    #[serde(other)]
    Other,
}

/// Paginated response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    pub collection: Vec<T>,
    pub next_href: Option<String>,
}

/// Stream URL response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamUrlResponse {
    pub url: String,
}

/// Direct download response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadResponse {
    #[serde(rename = "redirectUri")]
    pub redirect_uri: String,
}
