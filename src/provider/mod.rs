// SPDX-License-Identifier: MPL-2.0

//! The provider surface: URL resolution, search, entity lookups and downloads.

pub mod metadata;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::api::{ApiError, Resource, SoundCloudClient, Track, User};
use crate::cache::{EntityCache, Listing};
use crate::config::Config;
use crate::download::{DownloadRequest, Downloader, TrackDownload};
use crate::error::{Error, Result};
use crate::stream::select::{self, TrackStreams};
use crate::stream::{Codec, Diagnostic, ScoredStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Track,
    Album,
    Playlist,
    Artist,
}

impl MediaKind {
    fn search_endpoint(&self) -> &'static str {
        match self {
            Self::Track => "tracks",
            Self::Album => "albums",
            Self::Playlist => "playlists_without_albums",
            Self::Artist => "users",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Playlist => "playlist",
            Self::Artist => "artist",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "track" | "tracks" => Ok(Self::Track),
            "album" | "albums" => Ok(Self::Album),
            "playlist" | "playlists" => Ok(Self::Playlist),
            "artist" | "artists" | "user" | "users" => Ok(Self::Artist),
            other => Err(Error::UnsupportedKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaIdentification {
    pub kind: MediaKind,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: u64,
    pub kind: MediaKind,
    pub name: String,
    pub artists: Option<Vec<String>>,
    pub year: Option<i32>,
    /// Seconds
    pub duration: Option<u64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Tags {
    pub track_number: usize,
    pub release_date: Option<String>,
    pub genres: Option<Vec<String>>,
    pub composer: Option<String>,
    pub copyright: Option<String>,
    pub upc: Option<String>,
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackInfo {
    pub id: u64,
    pub name: String,
    pub album: Option<String>,
    pub artists: Vec<String>,
    /// Uploader permalink, unless the label supplied an artist credit
    pub artist_id: Option<String>,
    pub codec: Codec,
    pub release_year: Option<i32>,
    pub cover_url: Option<String>,
    pub explicit: Option<bool>,
    pub tags: Tags,
    /// The chosen transcoding, absent for direct downloads and unavailable tracks
    pub stream: Option<ScoredStream>,
    pub download: DownloadRequest,
    pub diagnostic: Option<Diagnostic>,
}

impl TrackInfo {
    /// False when the diagnostic means the track should be skipped
    pub fn is_downloadable(&self) -> bool {
        self.diagnostic.as_ref().is_none_or(|d| !d.is_blocking())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumInfo {
    pub id: u64,
    pub name: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub cover_url: Option<String>,
    pub release_year: Option<i32>,
    pub tracks: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistInfo {
    pub id: u64,
    pub name: String,
    pub creator: String,
    pub creator_id: Option<String>,
    pub cover_url: Option<String>,
    pub release_year: Option<i32>,
    pub tracks: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistInfo {
    pub id: u64,
    pub name: String,
    pub albums: Vec<u64>,
    pub tracks: Vec<u64>,
}

pub struct SoundCloudProvider {
    client: SoundCloudClient,
    downloader: Downloader,
    search_limit: usize,
}

impl SoundCloudProvider {
    pub fn new(access_token: impl Into<String>, config: &Config) -> Result<Self> {
        Ok(Self::from_parts(
            SoundCloudClient::new(access_token, config)?,
            Downloader::from_config(config),
            config.search_limit,
        ))
    }

    pub fn from_parts(client: SoundCloudClient, downloader: Downloader, search_limit: usize) -> Self {
        Self {
            client,
            downloader,
            search_limit,
        }
    }

    pub fn client(&self) -> &SoundCloudClient {
        &self.client
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Identify what a soundcloud.com URL points at
    pub async fn resolve(&self, url: &str, cache: &mut EntityCache) -> Result<MediaIdentification> {
        let resource = self.client.resolve_url(url).await?;
        let identification = match &resource {
            Resource::Track(t) => MediaIdentification {
                kind: MediaKind::Track,
                id: t.id,
            },
            Resource::Playlist(p) => MediaIdentification {
                kind: if p.is_album {
                    MediaKind::Album
                } else {
                    MediaKind::Playlist
                },
                id: p.id,
            },
            Resource::User(u) => MediaIdentification {
                kind: MediaKind::Artist,
                id: u.id,
            },
            Resource::Other => return Err(Error::UnsupportedKind(format!("resource at {url}"))),
        };
        debug!("{url} resolved to {} {}", identification.kind, identification.id);
        cache.insert_resource(resource);
        Ok(identification)
    }

    pub async fn search(
        &self,
        kind: MediaKind,
        query: &str,
        limit: Option<usize>,
        cache: &mut EntityCache,
    ) -> Result<Vec<SearchResult>> {
        let limit = limit.unwrap_or(self.search_limit);
        let resources = self
            .client
            .search(kind.search_endpoint(), query, limit)
            .await?;

        let mut results = Vec::with_capacity(resources.len());
        for resource in resources {
            let Some(result) = search_result(kind, &resource) else {
                continue;
            };
            results.push(result);
            cache.insert_resource(resource);
        }
        Ok(results)
    }

    pub async fn get_track(&self, track_id: u64, cache: &mut EntityCache) -> Result<TrackInfo> {
        self.get_track_in(track_id, None, cache).await
    }

    /// Like [`Self::get_track`], numbering the track by its position in
    /// `listing` rather than in the first listing it was seen in
    pub async fn get_track_in(
        &self,
        track_id: u64,
        listing: Option<Listing>,
        cache: &mut EntityCache,
    ) -> Result<TrackInfo> {
        let track = match cache.track(track_id).filter(|t| t.is_complete()) {
            Some(t) => t.clone(),
            None => {
                let t = self.client.get_track(track_id).await?;
                cache.insert_track(t.clone());
                t
            }
        };

        let mut download = DownloadRequest {
            track_id,
            track_url: None,
            download_url: None,
            codec: Codec::Aac,
            track_authorization: track.track_authorization.clone(),
            is_hls: false,
            encrypted: false,
        };
        let mut stream = None;

        let diagnostic = match select::plan(&track) {
            TrackStreams::DirectDownload => {
                let url = self.client.get_track_download(track_id).await?;
                let content_type = self.client.content_type(&url).await?;
                let (codec, diagnostic) = select::direct_download_codec(&content_type);
                info!("track {track_id}: direct download ({content_type})");
                download.codec = codec;
                download.track_url = Some(url.clone());
                download.download_url = Some(url);
                diagnostic
            }
            TrackStreams::Selected(selection) => {
                let s = &selection.stream;
                info!(
                    "track {track_id}: selected {} {} (preset {}, quality {})",
                    if s.is_hls { "HLS" } else { "progressive" },
                    s.codec,
                    s.preset,
                    s.quality
                );
                download.codec = s.codec;
                download.track_url = Some(s.url.clone());
                download.is_hls = s.is_hls;
                download.encrypted = s.encrypted;
                stream = Some(selection.stream);
                selection.diagnostic
            }
            TrackStreams::Unavailable(diagnostic) => diagnostic.into(),
        };
        if let Some(d) = &diagnostic {
            debug!("track {track_id}: {d}");
        }

        let publisher = track.publisher_metadata.clone().unwrap_or_default();
        let credit = publisher
            .artist
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(track.user.username.as_str());

        Ok(TrackInfo {
            id: track.id,
            name: metadata::track_name(&track.title),
            album: publisher.album_title.clone(),
            artists: metadata::split_artists(credit),
            artist_id: if publisher.artist.is_some() {
                None
            } else {
                track.user.permalink.clone()
            },
            codec: download.codec,
            release_year: track_year(&track),
            cover_url: metadata::original_artwork(
                track
                    .artwork_url
                    .as_deref()
                    .or(track.user.avatar_url.as_deref()),
            ),
            explicit: publisher.explicit,
            tags: Tags {
                track_number: cache.track_number(track_id, listing),
                release_date: track.created_at.as_deref().map(metadata::date_only),
                genres: metadata::genres(track.genre.as_deref()),
                composer: publisher.writer_composer,
                copyright: publisher.p_line,
                upc: publisher.upc_or_ean,
                isrc: publisher.isrc,
            },
            stream,
            download,
            diagnostic,
        })
    }

    pub async fn get_album(&self, album_id: u64, cache: &mut EntityCache) -> Result<AlbumInfo> {
        let playlist = self.playlist(album_id, cache).await?;
        let tracks = self.client.complete_tracklist(playlist.tracks.clone()).await?;
        let track_ids = tracks.iter().map(|t| t.id).collect();
        cache.insert_track_listing(Listing::Playlist(playlist.id), tracks);

        Ok(AlbumInfo {
            id: playlist.id,
            name: playlist.title.clone(),
            artist: playlist.user.username.clone(),
            artist_id: playlist.user.permalink.clone(),
            cover_url: metadata::original_artwork(
                playlist
                    .artwork_url
                    .as_deref()
                    .or(playlist.user.avatar_url.as_deref()),
            ),
            release_year: metadata::release_year(&[
                playlist.release_date.as_deref(),
                playlist.display_date.as_deref(),
                playlist.created_at.as_deref(),
            ]),
            tracks: track_ids,
        })
    }

    pub async fn get_playlist(
        &self,
        playlist_id: u64,
        cache: &mut EntityCache,
    ) -> Result<PlaylistInfo> {
        let playlist = self.playlist(playlist_id, cache).await?;
        let tracks = self.client.complete_tracklist(playlist.tracks.clone()).await?;
        let track_ids = tracks.iter().map(|t| t.id).collect();
        cache.insert_track_listing(Listing::Playlist(playlist.id), tracks);

        Ok(PlaylistInfo {
            id: playlist.id,
            name: playlist.title.clone(),
            creator: playlist.user.username.clone(),
            creator_id: playlist.user.permalink.clone(),
            cover_url: metadata::original_artwork(playlist.artwork_url.as_deref()),
            release_year: metadata::release_year(&[
                playlist.release_date.as_deref(),
                playlist.display_date.as_deref(),
                playlist.created_at.as_deref(),
            ]),
            tracks: track_ids,
        })
    }

    /// Artist by numeric id or permalink. Listing failures are logged, not
    /// returned: an artist whose uploads are restricted has empty lists.
    pub async fn get_artist(&self, artist: &str, cache: &mut EntityCache) -> Result<ArtistInfo> {
        let user = self.user(artist, cache).await?;

        let (albums, album_err) = split_result(self.client.get_user_albums(user.id).await);
        let (tracks, track_err) = split_result(self.client.get_user_tracks(user.id).await);

        if albums.is_empty() && tracks.is_empty() && (album_err.is_some() || track_err.is_some()) {
            let restricted = album_err.as_ref().is_some_and(ApiError::is_restricted)
                || track_err.as_ref().is_some_and(ApiError::is_restricted);
            if restricted {
                warn!(
                    "user {}: content not available (restricted or disabled for API)",
                    user.id
                );
            } else {
                let parts: Vec<String> = [("albums", &album_err), ("tracks", &track_err)]
                    .into_iter()
                    .filter_map(|(what, err)| err.as_ref().map(|e| format!("{what}: {e}")))
                    .collect();
                warn!("listing user {} failed: {}", user.id, parts.join("; "));
            }
        }

        let album_ids = albums.iter().map(|a| a.id).collect();
        for album in albums {
            cache.insert_playlist(album);
        }
        let track_ids = tracks.iter().map(|t| t.id).collect();
        cache.insert_track_listing(Listing::Artist(user.id), tracks);

        Ok(ArtistInfo {
            id: user.id,
            name: user.username,
            albums: album_ids,
            tracks: track_ids,
        })
    }

    pub async fn get_track_download(&self, request: &DownloadRequest) -> Result<TrackDownload> {
        self.downloader.download(&self.client, request).await
    }

    pub async fn preview_stream_url(&self, track_id: u64) -> Option<String> {
        self.client.preview_stream_url(track_id).await
    }

    async fn playlist(
        &self,
        playlist_id: u64,
        cache: &mut EntityCache,
    ) -> Result<crate::api::Playlist> {
        if let Some(p) = cache.playlist(playlist_id) {
            return Ok(p.clone());
        }
        let playlist = self.client.get_playlist(playlist_id).await?;
        cache.insert_playlist(playlist.clone());
        Ok(playlist)
    }

    async fn user(&self, artist: &str, cache: &mut EntityCache) -> Result<User> {
        if let Ok(id) = artist.parse::<u64>() {
            if let Some(u) = cache.user(id) {
                return Ok(u.clone());
            }
            let user = self.client.get_user(id).await?;
            cache.insert_user(user.clone());
            return Ok(user);
        }

        let url = format!("https://soundcloud.com/{}", urlencoding::encode(artist));
        match self.client.resolve_url(&url).await? {
            Resource::User(user) => {
                cache.insert_user(user.clone());
                Ok(user)
            }
            _ => Err(Error::NotFound(format!("artist {artist}"))),
        }
    }
}

fn track_year(track: &Track) -> Option<i32> {
    metadata::release_year(&[
        track.release_date.as_deref(),
        track.display_date.as_deref(),
        track.created_at.as_deref(),
    ])
}

fn split_result<T>(result: std::result::Result<Vec<T>, ApiError>) -> (Vec<T>, Option<ApiError>) {
    match result {
        Ok(items) => (items, None),
        Err(e) => (Vec::new(), Some(e)),
    }
}

fn search_result(kind: MediaKind, resource: &Resource) -> Option<SearchResult> {
    match (kind, resource) {
        (MediaKind::Artist, Resource::User(u)) => Some(SearchResult {
            id: u.id,
            kind,
            name: u.username.clone(),
            artists: None,
            year: None,
            duration: None,
            image_url: metadata::thumbnail(u.avatar_url.as_deref()),
        }),
        (MediaKind::Album | MediaKind::Playlist, Resource::Playlist(p)) => {
            // no uploader-avatar fallback: it is a generic person icon for playlists
            let image = p
                .artwork_url
                .as_deref()
                .or(p.calculated_artwork_url.as_deref())
                .or_else(|| p.tracks.first().and_then(|t| t.artwork_url.as_deref()));
            Some(SearchResult {
                id: p.id,
                kind,
                name: p.title.clone(),
                artists: Some(metadata::split_artists(&p.user.username)),
                year: metadata::release_year(&[
                    p.release_date.as_deref(),
                    p.display_date.as_deref(),
                    p.created_at.as_deref(),
                ]),
                duration: (p.duration > 0).then_some(p.duration / 1000),
                image_url: metadata::thumbnail(image),
            })
        }
        (MediaKind::Track, Resource::Track(t)) => Some(SearchResult {
            id: t.id,
            kind,
            name: t.title.clone(),
            artists: Some(metadata::split_artists(&t.user.username)),
            year: track_year(t),
            duration: (t.duration > 0).then_some(t.duration / 1000),
            image_url: metadata::thumbnail(
                t.artwork_url.as_deref().or(t.user.avatar_url.as_deref()),
            ),
        }),
        _ => None,
    }
}
