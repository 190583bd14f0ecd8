// SPDX-License-Identifier: MPL-2.0

//! HLS playlist inspection ahead of remuxing

use m3u8_rs::{KeyMethod, MediaPlaylist, Playlist};

use crate::api::SoundCloudClient;
use crate::error::{Error, Result};

/// HLS stream information
#[derive(Debug, Clone)]
pub struct HlsStream {
    pub segments: Vec<HlsSegment>,
    pub target_duration: u64,
    /// Key method of the first `#EXT-X-KEY` that is not `NONE`
    pub encryption: Option<KeyMethod>,
}

impl HlsStream {
    /// SAMPLE-AES segments need a DRM key ffmpeg can't obtain. Plain
    /// AES-128 is fine; ffmpeg fetches that key itself.
    pub fn is_drm_protected(&self) -> bool {
        matches!(self.encryption, Some(KeyMethod::SampleAES))
    }

    pub fn total_duration(&self) -> f32 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

/// A single HLS segment
#[derive(Debug, Clone)]
pub struct HlsSegment {
    pub uri: String,
    pub duration: f32,
}

/// Fetch and parse an HLS m3u8 playlist
pub async fn fetch_playlist(client: &SoundCloudClient, url: &str) -> Result<HlsStream> {
    let bytes = client.fetch_bytes(url).await?;
    parse_playlist(&bytes, url)
}

pub fn parse_playlist(bytes: &[u8], url: &str) -> Result<HlsStream> {
    match m3u8_rs::parse_playlist(bytes) {
        Ok((_, Playlist::MediaPlaylist(playlist))) => Ok(parse_media_playlist(&playlist, url)),
        Ok((_, Playlist::MasterPlaylist(_))) => Err(Error::StreamResolution(
            "expected a media playlist, got a master playlist".into(),
        )),
        Err(e) => Err(Error::StreamResolution(format!(
            "failed to parse playlist: {e:?}"
        ))),
    }
}

fn parse_media_playlist(playlist: &MediaPlaylist, base_url: &str) -> HlsStream {
    // Extract base URL for relative segment paths
    let base = base_url.split('?').next().unwrap_or(base_url);
    let base = base.rsplit_once('/').map(|(b, _)| b).unwrap_or(base);
    let absolute = |uri: &str| {
        if uri.starts_with("http") {
            uri.to_string()
        } else {
            format!("{base}/{uri}")
        }
    };

    let encryption = playlist
        .segments
        .iter()
        .find_map(|s| s.key.as_ref())
        .map(|key| key.method.clone())
        .filter(|method| !matches!(method, KeyMethod::None));

    let segments = playlist
        .segments
        .iter()
        .map(|seg| HlsSegment {
            uri: absolute(&seg.uri),
            duration: seg.duration,
        })
        .collect();

    HlsStream {
        segments,
        target_duration: playlist.target_duration,
        encryption,
    }
}
