// SPDX-License-Identifier: MPL-2.0

//! Turning a selected stream into something the caller can save.
//!
//! HLS streams are remuxed by ffmpeg into a temp file. Progressive AAC is
//! downloaded and remuxed the same way; other progressive codecs are handed
//! back as a URL plus auth header. Every temp file is deleted on error paths,
//! so a successful call leaves exactly one file and a failed call none.

mod ffmpeg;
pub mod hls;

pub use ffmpeg::{RemuxInput, Remuxer};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tempfile::TempPath;
use tracing::{debug, info, warn};

use crate::api::SoundCloudClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::stream::Codec;
use crate::stream::select::looks_like_hls;

/// Everything needed to fetch a track after its stream has been chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub track_id: u64,
    /// Transcoding lookup URL, or the direct download URL
    pub track_url: Option<String>,
    /// Set only for direct downloads of the original upload
    pub download_url: Option<String>,
    pub codec: Codec,
    pub track_authorization: Option<String>,
    pub is_hls: bool,
    /// Selected stream is a DRM-encrypted HLS variant
    #[serde(default)]
    pub encrypted: bool,
}

impl DownloadRequest {
    /// Whether materializing this request goes through ffmpeg
    pub fn needs_remux(&self) -> bool {
        self.wants_hls() || self.codec == Codec::Aac
    }

    fn wants_hls(&self) -> bool {
        self.is_hls || self.track_url.as_deref().is_some_and(looks_like_hls)
    }
}

/// Result of materializing a track
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackDownload {
    /// A local file now owned by the caller
    TempFile { path: PathBuf },
    /// A URL the caller fetches itself, with the headers it needs
    Url {
        url: String,
        headers: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone)]
pub struct Downloader {
    remuxer: Remuxer,
    temp_dir: Option<PathBuf>,
}

impl Downloader {
    pub fn new(remuxer: Remuxer, temp_dir: Option<PathBuf>) -> Self {
        Self { remuxer, temp_dir }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Remuxer::new(config.ffmpeg_path.clone()),
            config.temp_dir.clone(),
        )
    }

    pub fn remuxer(&self) -> &Remuxer {
        &self.remuxer
    }

    fn temp_path(&self, codec: Codec) -> Result<TempPath> {
        let suffix = format!(".{}", codec.container_extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("soundcloud-").suffix(&suffix);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file.into_temp_path())
    }

    pub async fn download(
        &self,
        client: &SoundCloudClient,
        request: &DownloadRequest,
    ) -> Result<TrackDownload> {
        if request.encrypted {
            return Err(Error::StreamResolution(format!(
                "track {} is only available as a DRM-protected stream",
                request.track_id
            )));
        }
        if request.wants_hls() {
            self.download_hls(client, request).await
        } else {
            self.download_progressive(client, request).await
        }
    }

    async fn download_hls(
        &self,
        client: &SoundCloudClient,
        request: &DownloadRequest,
    ) -> Result<TrackDownload> {
        let track_url = request
            .track_url
            .as_deref()
            .ok_or_else(|| Error::StreamResolution("HLS stream URL not found".into()))?;

        let playlist_url = client
            .get_stream_url(Some(track_url), request.track_authorization.as_deref())
            .await?;
        if !playlist_url.starts_with("http") {
            return Err(Error::StreamResolution(format!(
                "resolved playlist URL is invalid: {playlist_url}"
            )));
        }

        match hls::fetch_playlist(client, &playlist_url).await {
            Ok(stream) if stream.is_drm_protected() => {
                return Err(Error::StreamResolution(
                    "playlist segments are SAMPLE-AES encrypted".into(),
                ));
            }
            Ok(stream) => debug!(
                segments = stream.segments.len(),
                target_duration = stream.target_duration,
                duration = stream.total_duration(),
                "playlist inspected"
            ),
            Err(e) => debug!("could not inspect playlist, leaving it to ffmpeg: {e}"),
        }

        let output = self.temp_path(request.codec)?;
        let authorization = client.auth_header();
        // `output` is removed on drop if the remux fails
        self.remuxer
            .remux(
                RemuxInput::Url {
                    url: &playlist_url,
                    authorization: &authorization,
                },
                &output,
            )
            .await?;

        info!("track {} remuxed from HLS", request.track_id);
        Ok(TrackDownload::TempFile {
            path: keep(output)?,
        })
    }

    async fn download_progressive(
        &self,
        client: &SoundCloudClient,
        request: &DownloadRequest,
    ) -> Result<TrackDownload> {
        let url = match &request.download_url {
            Some(url) => url.clone(),
            None => {
                client
                    .get_stream_url(
                        request.track_url.as_deref(),
                        request.track_authorization.as_deref(),
                    )
                    .await?
            }
        };

        if request.codec != Codec::Aac {
            return Ok(TrackDownload::Url {
                url,
                headers: vec![("Authorization".to_string(), client.auth_header())],
            });
        }

        let raw_file = self.temp_path(Codec::Aac)?;
        client.download_to(&url, &raw_file).await?;

        let output = self.temp_path(Codec::Aac)?;
        let path = match self.remuxer.remux(RemuxInput::File(&raw_file), &output).await {
            Ok(()) => {
                drop(raw_file);
                keep(output)?
            }
            Err(e) => {
                warn!(
                    "ffmpeg is not installed or working properly for AAC remux ({e}); using the raw download, which may have errors"
                );
                drop(output);
                keep(raw_file)?
            }
        };

        Ok(TrackDownload::TempFile { path })
    }
}

fn keep(path: TempPath) -> Result<PathBuf> {
    path.keep().map_err(|e| Error::Io(e.error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(track_url: Option<&str>, is_hls: bool) -> DownloadRequest {
        DownloadRequest {
            track_id: 1,
            track_url: track_url.map(str::to_string),
            download_url: None,
            codec: Codec::Aac,
            track_authorization: None,
            is_hls,
            encrypted: false,
        }
    }

    #[test]
    fn hls_detection() {
        assert!(request(None, true).wants_hls());
        assert!(request(Some("https://api-v2.soundcloud.com/media/x/stream/hls"), false).wants_hls());
        assert!(request(Some("https://x/ctr-encrypted-hls"), false).wants_hls());
        assert!(!request(Some("https://api-v2.soundcloud.com/media/x/stream/progressive"), false).wants_hls());
        assert!(!request(None, false).wants_hls());
    }

    #[test]
    fn remux_needed_for_hls_and_aac() {
        assert!(request(None, true).needs_remux());
        assert!(request(Some("https://x/stream/progressive"), false).needs_remux());

        let mut mp3 = request(Some("https://x/stream/progressive"), false);
        mp3.codec = Codec::Mp3;
        assert!(!mp3.needs_remux());
        mp3.is_hls = true;
        assert!(mp3.needs_remux());
    }

    #[test]
    fn temp_paths_use_codec_container() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(Remuxer::default(), Some(dir.path().to_path_buf()));
        let path = downloader.temp_path(Codec::Mp3).unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "mp3");
        assert!(path.exists());

        let owned = path.to_path_buf();
        drop(path);
        assert!(!owned.exists());
    }
}
