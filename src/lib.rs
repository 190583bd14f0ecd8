// SPDX-License-Identifier: MPL-2.0

//! SoundCloud provider: resolves soundcloud.com URLs, searches the catalog,
//! picks the best transcoding for each track and materializes it as a file
//! (HLS and AAC via ffmpeg) or as an authorized progressive URL.

pub mod api;
pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod keyring;
pub mod provider;
pub mod stream;

pub use api::{ApiError, SoundCloudClient};
pub use cache::{EntityCache, Listing};
pub use config::Config;
pub use download::{DownloadRequest, Downloader, TrackDownload};
pub use error::{Error, Result};
pub use provider::{
    AlbumInfo, ArtistInfo, MediaIdentification, MediaKind, PlaylistInfo, SearchResult,
    SoundCloudProvider, Tags, TrackInfo,
};
pub use stream::{Codec, Diagnostic, ScoredStream};
