// SPDX-License-Identifier: MPL-2.0

mod client;
mod types;

pub use client::{ApiError, BATCH_SIZE, SoundCloudClient};
pub use types::{
    Media, Page, Playlist, PublisherMetadata, Resource, Track, TrackUser, Transcoding,
    TranscodingFormat, User,
};
