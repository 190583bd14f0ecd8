// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "soundcloud-provider",
    about = "Resolve, search and download SoundCloud tracks",
    version
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// OAuth token; overrides the keyring
    #[arg(long, global = true, env = "SOUNDCLOUD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Identify what a soundcloud.com URL points at
    Resolve { url: String },

    /// Search tracks, albums, playlists or artists
    Search {
        /// track, album, playlist or artist
        kind: String,
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Track metadata and the selected stream
    Track { id: u64 },

    Album { id: u64 },

    Playlist { id: u64 },

    /// Artist by numeric id or permalink
    Artist { id: String },

    /// Download a track given its URL or id
    Download {
        target: String,
        /// Destination file; defaults to the track name in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Directly playable stream URL of a track
    Preview { id: u64 },

    /// Store a token in the system keyring
    Login { token: String },

    /// Remove the stored token
    Logout,
}
