// SPDX-License-Identifier: MPL-2.0

//! Caller-owned store of already fetched API objects.
//!
//! Resolve, search and listing calls return full objects; keeping them here
//! lets later `get_*` calls skip the refetch. The provider never holds one
//! itself: callers create a cache and pass it by `&mut`.

use serde::Serialize;
use std::collections::HashMap;

use crate::api::{Playlist, Resource, Track, User};

/// A track listing: an album or playlist, or an artist's uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Listing {
    Playlist(u64),
    Artist(u64),
}

#[derive(Debug, Default, Clone)]
pub struct EntityCache {
    tracks: HashMap<u64, Track>,
    playlists: HashMap<u64, Playlist>,
    users: HashMap<u64, User>,
    /// Track order of every listing fetched so far
    listings: HashMap<Listing, Vec<u64>>,
    /// First listing each track was seen in
    home_listing: HashMap<u64, Listing>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Cache a track. Stubs never replace a complete entry.
    pub fn insert_track(&mut self, track: Track) {
        if !track.is_complete() && self.tracks.get(&track.id).is_some_and(Track::is_complete) {
            return;
        }
        self.tracks.insert(track.id, track);
    }

    /// Cache the tracks of `listing` and remember their order
    pub fn insert_track_listing(
        &mut self,
        listing: Listing,
        tracks: impl IntoIterator<Item = Track>,
    ) {
        let mut order = Vec::new();
        for track in tracks {
            order.push(track.id);
            self.home_listing.entry(track.id).or_insert(listing);
            self.insert_track(track);
        }
        self.listings.insert(listing, order);
    }

    /// 1-based position of a track in `listing`, or in the first listing it
    /// was seen in when none is given. 1 for tracks outside any listing.
    pub fn track_number(&self, id: u64, listing: Option<Listing>) -> usize {
        listing
            .or_else(|| self.home_listing.get(&id).copied())
            .and_then(|l| self.listings.get(&l))
            .and_then(|order| order.iter().position(|t| *t == id))
            .map_or(1, |i| i + 1)
    }

    pub fn playlist(&self, id: u64) -> Option<&Playlist> {
        self.playlists.get(&id)
    }

    pub fn insert_playlist(&mut self, playlist: Playlist) {
        self.playlists.insert(playlist.id, playlist);
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_resource(&mut self, resource: Resource) {
        match resource {
            Resource::Track(t) => self.insert_track(t),
            Resource::Playlist(p) => self.insert_playlist(p),
            Resource::User(u) => self.insert_user(u),
            Resource::Other => {}
        }
    }
}
