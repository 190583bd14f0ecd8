// SPDX-License-Identifier: MPL-2.0

//! Ranking of a track's transcodings and the resulting per-track diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::codec::Codec;
use super::preset;
use crate::api::{Track, Transcoding};

/// Quality assigned to DRM-encrypted HLS streams
pub const ENCRYPTED_QUALITY: i32 = -100;

const HLS_MARKERS: [&str; 4] = ["/hls", ".m3u8", "ctr-encrypted-hls", "cbc-encrypted-hls"];
const ENCRYPTED_MARKERS: [&str; 2] = ["ctr-encrypted-hls", "cbc-encrypted-hls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Progressive,
    Hls,
}

impl Protocol {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("hls") {
            Self::Hls
        } else {
            Self::Progressive
        }
    }
}

/// A transcoding as seen by the selector
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub url: Option<String>,
    pub codec: Codec,
    pub protocol: Protocol,
    pub preset: String,
}

impl From<&Transcoding> for Candidate {
    fn from(t: &Transcoding) -> Self {
        Self {
            url: t.url.clone(),
            codec: Codec::from_preset(&t.preset),
            protocol: Protocol::from_name(&t.format.protocol),
            preset: t.preset.clone(),
        }
    }
}

/// A usable candidate with its rank keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredStream {
    pub url: String,
    pub codec: Codec,
    pub is_hls: bool,
    pub encrypted: bool,
    pub quality: i32,
    pub preference: i32,
    pub preset: String,
}

/// Why a track has no (or no good) stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Diagnostic {
    DrmProtected,
    NonPositiveQuality { preset: String },
    NoUsableTranscodings,
    NoTranscodings,
    NotAvailable,
    UnknownContentType { content_type: String },
}

impl Diagnostic {
    /// Whether the track can still be fetched despite the diagnostic
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::UnknownContentType { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DrmProtected => write!(
                f,
                "Track is only available as a DRM-protected HLS stream, which is not playable without a decryption key. Skipping."
            ),
            Self::NonPositiveQuality { preset } => write!(
                f,
                "Best stream found (preset: {preset}) has zero or negative quality, or its codec could not be parsed."
            ),
            Self::NoUsableTranscodings => {
                write!(f, "No stream transcodings found or none were usable.")
            }
            Self::NoTranscodings => write!(f, "No stream transcodings available for this track."),
            Self::NotAvailable => write!(f, "Track is not available for download or streaming."),
            Self::UnknownContentType { content_type } => write!(
                f,
                "Unknown codec from direct download Content-Type: {content_type}"
            ),
        }
    }
}

/// The chosen stream plus any diagnostic about it
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub stream: ScoredStream,
    pub diagnostic: Option<Diagnostic>,
}

impl Selection {
    pub fn is_playable(&self) -> bool {
        self.diagnostic.is_none()
    }
}

/// How a track's audio should be obtained
#[derive(Debug, Clone, PartialEq)]
pub enum TrackStreams {
    /// The original upload can be downloaded; transcodings are ignored
    DirectDownload,
    Selected(Selection),
    Unavailable(Diagnostic),
}

pub fn looks_like_hls(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    HLS_MARKERS.iter().any(|m| url.contains(m))
}

pub fn looks_encrypted(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    ENCRYPTED_MARKERS.iter().any(|m| url.contains(m))
}

/// Static codec/protocol preference, higher is better
pub fn preference(codec: Codec, is_hls: bool) -> i32 {
    match (codec, is_hls) {
        (Codec::Aac, true) => 5,
        (Codec::Opus, true) => 4,
        (Codec::Opus, false) => 3,
        (Codec::Aac, false) => 2,
        (Codec::Mp3, false) => 1,
        _ => 0,
    }
}

/// Score a candidate. Returns `None` for candidates that can never be chosen:
/// no URL, an unknown codec, or a negative quality on an unencrypted stream.
pub fn score(candidate: &Candidate) -> Option<ScoredStream> {
    let url = candidate.url.as_deref().filter(|u| !u.is_empty())?;
    if !candidate.codec.is_known() {
        return None;
    }

    let is_hls = candidate.protocol == Protocol::Hls || looks_like_hls(url);
    let encrypted = is_hls && looks_encrypted(url);
    let quality = if encrypted {
        ENCRYPTED_QUALITY
    } else {
        preset::quality_score(&candidate.preset, candidate.codec, is_hls)
    };

    // encrypted streams stay so the DRM diagnostic can be reported
    if quality < 0 && !encrypted {
        return None;
    }

    Some(ScoredStream {
        url: url.to_string(),
        codec: candidate.codec,
        is_hls,
        encrypted,
        quality,
        preference: preference(candidate.codec, is_hls),
        preset: candidate.preset.clone(),
    })
}

/// Usable candidates, best first. Ties on (quality, preference) keep input order.
pub fn rank(candidates: &[Candidate]) -> Vec<ScoredStream> {
    let mut streams: Vec<ScoredStream> = candidates.iter().filter_map(score).collect();
    streams.sort_by(|a, b| {
        b.quality
            .cmp(&a.quality)
            .then_with(|| b.preference.cmp(&a.preference))
    });
    streams
}

/// Pick the best candidate, or report that none is usable
pub fn select(candidates: &[Candidate]) -> Result<Selection, Diagnostic> {
    let stream = rank(candidates)
        .into_iter()
        .next()
        .ok_or(Diagnostic::NoUsableTranscodings)?;

    let diagnostic = if stream.encrypted {
        Some(Diagnostic::DrmProtected)
    } else if stream.quality <= 0 {
        Some(Diagnostic::NonPositiveQuality {
            preset: stream.preset.clone(),
        })
    } else {
        None
    };

    Ok(Selection { stream, diagnostic })
}

/// Decide how a track's audio is obtained
pub fn plan(track: &Track) -> TrackStreams {
    if track.has_direct_download() {
        return TrackStreams::DirectDownload;
    }
    if !track.is_streamable() {
        return TrackStreams::Unavailable(Diagnostic::NotAvailable);
    }

    let transcodings = track.transcodings();
    if transcodings.is_empty() {
        return TrackStreams::Unavailable(Diagnostic::NoTranscodings);
    }

    let candidates: Vec<Candidate> = transcodings.iter().map(Candidate::from).collect();
    match select(&candidates) {
        Ok(selection) => TrackStreams::Selected(selection),
        Err(diagnostic) => TrackStreams::Unavailable(diagnostic),
    }
}

/// Codec of a direct download, from its `Content-Type`. Unknown types are
/// treated as AAC and reported.
pub fn direct_download_codec(content_type: &str) -> (Codec, Option<Diagnostic>) {
    match Codec::from_content_type(content_type) {
        Some(codec) => (codec, None),
        None => (
            Codec::Aac,
            Some(Diagnostic::UnknownContentType {
                content_type: content_type.to_string(),
            }),
        ),
    }
}
