// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio codecs a track can be delivered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Aac,
    Opus,
    Mp3,
    Vorbis,
    Flac,
    Wav,
    Alac,
    Unknown,
}

impl Codec {
    /// Map a codec name (case-insensitive) to a codec, `Unknown` if unrecognized
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "aac" => Self::Aac,
            "opus" => Self::Opus,
            "mp3" => Self::Mp3,
            "vorbis" => Self::Vorbis,
            "flac" => Self::Flac,
            "wav" => Self::Wav,
            "alac" => Self::Alac,
            _ => Self::Unknown,
        }
    }

    /// Codec of a transcoding preset such as `aac_160k` or `opus_0_0`
    pub fn from_preset(preset: &str) -> Self {
        preset
            .split('_')
            .next()
            .map(Self::from_name)
            .unwrap_or(Self::Unknown)
    }

    /// Infer the codec from a `Content-Type` header value.
    ///
    /// `audio/mpeg` is MP3 and `audio/ogg` is Vorbis; any other subtype is
    /// looked up by name. Returns `None` when the subtype names no known codec.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or("").trim();
        let subtype = mime.rsplit('/').next().unwrap_or("");
        let name = subtype.replace("mpeg", "mp3").replace("ogg", "vorbis");
        match Self::from_name(&name) {
            Self::Unknown => None,
            codec => Some(codec),
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }

    /// File extension of the container a remux of this codec is written to
    pub fn container_extension(&self) -> &'static str {
        match self {
            Self::Aac | Self::Alac | Self::Unknown => "m4a",
            Self::Opus => "opus",
            Self::Mp3 => "mp3",
            Self::Vorbis => "ogg",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aac => "AAC",
            Self::Opus => "OPUS",
            Self::Mp3 => "MP3",
            Self::Vorbis => "VORBIS",
            Self::Flac => "FLAC",
            Self::Wav => "WAV",
            Self::Alac => "ALAC",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_map_case_insensitively() {
        assert_eq!(Codec::from_name("AAC"), Codec::Aac);
        assert_eq!(Codec::from_name("opus"), Codec::Opus);
        assert_eq!(Codec::from_name("Mp3"), Codec::Mp3);
        assert_eq!(Codec::from_name("abr"), Codec::Unknown);
        assert_eq!(Codec::from_name(""), Codec::Unknown);
    }

    #[test]
    fn preset_prefix_selects_codec() {
        assert_eq!(Codec::from_preset("aac_256k"), Codec::Aac);
        assert_eq!(Codec::from_preset("opus_0_0"), Codec::Opus);
        assert_eq!(Codec::from_preset("mp3_1_0"), Codec::Mp3);
        assert_eq!(Codec::from_preset("abr_hq"), Codec::Unknown);
    }

    #[test]
    fn content_types() {
        assert_eq!(Codec::from_content_type("audio/mpeg"), Some(Codec::Mp3));
        assert_eq!(Codec::from_content_type("audio/ogg"), Some(Codec::Vorbis));
        assert_eq!(Codec::from_content_type("audio/flac"), Some(Codec::Flac));
        assert_eq!(
            Codec::from_content_type("audio/wav; charset=binary"),
            Some(Codec::Wav)
        );
        assert_eq!(Codec::from_content_type("audio/x-m4a"), None);
        assert_eq!(Codec::from_content_type(""), None);
    }

    #[test]
    fn containers() {
        assert_eq!(Codec::Aac.container_extension(), "m4a");
        assert_eq!(Codec::Mp3.container_extension(), "mp3");
        assert_eq!(Codec::Opus.container_extension(), "opus");
    }
}
