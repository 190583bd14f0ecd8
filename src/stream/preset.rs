// SPDX-License-Identifier: MPL-2.0

//! Bitrate extraction from SoundCloud transcoding presets.
//!
//! Presets are free-form vendor labels (`aac_256k`, `opus_0_0`, `mp3_1_0`,
//! `abr_hq`, ...). Each parser returns `None` when the label carries no
//! bitrate signal; [`quality_score`] turns that into a score of 0.

use regex::Regex;
use std::sync::LazyLock;

use super::codec::Codec;

static AAC_KBPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"aac_(\d+)k").expect("valid AAC preset regex"));
static ANY_KBPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)k").expect("valid kbps regex"));

/// Bitrate assumed for AAC presets that don't spell one out (`aac_1_0`)
pub const AAC_FALLBACK_KBPS: u32 = 64;

/// Parse an AAC preset. `aac_<n>k` yields `n`, any other `aac_` preset
/// yields [`AAC_FALLBACK_KBPS`].
pub fn aac_bitrate(preset: &str) -> Option<u32> {
    if let Some(caps) = AAC_KBPS.captures(preset) {
        return caps[1].parse().ok();
    }
    preset.starts_with("aac_").then_some(AAC_FALLBACK_KBPS)
}

/// Parse a progressive (or non-AAC HLS) preset.
pub fn generic_bitrate(preset: &str, codec: Codec) -> Option<u32> {
    if codec == Codec::Opus {
        if preset.contains("abr_hq") {
            return Some(128);
        }
        if preset.contains("abr_sq") {
            return Some(96);
        }
    }

    if let Some(caps) = ANY_KBPS.captures(preset) {
        if let Ok(kbps) = caps[1].parse() {
            return Some(kbps);
        }
    }

    // `mp3_128`, `opus_0_0`: the second segment, when numeric, is taken as-is.
    // This also covers opus quality-level presets, whose level is read verbatim.
    let second = preset.split('_').nth(1)?;
    if !second.is_empty() && second.bytes().all(|b| b.is_ascii_digit()) {
        return second.parse().ok();
    }

    None
}

/// Quality score of a stream; 0 when the preset carries no signal
pub fn quality_score(preset: &str, codec: Codec, is_hls: bool) -> i32 {
    let kbps = if is_hls && codec == Codec::Aac {
        aac_bitrate(preset)
    } else {
        generic_bitrate(preset, codec)
    };
    kbps.and_then(|k| i32::try_from(k).ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aac_kbps_suffix() {
        assert_eq!(aac_bitrate("aac_256k"), Some(256));
        assert_eq!(aac_bitrate("aac_160k"), Some(160));
        assert_eq!(aac_bitrate("hls_aac_96k"), Some(96));
    }

    #[test]
    fn aac_without_bitrate_falls_back() {
        assert_eq!(aac_bitrate("aac_1_0"), Some(64));
        assert_eq!(aac_bitrate("aac_hq"), Some(64));
    }

    #[test]
    fn aac_parser_ignores_other_codecs() {
        assert_eq!(aac_bitrate("opus_0_0"), None);
        assert_eq!(aac_bitrate(""), None);
    }

    #[test]
    fn generic_kbps_anywhere() {
        assert_eq!(generic_bitrate("mp3_128k", Codec::Mp3), Some(128));
        assert_eq!(generic_bitrate("opus_64k_v2", Codec::Opus), Some(64));
        assert_eq!(generic_bitrate("aac_256k", Codec::Aac), Some(256));
    }

    #[test]
    fn generic_second_segment() {
        assert_eq!(generic_bitrate("mp3_320", Codec::Mp3), Some(320));
        assert_eq!(generic_bitrate("mp3_1_0", Codec::Mp3), Some(1));
        assert_eq!(generic_bitrate("opus_0_10", Codec::Opus), Some(0));
    }

    #[test]
    fn opus_descriptive_presets() {
        assert_eq!(generic_bitrate("abr_hq", Codec::Opus), Some(128));
        assert_eq!(generic_bitrate("abr_sq", Codec::Opus), Some(96));
        // only meaningful for Opus
        assert_eq!(generic_bitrate("abr_hq", Codec::Mp3), None);
    }

    #[test]
    fn unparseable_presets_have_no_signal() {
        assert_eq!(generic_bitrate("mp3_standard", Codec::Mp3), None);
        assert_eq!(generic_bitrate("opus", Codec::Opus), None);
        assert_eq!(generic_bitrate("", Codec::Unknown), None);
        assert_eq!(generic_bitrate("ctr-encrypted-hls", Codec::Mp3), None);
    }

    #[test]
    fn scores() {
        assert_eq!(quality_score("aac_160k", Codec::Aac, true), 160);
        assert_eq!(quality_score("aac_1_0", Codec::Aac, true), 64);
        // progressive AAC goes through the generic parser
        assert_eq!(quality_score("aac_1_0", Codec::Aac, false), 1);
        assert_eq!(quality_score("mp3_standard", Codec::Mp3, false), 0);
        assert_eq!(quality_score("opus_0_10", Codec::Opus, false), 0);
    }
}
