// SPDX-License-Identifier: MPL-2.0

//! Field mapping from API objects to provider results

/// Split an uploader or artist credit into individual artists
pub fn split_artists(credit: &str) -> Vec<String> {
    credit
        .replace(" & ", ", ")
        .replace(" and ", ", ")
        .replace(" x ", ", ")
        .split(", ")
        .map(str::to_string)
        .collect()
}

/// Year of the first non-empty date, trying them in order
pub fn release_year(dates: &[Option<&str>]) -> Option<i32> {
    dates
        .iter()
        .flatten()
        .find(|d| !d.is_empty())
        .and_then(|d| d.split('-').next())
        .and_then(|y| y.parse().ok())
}

/// Uploads are often titled "Artist - Title"; keep the title part
pub fn track_name(title: &str) -> String {
    title
        .split(" - ")
        .nth(1)
        .unwrap_or(title)
        .to_string()
}

/// Full-size artwork instead of the default 100x100 variant
pub fn original_artwork(url: Option<&str>) -> Option<String> {
    url.map(|u| u.replace("-large", "-original"))
}

/// Search thumbnail; placeholder avatars are dropped
pub fn thumbnail(url: Option<&str>) -> Option<String> {
    url.filter(|u| !u.contains("default_avatar"))
        .map(|u| u.replace("-large", "-t200x200"))
}

/// Date part of an ISO timestamp
pub fn date_only(timestamp: &str) -> String {
    timestamp.split('T').next().unwrap_or(timestamp).to_string()
}

pub fn genres(genre: Option<&str>) -> Option<Vec<String>> {
    genre
        .filter(|g| !g.is_empty())
        .map(|g| g.split('/').map(str::to_string).collect())
}
