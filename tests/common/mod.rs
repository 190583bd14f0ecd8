// SPDX-License-Identifier: MPL-2.0

#![allow(dead_code)]

use axum::Router;
use serde_json::{Value, json};
use soundcloud_provider::{Config, SoundCloudClient, SoundCloudProvider};
use std::path::Path;
use tokio::net::TcpListener;

pub const TOKEN: &str = "tok";

/// Bind first so routes can embed the server's own base URL
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

pub fn spawn(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
}

pub fn config(base: &str, temp_dir: &Path) -> Config {
    Config {
        api_base: format!("{base}/"),
        ffmpeg_path: "/nonexistent/ffmpeg".into(),
        temp_dir: Some(temp_dir.to_path_buf()),
        request_timeout_secs: 5,
        ..Config::default()
    }
}

pub fn client(base: &str) -> SoundCloudClient {
    let config = Config {
        api_base: format!("{base}/"),
        request_timeout_secs: 5,
        ..Config::default()
    };
    SoundCloudClient::new(format!("OAuth {TOKEN}"), &config).unwrap()
}

pub fn provider(base: &str, temp_dir: &Path) -> SoundCloudProvider {
    SoundCloudProvider::new(TOKEN, &config(base, temp_dir)).unwrap()
}

/// A complete, streamable track with the given transcodings
pub fn track_json(id: u64, transcodings: Value) -> Value {
    json!({
        "kind": "track",
        "id": id,
        "title": "Uploader - Song",
        "streamable": true,
        "downloadable": false,
        "user": { "id": 2, "username": "Uploader", "permalink": "uploader" },
        "media": { "transcodings": transcodings },
        "track_authorization": "jwt",
        "created_at": "2020-03-04T05:06:07Z",
        "genre": "House/Techno",
        "duration": 180000
    })
}

pub fn transcoding(url: &str, preset: &str, protocol: &str) -> Value {
    json!({
        "url": url,
        "preset": preset,
        "format": { "protocol": protocol, "mime_type": "audio/mp4" }
    })
}

pub fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
