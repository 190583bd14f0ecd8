// SPDX-License-Identifier: MPL-2.0

mod common;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use soundcloud_provider::api::Track;
use soundcloud_provider::{ApiError, Config, SoundCloudClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Params = Query<HashMap<String, String>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("OAuth tok")
}

#[tokio::test]
async fn collections_follow_next_href() {
    let (listener, base) = common::bind().await;
    let next = format!("{base}/users/1/tracks/page2");
    let router = Router::new()
        .route(
            "/users/1/tracks",
            get(move |Query(params): Params| {
                let next = next.clone();
                async move {
                    assert_eq!(params.get("limit").map(String::as_str), Some("200"));
                    Json(json!({
                        "collection": [{ "id": 1 }, { "id": 2 }, { "kind": "promo" }],
                        "next_href": next
                    }))
                }
            }),
        )
        .route(
            "/users/1/tracks/page2",
            get(|| async { Json(json!([{ "id": 3 }])) }),
        );
    common::spawn(listener, router);

    let tracks = common::client(&base).get_user_tracks(1).await.unwrap();
    let ids: Vec<u64> = tracks.iter().map(|t| t.id).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[tokio::test]
async fn pagination_stops_at_max_pages() {
    let (listener, base) = common::bind().await;
    let next = format!("{base}/users/2/albums");
    let router = Router::new().route(
        "/users/2/albums",
        get(move || {
            let next = next.clone();
            async move { Json(json!({ "collection": [{ "id": 9 }], "next_href": next })) }
        }),
    );
    common::spawn(listener, router);

    let config = Config {
        api_base: format!("{base}/"),
        max_pages: 3,
        ..Config::default()
    };
    let client = SoundCloudClient::new("tok", &config).unwrap();
    assert_eq!(client.get_user_albums(2).await.unwrap().len(), 3);
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let (listener, base) = common::bind().await;
    let router = Router::new()
        .route("/tracks/403", get(|| async { StatusCode::FORBIDDEN }))
        .route(
            "/tracks/401",
            get(|| async { (StatusCode::UNAUTHORIZED, "token expired") }),
        )
        .route(
            "/tracks/500",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    common::spawn(listener, router);
    let client = common::client(&base);

    assert!(matches!(
        client.get_track(403).await,
        Err(ApiError::NotAvailable)
    ));
    match client.get_track(401).await {
        Err(ApiError::Unauthorized(body)) => assert_eq!(body, "token expired"),
        other => panic!("unexpected result: {other:?}"),
    }
    match client.get_track(500).await {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Serves `/tracks?ids=...`, recording the batch sizes. Ids divisible by 10
/// are left out of the response.
fn batch_router(seen: Arc<Mutex<Vec<usize>>>) -> Router {
    Router::new().route(
        "/tracks",
        get(move |headers: HeaderMap, Query(params): Params| {
            let seen = seen.clone();
            async move {
                if !authorized(&headers) {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                let ids: Vec<u64> = params["ids"]
                    .split(',')
                    .map(|id| id.parse().unwrap())
                    .collect();
                seen.lock().unwrap().push(ids.len());
                let tracks: Vec<Value> = ids
                    .into_iter()
                    .filter(|id| id % 10 != 0)
                    .map(|id| json!({ "id": id, "title": format!("t{id}"), "streamable": true }))
                    .collect();
                Ok(Json(tracks))
            }
        }),
    )
}

#[tokio::test]
async fn batch_lookup_is_chunked() {
    let (listener, base) = common::bind().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    common::spawn(listener, batch_router(seen.clone()));

    let ids: Vec<u64> = (1..=120).collect();
    let tracks = common::client(&base).get_tracks(&ids).await.unwrap();
    assert_eq!(tracks.len(), 108);
    assert_eq!(*seen.lock().unwrap(), [50, 50, 20]);
}

#[tokio::test]
async fn tracklist_completion_keeps_order() {
    let (listener, base) = common::bind().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    common::spawn(listener, batch_router(seen.clone()));

    let tracks: Vec<Track> = serde_json::from_value(json!([
        { "id": 3 },
        { "id": 1, "title": "kept", "streamable": true },
        { "id": 10 },
        { "id": 2 }
    ]))
    .unwrap();

    let completed = common::client(&base)
        .complete_tracklist(tracks)
        .await
        .unwrap();
    let ids: Vec<u64> = completed.iter().map(|t| t.id).collect();
    assert_eq!(ids, [3, 1, 2]);
    assert!(completed.iter().all(Track::is_complete));
    assert_eq!(completed[1].title, "kept");
    // only the three stubs were looked up
    assert_eq!(*seen.lock().unwrap(), [3]);
}

#[tokio::test]
async fn stream_url_resolution() {
    let (listener, base) = common::bind().await;
    let router = Router::new().route(
        "/media/1/stream/hls",
        get(|Query(params): Params| async move {
            match params.get("track_authorization").map(String::as_str) {
                Some("jwt") => Ok(Json(json!({ "url": "https://cdn.example/playlist.m3u8" }))),
                _ => Err(StatusCode::BAD_REQUEST),
            }
        }),
    );
    common::spawn(listener, router);
    let client = common::client(&base);

    let url = client
        .get_stream_url(Some(&format!("{base}/media/1/stream/hls")), Some("jwt"))
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example/playlist.m3u8");

    assert!(matches!(
        client.get_stream_url(None, None).await,
        Err(ApiError::MissingStreamUrl)
    ));
    assert!(matches!(
        client.get_stream_url(Some(""), None).await,
        Err(ApiError::MissingStreamUrl)
    ));
    assert!(matches!(
        client
            .get_stream_url(Some("https://elsewhere.example/media/1/stream/hls"), None)
            .await,
        Err(ApiError::InvalidStreamUrl(_))
    ));
}

#[tokio::test]
async fn download_writes_file_with_auth() {
    let (listener, base) = common::bind().await;
    let router = Router::new().route(
        "/files/a",
        get(|headers: HeaderMap| async move {
            if authorized(&headers) {
                Ok("audio bytes")
            } else {
                Err(StatusCode::UNAUTHORIZED)
            }
        }),
    );
    common::spawn(listener, router);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.mp3");
    let written = common::client(&base)
        .download_to(&format!("{base}/files/a"), &path)
        .await
        .unwrap();
    assert_eq!(written, 11);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "audio bytes");
}
