//! End-to-end tests for the scan flow
//!
//! Picture upload, mood detection and the song list that comes back.

mod common;

use common::{
    gray_png, TestClient, TestServer, ANGRY_FIRST_SONG, ANGRY_GRAY, HAPPY_FIRST_ARTIST,
    HAPPY_FIRST_SONG, HAPPY_GRAY, NEUTRAL_GRAY, SAD_FIRST_SONG, SAD_GRAY, SONGS_PER_LIST,
};
use reqwest::StatusCode;

#[tokio::test]
async fn test_capture_page_is_served() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_home().await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = response.text().await.unwrap();
    assert!(page.contains("<title>Music Therapy</title>"));
    assert!(page.contains("/v1/scan"));
}

#[tokio::test]
async fn test_scan_sad_picture() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.scan(gray_png(SAD_GRAY)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["emotion"], "Sad");
    assert_eq!(body["color"], "red");
    assert_eq!(body["songs"]["columns"], serde_json::json!(["Song", "Artist"]));
    assert_eq!(body["songs"]["rows"][0][0], SAD_FIRST_SONG);
    assert_eq!(
        body["songs"]["rows"].as_array().unwrap().len(),
        SONGS_PER_LIST
    );
}

#[tokio::test]
async fn test_scan_happy_picture_reads_workbook() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.scan(gray_png(HAPPY_GRAY)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["emotion"], "Happy");
    assert_eq!(body["color"], "green");
    assert_eq!(body["songs"]["rows"][0][0], HAPPY_FIRST_SONG);
    assert_eq!(body["songs"]["rows"][0][1], HAPPY_FIRST_ARTIST);
}

#[tokio::test]
async fn test_scan_uses_first_song_list_file() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.scan(gray_png(ANGRY_GRAY)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["emotion"], "Angry");
    assert_eq!(body["songs"]["rows"][0][0], ANGRY_FIRST_SONG);
}

#[tokio::test]
async fn test_scan_fails_when_song_list_is_missing() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    // The Neutral directory has no song list
    let response = client.scan(gray_png(NEUTRAL_GRAY)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("No song list"));
}

#[tokio::test]
async fn test_scan_rejects_garbage() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.scan(b"GIF89a but not really".to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_without_image_field() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.scan_field("photo", gray_png(SAD_GRAY)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
