//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When API routes or
//! request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    #[allow(dead_code)]
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    /// GET /v1/statics
    pub async fn get_statics(&self) -> Response {
        self.get("/v1/statics").await
    }

    /// GET /v1/emotions
    pub async fn get_emotions(&self) -> Response {
        self.get("/v1/emotions").await
    }

    /// GET /v1/playlist/{emotion}
    pub async fn get_playlist(&self, emotion: &str) -> Response {
        self.get(&format!("/v1/playlist/{}", emotion)).await
    }

    /// POST /v1/scan with the picture in the `image` field
    pub async fn scan(&self, image: Vec<u8>) -> Response {
        self.scan_field("image", image).await
    }

    /// POST /v1/scan with the picture in an arbitrary field
    pub async fn scan_field(&self, field: &str, image: Vec<u8>) -> Response {
        let part = Part::bytes(image)
            .file_name("capture.png")
            .mime_str("image/png")
            .expect("Invalid mime type");
        let form = Form::new().part(field.to_string(), part);

        self.client
            .post(format!("{}/v1/scan", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Scan request failed")
    }
}
