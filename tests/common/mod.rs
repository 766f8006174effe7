//! Mock HTTP server setup for client tests

#![allow(dead_code)]

use anime_enrich::backend::BackendClient;
use anime_enrich::cache::JsonCache;
use anime_enrich::catalog::CatalogClient;
use anime_enrich::transport::HttpTransport;
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::time::Duration;

/// Test fixture that owns a mock server.
///
/// The catalog is mounted under `/v4`, the streaming backend under
/// `/api/v2/hianime` and the user service at the root, mirroring production.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).expect("transport")
    }

    pub fn catalog_url(&self) -> String {
        format!("{}/v4", self.base_url)
    }

    pub fn backend_url(&self) -> String {
        format!("{}/api/v2/hianime", self.base_url)
    }

    pub fn catalog_client(&self) -> CatalogClient {
        CatalogClient::with_parts(&self.catalog_url(), Self::transport(), JsonCache::disabled())
            .expect("catalog client")
    }

    pub fn cached_catalog_client(&self) -> CatalogClient {
        CatalogClient::with_parts(
            &self.catalog_url(),
            Self::transport(),
            JsonCache::memory(16, Duration::from_secs(60)),
        )
        .expect("catalog client")
    }

    pub fn backend_client(&self) -> BackendClient {
        BackendClient::with_parts(&self.backend_url(), &self.base_url, Self::transport())
            .expect("backend client")
    }

    /// GET mock answering JSON. Any query string is accepted.
    pub async fn mock_json(&mut self, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// GET mock answering JSON for one exact query parameter.
    pub async fn mock_json_query(
        &mut self,
        path: &str,
        key: &str,
        value: &str,
        body: &str,
    ) -> Mock {
        self.server
            .mock("GET", path)
            .match_query(Matcher::UrlEncoded(key.into(), value.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn anime_body(mal_id: u64, title: &str) -> String {
    serde_json::json!({
        "data": {
            "mal_id": mal_id,
            "title": title,
            "images": {"jpg": {"image_url": format!("https://cdn.example/{mal_id}.jpg")}},
            "score": 8.5,
            "episodes": 24
        }
    })
    .to_string()
}
