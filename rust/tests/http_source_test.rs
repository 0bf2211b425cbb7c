use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use reqwest::{Client, Url};
use tokio::net::TcpListener;

use ma_preload_engine::config::HttpBackendConfig;
use ma_preload_engine::source::http_image::HttpImageFetcher;
use ma_preload_engine::source::http_source::HttpSource;
use ma_preload_engine::source::traits::{ByteSource, ImageFetcher};

const TEST_SIZE: usize = 64 * 1024;

fn png_bytes() -> Vec<u8> {
    let mut body = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    body.resize(2048, 0x42);
    body
}

async fn serve_file(req: Request) -> impl IntoResponse {
    let body: Vec<u8> = (0..TEST_SIZE).map(|i| (i % 256) as u8).collect();
    let total = body.len() as u64;

    if let Some(range_val) = req.headers().get("Range") {
        let range_str = range_val.to_str().unwrap_or("");
        // Parse "bytes=START-END"
        if let Some(rest) = range_str.strip_prefix("bytes=") {
            let parts: Vec<&str> = rest.splitn(2, '-').collect();
            if parts.len() == 2 {
                let start: u64 = parts[0].parse().unwrap_or(0);
                let end: u64 = if parts[1].is_empty() {
                    total - 1
                } else {
                    parts[1].parse().unwrap_or(total - 1)
                };
                let end = end.min(total - 1);
                let slice = &body[start as usize..=end as usize];
                let content_range = format!("bytes {}-{}/{}", start, end, total);
                return (
                    StatusCode::PARTIAL_CONTENT,
                    [
                        (header::CONTENT_TYPE, "video/mp4".to_string()),
                        (header::CONTENT_RANGE, content_range),
                        (header::CONTENT_LENGTH, slice.len().to_string()),
                    ],
                    slice.to_vec(),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, total.to_string()),
        ],
        body,
    )
        .into_response()
}

/// Ignores Range entirely, like many static image hosts.
async fn serve_plain(req: Request) -> impl IntoResponse {
    let body: Vec<u8> = (0..TEST_SIZE).map(|i| (i % 256) as u8).collect();
    let _ = req;
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/octet-stream")], body)
}

async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/file", get(serve_file))
        .route("/plain", get(serve_plain))
        .route(
            "/assets/logo.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], png_bytes()) }),
        )
        .route(
            "/assets/error.png",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<!DOCTYPE html><h1>oops</h1>") }),
        )
        .route(
            "/assets/private.png",
            get(|| async { (StatusCode::FORBIDDEN, "denied") }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn source(addr: SocketAddr, path: &str) -> HttpSource {
    let url = Url::parse(&format!("http://{}{}", addr, path)).unwrap();
    HttpSource::new(Client::new(), url, HashMap::new())
}

fn image_fetcher(addr: SocketAddr) -> HttpImageFetcher {
    let config = HttpBackendConfig {
        base_url: Some(format!("http://{}/assets/", addr)),
        ..HttpBackendConfig::default()
    };
    HttpImageFetcher::new(Client::new(), config)
}

#[tokio::test]
async fn test_http_source_probe() {
    let (addr, _handle) = start_server().await;
    let info = source(addr, "/file").probe().await.unwrap();
    assert_eq!(info.content_length, TEST_SIZE as u64);
    assert!(info.supports_range);
    assert_eq!(info.content_type, "video/mp4");
}

#[tokio::test]
async fn test_http_source_fetch_range() {
    let (addr, _handle) = start_server().await;
    let data = source(addr, "/file").fetch_range(0, 99).await.unwrap();
    assert_eq!(data.len(), 100);
    for i in 0..100u8 {
        assert_eq!(data[i as usize], i);
    }
}

#[tokio::test]
async fn test_http_source_range_ignored_by_server() {
    let (addr, _handle) = start_server().await;
    let plain = source(addr, "/plain");

    let info = plain.probe().await.unwrap();
    assert!(!info.supports_range);
    assert_eq!(info.content_length, TEST_SIZE as u64);

    let data = plain.fetch_range(300, 309).await.unwrap();
    assert_eq!(data.len(), 10);
    assert_eq!(data[0], (300 % 256) as u8);
}

#[tokio::test]
async fn test_image_fetcher_accepts_png() {
    let (addr, _handle) = start_server().await;
    image_fetcher(addr).fetch("logo.png").await.unwrap();
}

#[tokio::test]
async fn test_image_fetcher_rejects_undecodable_body() {
    let (addr, _handle) = start_server().await;
    let err = image_fetcher(addr).fetch("error.png").await.unwrap_err();
    assert!(err.to_string().contains("cannot decode image"));
}

#[tokio::test]
async fn test_image_fetcher_rejects_http_errors() {
    let (addr, _handle) = start_server().await;
    let fetcher = image_fetcher(addr);

    let err = fetcher.fetch("private.png").await.unwrap_err();
    assert!(err.to_string().contains("HTTP 403"));

    let err = fetcher.fetch("nowhere.png").await.unwrap_err();
    assert!(err.to_string().contains("HTTP 404"));
}
