use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use webdocs_engine::{
    short_hash, DownloadError, FetchSettings, ImageDownloader, ImageReference, ReqwestFetcher,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

fn downloader(root: &TempDir, max_bytes: u64) -> ImageDownloader {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    ImageDownloader::new(fetcher.client().clone(), root.path().to_path_buf(), max_bytes)
}

async fn serve(server: &MockServer, at: &str, status: u16, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_vec(), "image/png"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn download_saves_under_slug_directory() {
    let server = MockServer::start().await;
    serve(&server, "/a.png", 200, PNG_BYTES).await;
    let root = TempDir::new().unwrap();

    let url = format!("{}/a.png", server.uri());
    let local = downloader(&root, 1024)
        .download(&url, "hello-world")
        .await
        .unwrap();

    assert_eq!(local, "images/hello-world/a.png");
    assert_eq!(fs::read(root.path().join(&local)).unwrap(), PNG_BYTES);
}

#[tokio::test]
async fn url_without_path_gets_hashed_png_name() {
    let server = MockServer::start().await;
    serve(&server, "/", 200, PNG_BYTES).await;
    let root = TempDir::new().unwrap();

    let url = server.uri();
    let local = downloader(&root, 1024).download(&url, "s").await.unwrap();

    assert_eq!(local, format!("images/s/image_{}.png", short_hash(&url)));
    assert!(root.path().join(&local).is_file());
}

#[tokio::test]
async fn failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    serve(&server, "/gone.png", 404, b"").await;
    let root = TempDir::new().unwrap();

    let url = format!("{}/gone.png", server.uri());
    let err = downloader(&root, 1024)
        .download(&url, "s")
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::HttpStatus { status: 404, .. }));
    let dir = root.path().join("images").join("s");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let server = MockServer::start().await;
    serve(&server, "/big.png", 200, &[0u8; 64]).await;
    let root = TempDir::new().unwrap();

    let url = format!("{}/big.png", server.uri());
    let err = downloader(&root, 16).download(&url, "s").await.unwrap_err();

    assert!(matches!(err, DownloadError::TooLarge { max_bytes: 16, .. }));
    assert!(!root.path().join("images/s/big.png").exists());
}

#[tokio::test]
async fn process_all_maps_every_form_and_omits_failures() {
    let server = MockServer::start().await;
    serve(&server, "/cdn/diagram.png", 200, PNG_BYTES).await;
    serve(&server, "/cdn/broken.png", 500, b"").await;
    serve(&server, "/local/photo.jpg", 200, b"jpeg").await;
    let root = TempDir::new().unwrap();

    let proxied = format!("{}/cdn/diagram.png", server.uri());
    let proxy_src = format!(
        "/_next/image?url={}&w=3840&q=75",
        proxied.replace(':', "%3A").replace('/', "%2F")
    );
    let references = vec![
        ImageReference {
            as_seen: proxy_src.clone(),
            absolute: format!("{}{}", server.uri(), proxy_src),
            canonical: proxied.clone(),
        },
        ImageReference {
            as_seen: format!("{}/cdn/broken.png", server.uri()),
            absolute: format!("{}/cdn/broken.png", server.uri()),
            canonical: format!("{}/cdn/broken.png", server.uri()),
        },
        ImageReference {
            as_seen: "/local/photo.jpg".to_string(),
            absolute: format!("{}/local/photo.jpg", server.uri()),
            canonical: format!("{}/local/photo.jpg", server.uri()),
        },
    ];

    let map = downloader(&root, 1024)
        .process_all(&references, "post")
        .await;

    let expected: Vec<(String, String)> = vec![
        (format!("{}/local/photo.jpg", server.uri()), "images/post/photo.jpg".to_string()),
        (format!("{}{}", server.uri(), proxy_src), "images/post/diagram.png".to_string()),
        (proxied.clone(), "images/post/diagram.png".to_string()),
        ("/local/photo.jpg".to_string(), "images/post/photo.jpg".to_string()),
        (proxy_src.clone(), "images/post/diagram.png".to_string()),
    ];
    let mut expected = expected;
    expected.sort();
    let actual: Vec<(String, String)> = map.into_iter().collect();
    assert_eq!(actual, expected);

    for local in ["images/post/diagram.png", "images/post/photo.jpg"] {
        assert!(root.path().join(local).is_file(), "{local} missing");
    }
    assert!(!root.path().join("images/post/broken.png").exists());
}

#[tokio::test]
async fn repeated_canonical_url_is_requested_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES.to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;
    let root = TempDir::new().unwrap();

    let canonical = format!("{}/a.png", server.uri());
    let reference = |as_seen: &str| ImageReference {
        as_seen: as_seen.to_string(),
        absolute: canonical.clone(),
        canonical: canonical.clone(),
    };
    let references = vec![reference("/a.png"), reference(&canonical)];

    let map = downloader(&root, 1024).process_all(&references, "s").await;
    assert_eq!(map.len(), 2);
    assert!(map.values().all(|p| p == "images/s/a.png"));
}
