//! End-to-end requests against the warp routes.

use std::fs::File;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use warp::http::StatusCode;
use warp::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use zip::write::FileOptions;

use zipserve::{UnzipConfig, Unzipper, http};

fn stored() -> FileOptions {
    FileOptions::default().compression_method(zip::CompressionMethod::Stored)
}

fn deflated() -> FileOptions {
    FileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}

fn big_content() -> Vec<u8> {
    (0..300_000u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
        .collect()
}

fn write_run_zip(path: &Path) {
    let mut w = zip::ZipWriter::new(File::create(path).unwrap());

    // Added in reverse of the expected listing order
    w.start_file("file2.txt", stored()).unwrap();
    w.write_all(b"two").unwrap();
    w.start_file("File.txt", stored()).unwrap();
    w.write_all(b"one").unwrap();
    w.start_file("a.txt", stored()).unwrap();
    w.write_all(b"a").unwrap();
    w.start_file("logs/out.txt", stored()).unwrap();
    w.write_all(b"0123456789").unwrap();
    w.start_file("logs/stdout", deflated()).unwrap();
    w.write_all(b"no extension").unwrap();
    w.add_directory("B/", stored()).unwrap();
    w.start_file("big.bin", deflated()).unwrap();
    w.write_all(&big_content()).unwrap();
    w.add_symlink("link", "a.txt", stored()).unwrap();

    w.finish().unwrap();
}

fn fixture() -> (TempDir, Arc<Unzipper>) {
    let dir = tempfile::tempdir().unwrap();
    write_run_zip(&dir.path().join("run.zip"));
    std::fs::write(dir.path().join("notazip.txt"), b"plain text").unwrap();
    std::fs::write(dir.path().join("corrupt.zip"), b"definitely not a zip").unwrap();

    let config = UnzipConfig::new(dir.path(), "zip").unwrap();
    (dir, Arc::new(Unzipper::new(config)))
}

async fn get(unzipper: &Arc<Unzipper>, path: &str) -> warp::http::Response<warp::hyper::body::Bytes> {
    warp::test::request()
        .method("GET")
        .path(path)
        .reply(&http::routes(Arc::clone(unzipper)))
        .await
}

async fn get_json(unzipper: &Arc<Unzipper>, path: &str) -> serde_json::Value {
    let response = warp::test::request()
        .method("GET")
        .path(path)
        .header("accept", "application/json")
        .reply(&http::routes(Arc::clone(unzipper)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn streams_a_file_entry() {
    let (_dir, unzipper) = fixture();
    let response = get(&unzipper, "/unzip/run.zip/logs/out.txt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"0123456789");
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(response.headers()[CONTENT_LENGTH], "10");
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        response.headers()[CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
}

#[tokio::test]
async fn streams_large_deflated_entries_intact() {
    let (_dir, unzipper) = fixture();
    let response = get(&unzipper, "/unzip/run.zip/big.bin").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), big_content().as_slice());
    assert!(response.headers().get(CONTENT_TYPE).is_none());
}

#[tokio::test]
async fn unknown_extension_sends_no_content_type() {
    let (_dir, unzipper) = fixture();
    let response = get(&unzipper, "/unzip/run.zip/logs/stdout").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"no extension");
    assert!(response.headers().get(CONTENT_TYPE).is_none());
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let (_dir, unzipper) = fixture();
    let first = get(&unzipper, "/unzip/run.zip/big.bin").await;
    let second = get(&unzipper, "/unzip/run.zip/big.bin").await;
    assert_eq!(first.body(), second.body());

    let first = get(&unzipper, "/unzip/run.zip").await;
    let second = get(&unzipper, "/unzip/run.zip").await;
    assert_eq!(first.body(), second.body());
}

#[tokio::test]
async fn lists_an_implicit_directory() {
    let (_dir, unzipper) = fixture();
    let listing = get_json(&unzipper, "/unzip/run.zip/logs").await;

    let breadcrumbs = listing["breadcrumbs"].as_array().unwrap();
    assert_eq!(breadcrumbs.len(), 2);
    assert_eq!(breadcrumbs[0]["name"], "run.zip");
    assert_eq!(breadcrumbs[0]["is_selected"], false);
    assert_eq!(breadcrumbs[1]["name"], "logs");
    assert_eq!(breadcrumbs[1]["full_path"], "run.zip/logs");
    assert_eq!(breadcrumbs[1]["is_selected"], true);

    let children = listing["children"].as_array().unwrap();
    let out = children.iter().find(|c| c["name"] == "out.txt").unwrap();
    assert_eq!(out["full_path"], "run.zip/logs/out.txt");
    assert_eq!(out["size"], "10 B");
    assert_eq!(out["is_directory"], false);
}

#[tokio::test]
async fn root_listing_orders_directories_first_then_ignoring_case() {
    let (_dir, unzipper) = fixture();
    let listing = get_json(&unzipper, "/unzip/run.zip/").await;

    let names: Vec<&str> = listing["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["B", "logs", "a.txt", "big.bin", "File.txt", "file2.txt", "link"]
    );
}

#[tokio::test]
async fn listings_default_to_html() {
    let (_dir, unzipper) = fixture();
    let response = get(&unzipper, "/unzip/run.zip/logs").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    let html = std::str::from_utf8(response.body()).unwrap();
    assert!(html.contains("<a href=\"/unzip/run.zip/logs/out.txt\">out.txt</a>"));
}

#[tokio::test]
async fn missing_things_are_not_found() {
    let (_dir, unzipper) = fixture();
    for path in [
        "/unzip/",
        "/unzip/run.zip/missing",
        "/unzip/missing.zip",
        "/unzip/notazip.txt/inner",
        "/unzip/notazip.txt",
        "/unzip/../etc/passwd",
        "/unzip/%2e%2e/etc/passwd",
        "/unzip/run.zip/logs/../../notazip.txt",
        "/unzip/run.zip/./logs/out.txt",
        "/unzip/run.zip/%2e/logs/out.txt",
        "/unzip/%2Fetc%2Fpasswd",
        "/unzip/%FF.zip",
    ] {
        let response = get(&unzipper, path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(response.body().as_ref(), b"Not Found", "{path}");
    }
}

#[tokio::test]
async fn broken_archives_and_odd_entries_are_server_errors() {
    let (_dir, unzipper) = fixture();
    for path in ["/unzip/corrupt.zip", "/unzip/corrupt.zip/x", "/unzip/run.zip/link"] {
        let response = get(&unzipper, path).await;
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "{path}"
        );
        assert_eq!(response.body().as_ref(), b"Internal Server Error", "{path}");
    }
}

#[tokio::test]
async fn only_get_is_routed() {
    let (_dir, unzipper) = fixture();
    let response = warp::test::request()
        .method("POST")
        .path("/unzip/run.zip/logs/out.txt")
        .reply(&http::routes(unzipper))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_of_one_archive_do_not_interfere() {
    let (_dir, unzipper) = fixture();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let unzipper = Arc::clone(&unzipper);
            let path = if i % 4 == 0 {
                "/unzip/run.zip/logs/out.txt"
            } else {
                "/unzip/run.zip/big.bin"
            };
            tokio::spawn(async move { (path, get(&unzipper, path).await) })
        })
        .collect();

    let big = big_content();
    for task in futures_util::future::join_all(tasks).await {
        let (path, response) = task.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        if path.ends_with("big.bin") {
            assert_eq!(response.body().as_ref(), big.as_slice());
        } else {
            assert_eq!(response.body().as_ref(), b"0123456789");
        }
    }
}

/// Raw HTTP/1.1 exchange; returns what arrived and whether the server
/// closed the connection (as opposed to the read timing out)
fn raw_get(addr: SocketAddr, path: &str) -> (Vec<u8>, bool) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    )
    .unwrap();

    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return (received, true),
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                return (received, false);
            }
            Err(_) => return (received, true),
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn corrupted_entry_is_never_delivered_complete() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["good.zip", "bad.zip"] {
        let mut w = zip::ZipWriter::new(File::create(dir.path().join(name)).unwrap());
        w.start_file("a.txt", stored()).unwrap();
        w.write_all(b"hello world").unwrap();
        w.finish().unwrap();
    }

    // Flip one data byte so the recorded CRC-32 no longer matches
    let bad = dir.path().join("bad.zip");
    let mut bytes = std::fs::read(&bad).unwrap();
    let at = bytes.windows(11).position(|w| w == b"hello world").unwrap();
    bytes[at] = b'j';
    std::fs::write(&bad, bytes).unwrap();

    let config = UnzipConfig::new(dir.path(), "zip").unwrap();
    let routes = http::routes(Arc::new(Unzipper::new(config)));
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let (good, _) = tokio::task::spawn_blocking(move || raw_get(addr, "/unzip/good.zip/a.txt"))
        .await
        .unwrap();
    assert!(good.starts_with(b"HTTP/1.1 200 OK"));
    assert!(contains(&good, b"hello world"));

    let (corrupt, closed) = tokio::task::spawn_blocking(move || raw_get(addr, "/unzip/bad.zip/a.txt"))
        .await
        .unwrap();
    assert!(closed, "connection left open after a failed entry");
    assert!(!contains(&corrupt, b"jello world"));
}
