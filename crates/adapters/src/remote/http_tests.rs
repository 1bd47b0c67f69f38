// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

/// Request as the canned server saw it
#[derive(Debug)]
struct Seen {
    request_line: String,
    headers: Vec<String>,
    body: String,
}

impl Seen {
    fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.headers
            .iter()
            .find(|h| h.to_ascii_lowercase().starts_with(&prefix))
            .map(|h| h[prefix.len()..].trim())
    }
}

/// Serve one request with a fixed status and body, returning the base URL
/// and a channel that yields what was received.
fn serve_once(status: u16, body: &str) -> (String, mpsc::Receiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut headers = Vec::new();
        let mut length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end().to_string();
            if line.is_empty() {
                break;
            }
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                length = v.trim().parse().unwrap();
            }
            headers.push(line);
        }
        let mut buf = vec![0u8; length];
        reader.read_exact(&mut buf).unwrap();

        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        let _ = tx.send(Seen {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(buf).unwrap(),
        });
    });

    (format!("http://{addr}"), rx)
}

fn adapter(base_url: String, min_assets: usize) -> HttpRemoteAdapter {
    HttpRemoteAdapter::new(
        RemoteCredentials {
            base_url,
            api_key: "secret".into(),
        },
        Duration::from_secs(5),
        Duration::from_secs(5),
        min_assets,
    )
}

fn upload(images: usize) -> RoomUpload {
    RoomUpload {
        room_name: "Atrium".into(),
        description: "glass roof".into(),
        images: (0..images)
            .map(|i| format!("https://img.example/{i}.png"))
            .collect(),
        documented_by: 7,
        tags: vec!["hall".into()],
        roomtype: "public".into(),
        last_edited_by: None,
        last_edited: Some(1700.0),
    }
}

#[tokio::test]
async fn export_parses_rooms_and_sends_bearer_key() {
    let (base, seen) = serve_once(
        200,
        r#"{"success":true,"exported_at":"2025-12-06T12:00:00Z","rooms":{
            "Atrium":{"images":["https://a/1"],"description":"d","tags":[],"roomtype":"public",
                      "documented_by":"42","last_edited":1700.5,"last_edited_by":null}}}"#,
    );
    let export = adapter(base, 4).export().await.unwrap();

    let room = &export.rooms["Atrium"];
    assert_eq!(room.documented_by, 42);
    assert_eq!(room.last_edited, 1700.5);
    assert_eq!(export.exported_at.as_deref(), Some("2025-12-06T12:00:00Z"));

    let seen = seen.recv().unwrap();
    assert_eq!(seen.request_line, "GET /database/export HTTP/1.1");
    assert_eq!(seen.header("authorization"), Some("Bearer secret"));
}

#[tokio::test]
async fn export_unsuccessful_envelope_is_rejected() {
    let (base, _seen) = serve_once(200, r#"{"success":false,"error":"db locked"}"#);
    let err = adapter(base, 4).export().await.unwrap_err();
    assert_eq!(err, RemoteError::Rejected("db locked".into()));
}

#[tokio::test]
async fn export_non_200_is_status_error_with_truncated_body() {
    let long = "x".repeat(500);
    let (base, _seen) = serve_once(503, &long);
    match adapter(base, 4).export().await.unwrap_err() {
        RemoteError::Status { code, body } => {
            assert_eq!(code, 503);
            assert_eq!(body.len(), 200);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn export_garbage_is_malformed() {
    let (base, _seen) = serve_once(200, "<html>oops</html>");
    let err = adapter(base, 4).export().await.unwrap_err();
    assert!(matches!(err, RemoteError::Malformed(_)), "{err:?}");
}

#[tokio::test]
async fn export_unreachable_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = adapter(format!("http://127.0.0.1:{port}"), 4)
        .export()
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn upsert_posts_json_payload() {
    let (base, seen) = serve_once(201, r#"{"success":true}"#);
    adapter(base, 4).upsert(&upload(4)).await.unwrap();

    let seen = seen.recv().unwrap();
    assert_eq!(seen.request_line, "POST /upload-room HTTP/1.1");
    assert_eq!(seen.header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body["room_name"], "Atrium");
    assert_eq!(body["images"].as_array().unwrap().len(), 4);
    assert_eq!(body["last_edited"], 1700.0);
}

#[tokio::test]
async fn upsert_below_minimum_never_reaches_server() {
    // No server: a request would fail as a transport error
    let err = adapter("http://127.0.0.1:9".into(), 4)
        .upsert(&upload(3))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteError::InsufficientAssets {
            valid: 3,
            required: 4
        }
    );
    assert!(err.is_skip());
}

#[tokio::test]
async fn upsert_skipped_response_is_insufficient_assets() {
    let (base, _seen) = serve_once(400, r#"{"success":false,"skipped":true}"#);
    let err = adapter(base, 4).upsert(&upload(4)).await.unwrap_err();
    assert!(err.is_skip(), "{err:?}");
}

#[tokio::test]
async fn upsert_server_error_is_status() {
    let (base, _seen) = serve_once(500, "boom");
    let err = adapter(base, 4).upsert(&upload(5)).await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::Status {
            code: 500,
            body: "boom".into()
        }
    );
}

#[test]
fn from_config_without_credentials_is_not_configured() {
    let config = RemoteConfig::default();
    let err = HttpRemoteAdapter::from_config(&config, 4).unwrap_err();
    assert_eq!(err, RemoteError::NotConfigured);
}

#[test]
fn debug_hides_api_key() {
    let a = adapter("https://archive.example".into(), 4);
    let debug = format!("{a:?}");
    assert!(debug.contains("archive.example"));
    assert!(!debug.contains("secret"));
}
