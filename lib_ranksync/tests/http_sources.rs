//! # HTTP Collaborator Tests
//!
//! Exercises `HttpSnapshotSource`, `SseUpdateChannel` and a fully wired
//! `RankingSync` against a throwaway HTTP server on a random local port.

#![cfg(feature = "http")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use futures_util::StreamExt;
use lib_ranksync::ingestors::SseUpdateChannel;
use lib_ranksync::retrieve::HttpSnapshotSource;
use lib_ranksync::{ChannelEvent, RankingSync, SnapshotSource, StreamStatus, SyncConfig, SyncError, UpdateChannel};
use serde_json::{json, Value};

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).unwrap_or(0);
    String::from_utf8_lossy(&buf[..n]).to_string()
}

fn write_response(stream: &mut TcpStream, status: &str, content_type: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        content_type,
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Serves exactly one request and hands back the raw request text.
fn serve_once(status: &'static str, content_type: &'static str, body: String) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        write_response(&mut stream, status, content_type, &body);
        request
    });

    (format!("http://127.0.0.1:{}", port), handle)
}

fn config_for(base: &str) -> SyncConfig {
    let mut config = SyncConfig::with_page_size(20).unwrap().api_base(base);
    config.auth_token = Some("secret-token".to_string());
    config
}

#[tokio::test]
async fn test_snapshot_source_requests_count_with_bearer_token() {
    let payload = json!({ "data": { "items": [{ "gameCode": "abc", "memberName": "Kim" }] } });
    let (base, server) = serve_once("200 OK", "application/json", payload.to_string());

    let source = HttpSnapshotSource::from_config(&config_for(&base)).unwrap();
    let body = source.fetch(NonZeroU32::new(20).unwrap()).await.unwrap();
    let request = server.join().unwrap();

    assert_eq!(body, payload);
    assert!(request.starts_with("GET /api/rankings?count=20 HTTP/1.1"), "unexpected request: {}", request);
    assert!(request.to_lowercase().contains("authorization: bearer secret-token"));
}

#[tokio::test]
async fn test_snapshot_source_reports_http_errors() {
    let (base, server) = serve_once("503 Service Unavailable", "text/plain", "maintenance".to_string());

    let source = HttpSnapshotSource::from_config(&config_for(&base)).unwrap();
    let result = source.fetch(NonZeroU32::new(5).unwrap()).await;
    server.join().unwrap();

    assert_eq!(
        result,
        Err(SyncError::Http { status: 503, body: "maintenance".to_string() })
    );
}

#[tokio::test]
async fn test_snapshot_source_treats_non_json_body_as_empty() {
    let (base, server) = serve_once("200 OK", "text/html", "<html>hi</html>".to_string());

    let source = HttpSnapshotSource::from_config(&config_for(&base)).unwrap();
    let result = source.fetch(NonZeroU32::new(5).unwrap()).await;
    server.join().unwrap();

    assert_eq!(result, Ok(Value::Null));
}

#[test]
fn test_snapshot_source_needs_an_api_base() {
    assert!(matches!(
        HttpSnapshotSource::from_config(&SyncConfig::default()),
        Err(SyncError::InvalidEndpoint(_))
    ));
}

#[tokio::test]
async fn test_sse_channel_maps_events_and_reports_end_of_stream() {
    let body = concat!(
        ": keep-alive comment\n\n",
        "event: init\ndata: {\"hello\":true}\n\n",
        "data: plain message\n\n",
        "event: ranking_update\ndata: {\"memberId\":7}\n\n"
    );
    let (base, server) = serve_once("200 OK", "text/event-stream", body.to_string());

    let channel = SseUpdateChannel::from_config(&config_for(&base));
    assert!(channel.is_supported());

    let events: Vec<ChannelEvent> = tokio::time::timeout(Duration::from_secs(5), channel.connect().take(5).collect())
        .await
        .expect("stream did not finish");
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /api/rankings/stream HTTP/1.1"));
    assert_eq!(events[0], ChannelEvent::Open);
    assert_eq!(
        events[1],
        ChannelEvent::Named { event: "init".to_string(), data: "{\"hello\":true}".to_string() }
    );
    assert_eq!(events[2], ChannelEvent::Message { data: "plain message".to_string() });
    assert_eq!(
        events[3],
        ChannelEvent::Named { event: "ranking_update".to_string(), data: "{\"memberId\":7}".to_string() }
    );
    assert!(matches!(events[4], ChannelEvent::Failed(_)));
}

#[tokio::test]
async fn test_sse_channel_rejects_non_stream_responses() {
    let (base, server) = serve_once("404 Not Found", "text/plain", "nope".to_string());

    let channel = SseUpdateChannel::from_config(&config_for(&base));
    let events: Vec<ChannelEvent> = tokio::time::timeout(Duration::from_secs(5), channel.connect().take(2).collect())
        .await
        .expect("stream did not finish");
    server.join().unwrap();

    assert!(matches!(events.first(), Some(ChannelEvent::Failed(_))));
}

#[tokio::test]
async fn test_wired_client_reloads_on_push_event() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let base = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    let snapshot_hits = Arc::new(AtomicUsize::new(0));
    let stream_hits = Arc::new(AtomicUsize::new(0));
    let seen_counts = Arc::new(Mutex::new(Vec::new()));

    {
        let snapshot_hits = Arc::clone(&snapshot_hits);
        let stream_hits = Arc::clone(&stream_hits);
        let seen_counts = Arc::clone(&seen_counts);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let snapshot_hits = Arc::clone(&snapshot_hits);
                let stream_hits = Arc::clone(&stream_hits);
                let seen_counts = Arc::clone(&seen_counts);
                thread::spawn(move || {
                    let request = read_request(&mut stream);
                    let line = request.lines().next().unwrap_or_default().to_string();
                    if line.starts_with("GET /api/rankings/stream") {
                        stream_hits.fetch_add(1, Ordering::SeqCst);
                        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\n\r\n";
                        let _ = stream.write_all(head.as_bytes());
                        let _ = stream.write_all(b"event: init\ndata: {}\n\n");
                        let _ = stream.flush();
                        thread::sleep(Duration::from_millis(300));
                        let _ = stream.write_all(b"event: ranking_update\ndata: not-json\n\n");
                        let _ = stream.flush();
                        // Hold the connection open for the rest of the test.
                        thread::sleep(Duration::from_secs(10));
                    } else {
                        let hit = snapshot_hits.fetch_add(1, Ordering::SeqCst);
                        if let Some(query) = line.split_whitespace().nth(1).and_then(|p| p.split('?').nth(1)) {
                            seen_counts.lock().unwrap().push(query.to_string());
                        }
                        let names: Vec<Value> = (0..=hit)
                            .map(|i| json!({ "gameCode": format!("gc{}", i), "memberName": format!("m{}", i), "totalPlayTime": 60 }))
                            .collect();
                        write_response(&mut stream, "200 OK", "application/json", &json!(names).to_string());
                    }
                });
            }
        });
    }

    let config = config_for(&base).reconnect_delay(Duration::from_millis(200));
    let sync = RankingSync::from_config(config).unwrap();
    let mut views = sync.subscribe();
    sync.activate();

    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let view = views.borrow_and_update();
                if view.rankings.len() >= 2 && !view.is_refreshing && view.stream_status == StreamStatus::Open {
                    return view.clone();
                }
            }
            if views.changed().await.is_err() {
                panic!("view channel closed");
            }
        }
    })
    .await
    .expect("push-triggered reload never landed");

    assert_eq!(reached.rankings.len(), 2);
    assert!(reached.error.is_none());
    assert_eq!(snapshot_hits.load(Ordering::SeqCst), 2);
    assert_eq!(stream_hits.load(Ordering::SeqCst), 1);
    assert!(seen_counts.lock().unwrap().iter().all(|q| q == "count=20"));

    sync.deactivate();
}
