//! End-to-end behavior of the sink over real sockets.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use mirror_sink::http::ServerError;
use mirror_sink::stats::classify::NO_HOST;
use mirror_sink::stats::registry::MethodTotals;

mod common;

#[tokio::test]
async fn test_every_method_gets_ok_and_is_counted() {
    let sink = common::start_sink(|_| {}).await;
    let client = common::client();

    let cases = [
        (reqwest::Method::GET, "/", ""),
        (reqwest::Method::POST, "/orders?id=7", "{\"qty\":3}"),
        (reqwest::Method::from_bytes(b"PURGE").unwrap(), "/cache/item", ""),
    ];

    for (i, (method, path, body)) in cases.into_iter().enumerate() {
        let res = client
            .request(method, sink.url(path))
            .body(body)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(res.text().await.unwrap(), "OK");
        assert_eq!(sink.registry.snapshot_totals().requests, i as u64 + 1);
    }

    assert_eq!(
        sink.registry.snapshot_methods(),
        MethodTotals { get: 1, post: 1, other: 1 }
    );
    sink.stop().await.unwrap();
}

#[tokio::test]
async fn test_host_is_lowercased() {
    let sink = common::start_sink(|_| {}).await;

    let response = common::send_raw(
        sink.addr,
        b"GET /a HTTP/1.1\r\nHost: Example.COM\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("OK"));

    let hosts = sink.registry.snapshot_hosts();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].0, "example.com");
    assert_eq!(hosts[0].1.requests, 1);
    sink.stop().await.unwrap();
}

#[tokio::test]
async fn test_missing_host_counted_under_placeholder() {
    let sink = common::start_sink(|_| {}).await;

    let response = common::send_raw(sink.addr, b"GET / HTTP/1.0\r\n\r\n").await;
    assert!(response.contains(" 200 OK"));

    let hosts = sink.registry.snapshot_hosts();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].0, NO_HOST);
    sink.stop().await.unwrap();
}

#[tokio::test]
async fn test_keep_alive_connection_serves_many_requests() {
    let sink = common::start_sink(|_| {}).await;
    let mut stream = TcpStream::connect(sink.addr).await.unwrap();

    for _ in 0..3 {
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: ka.test\r\n\r\n")
            .await
            .unwrap();
        let mut buf = vec![0u8; 1024];
        let n = stream.read(&mut buf).await.unwrap();
        let response = String::from_utf8_lossy(&buf[..n]);
        assert!(response.starts_with("HTTP/1.1 200 OK"));
    }

    let hosts = sink.registry.snapshot_hosts();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].0, "ka.test");
    assert_eq!(hosts[0].1.requests, 3);
    sink.stop().await.unwrap();
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let sink = common::start_sink(|config| config.timeouts.idle_ms = 200).await;
    let mut stream = TcpStream::connect(sink.addr).await.unwrap();

    // The server hangs up; the read ends with EOF or a reset.
    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(3), stream.read(&mut buf)).await;
    assert!(read.is_ok(), "idle connection was not closed");
    assert!(!matches!(read, Ok(Ok(n)) if n > 0));

    assert_eq!(sink.registry.snapshot_totals().requests, 0);
    sink.stop().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_drains_idle_keep_alive_and_stops_listening() {
    let sink = common::start_sink(|_| {}).await;
    let addr = sink.addr;

    // Leave a keep-alive connection open across the shutdown.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: drain.test\r\n\r\n")
        .await
        .unwrap();
    let mut buf = vec![0u8; 1024];
    let n = stream.read(&mut buf).await.unwrap();
    assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200 OK"));

    sink.stop().await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
    let n = stream.read(&mut buf).await.unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_stalled_request_outlives_grace_period() {
    let sink = common::start_sink(|config| config.shutdown.grace_period_ms = 200).await;
    let registry = sink.registry.clone();

    // Promise 100 body bytes, send 3, then go quiet.
    let mut stream = TcpStream::connect(sink.addr).await.unwrap();
    stream
        .write_all(b"POST /upload HTTP/1.1\r\nHost: slow.test\r\nContent-Length: 100\r\n\r\nabc")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = sink.stop().await.unwrap_err();
    assert!(
        matches!(err, ServerError::DrainTimeout { remaining: 1, .. }),
        "unexpected error: {err}"
    );
    assert_eq!(err.to_string(), "1 connections still open after 200ms grace period");

    // The handler never finished, so nothing was counted.
    assert_eq!(registry.snapshot_totals().requests, 0);
    drop(stream);
}
