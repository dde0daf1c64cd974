//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use mirror_sink::config::SinkConfig;
use mirror_sink::http::{ServerError, SinkServer};
use mirror_sink::lifecycle::Shutdown;
use mirror_sink::net::Listener;
use mirror_sink::stats::StatsRegistry;

/// A sink running on an ephemeral loopback port.
pub struct TestSink {
    pub addr: SocketAddr,
    pub registry: Arc<StatsRegistry>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestSink {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server to finish draining.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

/// Start a sink with default settings, adjusted by `configure`.
pub async fn start_sink(configure: impl FnOnce(&mut SinkConfig)) -> TestSink {
    let mut config = SinkConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    configure(&mut config);

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let registry = Arc::new(StatsRegistry::with_host_limit(config.stats.max_tracked_hosts));
    let shutdown = Shutdown::new();
    let server = SinkServer::new(&config, registry.clone());
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestSink {
        addr,
        registry,
        shutdown,
        handle,
    }
}

/// HTTP client that never routes loopback traffic through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Write `request` verbatim and read until the server closes the connection.
#[allow(dead_code)]
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}
