//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cookie_proxy::config::ProxyConfig;
use cookie_proxy::{HttpServer, Shutdown};

/// Start a mock upstream that answers every request with the given
/// `Set-Cookie` lines, an unrelated `X-Upstream` header and a fixed body.
pub async fn start_cookie_backend(addr: SocketAddr, set_cookies: &'static [&'static str]) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // Drain (enough of) the request before answering.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let body = "hello from upstream";
                        let mut response = String::from("HTTP/1.1 200 OK\r\n");
                        for line in set_cookies {
                            response.push_str(&format!("Set-Cookie: {}\r\n", line));
                        }
                        response.push_str("X-Upstream: Path=/\r\n");
                        response.push_str(&format!(
                            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ));

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start the proxy in the background; returns the shutdown handle.
pub async fn start_proxy(config: ProxyConfig, proxy_addr: SocketAddr) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind(proxy_addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
