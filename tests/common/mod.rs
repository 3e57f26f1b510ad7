//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use banner_proxy::{HttpServer, ProxyConfig};

/// Start a mock upstream that answers every connection with the given raw
/// HTTP response bytes.
#[allow(dead_code)]
pub async fn start_upstream(addr: SocketAddr, response: String) {
    let response = Arc::new(response);
    start_inspecting_upstream(addr, move |_head| {
        let response = response.clone();
        async move { (*response).clone() }
    })
    .await;
}

/// Start a mock upstream whose handler sees the request head (request line
/// plus headers) and returns the raw HTTP response to write back.
pub async fn start_inspecting_upstream<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let response = f(head).await;
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

/// Start the proxy in the background, fronting the given upstream with the
/// default banner settings.
pub async fn start_proxy(listen: SocketAddr, upstream: SocketAddr) {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = listen.to_string();
    config.upstream.url = format!("http://{}", upstream);

    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind(listen).await.unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
}

/// Format a minimal HTTP/1.1 response with the given content type and body.
#[allow(dead_code)]
pub fn http_response(content_type: Option<&str>, body: &str) -> String {
    match content_type {
        Some(content_type) => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            content_type,
            body.len(),
            body
        ),
        None => format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
    }
}

/// Read up to the end of the request head (the blank line).
async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        match socket.read(&mut byte).await {
            Ok(0) | Err(_) => break,
            Ok(_) => buf.push(byte[0]),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}
