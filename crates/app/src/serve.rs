//! Minimal HTTP/1.1 front end for the render service.
//!
//! One request per connection, `Connection: close` on every reply. Request
//! routing and rendering live in `scopewave_core::service`.

use std::net::SocketAddr;

use scopewave_core::{
    service::{self, ServiceReply},
    ScopeError, SourceConfig,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

/// Bodies larger than this are refused before reading.
const MAX_BODY: usize = 16 * 1024 * 1024;
const MAX_HEADER_LINES: usize = 100;

pub fn run(port: u16, source: SourceConfig) -> scopewave_core::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_server(port, source))
}

async fn run_server(port: u16, source: SourceConfig) -> scopewave_core::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "render service listening, press Ctrl+C to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, source).await {
                            tracing::warn!(%peer, error = %err, "connection failed");
                        }
                    });
                }
                Err(err) => tracing::warn!(error = %err, "accept failed"),
            },
            _ = &mut shutdown => {
                tracing::info!("render service stopped");
                break;
            }
        }
    }
    Ok(())
}

async fn handle_connection(stream: TcpStream, source: SourceConfig) -> scopewave_core::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let Some(method) = parse_method(&request_line) else {
        let reply = ServiceReply::error(400, "malformed request line");
        return write_reply(reader.get_mut(), &reply).await;
    };

    let mut content_length = 0usize;
    let mut line = String::new();
    for _ in 0..MAX_HEADER_LINES {
        line.clear();
        if reader.read_line(&mut line).await? == 0 || line.trim().is_empty() {
            break;
        }
        if let Some(length) = parse_content_length(&line) {
            content_length = length;
        }
    }

    if content_length > MAX_BODY {
        let reply = ServiceReply::error(413, "request body too large");
        return write_reply(reader.get_mut(), &reply).await;
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).await?;

    tracing::debug!(method = %method, bytes = body.len(), "request");
    let reply = tokio::task::spawn_blocking(move || service::handle(&method, &body, &source))
        .await
        .map_err(|err| ScopeError::msg(format!("render task failed: {err}")))?;
    write_reply(reader.get_mut(), &reply).await
}

async fn write_reply(stream: &mut TcpStream, reply: &ServiceReply) -> scopewave_core::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Connection: close\r\n\r\n",
        reply.status,
        reply.reason(),
        reply.content_type,
        reply.body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&reply.body).await?;
    stream.shutdown().await?;
    Ok(())
}

fn parse_method(request_line: &str) -> Option<String> {
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?;
    parts.next()?;
    Some(method.to_ascii_uppercase())
}

fn parse_content_length(header: &str) -> Option<usize> {
    let (name, value) = header.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse().ok()
}
