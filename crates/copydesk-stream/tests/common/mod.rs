//! Minimal chunked event-stream server for tests that need control over
//! when each network chunk is written.

#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct ScriptedChunk {
    pub delay: Duration,
    pub bytes: String,
}

pub fn chunk(delay_ms: u64, bytes: impl Into<String>) -> ScriptedChunk {
    ScriptedChunk {
        delay: Duration::from_millis(delay_ms),
        bytes: bytes.into(),
    }
}

pub fn frame(json: &str) -> String {
    format!("data: {}\n\n", json)
}

/// Serve one request, writing each chunk after its delay. When `hold_open`
/// is set the response never completes, which lets tests cancel a stream
/// that is still waiting for data.
pub async fn spawn_chunked_server(chunks: Vec<ScriptedChunk>, hold_open: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        let head = "HTTP/1.1 200 OK\r\n\
                    Content-Type: text/event-stream\r\n\
                    Transfer-Encoding: chunked\r\n\
                    Connection: close\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();

        for part in chunks {
            tokio::time::sleep(part.delay).await;
            let encoded = format!("{:x}\r\n{}\r\n", part.bytes.len(), part.bytes);
            if socket.write_all(encoded.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }

        if hold_open {
            tokio::time::sleep(Duration::from_secs(30)).await;
        } else {
            let _ = socket.write_all(b"0\r\n\r\n").await;
        }
    });

    format!("http://{}", addr)
}

async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut tmp).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut tmp).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}
