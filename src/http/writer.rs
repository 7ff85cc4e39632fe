use chrono::Utc;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::assets::negotiate::ResponseDecision;
use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Chunk size for streaming file bodies
const BUFFER_SIZE: usize = 8192;

/// RFC 7231 Date header value, always English month/day names.
fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn serialize_response(resp: &Response, head_only: bool) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(b"Date: ");
    buf.extend_from_slice(http_date().as_bytes());
    buf.extend_from_slice(b"\r\n");

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body (suppressed for HEAD; the headers still describe it)
    if !head_only {
        buf.extend_from_slice(&resp.body);
    }

    buf
}

/// Response head for a negotiated asset. The body never passes through
/// here; it is streamed from disk by [`stream_file`].
pub fn serialize_asset_head(
    decision: &ResponseDecision,
    connection: Option<&'static str>,
) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(format!("{} 200 OK\r\n", HTTP_VERSION).as_bytes());
    buf.extend_from_slice(format!("Content-Type: {}\r\n", decision.content_type).as_bytes());
    buf.extend_from_slice(format!("Content-Length: {}\r\n", decision.content_length).as_bytes());
    if let Some(encoding) = decision.content_encoding() {
        buf.extend_from_slice(format!("Content-Encoding: {}\r\n", encoding).as_bytes());
    }
    buf.extend_from_slice(format!("ETag: {}\r\n", decision.etag).as_bytes());
    if let Some(connection) = connection {
        buf.extend_from_slice(format!("Connection: {}\r\n", connection).as_bytes());
    }
    buf.extend_from_slice(format!("Date: {}\r\n", http_date()).as_bytes());
    buf.extend_from_slice(b"\r\n");

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response, head_only: bool) -> Self {
        Self {
            buffer: serialize_response(response, head_only),
            written: 0,
        }
    }

    pub fn from_head(head: Vec<u8>) -> Self {
        Self {
            buffer: head,
            written: 0,
        }
    }

    pub async fn write_to_stream(&mut self, stream: &mut TcpStream) -> anyhow::Result<()> {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        Ok(())
    }
}

/// Copies a file to the socket in bounded chunks.
///
/// The handle lives only inside this call, so it is released when the copy
/// completes and when the client aborts mid-stream alike.
pub async fn stream_file(stream: &mut TcpStream, path: &Path) -> anyhow::Result<()> {
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path).await?;
    let mut chunk = [0u8; BUFFER_SIZE];

    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        stream.write_all(&chunk[..n]).await?;
    }

    Ok(())
}
