use bytes::BytesMut;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::assets::site::{Reply, Site};
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::{self, ResponseWriter};

pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    site: Arc<Site>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(Reply, WriteContext),
    Closed,
}

/// Per-response facts the writer needs beyond the reply itself.
pub struct WriteContext {
    pub keep_alive: bool,
    pub head_only: bool,
    /// Value of the Connection response header, when one must be sent
    pub connection_header: Option<&'static str>,
}

enum ReadOutcome {
    Request(Request),
    /// Client closed the socket between requests
    Eof,
    /// Stream is not valid HTTP; answer 400 and close
    Malformed,
    /// Idle timeout elapsed on a keep-alive connection; close silently
    IdleTimeout,
}

impl Connection {
    pub fn new(stream: TcpStream, site: Arc<Site>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            site,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    match self.read_request().await? {
                        ReadOutcome::Request(req) => {
                            self.state = ConnectionState::Processing(req);
                        }
                        ReadOutcome::Eof | ReadOutcome::IdleTimeout => {
                            self.state = ConnectionState::Closed;
                        }
                        ReadOutcome::Malformed => {
                            let mut resp = Response::bad_request();
                            resp.headers
                                .insert("Connection".to_string(), "close".to_string());
                            ResponseWriter::new(&resp, false)
                                .write_to_stream(&mut self.stream)
                                .await?;
                            self.state = ConnectionState::Closed;
                        }
                    }
                }

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();
                    let head_only = req.method == Method::HEAD;
                    let connection_header = if !keep_alive {
                        Some("close")
                    } else if req.version == "HTTP/1.0" {
                        Some("keep-alive")
                    } else {
                        None
                    };

                    let reply = self.site.respond(req);
                    debug!(method = ?req.method, path = %req.path, "request dispatched");

                    self.state = ConnectionState::Writing(
                        reply,
                        WriteContext {
                            keep_alive,
                            head_only,
                            connection_header,
                        },
                    );
                }

                ConnectionState::Writing(reply, ctx) => {
                    let keep_alive = ctx.keep_alive;
                    match reply {
                        Reply::Status(resp) => {
                            if let Some(value) = ctx.connection_header {
                                resp.headers
                                    .insert("Connection".to_string(), value.to_string());
                            }
                            ResponseWriter::new(resp, ctx.head_only)
                                .write_to_stream(&mut self.stream)
                                .await?;
                        }
                        Reply::Asset { decision, source } => {
                            let head =
                                writer::serialize_asset_head(decision, ctx.connection_header);
                            ResponseWriter::from_head(head)
                                .write_to_stream(&mut self.stream)
                                .await?;
                            if !ctx.head_only {
                                writer::stream_file(&mut self.stream, source).await?;
                            }
                        }
                    }

                    if keep_alive {
                        self.state = ConnectionState::Reading; // next request, same socket
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let idle = Duration::from_secs(self.site.idle_timeout_secs);

        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    let _ = self.buffer.split_to(consumed);
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    debug!(error = ?e, "malformed request");
                    return Ok(ReadOutcome::Malformed);
                }
            }

            // Read more data; an idle timeout between requests is a normal
            // termination, not an error the client hears about.
            let mut temp = [0u8; 1024];
            let n = match timeout(idle, self.stream.read(&mut temp)).await {
                Ok(read) => read?,
                Err(_) => return Ok(ReadOutcome::IdleTimeout),
            };

            if n == 0 {
                return Ok(ReadOutcome::Eof);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }
}
