use std::collections::HashMap;

/// HTTP request methods.
///
/// The server serves GET and HEAD; the remaining methods are parsed so the
/// dispatcher can answer them with 405 Method Not Allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    OPTIONS,
    PATCH,
}

impl Method {
    /// Parses an HTTP method token (case-sensitive, per RFC 9110).
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }
}

/// A parsed HTTP request.
///
/// Header names are lowercased at parse time, so every lookup through
/// [`Request::header`] is case-insensitive as HTTP requires.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Request target as sent by the client, query string included
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Headers with lowercased names
    pub headers: HashMap<String, String>,
    /// Request body, read when Content-Length says there is one
    pub body: Vec<u8>,
}

impl Request {
    /// Retrieves a header value by name, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_ascii_lowercase()).map(|v| v.as_str())
    }

    /// The raw Accept-Encoding header value, if the client sent one.
    pub fn accept_encoding(&self) -> Option<&str> {
        self.header("accept-encoding")
    }

    /// Whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive unless the client sends
    /// `Connection: close`; HTTP/1.0 defaults to close unless the client
    /// asks for `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let connection = self.header("connection");
        if self.version == "HTTP/1.0" {
            connection.is_some_and(|v| v.eq_ignore_ascii_case("keep-alive"))
        } else {
            !connection.is_some_and(|v| v.eq_ignore_ascii_case("close"))
        }
    }
}
