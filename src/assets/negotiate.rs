use crate::assets::manifest::AssetRecord;

/// Which representation of an asset the response will carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Original,
    Gzip,
}

impl Representation {
    pub fn content_encoding(&self) -> Option<&'static str> {
        match self {
            Representation::Original => None,
            Representation::Gzip => Some("gzip"),
        }
    }
}

/// The outcome of negotiation for one request: everything the writer needs
/// to emit headers and pick the byte source.
///
/// `content_length` is always read from the same record field the bytes
/// will come from, so a size/body mismatch cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDecision {
    pub representation: Representation,
    pub content_length: u64,
    pub content_type: String,
    pub etag: String,
}

impl ResponseDecision {
    pub fn content_encoding(&self) -> Option<&'static str> {
        self.representation.content_encoding()
    }
}

/// Whether an Accept-Encoding header value accepts gzip.
///
/// Token match is case-insensitive over the comma-separated list. Quality
/// values are not weighed beyond the one case that changes the answer:
/// `gzip;q=0` is an explicit refusal.
pub fn accepts_gzip(accept_encoding: &str) -> bool {
    for part in accept_encoding.split(',') {
        let mut params = part.split(';');
        let token = params.next().unwrap_or("").trim();
        if !token.eq_ignore_ascii_case("gzip") {
            continue;
        }
        for param in params {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") && q_is_zero(value.trim()) {
                    return false;
                }
            }
        }
        return true;
    }
    false
}

// "0", "0.", "0.0", "0.00", "0.000" are all zero per RFC 7231 qvalue syntax
fn q_is_zero(value: &str) -> bool {
    let mut chars = value.chars();
    if chars.next() != Some('0') {
        return false;
    }
    match chars.next() {
        None => true,
        Some('.') => chars.all(|c| c == '0'),
        Some(_) => false,
    }
}

/// Chooses the representation for one request. Deterministic: the same
/// record and header always produce the same decision.
pub fn negotiate(record: &AssetRecord, accept_encoding: Option<&str>) -> ResponseDecision {
    let use_gzip = record.gzip.is_some()
        && accept_encoding.is_some_and(accepts_gzip);

    let (representation, content_length) = if use_gzip {
        // Unwrap is safe: use_gzip implies the variant exists
        (Representation::Gzip, record.gzip.unwrap().size)
    } else {
        (Representation::Original, record.size)
    };

    ResponseDecision {
        representation,
        content_length,
        content_type: record.content_type.clone(),
        etag: record.etag.clone(),
    }
}
