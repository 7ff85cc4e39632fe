use crate::assets::manifest::Manifest;
use crate::assets::negotiate::{self, Representation, ResponseDecision};
use crate::assets::resolver;
use crate::config::AssetConfig;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use std::path::PathBuf;

/// What the dispatcher should do with one request.
#[derive(Debug)]
pub enum Reply {
    /// Stream an asset file: the negotiated headers and the absolute path
    /// of the chosen representation.
    Asset {
        decision: ResponseDecision,
        source: PathBuf,
    },
    /// A synthesized response (404, 405, 304) written from memory.
    Status(Response),
}

/// One loaded site: the manifest plus the on-disk roots it refers to.
///
/// Shared read-only across all workers; nothing here mutates after load.
#[derive(Debug)]
pub struct Site {
    manifest: Manifest,
    root: PathBuf,
    gzip_root: PathBuf,
    index_file: String,
    /// How long a keep-alive connection to this site may sit idle
    pub idle_timeout_secs: u64,
}

impl Site {
    pub fn new(manifest: Manifest, cfg: &AssetConfig, idle_timeout_secs: u64) -> Self {
        Self {
            manifest,
            root: cfg.root.clone(),
            gzip_root: cfg.gzip_root.clone(),
            index_file: cfg.index_file.clone(),
            idle_timeout_secs,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Decides the response for one parsed request. Pure manifest lookups;
    /// no filesystem access happens here.
    pub fn respond(&self, req: &Request) -> Reply {
        if !matches!(req.method, Method::GET | Method::HEAD) {
            return Reply::Status(Response::method_not_allowed());
        }

        let record = match resolver::resolve(&self.manifest, &req.path, &self.index_file) {
            Some(record) => record,
            None => return Reply::Status(Response::not_found()),
        };

        if let Some(if_none_match) = req.header("if-none-match") {
            if etag_matches(&record.etag, if_none_match) {
                return Reply::Status(Response::not_modified(&record.etag));
            }
        }

        let decision = negotiate::negotiate(record, req.accept_encoding());
        let source = match decision.representation {
            Representation::Original => self.root.join(&record.path),
            Representation::Gzip => self.gzip_root.join(&record.path),
        };

        Reply::Asset { decision, source }
    }
}

/// Weak comparison of a stored ETag against an If-None-Match header.
///
/// Clients may echo the validator with or without the `W/` prefix; both
/// forms revalidate.
pub fn etag_matches(etag: &str, if_none_match: &str) -> bool {
    let etag = etag.trim();
    let bare = etag.strip_prefix("W/").unwrap_or(etag);
    if_none_match.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == etag
            || candidate == bare
            || candidate.strip_prefix("W/").is_some_and(|c| c == bare)
    })
}
