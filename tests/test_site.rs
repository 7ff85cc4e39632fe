use atrium::assets::manifest::{AssetRecord, GzipVariant, Manifest};
use atrium::assets::site::{Reply, Site, etag_matches};
use atrium::config::AssetConfig;
use atrium::http::parser::parse_http_request;
use atrium::http::request::Request;
use atrium::http::response::StatusCode;
use std::path::PathBuf;

fn parse(raw: &str) -> Request {
    parse_http_request(raw.as_bytes()).unwrap().0
}

fn test_site() -> Site {
    let cfg = AssetConfig {
        root: PathBuf::from("/srv/www"),
        gzip_root: PathBuf::from("/srv/wwwgz"),
        mime_table: PathBuf::from("/srv/mimetypes.json"),
        gzip_manifest: PathBuf::from("/srv/gzip-manifest.json"),
        index_file: "index.html".to_string(),
        default_type: "application/octet-stream".to_string(),
    };
    let manifest = Manifest::from_records([
        AssetRecord {
            path: "nav.css".to_string(),
            content_type: "text/css".to_string(),
            size: 1000,
            gzip: Some(GzipVariant { size: 300 }),
            etag: "W/\"5f3a-3e8\"".to_string(),
        },
        AssetRecord {
            path: "index.html".to_string(),
            content_type: "text/html".to_string(),
            size: 200,
            gzip: None,
            etag: "W/\"5f3b-c8\"".to_string(),
        },
    ]);
    Site::new(manifest, &cfg, 30)
}

#[test]
fn test_respond_get_streams_from_asset_root() {
    let site = test_site();
    let reply = site.respond(&parse("GET /nav.css HTTP/1.1\r\n\r\n"));

    match reply {
        Reply::Asset { decision, source } => {
            assert_eq!(decision.content_length, 1000);
            assert_eq!(source, PathBuf::from("/srv/www/nav.css"));
        }
        other => panic!("expected asset reply, got {:?}", other),
    }
}

#[test]
fn test_respond_gzip_streams_from_gzip_root() {
    let site = test_site();
    let reply = site.respond(&parse(
        "GET /nav.css HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n",
    ));

    match reply {
        Reply::Asset { decision, source } => {
            assert_eq!(decision.content_length, 300);
            assert_eq!(decision.content_encoding(), Some("gzip"));
            assert_eq!(source, PathBuf::from("/srv/wwwgz/nav.css"));
        }
        other => panic!("expected asset reply, got {:?}", other),
    }
}

#[test]
fn test_respond_unknown_path_is_404() {
    let site = test_site();
    let reply = site.respond(&parse("GET /missing.css HTTP/1.1\r\n\r\n"));

    match reply {
        Reply::Status(resp) => assert_eq!(resp.status, StatusCode::NotFound),
        other => panic!("expected status reply, got {:?}", other),
    }
}

#[test]
fn test_respond_post_is_405() {
    let site = test_site();
    let reply = site.respond(&parse("POST /nav.css HTTP/1.1\r\n\r\n"));

    match reply {
        Reply::Status(resp) => {
            assert_eq!(resp.status, StatusCode::MethodNotAllowed);
            assert_eq!(resp.headers.get("Allow").unwrap(), "GET, HEAD");
        }
        other => panic!("expected status reply, got {:?}", other),
    }
}

#[test]
fn test_respond_matching_etag_is_304() {
    let site = test_site();
    let reply = site.respond(&parse(
        "GET /nav.css HTTP/1.1\r\nIf-None-Match: W/\"5f3a-3e8\"\r\n\r\n",
    ));

    match reply {
        Reply::Status(resp) => {
            assert_eq!(resp.status, StatusCode::NotModified);
            assert_eq!(resp.headers.get("ETag").unwrap(), "W/\"5f3a-3e8\"");
            assert!(resp.body.is_empty());
        }
        other => panic!("expected status reply, got {:?}", other),
    }
}

#[test]
fn test_respond_stale_etag_is_full_response() {
    let site = test_site();
    let reply = site.respond(&parse(
        "GET /nav.css HTTP/1.1\r\nIf-None-Match: W/\"old-0\"\r\n\r\n",
    ));

    assert!(matches!(reply, Reply::Asset { .. }));
}

#[test]
fn test_etag_matches_with_and_without_weak_prefix() {
    let etag = "W/\"5f3a-3e8\"";

    assert!(etag_matches(etag, "W/\"5f3a-3e8\""));
    assert!(etag_matches(etag, "\"5f3a-3e8\""));
    assert!(etag_matches(etag, "\"other\", W/\"5f3a-3e8\""));
    assert!(!etag_matches(etag, "\"other\""));
    assert!(!etag_matches(etag, ""));
}
