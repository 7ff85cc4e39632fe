//! Atrium - Precomputed Static Asset Server
//!
//! Core library for serving a static site from build-time artifacts:
//! an extension-to-MIME table and a gzip manifest, both produced offline by
//! the bundled pipeline tools, so the request path never compresses or
//! sniffs anything.

pub mod assets;
pub mod config;
pub mod http;
pub mod pipeline;
pub mod server;
