//! Asset metadata and content negotiation.
//!
//! Everything here is computed once at start-up from the build-time tables
//! and is read-only afterwards, which is what lets workers share it without
//! a single lock: per request the server does one map lookup, one header
//! scan, and streams a file whose size and type were decided at build time.

pub mod manifest;
pub mod negotiate;
pub mod resolver;
pub mod site;

pub use manifest::{AssetRecord, GzipVariant, Manifest, ManifestError};
pub use negotiate::{Representation, ResponseDecision, accepts_gzip, negotiate};
pub use site::{Reply, Site};
