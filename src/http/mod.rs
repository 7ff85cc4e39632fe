//! HTTP protocol implementation.
//!
//! A hand-rolled HTTP/1.1 server layer with keep-alive support. Only the
//! surface a static file server needs is implemented: GET and HEAD are
//! served, everything else is answered with 405.
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Resolve + negotiate the asset
//!        └──────┬───────────┘
//!               │ Decision ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Stream response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
