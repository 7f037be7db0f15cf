//! HTTP/1.1 protocol implementation.
//!
//! A deliberately small subset of HTTP/1.1: GET and HEAD on static files,
//! no request bodies, sequential keep-alive on one connection.
//!
//! # Architecture
//!
//! - **`line`**: Reads CRLF lines with an 8300 byte cap
//! - **`parser`**: Header-line grammar, per-request header counts and the
//!   request-line grammars
//! - **`request`**: Validated request representation
//! - **`response`**: Response representation with builder pattern
//! - **`writer`**: Serializes responses and writes them until complete
//! - **`connection`**: The per-connection request-response state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Read lines, check each header as it arrives
//!        └──────┬──────┘
//!               │ Blank line (or rejection → Writing)
//!               ▼
//!        ┌──────────────────┐
//!        │   Validating     │ ← Strict / lenient request-line grammar
//!        └──────┬───────────┘
//!               │ Request accepted (or rejection → Writing)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Method check, resolve target
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod line;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
