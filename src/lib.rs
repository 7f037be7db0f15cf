//! Waypost - static HTTP/1.1 origin server
//!
//! Serves files from a document root and redirects requests for
//! resources held by correlated servers.

pub mod config;
pub mod http;
pub mod resource;
pub mod server;
