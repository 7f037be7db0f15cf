//! Resource resolution
//!
//! Decides whether a target is served from the document root, redirected
//! to a correlated server, or refused.

pub mod correlated;
pub mod resolver;

pub use correlated::{CorrelatedServer, CorrelatedTable};
pub use resolver::{Resolution, ServerContext};
