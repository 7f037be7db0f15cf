//! Correlated resource table
//!
//! Maps resource paths this server does not hold to the peer server that
//! does. The table is loaded once at startup and never mutated afterwards.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;

/// A peer server holding a correlated resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelatedServer {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl CorrelatedServer {
    pub fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Absolute URL of `target` on this server.
    pub fn location(&self, target: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, target)
    }
}

/// Immutable lookup from resource path to peer server.
#[derive(Debug, Clone, Default)]
pub struct CorrelatedTable {
    entries: HashMap<String, CorrelatedServer>,
}

impl CorrelatedTable {
    /// Builds a table from `path<TAB>ipv4<TAB>port` lines.
    ///
    /// The first definition of a path wins. Lines that do not follow the
    /// format are skipped with a warning.
    pub fn parse(source: &str) -> Self {
        let mut entries = HashMap::new();

        for (index, line) in source.lines().enumerate() {
            match parse_definition(line) {
                Some((path, server)) => {
                    entries.entry(path.to_string()).or_insert(server);
                }
                None => {
                    tracing::warn!(line = index + 1, content = %line, "Skipping malformed correlated resource definition");
                }
            }
        }

        Self { entries }
    }

    /// Reads and parses a definition file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read correlated resources from {}", path.display()))?;
        let table = Self::parse(&source);

        tracing::info!(
            file = %path.display(),
            entries = table.len(),
            "Correlated resources loaded"
        );

        Ok(table)
    }

    /// Exact lookup of a request target.
    pub fn get(&self, target: &str) -> Option<&CorrelatedServer> {
        self.entries.get(target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, CorrelatedServer)> for CorrelatedTable {
    fn from_iter<I: IntoIterator<Item = (String, CorrelatedServer)>>(iter: I) -> Self {
        let mut entries = HashMap::new();
        for (path, server) in iter {
            entries.entry(path).or_insert(server);
        }
        Self { entries }
    }
}

fn parse_definition(line: &str) -> Option<(&str, CorrelatedServer)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = line.split('\t');
    let path = fields.next()?;
    let host = fields.next()?;
    let port = fields.next()?;

    if fields.next().is_some() {
        return None;
    }

    let path_ok = !path.is_empty()
        && path
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'/'));
    if !path_ok || port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let host: Ipv4Addr = host.parse().ok()?;
    let port: u16 = port.parse().ok()?;

    Some((path, CorrelatedServer::new(host, port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_hostnames_and_bad_ports() {
        assert!(parse_definition("/a\tlocalhost\t80").is_none());
        assert!(parse_definition("/a\t10.0.0.1\t99999").is_none());
        assert!(parse_definition("/a\t10.0.0.1\t+80").is_none());
        assert!(parse_definition("/a b\t10.0.0.1\t80").is_none());
    }

    #[test]
    fn accepts_crlf_terminated_definition() {
        let (path, server) = parse_definition("/a.txt\t10.0.0.1\t8081\r").unwrap();
        assert_eq!(path, "/a.txt");
        assert_eq!(server.port, 8081);
    }
}
