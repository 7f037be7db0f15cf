//! Request target resolution
//!
//! Maps a validated target onto the document root, falling back to the
//! correlated table for anything the root does not hold.

use std::path::{Component, Path, PathBuf};

use crate::resource::correlated::{CorrelatedServer, CorrelatedTable};

/// Where a request target leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A regular file under the document root
    File(PathBuf),
    /// Not held locally, but a correlated server has it
    Redirect(CorrelatedServer),
    /// Exists under the root but is not a regular file
    NotRegular,
    /// Neither held locally nor correlated
    Missing,
}

/// Read-only state shared by every connection.
#[derive(Debug)]
pub struct ServerContext {
    root: PathBuf,
    correlated: CorrelatedTable,
}

impl ServerContext {
    pub fn new(root: impl Into<PathBuf>, correlated: CorrelatedTable) -> Self {
        Self {
            root: root.into(),
            correlated,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn correlated(&self) -> &CorrelatedTable {
        &self.correlated
    }

    /// Resolves `target`, which must start with `/`.
    ///
    /// Paths escaping the document root are treated as missing locally.
    pub async fn resolve(&self, target: &str) -> Resolution {
        let mut candidate = self.root.as_os_str().to_owned();
        candidate.push(target);
        let candidate = PathBuf::from(candidate);

        let metadata = if is_contained(&self.root, &candidate) {
            tokio::fs::metadata(&candidate).await.ok()
        } else {
            tracing::debug!(path = %target, "Target escapes document root");
            None
        };

        match metadata {
            None => match self.correlated.get(target) {
                Some(server) => Resolution::Redirect(*server),
                None => Resolution::Missing,
            },
            Some(meta) if !meta.is_file() => Resolution::NotRegular,
            Some(_) => Resolution::File(candidate),
        }
    }
}

/// Whether `path` lies under `root` once both are made absolute and
/// lexically normalized. Symlinks are not resolved.
pub fn is_contained(root: &Path, path: &Path) -> bool {
    match (std::path::absolute(root), std::path::absolute(path)) {
        (Ok(root), Ok(path)) => lexically_normal(&path).starts_with(lexically_normal(&root)),
        _ => false,
    }
}

/// Removes `.` components and folds `..` into its parent without touching
/// the filesystem.
pub fn lexically_normal(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_parent_components() {
        assert_eq!(
            lexically_normal(Path::new("/srv/www/./a/../b")),
            PathBuf::from("/srv/www/b")
        );
        assert_eq!(lexically_normal(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn containment_is_component_wise() {
        let root = Path::new("/srv/www");
        assert!(is_contained(root, Path::new("/srv/www/index.html")));
        assert!(!is_contained(root, Path::new("/srv/www/../../etc/passwd")));
        assert!(!is_contained(root, Path::new("/srv/www/../www2/x")));
    }
}
