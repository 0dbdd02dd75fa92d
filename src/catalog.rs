use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Default locations scanned for database containers, relative to the
/// working directory.
pub const DEFAULT_RESOURCES: &[&str] = &["data", "data/external"];

const DATABASE_SUFFIX: &str = "gdb";

/// Resolves configured filesystem locations into concrete database
/// containers, deduplicated and in deterministic order.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    paths: BTreeSet<PathBuf>,
}

impl SourceCatalog {
    /// Catalog over the given paths plus the fixed default set.
    pub fn new<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let defaults = DEFAULT_RESOURCES.iter().map(PathBuf::from);
        Self::from_paths(paths.into_iter().map(Into::into).chain(defaults))
    }

    /// Catalog over exactly the given paths, without the defaults.
    pub fn from_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let cwd = std::env::current_dir()?;
        let paths = paths
            .into_iter()
            .map(Into::into)
            .map(|path| {
                if path.is_absolute() {
                    path
                } else {
                    cwd.join(path)
                }
            })
            .collect();
        Ok(Self { paths })
    }

    /// Discover database containers: each catalog path that is itself a
    /// `.gdb` directory, plus any `.gdb` directory among the immediate
    /// children of other directory paths. One level of recursion only.
    pub fn container_paths(&self) -> Vec<PathBuf> {
        let mut containers = Vec::new();
        for path in &self.paths {
            if is_database_dir(path) {
                containers.push(path.clone());
            } else if path.is_dir() {
                match fs::read_dir(path) {
                    Ok(entries) => {
                        for entry in entries.flatten() {
                            let child = entry.path();
                            if is_database_dir(&child) {
                                containers.push(child);
                            }
                        }
                    }
                    Err(err) => debug!("skipping unreadable path '{}': {}", path.display(), err),
                }
            }
        }
        containers.sort();
        containers.dedup();
        containers
    }
}

fn is_database_dir(path: &Path) -> bool {
    path.is_dir() && path.extension().is_some_and(|ext| ext == DATABASE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_gdb_directories_one_level_deep() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("a.gdb")).unwrap();
        fs::create_dir_all(root.path().join("sub/b.gdb")).unwrap();
        fs::create_dir(root.path().join("plain")).unwrap();
        // A file with the suffix is not a database container.
        fs::write(root.path().join("c.gdb"), b"").unwrap();

        let catalog =
            SourceCatalog::from_paths([root.path().to_path_buf(), root.path().join("sub")])
                .unwrap();
        let containers = catalog.container_paths();

        assert_eq!(
            containers,
            vec![root.path().join("a.gdb"), root.path().join("sub/b.gdb")]
        );
    }

    #[test]
    fn test_direct_container_path_is_accepted() {
        let root = TempDir::new().unwrap();
        let gdb = root.path().join("charts.gdb");
        fs::create_dir(&gdb).unwrap();

        let catalog = SourceCatalog::from_paths([gdb.clone()]).unwrap();
        assert_eq!(catalog.container_paths(), vec![gdb]);
    }

    #[test]
    fn test_duplicate_paths_are_deduplicated() {
        let root = TempDir::new().unwrap();
        let gdb = root.path().join("charts.gdb");
        fs::create_dir(&gdb).unwrap();

        let catalog = SourceCatalog::from_paths([
            root.path().to_path_buf(),
            root.path().to_path_buf(),
            gdb.clone(),
        ])
        .unwrap();
        assert_eq!(catalog.container_paths(), vec![gdb]);
    }

    #[test]
    fn test_missing_paths_yield_no_containers() {
        let catalog = SourceCatalog::from_paths([PathBuf::from("/nonexistent/nowhere")]).unwrap();
        assert!(catalog.container_paths().is_empty());
    }
}
