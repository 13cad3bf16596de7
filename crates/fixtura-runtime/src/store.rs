//! Resource storage
//!
//! Resources are addressed by slash-separated logical paths such as
//! `/com/acme/orders/pair.json`. A store maps them onto bytes somewhere.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Loads and saves fixture resources by logical path
pub trait ResourceStore: Send + Sync {
    /// Read a resource, or `None` if it does not exist
    fn load(&self, resource: &str) -> io::Result<Option<String>>;

    /// Write a resource, creating whatever containers it needs
    fn save(&self, resource: &str, contents: &str) -> io::Result<()>;
}

/// Store rooted at a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsResourceStore {
    root: PathBuf,
}

impl FsResourceStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a resource
    pub fn path_of(&self, resource: &str) -> PathBuf {
        resource
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl ResourceStore for FsResourceStore {
    fn load(&self, resource: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_of(resource)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, resource: &str, contents: &str) -> io::Result<()> {
        let path = self.path_of(resource);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_of_strips_leading_slash() {
        let store = FsResourceStore::new("resources");
        assert_eq!(
            store.path_of("/com/acme/pair.json"),
            Path::new("resources").join("com").join("acme").join("pair.json")
        );
    }

    #[test]
    fn test_load_missing_resource() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsResourceStore::new(temp_dir.path());
        assert_eq!(store.load("/absent.json").unwrap(), None);
    }

    #[test]
    fn test_save_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsResourceStore::new(temp_dir.path());

        store.save("/a/b/c.json", "{}").unwrap();

        assert!(temp_dir.path().join("a/b/c.json").is_file());
        assert_eq!(store.load("/a/b/c.json").unwrap().as_deref(), Some("{}"));
    }
}
