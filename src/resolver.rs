//! Mapping module references to source text.
//!
//! The filesystem is an external collaborator: the core only ever talks to a
//! [`ModuleResolver`]. [`FsResolver`] implements the real lookup; tests and
//! embedders can substitute [`MemoryResolver`].

use std::io;
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;

pub trait ModuleResolver {
    /// Resolve a module file reference. An absolute `target` is returned
    /// as-is; otherwise `base_dir/target` is tried first, then each search
    /// path in order. The first existing candidate wins.
    fn resolve(&self, target: &Path, base_dir: &Path, search_paths: &[PathBuf])
        -> Option<PathBuf>;

    /// Load the source text behind a previously resolved path.
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
pub struct FsResolver;

impl ModuleResolver for FsResolver {
    fn resolve(
        &self,
        target: &Path,
        base_dir: &Path,
        search_paths: &[PathBuf],
    ) -> Option<PathBuf> {
        if target.is_absolute() {
            return Some(target.to_path_buf());
        }

        let candidate = base_dir.join(target);
        if candidate.exists() {
            return Some(candidate);
        }

        for search_path in search_paths {
            let candidate = search_path.join(target);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        None
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory file set following the same resolution contract.
#[derive(Default)]
pub struct MemoryResolver {
    files: FxHashMap<PathBuf, String>,
}

impl MemoryResolver {
    pub fn new() -> MemoryResolver {
        MemoryResolver::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> MemoryResolver {
        self.files.insert(path.into(), source.into());
        self
    }
}

impl ModuleResolver for MemoryResolver {
    fn resolve(
        &self,
        target: &Path,
        base_dir: &Path,
        search_paths: &[PathBuf],
    ) -> Option<PathBuf> {
        if target.is_absolute() {
            return Some(target.to_path_buf());
        }

        let candidate = base_dir.join(target);
        if self.files.contains_key(&candidate) {
            return Some(candidate);
        }

        for search_path in search_paths {
            let candidate = search_path.join(target);
            if self.files.contains_key(&candidate) {
                return Some(candidate);
            }
        }

        None
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dir_wins_over_search_paths() {
        let resolver = MemoryResolver::new()
            .with("base/m.sap", "base")
            .with("search/m.sap", "search");
        let found = resolver.resolve(
            Path::new("m.sap"),
            Path::new("base"),
            &[PathBuf::from("search")],
        );
        assert_eq!(found, Some(PathBuf::from("base/m.sap")));
    }

    #[test]
    fn search_paths_in_order() {
        let resolver = MemoryResolver::new()
            .with("b/m.sap", "b")
            .with("c/m.sap", "c");
        let found = resolver.resolve(
            Path::new("m.sap"),
            Path::new("a"),
            &[PathBuf::from("b"), PathBuf::from("c")],
        );
        assert_eq!(found, Some(PathBuf::from("b/m.sap")));
    }
}
