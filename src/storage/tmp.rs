//! Scoped temporary storage, one scope per train.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Private working directory for a single train. The directory and all of
/// its contents are removed when the scope is dropped, on the success and
/// the failure path alike.
#[derive(Debug)]
pub struct TmpScope {
    dir: TempDir,
}

impl TmpScope {
    /// Create a fresh scope under `root`, creating `root` if needed.
    pub fn create_in(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("train-").tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path for a file inside the scope.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_is_removed_on_drop() {
        let root = tempfile::tempdir().expect("root");
        let scope = TmpScope::create_in(root.path()).expect("scope");
        let dir = scope.path().to_path_buf();
        std::fs::write(scope.file("artifact.bin"), b"data").expect("write");
        assert!(dir.exists());

        drop(scope);
        assert!(!dir.exists());
    }

    #[test]
    fn scopes_are_private_to_each_other() {
        let root = tempfile::tempdir().expect("root");
        let a = TmpScope::create_in(root.path()).expect("scope a");
        let b = TmpScope::create_in(root.path()).expect("scope b");
        assert_ne!(a.path(), b.path());
    }
}
