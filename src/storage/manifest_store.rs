//! Filesystem persistence base for target manifests.
//!
//! Concrete targets delegate their manifest bookkeeping here so the
//! consistency contract lives in one place: a run is committed only after
//! its artifact write succeeded, and every write goes through a sibling
//! temp file plus rename so a crash never leaves a torn manifest behind.

use crate::error::Result;
use crate::models::manifest::{Manifest, TargetManifest};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MANIFEST_FILE: &str = "manifest.json";

pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(MANIFEST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted manifest, or create and persist a fresh empty
    /// one. Intended to be called from `Target::init` only.
    pub fn load_or_init(&self, name: &str, kind: &str) -> Result<TargetManifest> {
        if self.path.exists() {
            self.load()
        } else {
            let manifest = TargetManifest::empty(name, kind);
            self.persist(&manifest)?;
            Ok(manifest)
        }
    }

    pub fn load(&self) -> Result<TargetManifest> {
        let data = std::fs::read(&self.path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn persist(&self, manifest: &TargetManifest) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(manifest)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Append a completed run (read-modify-write). Call only after the
    /// artifact itself has been durably stored.
    pub fn commit_backup(&self, run: Manifest) -> Result<()> {
        let mut manifest = self.load()?;
        manifest.backups.push(run);
        self.persist(&manifest)
    }

    /// Remove a run's entry. Returns whether an entry was removed.
    pub fn remove_backup(&self, id: Uuid) -> Result<bool> {
        let mut manifest = self.load()?;
        let before = manifest.backups.len();
        manifest.backups.retain(|m| m.id != id);
        let removed = manifest.backups.len() != before;
        if removed {
            self.persist(&manifest)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::manifest::TARGET_MANIFEST_VERSION;

    #[test]
    fn initializes_once_then_loads() {
        let dir = tempfile::tempdir().expect("dir");
        let store = ManifestStore::new(dir.path());

        let fresh = store.load_or_init("local", "directory").expect("init");
        assert_eq!(fresh.version, TARGET_MANIFEST_VERSION);
        assert!(fresh.backups.is_empty());
        assert!(store.path().exists());

        store
            .commit_backup(Manifest::new("db", "dump"))
            .expect("commit");

        // a second init must load, not wipe
        let loaded = store.load_or_init("local", "directory").expect("reload");
        assert_eq!(loaded.backups.len(), 1);
    }

    #[test]
    fn commit_appends_in_order() {
        let dir = tempfile::tempdir().expect("dir");
        let store = ManifestStore::new(dir.path());
        store.load_or_init("local", "directory").expect("init");

        let first = Manifest::new("db", "dump");
        let second = Manifest::new("db", "dump");
        let ids = (first.id, second.id);
        store.commit_backup(first).expect("first");
        store.commit_backup(second).expect("second");

        let manifest = store.load().expect("load");
        assert_eq!(manifest.backups.len(), 2);
        assert_eq!(manifest.backups[0].id, ids.0);
        assert_eq!(manifest.backups[1].id, ids.1);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("dir");
        let store = ManifestStore::new(dir.path());
        store.load_or_init("local", "directory").expect("init");

        let run = Manifest::new("db", "dump");
        let id = run.id;
        store.commit_backup(run).expect("commit");

        assert!(store.remove_backup(id).expect("first remove"));
        assert!(!store.remove_backup(id).expect("second remove"));
        assert!(store.load().expect("load").backups.is_empty());
    }
}
