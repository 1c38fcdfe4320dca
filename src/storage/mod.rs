//! Capability interfaces the engine consumes: backup sources, storage
//! targets, and transform middlewares. Concrete implementations live with
//! the embedding process; the engine depends only on these contracts.

pub mod manifest_store;
pub mod registry;
pub mod tmp;

use crate::error::Result;
use crate::models::manifest::{Manifest, TargetManifest};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tmp::TmpScope;

/// A pluggable capture mechanism producing a backup artifact.
#[async_trait]
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    /// File suffix for the captured artifact (e.g. ".sql", ".tar").
    fn file_suffix(&self) -> &str;

    /// Capture the container's data into a file inside `tmp` and return its
    /// path. Must not write outside the scope.
    async fn backup(&self, tmp: &TmpScope) -> Result<PathBuf>;
}

/// A durable storage backend plus its manifest-consistency obligations.
#[async_trait]
pub trait Target: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> &str;

    /// Verify writability, then load the persisted target manifest or
    /// create and persist a fresh empty one. This is the only point at
    /// which the target manifest may be initialized from nothing.
    async fn init(&self) -> Result<()>;

    /// All completed runs this target holds, across containers.
    async fn all_backups(&self) -> Result<Vec<Manifest>>;

    /// Move `tmp_path` into durable storage as `final_name`, append the
    /// persist step, and commit the run into the target manifest. Must fail
    /// with [`crate::error::EngineError::Collision`] when `final_name`
    /// already exists and must leave the target manifest untouched on any
    /// failure.
    async fn add_backup(
        &self,
        tmp_path: &Path,
        final_name: &str,
        manifest: Manifest,
    ) -> Result<Manifest>;

    /// Remove a stored run and its target-manifest entry.
    async fn delete_backup(&self, manifest: &Manifest) -> Result<()>;

    async fn manifest(&self) -> Result<TargetManifest>;
}

/// A pluggable transform applied between capture and persist.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> &str;

    /// Consume the manifest's last step's artifact and append exactly one
    /// new step for the transformed output.
    async fn execute(&self, manifest: Manifest, tmp: &TmpScope) -> Result<Manifest>;
}

/// A registered target plus its init-time writability verdict. Mandates
/// bound to a target that failed `init` refuse to trigger instead of
/// silently losing backups.
pub struct TargetHandle {
    target: Arc<dyn Target>,
    usable: AtomicBool,
}

impl TargetHandle {
    pub fn new(target: Arc<dyn Target>) -> Self {
        Self {
            target,
            usable: AtomicBool::new(false),
        }
    }

    /// Run the target's `init`, recording whether it came up writable.
    pub async fn init(&self) -> Result<()> {
        match self.target.init().await {
            Ok(()) => {
                self.usable.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                self.usable.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    pub fn is_usable(&self) -> bool {
        self.usable.load(Ordering::SeqCst)
    }

    pub fn target(&self) -> &Arc<dyn Target> {
        &self.target
    }

    pub fn name(&self) -> &str {
        self.target.name()
    }
}
