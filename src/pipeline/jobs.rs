//! Concrete pipeline jobs: capture, transform, persist, prune.

use super::status::Lifecycle;
use super::Job;
use crate::error::{EngineError, Result};
use crate::models::manifest::{Manifest, Step};
use crate::services::retention;
use crate::storage::tmp::TmpScope;
use crate::storage::{Middleware, Source, Target};
use crate::utils::hash::sha256_file;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Captures the container's data into the train's tmp scope and appends the
/// run's first step.
pub struct SourceJob {
    lifecycle: Lifecycle,
    source: Arc<dyn Source>,
}

impl SourceJob {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            lifecycle: Lifecycle::new("source", Uuid::new_v4()),
            source,
        }
    }
}

#[async_trait]
impl Job for SourceJob {
    fn kind(&self) -> &'static str {
        "source"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    async fn execute(&mut self, mut manifest: Manifest, tmp: &TmpScope) -> Result<Manifest> {
        let artifact = self.source.backup(tmp).await?;
        let (sha256, size) = sha256_file(&artifact)
            .await
            .map_err(|e| EngineError::Capture(format!("captured artifact unreadable: {e}")))?;
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        manifest.filesize = Some(size);
        manifest.push_step(Step {
            processor: self.source.name().to_string(),
            file_name,
            uri: artifact.to_string_lossy().into_owned(),
            sha256,
            size: Some(size),
        });
        Ok(manifest)
    }
}

/// Applies one middleware transform. The middleware consumes the last
/// step's artifact and appends exactly one new step.
pub struct MiddlewareJob {
    lifecycle: Lifecycle,
    middleware: Arc<dyn Middleware>,
}

impl MiddlewareJob {
    pub fn new(middleware: Arc<dyn Middleware>) -> Self {
        Self {
            lifecycle: Lifecycle::new("middleware", Uuid::new_v4()),
            middleware,
        }
    }
}

#[async_trait]
impl Job for MiddlewareJob {
    fn kind(&self) -> &'static str {
        "middleware"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    async fn execute(&mut self, manifest: Manifest, tmp: &TmpScope) -> Result<Manifest> {
        self.middleware.execute(manifest, tmp).await
    }
}

/// Moves the final artifact into durable storage and commits the run into
/// the target manifest.
pub struct TargetJob {
    lifecycle: Lifecycle,
    target: Arc<dyn Target>,
    final_name: String,
}

impl TargetJob {
    pub fn new(target: Arc<dyn Target>, final_name: String) -> Self {
        Self {
            lifecycle: Lifecycle::new("target", Uuid::new_v4()),
            target,
            final_name,
        }
    }
}

#[async_trait]
impl Job for TargetJob {
    fn kind(&self) -> &'static str {
        "target"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    async fn execute(&mut self, manifest: Manifest, _tmp: &TmpScope) -> Result<Manifest> {
        let uri = manifest
            .latest_step()
            .map(|s| s.uri.clone())
            .ok_or_else(|| EngineError::Persist("no artifact to persist".into()))?;
        let path = PathBuf::from(uri);
        if !path.exists() {
            return Err(EngineError::Persist(format!(
                "artifact missing: {}",
                path.display()
            )));
        }
        self.target
            .add_backup(&path, &self.final_name, manifest)
            .await
    }
}

/// Prunes stored runs past the retention count. Best-effort cleanup: a
/// failed listing or delete is logged, never raised, so a successful backup
/// is not reported as failed over housekeeping.
pub struct RetentionJob {
    lifecycle: Lifecycle,
    target: Arc<dyn Target>,
    container_name: String,
    keep: u32,
}

impl RetentionJob {
    pub fn new(target: Arc<dyn Target>, container_name: String, keep: u32) -> Self {
        Self {
            lifecycle: Lifecycle::new("retention", Uuid::new_v4()),
            target,
            container_name,
            keep,
        }
    }
}

#[async_trait]
impl Job for RetentionJob {
    fn kind(&self) -> &'static str {
        "retention"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    async fn execute(&mut self, manifest: Manifest, _tmp: &TmpScope) -> Result<Manifest> {
        if self.keep == 0 {
            return Ok(manifest);
        }
        match retention::prune(
            self.target.as_ref(),
            &self.container_name,
            self.keep as usize,
        )
        .await
        {
            Ok(deleted) if deleted > 0 => {
                tracing::info!(container = %self.container_name, deleted, "Pruned old backups");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    container = %self.container_name,
                    error = %e,
                    "Retention pass skipped: could not list stored backups"
                );
            }
        }
        Ok(manifest)
    }
}
