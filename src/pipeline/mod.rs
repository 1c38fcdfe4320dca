//! The backup pipeline: jobs, trains, and their shared lifecycle.

pub mod jobs;
pub mod status;
pub mod train;

use crate::error::Result;
use crate::models::manifest::Manifest;
use crate::storage::tmp::TmpScope;
use async_trait::async_trait;
use status::{Lifecycle, QueueState};
use uuid::Uuid;

/// One pipeline step. Implementations provide `execute`; the provided
/// `start` wraps it in the lifecycle transitions and is the only way a
/// train runs a job.
#[async_trait]
pub trait Job: Send {
    /// Short processor kind for logs ("source", "middleware", ...).
    fn kind(&self) -> &'static str;

    fn lifecycle(&self) -> &Lifecycle;
    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    fn id(&self) -> Uuid {
        self.lifecycle().id()
    }

    async fn execute(&mut self, manifest: Manifest, tmp: &TmpScope) -> Result<Manifest>;

    /// Run the job: transition to Started, delegate to `execute`, then
    /// transition to Finished or Failed. Failures are re-raised untouched so
    /// the owning train can abort exactly once.
    async fn start(&mut self, manifest: Manifest, tmp: &TmpScope) -> Result<Manifest> {
        self.lifecycle_mut().advance(QueueState::Started);
        match self.execute(manifest, tmp).await {
            Ok(manifest) => {
                self.lifecycle_mut().advance(QueueState::Finished);
                Ok(manifest)
            }
            Err(e) => {
                self.lifecycle_mut().advance(QueueState::Failed);
                Err(e)
            }
        }
    }
}
