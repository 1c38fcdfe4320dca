//! Cron scheduling for mandates.

use crate::error::Result;
use crate::services::mandate::BackupMandate;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

pub struct MandateScheduler {
    scheduler: Mutex<JobScheduler>,
}

impl MandateScheduler {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Mutex::new(scheduler),
        })
    }

    /// Register a cron entry firing `mandate.trigger()`. The closure holds
    /// a weak reference so a dropped mandate simply stops firing.
    pub async fn schedule(&self, mandate: &Arc<BackupMandate>, cron: &str) -> Result<Uuid> {
        let weak: Weak<BackupMandate> = Arc::downgrade(mandate);
        let container = mandate.container_name().to_string();

        let job = Job::new_async(cron, move |_uuid, _lock| {
            let weak = weak.clone();
            let container = container.clone();
            Box::pin(async move {
                let Some(mandate) = weak.upgrade() else { return };
                tracing::info!(container = %container, "Starting scheduled backup");
                match mandate.trigger(None) {
                    Ok(manifest) => {
                        tracing::debug!(container = %container, manifest = %manifest.id, "Train enqueued");
                    }
                    Err(e) => {
                        tracing::error!(container = %container, error = %e, "Scheduled trigger failed");
                    }
                }
            })
        })?;

        let id = self.scheduler.lock().await.add(job).await?;
        tracing::info!(container = %mandate.container_name(), cron = %cron, schedule = %id, "Mandate scheduled");
        Ok(id)
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        self.scheduler.lock().await.remove(&id).await?;
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler.lock().await.start().await?;
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.scheduler.lock().await.shutdown().await?;
        Ok(())
    }
}
