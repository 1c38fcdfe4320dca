//! Backup mandates: the schedule-bound configuration for one container.

use crate::error::{EngineError, Result};
use crate::models::mandate::MandateConfig;
use crate::models::manifest::{Manifest, MANIFEST_DATE_FORMAT};
use crate::pipeline::jobs::{MiddlewareJob, RetentionJob, SourceJob, TargetJob};
use crate::pipeline::train::JobTrain;
use crate::pipeline::Job;
use crate::services::queue::TrainQueue;
use crate::services::retention;
use crate::services::scheduler::MandateScheduler;
use crate::storage::tmp::TmpScope;
use crate::storage::{Middleware, Source, TargetHandle};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Binds one container to its source, target, middleware stack, schedule,
/// and retention count. The mandate is the sole authority allowed to build
/// and enqueue trains referencing its providers, and it exclusively owns
/// its schedule handle.
pub struct BackupMandate {
    container_id: String,
    container_name: String,
    source: Arc<dyn Source>,
    target: Arc<TargetHandle>,
    middlewares: Vec<Arc<dyn Middleware>>,
    interval: Option<String>,
    retention: u32,
    name_pattern: String,
    tmp_root: PathBuf,
    queue: Arc<TrainQueue>,
    scheduler: Arc<MandateScheduler>,
    stopped: AtomicBool,
    schedule: Mutex<Option<Uuid>>,
}

impl std::fmt::Debug for BackupMandate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupMandate")
            .field("container_id", &self.container_id)
            .field("container_name", &self.container_name)
            .field("interval", &self.interval)
            .field("retention", &self.retention)
            .field("name_pattern", &self.name_pattern)
            .finish_non_exhaustive()
    }
}

impl BackupMandate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &MandateConfig,
        source: Arc<dyn Source>,
        target: Arc<TargetHandle>,
        middlewares: Vec<Arc<dyn Middleware>>,
        queue: Arc<TrainQueue>,
        scheduler: Arc<MandateScheduler>,
        tmp_root: PathBuf,
    ) -> Self {
        Self {
            container_id: config.container_id.clone(),
            container_name: config.container_name.clone(),
            source,
            target,
            middlewares,
            interval: config.interval.clone(),
            retention: config.retention.unwrap_or(0),
            name_pattern: config.name_pattern.clone(),
            tmp_root,
            queue,
            scheduler,
            stopped: AtomicBool::new(false),
            schedule: Mutex::new(None),
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn interval(&self) -> Option<&str> {
        self.interval.as_deref()
    }

    pub fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn attach_schedule(&self, id: Uuid) {
        *self.schedule.lock().expect("schedule lock") = Some(id);
    }

    /// Build and enqueue a train for one backup run. Synchronous: the
    /// returned manifest is the run's identity; the pipeline executes later
    /// on the queue worker. Concurrent triggers each get their own train
    /// and manifest; the queue serializes them.
    pub fn trigger(
        &self,
        meta: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<Manifest> {
        if !self.is_active() {
            return Err(EngineError::MandateStopped(self.container_name.clone()));
        }
        if !self.target.is_usable() {
            return Err(EngineError::TargetUnusable(self.target.name().to_string()));
        }

        let mut manifest = Manifest::new(&self.container_name, self.source.name());
        if let Some(meta) = meta {
            manifest.extra.extend(meta);
        }

        let final_name = format!("{}{}", self.derive_name(), self.source.file_suffix());
        let tmp = TmpScope::create_in(&self.tmp_root)?;

        let mut jobs: Vec<Box<dyn Job>> = Vec::with_capacity(self.middlewares.len() + 3);
        jobs.push(Box::new(SourceJob::new(Arc::clone(&self.source))));
        for middleware in &self.middlewares {
            jobs.push(Box::new(MiddlewareJob::new(Arc::clone(middleware))));
        }
        jobs.push(Box::new(TargetJob::new(
            Arc::clone(self.target.target()),
            final_name,
        )));
        jobs.push(Box::new(RetentionJob::new(
            Arc::clone(self.target.target()),
            self.container_name.clone(),
            self.retention,
        )));

        let train = JobTrain::new(manifest.clone(), jobs, tmp);
        tracing::info!(
            container = %self.container_name,
            train = %train.id(),
            manifest = %manifest.id,
            "Enqueueing backup train"
        );
        self.queue.enqueue_train(train)?;
        Ok(manifest)
    }

    /// Substitute `{container}` and `{date}` into the configured pattern.
    fn derive_name(&self) -> String {
        let date = Utc::now().format(MANIFEST_DATE_FORMAT).to_string();
        self.name_pattern
            .replace("{container}", &self.container_name)
            .replace("{date}", &date)
    }

    /// Cancel the schedule and refuse further triggers. Trains already
    /// submitted to the queue keep running.
    pub async fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let handle = self.schedule.lock().expect("schedule lock").take();
        if let Some(id) = handle {
            self.scheduler.remove(id).await?;
        }
        tracing::info!(container = %self.container_name, "Mandate stopped");
        Ok(())
    }

    /// Prune stored backups for this container right now, outside a train.
    /// Per-item delete failures are logged by the prune helper and do not
    /// abort the remainder.
    pub async fn enforce_retention(&self) -> Result<usize> {
        if self.retention == 0 {
            return Ok(0);
        }
        retention::prune(
            self.target.target().as_ref(),
            &self.container_name,
            self.retention as usize,
        )
        .await
    }
}
