//! Explicit owner of the engine's moving parts: queue, scheduler, targets,
//! and mandates. Everything is reached through this object; there is no
//! ambient global registry.

use crate::config::AppConfig;
use crate::error::{EngineError, Result};
use crate::models::mandate::MandateConfig;
use crate::models::manifest::Manifest;
use crate::services::mandate::BackupMandate;
use crate::services::queue::TrainQueue;
use crate::services::scheduler::MandateScheduler;
use crate::storage::registry::ProviderRegistry;
use crate::storage::{Target, TargetHandle};
use dashmap::DashMap;
use std::sync::Arc;

pub struct Orchestrator {
    config: AppConfig,
    queue: Arc<TrainQueue>,
    scheduler: Arc<MandateScheduler>,
    registry: ProviderRegistry,
    targets: DashMap<String, Arc<TargetHandle>>,
    mandates: DashMap<String, Arc<BackupMandate>>,
}

impl Orchestrator {
    pub async fn new(config: AppConfig) -> Result<Self> {
        Ok(Self {
            queue: Arc::new(TrainQueue::new(config.queue_history)),
            scheduler: Arc::new(MandateScheduler::new().await?),
            registry: ProviderRegistry::new(),
            targets: DashMap::new(),
            mandates: DashMap::new(),
            config,
        })
    }

    /// Provider factories are registered before the orchestrator is shared.
    pub fn registry_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.registry
    }

    pub fn queue(&self) -> &Arc<TrainQueue> {
        &self.queue
    }

    /// Initialize and register a storage target. An unwritable target is
    /// still registered, so mandate configs can name it, but it is marked
    /// unusable and mandates bound to it refuse to trigger.
    pub async fn register_target(&self, target: Arc<dyn Target>) -> Result<()> {
        let name = target.name().to_string();
        let handle = Arc::new(TargetHandle::new(target));
        let result = handle.init().await;
        self.targets.insert(name.clone(), handle);
        match result {
            Ok(()) => {
                tracing::info!(target = %name, "Target initialized");
                Ok(())
            }
            Err(e) => {
                tracing::error!(target = %name, error = %e, "Target failed init; marked unusable");
                Err(EngineError::TargetUnusable(name))
            }
        }
    }

    /// Create, register, and (when an interval is set) schedule a mandate.
    /// Configuration problems are fatal to this mandate only; other
    /// mandates are unaffected.
    pub async fn add_mandate(&self, config: MandateConfig) -> Result<Arc<BackupMandate>> {
        if self.mandates.contains_key(&config.container_id) {
            return Err(EngineError::Config(format!(
                "duplicate mandate for container '{}'",
                config.container_id
            )));
        }
        let target = self
            .targets
            .get(&config.target)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| EngineError::UnknownTarget(config.target.clone()))?;

        let source = self.registry.build_source(&config.source_type, &config)?;
        let mut middlewares = Vec::with_capacity(config.middlewares.len());
        for kind in &config.middlewares {
            middlewares.push(self.registry.build_middleware(kind, &config)?);
        }

        let mandate = Arc::new(BackupMandate::new(
            &config,
            source,
            target,
            middlewares,
            Arc::clone(&self.queue),
            Arc::clone(&self.scheduler),
            self.config.tmp_dir.clone(),
        ));

        if let Some(cron) = mandate.interval() {
            let id = self.scheduler.schedule(&mandate, cron).await?;
            mandate.attach_schedule(id);
        }

        self.mandates
            .insert(config.container_id.clone(), Arc::clone(&mandate));
        tracing::info!(container = %config.container_name, "Mandate registered");
        Ok(mandate)
    }

    /// Stop a mandate's schedule and drop it. In-flight trains keep
    /// running.
    pub async fn remove_mandate(&self, container_id: &str) -> Result<bool> {
        let Some((_, mandate)) = self.mandates.remove(container_id) else {
            return Ok(false);
        };
        mandate.stop().await?;
        Ok(true)
    }

    pub fn mandate(&self, container_id: &str) -> Option<Arc<BackupMandate>> {
        self.mandates.get(container_id).map(|m| Arc::clone(m.value()))
    }

    /// Manual trigger for a registered mandate.
    pub fn trigger(&self, container_id: &str) -> Result<Manifest> {
        let mandate = self.mandate(container_id).ok_or_else(|| {
            EngineError::Config(format!("no mandate for container '{container_id}'"))
        })?;
        mandate.trigger(None)
    }

    /// Start the queue worker and the cron scheduler.
    pub async fn start(&self) -> Result<()> {
        self.queue.start().await;
        self.scheduler.start().await?;
        Ok(())
    }

    /// Ordered shutdown: stop every mandate's schedule first so no new work
    /// is accepted, then drain the queue (the in-flight train finishes),
    /// then release the tmp root.
    pub async fn shutdown(&self) {
        for entry in self.mandates.iter() {
            if let Err(e) = entry.value().stop().await {
                tracing::warn!(
                    container = %entry.value().container_name(),
                    error = %e,
                    "Failed to cancel schedule"
                );
            }
        }
        if let Err(e) = self.scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown error");
        }

        self.queue.stop().await;

        if self.config.tmp_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.config.tmp_dir) {
                tracing::warn!(error = %e, "Failed to remove tmp root");
            }
        }
        tracing::info!("Orchestrator stopped");
    }
}
