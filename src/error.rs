//! Custom error types for the backup engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Unknown provider type: {0}")]
    UnknownProvider(String),

    #[error("Target '{0}' is not writable")]
    TargetUnusable(String),

    #[error("Mandate for '{0}' is stopped")]
    MandateStopped(String),

    #[error("Queue is no longer accepting trains")]
    QueueClosed,

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Persist failed: {0}")]
    Persist(String),

    #[error("Backup '{0}' already exists at target")]
    Collision(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
