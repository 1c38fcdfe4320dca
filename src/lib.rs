//! Backup orchestration engine for data-bearing containers.
//!
//! Each container gets a [`BackupMandate`]: its source, target, middleware
//! stack, cron interval, and retention count. A trigger builds a
//! [`JobTrain`] (capture → transform × N → persist → prune) over a fresh
//! [`Manifest`] and submits it to the single-worker [`TrainQueue`], which
//! serializes every pipeline system-wide so shared target manifests are
//! never mutated concurrently.

pub mod config;
pub mod daemon;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::AppConfig;
pub use error::{EngineError, Result};
pub use models::mandate::MandateConfig;
pub use models::manifest::{Manifest, Step, TargetManifest};
pub use pipeline::status::QueueState;
pub use pipeline::train::JobTrain;
pub use services::mandate::BackupMandate;
pub use services::orchestrator::Orchestrator;
pub use services::queue::{TrainQueue, TrainRecord};
