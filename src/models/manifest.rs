//! Run manifests and the per-target durable backup index.
//!
//! A [`Manifest`] records one backup run: its identity plus the ordered
//! steps the pipeline appended while producing the final artifact. Each
//! target keeps a [`TargetManifest`] as the durable index of every run it
//! successfully persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Date format for run manifests. Lexicographic order equals chronological
/// order, which the retention policy relies on.
pub const MANIFEST_DATE_FORMAT: &str = "%Y%m%d-%H-%M";

/// Current on-disk format version of a target manifest.
pub const TARGET_MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub id: Uuid,
    pub container_name: String,
    pub source_name: String,
    /// Formatted with [`MANIFEST_DATE_FORMAT`].
    pub date: String,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<Step>,
    pub filesize: Option<u64>,
    /// Open metadata map, carried through the pipeline untouched.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Manifest {
    pub fn new(container_name: &str, source_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            container_name: container_name.to_string(),
            source_name: source_name.to_string(),
            date: now.format(MANIFEST_DATE_FORMAT).to_string(),
            created_at: now,
            steps: Vec::new(),
            filesize: None,
            extra: HashMap::new(),
        }
    }

    /// Steps are append-only and kept in execution order.
    pub fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// The most recently appended step, i.e. the artifact the next pipeline
    /// stage should consume.
    pub fn latest_step(&self) -> Option<&Step> {
        self.steps.last()
    }
}

/// One pipeline stage's output artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Name of the source, middleware, or target that produced the artifact.
    pub processor: String,
    pub file_name: String,
    pub uri: String,
    pub sha256: String,
    pub size: Option<u64>,
}

/// Durable index of every completed run a target holds.
///
/// A run manifest enters `backups` only when its persist step succeeded;
/// partial or failed runs never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetManifest {
    pub name: String,
    pub kind: String,
    pub version: u32,
    pub backups: Vec<Manifest>,
}

impl TargetManifest {
    pub fn empty(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            version: TARGET_MANIFEST_VERSION,
            backups: Vec::new(),
        }
    }
}
