//! A job train: one backup run's ordered pipeline.

use super::status::{Lifecycle, QueueState};
use super::Job;
use crate::error::Result;
use crate::models::manifest::Manifest;
use crate::storage::tmp::TmpScope;
use std::collections::VecDeque;
use uuid::Uuid;

/// An ordered pipeline of jobs sharing one manifest, 1:1 with the manifest
/// for its lifetime. The train owns its tmp scope; dropping the train
/// removes the scope on the success and failure path alike.
pub struct JobTrain {
    lifecycle: Lifecycle,
    manifest: Manifest,
    jobs: VecDeque<Box<dyn Job>>,
    tmp: TmpScope,
}

impl JobTrain {
    pub fn new(manifest: Manifest, jobs: Vec<Box<dyn Job>>, tmp: TmpScope) -> Self {
        Self {
            lifecycle: Lifecycle::new("train", Uuid::new_v4()),
            manifest,
            jobs: jobs.into(),
            tmp,
        }
    }

    pub fn id(&self) -> Uuid {
        self.lifecycle.id()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// The manifest as produced so far; partial when the train failed.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Lifecycle states of the jobs still waiting to run.
    pub fn job_states(&self) -> Vec<QueueState> {
        self.jobs.iter().map(|j| j.lifecycle().state()).collect()
    }

    /// Cascade Enqueued to the train and every job, so waiting metrics for
    /// the whole pipeline start at submission time rather than per job.
    pub fn mark_enqueued(&mut self) {
        self.lifecycle.advance(QueueState::Enqueued);
        for job in self.jobs.iter_mut() {
            job.lifecycle_mut().advance(QueueState::Enqueued);
        }
    }

    /// Run jobs strictly in submission order, threading the manifest
    /// through each one. The first failure stops the pipeline: no later job
    /// runs, which is what keeps failed runs out of target manifests. Each
    /// job is consumed as it runs; a job never runs twice.
    pub async fn run(&mut self) -> Result<()> {
        self.lifecycle.advance(QueueState::Started);
        while let Some(mut job) = self.jobs.pop_front() {
            let manifest = self.manifest.clone();
            match job.start(manifest, &self.tmp).await {
                Ok(updated) => self.manifest = updated,
                Err(e) => {
                    tracing::warn!(
                        train = %self.id(),
                        job = %job.id(),
                        kind = job.kind(),
                        error = %e,
                        "Job failed; aborting remaining jobs"
                    );
                    self.jobs.clear();
                    self.lifecycle.advance(QueueState::Failed);
                    return Err(e);
                }
            }
        }
        self.lifecycle.advance(QueueState::Finished);
        Ok(())
    }
}
