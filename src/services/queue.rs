//! The execution engine: a single-worker FIFO queue of job trains.
//!
//! Exactly one train runs at a time, system-wide. Target manifests are
//! read-modify-write structures shared by every mandate bound to the same
//! target; the single worker serializes those mutations, so targets need no
//! lock of their own. A variant running N trains in parallel would have to
//! add per-target mutual exclusion around add/delete/manifest writes.

use crate::error::{EngineError, Result};
use crate::pipeline::status::QueueState;
use crate::pipeline::train::JobTrain;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Read-only observability snapshot of a known train.
#[derive(Debug, Clone, Serialize)]
pub struct TrainRecord {
    pub id: Uuid,
    pub manifest_id: Uuid,
    pub container_name: String,
    pub state: QueueState,
    pub enqueued_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TrainRecord {
    fn from_train(train: &JobTrain, error: Option<String>) -> Self {
        let lifecycle = train.lifecycle();
        Self {
            id: train.id(),
            manifest_id: train.manifest().id,
            container_name: train.manifest().container_name.clone(),
            state: lifecycle.state(),
            enqueued_at: lifecycle.enqueued_at(),
            started_at: lifecycle.started_at(),
            finished_at: lifecycle.finished_at(),
            error,
        }
    }
}

pub struct TrainQueue {
    tx: mpsc::UnboundedSender<JobTrain>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<JobTrain>>>,
    trains: Arc<DashMap<Uuid, TrainRecord>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    history: usize,
}

impl TrainQueue {
    pub fn new(history: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            trains: Arc::new(DashMap::new()),
            worker: Mutex::new(None),
            cancel: CancellationToken::new(),
            history,
        }
    }

    /// Submit a train. Cascades Enqueued to the train and all its jobs,
    /// records a snapshot, and returns immediately; execution happens on
    /// the worker in strict submission order.
    pub fn enqueue_train(&self, mut train: JobTrain) -> Result<()> {
        train.mark_enqueued();
        self.trains
            .insert(train.id(), TrainRecord::from_train(&train, None));
        self.tx.send(train).map_err(|_| EngineError::QueueClosed)?;
        Ok(())
    }

    /// Spawn the worker loop. Calling start twice is a no-op.
    pub async fn start(&self) {
        let mut slot = self.worker.lock().await;
        if slot.is_some() {
            return;
        }
        let Some(mut rx) = self.rx.lock().await.take() else {
            return;
        };
        let trains = Arc::clone(&self.trains);
        let cancel = self.cancel.clone();
        let history = self.history;

        let handle = tokio::spawn(async move {
            loop {
                let train = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(train) => train,
                        None => break,
                    },
                };
                run_train(train, &trains).await;
                prune_records(&trains, history);
            }

            // Anything still queued at stop never ran; its tmp scope is
            // released as the train drops.
            rx.close();
            let mut dropped = 0;
            while let Ok(train) = rx.try_recv() {
                trains.remove(&train.id());
                dropped += 1;
            }
            if dropped > 0 {
                tracing::warn!(dropped, "Queue stopped with trains still waiting");
            }
        });
        *slot = Some(handle);
    }

    /// Graceful stop: the in-flight train finishes, then the worker exits.
    pub async fn stop(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Queue worker exited abnormally");
            }
        }
        tracing::info!("Queue stopped");
    }

    pub fn train(&self, id: Uuid) -> Option<TrainRecord> {
        self.trains.get(&id).map(|r| r.clone())
    }

    pub fn trains(&self) -> Vec<TrainRecord> {
        self.trains.iter().map(|r| r.clone()).collect()
    }
}

async fn run_train(mut train: JobTrain, trains: &DashMap<Uuid, TrainRecord>) {
    let id = train.id();
    let container = train.manifest().container_name.clone();
    tracing::info!(train = %id, container = %container, "Running train");

    // flip the live snapshot so introspection shows the train as picked up
    if let Some(mut record) = trains.get_mut(&id) {
        record.state = QueueState::Started;
        record.started_at = Some(Utc::now());
    }

    let result = train.run().await;
    match &result {
        Ok(()) => {
            tracing::info!(train = %id, container = %container, "Train finished");
        }
        Err(e) => {
            // keep the partial manifest in the log for forensics; the queue
            // never retries a failed train
            let partial = serde_json::to_string(train.manifest()).unwrap_or_default();
            tracing::error!(
                train = %id,
                container = %container,
                error = %e,
                partial_manifest = %partial,
                "Train failed"
            );
        }
    }
    trains.insert(
        id,
        TrainRecord::from_train(&train, result.err().map(|e| e.to_string())),
    );
}

/// Drop the oldest terminal records beyond the history window so the view
/// of known trains does not grow without bound.
fn prune_records(trains: &DashMap<Uuid, TrainRecord>, history: usize) {
    let mut terminal: Vec<(Uuid, DateTime<Utc>)> = trains
        .iter()
        .filter(|r| r.state.is_terminal())
        .map(|r| {
            let stamp = r
                .finished_at
                .or(r.enqueued_at)
                .unwrap_or_else(Utc::now);
            (r.id, stamp)
        })
        .collect();
    if terminal.len() <= history {
        return;
    }
    terminal.sort_by_key(|(_, stamp)| *stamp);
    let excess = terminal.len() - history;
    for (id, _) in terminal.into_iter().take(excess) {
        trains.remove(&id);
    }
}
