//! Shared lifecycle state machine for jobs and trains.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Created,
    Enqueued,
    Started,
    Finished,
    Failed,
}

impl QueueState {
    /// Finished and Failed share a rank: both are terminal and mutually
    /// exclusive, so a late failure signal cannot erase a finished result
    /// (or the other way around).
    fn rank(self) -> u8 {
        match self {
            QueueState::Created => 0,
            QueueState::Enqueued => 1,
            QueueState::Started => 2,
            QueueState::Finished | QueueState::Failed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 3
    }
}

/// Lifecycle of a queueable entity: current state plus the timestamps
/// backing the waiting/working metrics.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    kind: &'static str,
    id: Uuid,
    state: QueueState,
    enqueued_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
    pub fn new(kind: &'static str, id: Uuid) -> Self {
        Self {
            kind,
            id,
            state: QueueState::Created,
            enqueued_at: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn enqueued_at(&self) -> Option<DateTime<Utc>> {
        self.enqueued_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Attempt a transition. A transition whose rank is at or below the
    /// current one is silently ignored. Returns whether it applied.
    pub fn advance(&mut self, next: QueueState) -> bool {
        if next.rank() <= self.state.rank() {
            return false;
        }
        let now = Utc::now();
        match next {
            QueueState::Enqueued => self.enqueued_at = Some(now),
            QueueState::Started => self.started_at = Some(now),
            QueueState::Finished | QueueState::Failed => self.finished_at = Some(now),
            QueueState::Created => {}
        }
        tracing::debug!(
            kind = self.kind,
            id = %self.id,
            from = ?self.state,
            to = ?next,
            "Lifecycle transition"
        );
        self.state = next;
        true
    }

    /// Time between enqueue and start, or `now - enqueued` while still
    /// waiting. `None` before the entity was enqueued.
    pub fn waiting_duration(&self) -> Option<Duration> {
        let enqueued = self.enqueued_at?;
        Some(self.started_at.unwrap_or_else(Utc::now) - enqueued)
    }

    /// Time between start and completion, or `now - started` while still
    /// running. `None` before the entity was started.
    pub fn working_duration(&self) -> Option<Duration> {
        let started = self.started_at?;
        Some(self.finished_at.unwrap_or_else(Utc::now) - started)
    }
}
