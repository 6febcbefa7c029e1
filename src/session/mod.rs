use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io;
use tokio_util::task::TaskTracker;

use crate::session::progress::{ProgressChannel, ProgressEvent};
use crate::session::store::SessionStore;
use crate::storage::Storage;

pub mod progress;
pub mod store;

/// Outcome of one successfully stored file, in the order tasks settled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub original_name: String,
    pub file_id: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    PartiallyCompleted,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

/// Aggregate state of one background upload batch. `completed` counts every
/// settled task, so a failed file is completed in the accounting sense and
/// `failed <= completed <= total` holds throughout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub status: SessionStatus,
    pub results: Vec<FileOutcome>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub(crate) fn new(id: String, total: usize) -> Self {
        Session {
            id,
            total,
            completed: 0,
            failed: 0,
            status: SessionStatus::InProgress,
            results: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn progress_percent(&self) -> f64 {
        (self.completed as f64 / self.total as f64) * 100.0
    }

    /// Record one settled task. `Some` appends the outcome, `None` counts a
    /// failure. The last settlement flips the session into its terminal
    /// status and stamps `ended_at`; callers never settle a terminal session.
    pub(crate) fn settle(&mut self, outcome: Option<FileOutcome>) {
        self.completed += 1;
        match outcome {
            Some(outcome) => self.results.push(outcome),
            None => self.failed += 1,
        }
        if self.completed == self.total {
            self.status = if self.failed == self.total {
                SessionStatus::Failed
            } else if self.failed > 0 {
                SessionStatus::PartiallyCompleted
            } else {
                SessionStatus::Completed
            };
            self.ended_at = Some(Utc::now());
        }
    }
}

/// One file of a batch, fully buffered and waiting for its upload task.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Drives background batch uploads: creates the session, spawns one tracked
/// task per file against the storage port, folds settlements back into the
/// session and publishes a progress event after every update.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<SessionStore>,
    storage: Arc<dyn Storage>,
    progress: ProgressChannel,
    tracker: TaskTracker,
    task_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        storage: Arc<dyn Storage>,
        progress: ProgressChannel,
        tracker: TaskTracker,
        task_timeout: Duration,
    ) -> Self {
        Orchestrator {
            store,
            storage,
            progress,
            tracker,
            task_timeout,
        }
    }

    /// Register a session for `files` and return its id immediately. The
    /// per-file tasks run concurrently with no ordering guarantee, neither
    /// among themselves nor relative to this call returning. The caller
    /// guarantees `files` is non-empty.
    pub async fn begin_batch(&self, files: Vec<PendingFile>) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.store
            .insert(Session::new(session_id.clone(), files.len()))
            .await;
        tracing::info!(session_id = %session_id, files = files.len(), "background upload session created");

        for file in files {
            let this = self.clone();
            let session_id = session_id.clone();
            self.tracker.spawn(async move {
                match tokio::time::timeout(this.task_timeout, this.upload_one(&file)).await {
                    Ok(Ok(outcome)) => this.record_success(&session_id, outcome).await,
                    Ok(Err(err)) => this.record_failure(&session_id, &err.to_string()).await,
                    Err(_) => {
                        let message = format!(
                            "upload of `{}` timed out after {}s",
                            file.name,
                            this.task_timeout.as_secs()
                        );
                        this.record_failure(&session_id, &message).await;
                    }
                }
            });
        }

        session_id
    }

    async fn upload_one(&self, file: &PendingFile) -> io::Result<FileOutcome> {
        let allocated = self.storage.allocate(&file.name).await?;
        self.storage
            .write(&allocated.file_id, file.bytes.clone())
            .await?;
        Ok(FileOutcome {
            original_name: file.name.clone(),
            file_id: allocated.file_id,
            size: file.bytes.len() as u64,
            mime_type: file.mime_type.clone(),
        })
    }

    pub async fn record_success(&self, session_id: &str, outcome: FileOutcome) {
        let recorded = self
            .store
            .settle(session_id, Some(outcome), |session| {
                self.progress.publish(ProgressEvent::success(session));
            })
            .await;
        if !recorded {
            tracing::warn!(session_id, "dropping success for unknown or finished session");
        }
    }

    pub async fn record_failure(&self, session_id: &str, error_message: &str) {
        let recorded = self
            .store
            .settle(session_id, None, |session| {
                self.progress
                    .publish(ProgressEvent::failure(session, error_message));
            })
            .await;
        if recorded {
            tracing::warn!(session_id, error_message, "file upload failed");
        } else {
            tracing::warn!(session_id, "dropping failure for unknown or finished session");
        }
    }

    pub async fn get_status(&self, session_id: &str) -> Option<Session> {
        self.store.get(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str) -> FileOutcome {
        FileOutcome {
            original_name: name.to_string(),
            file_id: format!("deadbeef-{name}"),
            size: 3,
            mime_type: "text/plain".to_string(),
        }
    }

    #[test]
    fn all_successes_complete_the_session() {
        let mut session = Session::new("s".to_string(), 3);
        session.settle(Some(outcome("a")));
        session.settle(Some(outcome("b")));
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(session.ended_at.is_none());

        session.settle(Some(outcome("c")));
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.completed, 3);
        assert_eq!(session.failed, 0);
        assert_eq!(session.results.len(), 3);
        assert!(session.ended_at.is_some());
    }

    #[test]
    fn mixed_settlements_are_partially_completed() {
        let mut session = Session::new("s".to_string(), 3);
        session.settle(Some(outcome("a")));
        session.settle(None);
        session.settle(None);

        assert_eq!(session.status, SessionStatus::PartiallyCompleted);
        assert_eq!(session.failed, 2);
        assert_eq!(session.results.len(), 1);
    }

    #[test]
    fn all_failures_fail_the_session_with_empty_results() {
        let mut session = Session::new("s".to_string(), 2);
        session.settle(None);
        session.settle(None);

        assert_eq!(session.status, SessionStatus::Failed);
        assert!(session.results.is_empty());
    }

    #[test]
    fn counters_stay_within_bounds_at_every_step() {
        let mut session = Session::new("s".to_string(), 4);
        for settled in [Some(outcome("a")), None, Some(outcome("b")), None] {
            session.settle(settled);
            assert!(session.completed <= session.total);
            assert!(session.failed <= session.completed);
        }
    }

    #[test]
    fn progress_is_a_percentage_of_settled_tasks() {
        let mut session = Session::new("s".to_string(), 4);
        session.settle(None);
        assert_eq!(session.progress_percent(), 25.0);
    }

    #[test]
    fn results_keep_completion_order() {
        let mut session = Session::new("s".to_string(), 3);
        session.settle(Some(outcome("second-submitted")));
        session.settle(Some(outcome("first-submitted")));
        session.settle(Some(outcome("third-submitted")));

        let names: Vec<_> = session
            .results
            .iter()
            .map(|r| r.original_name.as_str())
            .collect();
        assert_eq!(
            names,
            ["second-submitted", "first-submitted", "third-submitted"]
        );
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let json = serde_json::to_string(&SessionStatus::PartiallyCompleted).unwrap();
        assert_eq!(json, "\"partially_completed\"");
    }
}
