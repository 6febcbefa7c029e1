use serde::Serialize;
use tokio::sync::broadcast;

use crate::session::{FileOutcome, Session, SessionStatus};

/// One progress update for a background upload session. Success updates carry
/// the results snapshot; failure updates carry the error message instead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub session_id: String,
    pub progress: f64,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<FileOutcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProgressEvent {
    pub fn success(session: &Session) -> Self {
        ProgressEvent {
            session_id: session.id.clone(),
            progress: session.progress_percent(),
            status: session.status,
            results: Some(session.results.clone()),
            error_message: None,
        }
    }

    pub fn failure(session: &Session, error_message: &str) -> Self {
        ProgressEvent {
            session_id: session.id.clone(),
            progress: session.progress_percent(),
            status: session.status,
            results: None,
            error_message: Some(error_message.to_string()),
        }
    }
}

/// Fan-out of progress events to live subscribers. Delivery is best-effort:
/// publishing with no subscribers is fine, a lagging subscriber loses the
/// oldest events, and nothing is replayed to late subscribers.
#[derive(Clone)]
pub struct ProgressChannel {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        ProgressChannel { sender }
    }

    pub fn publish(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }

    /// Bind a new subscriber to `session_id`. The binding is fixed for the
    /// life of the subscription.
    pub fn subscribe(&self, session_id: &str) -> ProgressSubscription {
        ProgressSubscription {
            session_id: session_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct ProgressSubscription {
    session_id: String,
    receiver: broadcast::Receiver<ProgressEvent>,
}

impl ProgressSubscription {
    /// Next event for the bound session; events for other sessions are
    /// discarded. Returns `None` once the channel is closed.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.session_id == self.session_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, session_id = %self.session_id, "progress subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
