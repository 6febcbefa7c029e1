use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::session::{FileOutcome, Session};

/// In-memory registry of background upload sessions. The only mutation paths
/// are task settlement (through [`SessionStore::settle`]) and the reaper;
/// everything else sees cloned snapshots.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Apply one task settlement and hand the updated session to `observe`
    /// while the write lock is still held, so observers see settlements in
    /// counter order. Returns `false` for unknown ids and for sessions that
    /// are already terminal.
    pub async fn settle(
        &self,
        id: &str,
        outcome: Option<FileOutcome>,
        observe: impl FnOnce(&Session),
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(id) else {
            return false;
        };
        if session.status.is_terminal() {
            return false;
        }
        session.settle(outcome);
        observe(session);
        true
    }

    /// Remove every terminal session whose `ended_at` is older than
    /// `retention`. In-progress sessions survive regardless of age.
    pub async fn sweep(&self, retention: Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.ended_at {
            Some(ended_at) if session.status.is_terminal() => ended_at >= cutoff,
            _ => true,
        });
        before - sessions.len()
    }

    pub async fn run_reaper(
        self: Arc<Self>,
        every: Duration,
        retention: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let reaped = self.sweep(retention).await;
                    if reaped > 0 {
                        tracing::info!(reaped, "reaped expired upload sessions");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use chrono::TimeDelta;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn terminal_session(id: &str, ended_hours_ago: i64) -> Session {
        let mut session = Session::new(id.to_string(), 1);
        session.settle(None);
        assert_eq!(session.status, SessionStatus::Failed);
        session.ended_at = Some(Utc::now() - TimeDelta::hours(ended_hours_ago));
        session
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_terminal_sessions() {
        let store = SessionStore::new();
        store.insert(terminal_session("old", 25)).await;
        store.insert(terminal_session("fresh", 1)).await;

        let mut stale_but_running = Session::new("running".to_string(), 3);
        stale_but_running.started_at = Utc::now() - TimeDelta::hours(48);
        store.insert(stale_but_running).await;

        assert_eq!(store.sweep(DAY).await, 1);
        assert!(store.get("old").await.is_none());
        assert!(store.get("fresh").await.is_some());
        assert!(store.get("running").await.is_some());
    }

    #[tokio::test]
    async fn settle_on_unknown_session_is_a_noop() {
        let store = SessionStore::new();
        assert!(!store.settle("never-created", None, |_| {}).await);
    }

    #[tokio::test]
    async fn settle_on_terminal_session_is_a_noop() {
        let store = SessionStore::new();
        store.insert(terminal_session("done", 0)).await;

        assert!(!store.settle("done", None, |_| {}).await);
        let snapshot = store.get("done").await.unwrap();
        assert_eq!(snapshot.completed, 1);
        assert_eq!(snapshot.failed, 1);
    }

    #[tokio::test]
    async fn settle_observes_the_updated_session() {
        let store = SessionStore::new();
        store.insert(Session::new("s".to_string(), 2)).await;

        let mut seen = None;
        store
            .settle("s", None, |session| seen = Some(session.completed))
            .await;
        assert_eq!(seen, Some(1));
    }
}
