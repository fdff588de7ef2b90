//! Session registry using moka
//!
//! One entry per workspace. Creation is compare-and-set through the cache's
//! entry API, so two starts racing for the same workspace cannot both win.
//! Entries idle for longer than the configured timeout are evicted.

use crate::error::SessionError;
use crate::session::WizardSession;
use clanforge_graph::{UserId, WorkspaceId};
use moka::future::Cache;
use moka::ops::compute::Op;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Shared handle to one running session
#[derive(Debug)]
pub struct SessionHandle {
    owner: UserId,
    state: Mutex<WizardSession>,
    cancelled: AtomicBool,
}

impl SessionHandle {
    fn new(session: WizardSession) -> Self {
        Self {
            owner: session.owner,
            state: Mutex::new(session),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Initiating user
    #[inline]
    #[must_use]
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Lock the session state
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, WizardSession> {
        self.state.lock().await
    }

    /// Request that no further stages run
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the session was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Running sessions keyed by workspace
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    inner: Cache<WorkspaceId, Arc<SessionHandle>>,
}

impl SessionRegistry {
    /// Create registry with an idle timeout and capacity
    #[must_use]
    pub fn new(idle_timeout: Duration, max_sessions: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle_timeout)
                .build(),
        }
    }

    /// Register `session` unless its workspace already has one
    ///
    /// # Errors
    /// `SessionError::AlreadyActive` if another session holds the workspace.
    pub async fn start(&self, session: WizardSession) -> Result<Arc<SessionHandle>, SessionError> {
        let workspace = session.workspace;
        let handle = Arc::new(SessionHandle::new(session));
        let candidate = Arc::clone(&handle);
        let entry = self
            .inner
            .entry(workspace)
            .or_insert_with(async move { candidate })
            .await;

        if entry.is_fresh() {
            tracing::info!(%workspace, owner = %handle.owner, "session started");
            Ok(handle)
        } else {
            tracing::debug!(%workspace, "start rejected, session active");
            Err(SessionError::AlreadyActive(workspace))
        }
    }

    /// Session for `workspace`, if `user` owns it
    ///
    /// # Errors
    /// - `NoActiveSession` if nothing is registered (or it timed out)
    /// - `NotOwner` if `user` did not start it
    pub async fn get(
        &self,
        workspace: WorkspaceId,
        user: UserId,
    ) -> Result<Arc<SessionHandle>, SessionError> {
        let handle = self
            .inner
            .get(&workspace)
            .await
            .ok_or(SessionError::NoActiveSession(workspace))?;
        if handle.owner != user {
            tracing::warn!(%workspace, %user, "interaction from non-owner rejected");
            return Err(SessionError::NotOwner { workspace, user });
        }
        Ok(handle)
    }

    /// Remove `handle` if it is still the registered session
    ///
    /// A newer session started for the same workspace is left in place.
    pub async fn end(&self, workspace: WorkspaceId, handle: &Arc<SessionHandle>) {
        let target = Arc::clone(handle);
        self.inner
            .entry(workspace)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if Arc::ptr_eq(entry.value(), &target) => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        tracing::debug!(%workspace, "session ended");
    }

    /// Whether `workspace` has a registered session
    #[must_use]
    pub fn is_active(&self, workspace: WorkspaceId) -> bool {
        self.inner.contains_key(&workspace)
    }

    /// Approximate number of registered sessions
    pub async fn active_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WS: WorkspaceId = WorkspaceId(5);

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Duration::from_secs(60), 100)
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let reg = registry();
        reg.start(WizardSession::new(WS, UserId(1), "standard"))
            .await
            .unwrap();
        let err = reg
            .start(WizardSession::new(WS, UserId(2), "standard"))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyActive(WS));
        assert_eq!(reg.get(WS, UserId(1)).await.unwrap().owner(), UserId(1));
    }

    #[tokio::test]
    async fn ownership_is_checked() {
        let reg = registry();
        reg.start(WizardSession::new(WS, UserId(1), "standard"))
            .await
            .unwrap();
        assert!(matches!(
            reg.get(WS, UserId(2)).await,
            Err(SessionError::NotOwner { .. })
        ));
        assert!(matches!(
            reg.get(WorkspaceId(6), UserId(1)).await,
            Err(SessionError::NoActiveSession(_))
        ));
    }

    #[tokio::test]
    async fn end_leaves_newer_session_alone() {
        let reg = registry();
        let old = reg
            .start(WizardSession::new(WS, UserId(1), "standard"))
            .await
            .unwrap();
        reg.end(WS, &old).await;
        assert!(!reg.is_active(WS));

        reg.start(WizardSession::new(WS, UserId(2), "standard"))
            .await
            .unwrap();
        reg.end(WS, &old).await;
        assert!(reg.get(WS, UserId(2)).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_starts_have_one_winner() {
        let reg = registry();
        let starts: Vec<_> = (1..=8)
            .map(|user| {
                let reg = reg.clone();
                tokio::spawn(async move {
                    reg.start(WizardSession::new(WS, UserId(user), "standard"))
                        .await
                        .is_ok()
                })
            })
            .collect();
        let mut winners = 0;
        for start in starts {
            if start.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let reg = SessionRegistry::new(Duration::from_millis(50), 100);
        reg.start(WizardSession::new(WS, UserId(1), "standard"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(matches!(
            reg.get(WS, UserId(1)).await,
            Err(SessionError::NoActiveSession(_))
        ));
    }
}
