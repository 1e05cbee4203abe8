//! # Session and token refresh
//!
//! Holds the caller's tokens and makes sure that a burst of 401 answers
//! triggers exactly one refresh.
//!
//! ## Key Responsibilities
//! - Keep the access/refresh token pair of the logged-in user
//! - Run the refresh state machine `Idle -> Refreshing -> Idle | Failed`
//! - Queue callers that hit 401 during a refresh and wake them all on completion
//! - Clear the credentials when a refresh fails, so every waiter sees
//!   [`ClientError::SessionExpired`]

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<String>;
}

/// `None` tells a waiter the refresh failed
type Waiter = oneshot::Sender<Option<String>>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
    /// Last refresh failed; stays here until the next login
    Failed,
}

struct SessionState {
    credentials: Option<Credentials>,
    refresh: RefreshState,
}

pub struct Session {
    state: Arc<Mutex<SessionState>>,
    refresher: Arc<dyn TokenRefresher>,
}

impl Session {
    pub fn new(refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                credentials: None,
                refresh: RefreshState::Idle,
            })),
            refresher,
        }
    }

    /// Store fresh credentials after a login. A refresh still in flight for
    /// the previous credentials finishes without touching these.
    pub async fn set_credentials(&self, credentials: Credentials) {
        let mut state = self.state.lock().await;
        state.credentials = Some(credentials);
        if !matches!(state.refresh, RefreshState::Refreshing { .. }) {
            state.refresh = RefreshState::Idle;
        }
    }

    pub async fn credentials(&self) -> Option<Credentials> {
        self.state.lock().await.credentials.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.lock().await.credentials.as_ref().map(|c| c.access_token.clone())
    }

    /// Forget the tokens; returns them so the caller can revoke the refresh token
    pub async fn clear(&self) -> Option<Credentials> {
        self.state.lock().await.credentials.take()
    }

    /// Called after a request carrying `rejected_token` got a 401.
    ///
    /// Resolves to the access token to retry with. If another caller already
    /// replaced `rejected_token`, the current token is returned without a new
    /// refresh. Concurrent callers share a single in-flight refresh.
    pub async fn refresh_after_unauthorized(&self, rejected_token: &str) -> ClientResult<String> {
        let receiver = {
            let mut state = self.state.lock().await;

            let refresh_token = match &state.credentials {
                None => return Err(ClientError::SessionExpired),
                Some(c) if c.access_token != rejected_token => return Ok(c.access_token.clone()),
                Some(c) => c.refresh_token.clone(),
            };

            let (sender, receiver) = oneshot::channel();
            match &mut state.refresh {
                RefreshState::Refreshing { waiters } => {
                    debug!("Refresh in flight, queueing caller");
                    waiters.push(sender);
                }
                RefreshState::Failed => return Err(ClientError::SessionExpired),
                RefreshState::Idle => {
                    state.refresh = RefreshState::Refreshing { waiters: vec![sender] };
                    // Spawned so a dropped caller cannot strand the queue
                    tokio::spawn(run_refresh(self.state.clone(), self.refresher.clone(), refresh_token));
                }
            }
            receiver
        };

        match receiver.await {
            Ok(Some(token)) => Ok(token),
            Ok(None) | Err(_) => Err(ClientError::SessionExpired),
        }
    }
}

/// `refresh_token` identifies the credentials the refresh started from
async fn run_refresh(state: Arc<Mutex<SessionState>>, refresher: Arc<dyn TokenRefresher>, refresh_token: String) {
    let outcome = refresher.refresh(&refresh_token).await;

    let mut state = state.lock().await;
    let waiters = match std::mem::replace(&mut state.refresh, RefreshState::Idle) {
        RefreshState::Refreshing { waiters } => waiters,
        _ => Vec::new(),
    };

    let same_session = state
        .credentials
        .as_ref()
        .is_some_and(|c| c.refresh_token == refresh_token);

    let token = if !same_session {
        debug!("Credentials changed during refresh, dropping its outcome");
        state.credentials.as_ref().map(|c| c.access_token.clone())
    } else {
        apply_outcome(&mut state, outcome, waiters.len())
    };

    for waiter in waiters {
        // receivers dropped by cancelled callers are fine to skip
        let _ = waiter.send(token.clone());
    }
}

fn apply_outcome(state: &mut SessionState, outcome: ClientResult<String>, waiting: usize) -> Option<String> {
    match outcome {
        Ok(token) => {
            if let Some(credentials) = state.credentials.as_mut() {
                credentials.access_token = token.clone();
            }
            info!("Access token refreshed, waking {} callers", waiting);
            Some(token)
        }
        Err(e) => {
            warn!("Token refresh failed, ending session: {}", e);
            state.credentials = None;
            state.refresh = RefreshState::Failed;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingRefresher {
        calls: AtomicUsize,
        succeed: bool,
    }

    impl CountingRefresher {
        fn new(succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                succeed,
            })
        }
    }

    #[async_trait]
    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, refresh_token: &str) -> ClientResult<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(30)).await;
            if self.succeed {
                Ok(format!("access-{}-{}", refresh_token, call))
            } else {
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn logged_in(refresher: Arc<CountingRefresher>) -> Arc<Session> {
        let session = Arc::new(Session::new(refresher));
        session
            .set_credentials(Credentials {
                access_token: "stale".to_string(),
                refresh_token: "r1".to_string(),
            })
            .await;
        session
    }

    async fn burst(session: &Arc<Session>, callers: usize) -> Vec<ClientResult<String>> {
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let session = session.clone();
                tokio::spawn(async move { session.refresh_after_unauthorized("stale").await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_share_one_refresh() {
        let refresher = CountingRefresher::new(true);
        let session = logged_in(refresher.clone()).await;

        let results = burst(&session, 8).await;

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| r.as_deref() == Ok("access-r1-1")));
        assert_eq!(session.access_token().await.as_deref(), Some("access-r1-1"));
    }

    #[tokio::test]
    async fn test_late_unauthorized_reuses_new_token() {
        let refresher = CountingRefresher::new(true);
        let session = logged_in(refresher.clone()).await;

        session.refresh_after_unauthorized("stale").await.unwrap();
        let again = session.refresh_after_unauthorized("stale").await.unwrap();

        assert_eq!(again, "access-r1-1");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_fails_every_waiter() {
        let refresher = CountingRefresher::new(false);
        let session = logged_in(refresher.clone()).await;

        let results = burst(&session, 5).await;

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| *r == Err(ClientError::SessionExpired)));
        assert_eq!(session.credentials().await, None);

        // no new refresh attempts until the next login
        assert_eq!(
            session.refresh_after_unauthorized("stale").await,
            Err(ClientError::SessionExpired)
        );
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    async fn login_during_refresh(session: &Arc<Session>) -> ClientResult<String> {
        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.refresh_after_unauthorized("stale").await })
        };
        // let the refresh start before logging in again
        tokio::time::sleep(Duration::from_millis(5)).await;
        session
            .set_credentials(Credentials {
                access_token: "fresh".to_string(),
                refresh_token: "r2".to_string(),
            })
            .await;
        pending.await.unwrap()
    }

    #[tokio::test]
    async fn test_refresh_for_previous_login_keeps_new_credentials() {
        let refresher = CountingRefresher::new(true);
        let session = logged_in(refresher.clone()).await;

        assert_eq!(login_during_refresh(&session).await.as_deref(), Ok("fresh"));
        assert_eq!(
            session.credentials().await,
            Some(Credentials {
                access_token: "fresh".to_string(),
                refresh_token: "r2".to_string(),
            })
        );

        // the new login refreshes with its own token
        assert_eq!(
            session.refresh_after_unauthorized("fresh").await.as_deref(),
            Ok("access-r2-2")
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_for_previous_login_keeps_session() {
        let refresher = CountingRefresher::new(false);
        let session = logged_in(refresher.clone()).await;

        assert_eq!(login_during_refresh(&session).await.as_deref(), Ok("fresh"));
        assert_eq!(session.access_token().await.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_login_after_failure_resets_state() {
        let refresher = CountingRefresher::new(false);
        let session = logged_in(refresher.clone()).await;
        let _ = session.refresh_after_unauthorized("stale").await;

        session
            .set_credentials(Credentials {
                access_token: "fresh".to_string(),
                refresh_token: "r2".to_string(),
            })
            .await;

        let _ = session.refresh_after_unauthorized("fresh").await;
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
    }
}
