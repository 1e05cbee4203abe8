//! Guards against slow responses overwriting newer ones.
//!
//! Every fetch takes a ticket from [`RequestGeneration`]; only the holder of
//! the newest ticket may publish its result.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ClientResult;

#[derive(Debug, Default)]
pub struct RequestGeneration {
    current: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier one
    pub fn next(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.current.load(Ordering::SeqCst) == ticket
    }
}

/// Last published result of a repeatedly refreshed query
#[derive(Debug)]
pub struct LatestSnapshot<T> {
    generation: RequestGeneration,
    value: RwLock<Option<T>>,
}

impl<T: Clone> LatestSnapshot<T> {
    pub fn new() -> Self {
        Self {
            generation: RequestGeneration::new(),
            value: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<T> {
        self.value.read().await.clone()
    }

    /// Run `fetch` and publish its result unless a newer load started
    /// meanwhile. Returns whether the result was published.
    pub async fn load<F, Fut>(&self, fetch: F) -> ClientResult<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let ticket = self.generation.next();
        let value = fetch().await?;

        let mut slot = self.value.write().await;
        if !self.generation.is_current(ticket) {
            debug!("Discarding stale response (generation {})", ticket);
            return Ok(false);
        }
        *slot = Some(value);
        Ok(true)
    }
}
