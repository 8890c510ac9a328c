//! Collection stores backing the data providers
//!
//! A store holds the last-known-good copy of one backend collection plus
//! `loading` / `error` flags. Refreshes replace the whole list; a failed
//! refresh keeps the previous items and only records the error.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::ClientResult;

/// Point-in-time copy of a store
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct StoreState<T> {
    items: Vec<T>,
    in_flight: usize,
    error: Option<String>,
    /// Ticket of the newest response applied so far
    applied: u64,
    /// Ticket of the newest failed refresh
    failed: u64,
}

/// Shared, cloneable collection store
#[derive(Debug)]
pub struct CollectionStore<T> {
    name: &'static str,
    state: Arc<RwLock<StoreState<T>>>,
    tickets: Arc<AtomicU64>,
}

impl<T> Clone for CollectionStore<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            state: Arc::clone(&self.state),
            tickets: Arc::clone(&self.tickets),
        }
    }
}

impl<T: Clone + Send + Sync> CollectionStore<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(RwLock::new(StoreState {
                items: Vec::new(),
                in_flight: 0,
                error: None,
                applied: 0,
                failed: 0,
            })),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `fetch` and replace the items with its result.
    ///
    /// Responses are applied in issue order: when a later refresh has
    /// already landed, an older response is dropped. On failure the items
    /// are left untouched and the error message is recorded.
    ///
    /// An older success arriving after a newer failure still replaces the
    /// items, but the error stays until a refresh newer than the failure
    /// succeeds.
    pub async fn refresh_with<F>(&self, fetch: F) -> ClientResult<usize>
    where
        F: Future<Output = ClientResult<Vec<T>>>,
    {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().await.in_flight += 1;

        let result = fetch.await;

        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        match result {
            Ok(items) => {
                let count = items.len();
                if ticket < state.applied {
                    tracing::debug!(
                        store = self.name,
                        ticket,
                        applied = state.applied,
                        "Discarding stale refresh response"
                    );
                    return Ok(count);
                }
                state.items = items;
                state.applied = ticket;
                if ticket > state.failed {
                    state.error = None;
                }
                tracing::debug!(store = self.name, count, "Store refreshed");
                Ok(count)
            }
            Err(e) if ticket < state.applied => {
                tracing::debug!(store = self.name, ticket, "Ignoring failure of a superseded refresh: {e}");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(store = self.name, error = %e, "Store refresh failed, keeping last-known-good data");
                state.error = Some(e.to_string());
                state.failed = state.failed.max(ticket);
                Err(e)
            }
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot<T> {
        let state = self.state.read().await;
        StoreSnapshot {
            items: state.items.clone(),
            loading: state.in_flight > 0,
            error: state.error.clone(),
        }
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.read().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.in_flight > 0
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Replace the items directly (the provider's `setItems`)
    pub async fn set_items(&self, items: Vec<T>) {
        self.state.write().await.items = items;
    }

    pub async fn find<P>(&self, pred: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.state.read().await.items.iter().find(|i| pred(i)).cloned()
    }

    pub async fn filter<P>(&self, pred: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.state
            .read()
            .await
            .items
            .iter()
            .filter(|i| pred(i))
            .cloned()
            .collect()
    }

    /// Apply `f` to every item matching `pred`; returns how many matched.
    pub async fn update_where<P, F>(&self, pred: P, mut f: F) -> usize
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        let mut state = self.state.write().await;
        let mut touched = 0;
        for item in state.items.iter_mut().filter(|i| pred(i)) {
            f(item);
            touched += 1;
        }
        touched
    }

    /// Replace the first item matching `pred` wholesale; returns whether
    /// one was found.
    pub async fn replace_where<P>(&self, pred: P, item: T) -> bool
    where
        P: Fn(&T) -> bool,
    {
        let mut state = self.state.write().await;
        match state.items.iter_mut().find(|i| pred(i)) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Replace the matching item or append it.
    pub async fn upsert_where<P>(&self, pred: P, item: T)
    where
        P: Fn(&T) -> bool,
    {
        let mut state = self.state.write().await;
        match state.items.iter_mut().find(|i| pred(i)) {
            Some(slot) => *slot = item,
            None => state.items.push(item),
        }
    }

    /// Remove matching items; returns how many were removed.
    pub async fn remove_where<P>(&self, pred: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let mut state = self.state.write().await;
        let before = state.items.len();
        state.items.retain(|i| !pred(i));
        before - state.items.len()
    }
}
