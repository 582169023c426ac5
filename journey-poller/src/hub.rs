//! Process-wide registry of pollers.
//!
//! Each configured instance owns one [`Poller`]. The hub maps instance ids
//! to pollers so a single manual refresh request can reach any of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::poller::{Clock, JourneySource, Poller, Snapshot};

/// Type-erased view of a poller, as stored in the hub.
pub trait PollHandle: Send + Sync {
    fn snapshot(&self) -> BoxFuture<'_, Arc<Snapshot>>;

    /// See [`Poller::refresh`].
    fn refresh<'a>(&'a self, route: Option<&'a str>) -> BoxFuture<'a, bool>;

    /// Configured route names, in configuration order.
    fn route_names(&self) -> Vec<String>;

    fn has_route(&self, route: &str) -> bool;
}

impl<S: JourneySource, C: Clock> PollHandle for Poller<S, C> {
    fn snapshot(&self) -> BoxFuture<'_, Arc<Snapshot>> {
        Poller::snapshot(self).boxed()
    }

    fn refresh<'a>(&'a self, route: Option<&'a str>) -> BoxFuture<'a, bool> {
        Poller::refresh(self, route).boxed()
    }

    fn route_names(&self) -> Vec<String> {
        self.registry().names().map(str::to_string).collect()
    }

    fn has_route(&self, route: &str) -> bool {
        self.registry().get(route).is_some()
    }
}

/// Instance id to poller mapping.
///
/// Cloning is cheap; clones share the same mapping.
#[derive(Clone, Default)]
pub struct PollerHub {
    inner: Arc<RwLock<BTreeMap<String, Arc<dyn PollHandle>>>>,
}

impl PollerHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a poller under `entry_id`.
    ///
    /// Registering an id that is already present keeps the existing poller
    /// and returns `false`.
    pub async fn register(&self, entry_id: impl Into<String>, poller: Arc<dyn PollHandle>) -> bool {
        let entry_id = entry_id.into();
        let mut guard = self.inner.write().await;
        if guard.contains_key(&entry_id) {
            warn!(entry_id = %entry_id, "Instance already registered");
            return false;
        }
        info!(entry_id = %entry_id, routes = poller.route_names().len(), "Registered instance");
        guard.insert(entry_id, poller);
        true
    }

    /// Remove a poller. Returns `false` if the id was not registered.
    pub async fn unregister(&self, entry_id: &str) -> bool {
        self.inner.write().await.remove(entry_id).is_some()
    }

    pub async fn get(&self, entry_id: &str) -> Option<Arc<dyn PollHandle>> {
        self.inner.read().await.get(entry_id).cloned()
    }

    /// Registered instance ids, sorted.
    pub async fn entry_ids(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Manual refresh.
    ///
    /// `entry_id` limits the refresh to one instance and `route` to one
    /// route. With neither, every route of every instance is refreshed.
    /// Filters that match nothing log a warning and do nothing. Returns the
    /// number of instances refreshed.
    pub async fn refresh(&self, entry_id: Option<&str>, route: Option<&str>) -> usize {
        let targets: Vec<(String, Arc<dyn PollHandle>)> = {
            let guard = self.inner.read().await;
            guard
                .iter()
                .filter(|(id, _)| entry_id.is_none_or(|wanted| wanted == id.as_str()))
                .filter(|(_, poller)| route.is_none_or(|r| poller.has_route(r)))
                .map(|(id, poller)| (id.clone(), Arc::clone(poller)))
                .collect()
        };

        if targets.is_empty() {
            warn!(?entry_id, ?route, "Refresh matched no instance");
            return 0;
        }

        let refreshes = targets.iter().map(|(id, poller)| async move {
            info!(entry_id = %id, ?route, "Manual refresh");
            poller.refresh(route).await
        });

        join_all(refreshes).await.into_iter().filter(|ran| *ran).count()
    }
}
