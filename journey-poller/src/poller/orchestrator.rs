//! Poll cycle orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::{JourneyData, RouteConfig};
use crate::registry::RouteRegistry;
use crate::transperth::TransperthError;

use super::clock::{Clock, SystemClock};
use super::snapshot::Snapshot;
use super::source::JourneySource;

/// Polls every route in a registry and publishes the results.
///
/// The poller is the only writer of its [`Snapshot`]. Readers get an
/// `Arc` to a complete snapshot and never see one being built.
pub struct Poller<S, C = SystemClock> {
    registry: RouteRegistry,
    source: S,
    clock: C,
    published: RwLock<Arc<Snapshot>>,
    /// Serializes cycles and manual refreshes so commits never interleave.
    cycle: Arc<Mutex<()>>,
}

impl<S: JourneySource> Poller<S, SystemClock> {
    pub fn new(registry: RouteRegistry, source: S) -> Self {
        Self::with_clock(registry, source, SystemClock)
    }
}

impl<S: JourneySource, C: Clock> Poller<S, C> {
    pub fn with_clock(registry: RouteRegistry, source: S, clock: C) -> Self {
        Self {
            registry,
            source,
            clock,
            published: RwLock::new(Arc::new(Snapshot::default())),
            cycle: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// The most recently published snapshot.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.published.read().await.clone()
    }

    /// Fetch every route concurrently and publish a fresh snapshot.
    ///
    /// Never fails: a route that cannot be fetched is left out of the new
    /// snapshot, so the worst outcome is an empty one.
    pub async fn poll_once(&self) -> Arc<Snapshot> {
        let _cycle = self.cycle.lock().await;
        self.poll_locked().await
    }

    /// One full cycle. The caller holds `cycle`.
    async fn poll_locked(&self) -> Arc<Snapshot> {
        let now = self.clock.now();

        let fetches = self.registry.iter().map(|route| async move {
            let result = self.fetch_route(route, now).await;
            (route.name.as_str(), result)
        });
        let results = join_all(fetches).await;

        let mut snapshot = Snapshot::new(now);
        for (name, result) in results {
            record(&mut snapshot, name, result, now);
        }

        info!(
            attempted = self.registry.len(),
            succeeded = snapshot.len(),
            "Poll cycle complete"
        );

        self.publish(snapshot).await
    }

    /// Refresh out of band, through the same path as a scheduled poll.
    ///
    /// With no route, refreshes everything. With a route, only that entry
    /// of the current snapshot is replaced. Returns `false` for an unknown
    /// route, which is not an error.
    pub async fn refresh(&self, route: Option<&str>) -> bool {
        let Some(name) = route else {
            self.poll_once().await;
            return true;
        };

        let Some(route) = self.registry.get(name) else {
            warn!(route = %name, "Refresh requested for unknown route");
            return false;
        };

        let _cycle = self.cycle.lock().await;
        let now = self.clock.now();
        let result = self.fetch_route(route, now).await;

        let mut snapshot = Snapshot::clone(&*self.snapshot().await);
        record(&mut snapshot, &route.name, result, now);
        self.publish(snapshot).await;
        true
    }

    /// Poll forever, once immediately and then every `every`.
    ///
    /// Each cycle runs on its own task, so a slow upstream never delays the
    /// timer itself. A tick that arrives while a cycle or refresh is still
    /// running is skipped.
    pub async fn run(self: Arc<Self>, every: Duration)
    where
        S: 'static,
        C: 'static,
    {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let Ok(guard) = Arc::clone(&self.cycle).try_lock_owned() else {
                warn!("Previous poll still running, skipping tick");
                continue;
            };
            let poller = Arc::clone(&self);
            tokio::spawn(async move {
                let _cycle = guard;
                poller.poll_locked().await;
            });
        }
    }

    async fn fetch_route(
        &self,
        route: &RouteConfig,
        now: NaiveDateTime,
    ) -> Result<JourneyData, TransperthError> {
        let date = route.date.resolve(now);
        let time = route.time.resolve(now);
        debug!(route = %route.name, %date, %time, "Fetching route");
        self.source.fetch(route, &date, &time).await
    }

    async fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.published.write().await = Arc::clone(&snapshot);
        snapshot
    }
}

fn record(
    snapshot: &mut Snapshot,
    route: &str,
    result: Result<JourneyData, TransperthError>,
    at: NaiveDateTime,
) {
    match result {
        Ok(data) => {
            debug!(route = %route, options = data.options.len(), "Route fetched");
            snapshot.insert(route, data, at);
        }
        Err(e) => {
            let kind = e.kind();
            error!(route = %route, %kind, error = %e, "Failed to fetch route");
            snapshot.fail(route, kind, e.to_string(), at);
        }
    }
}
