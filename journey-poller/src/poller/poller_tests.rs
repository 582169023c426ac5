//! Tests for the poll orchestrator.

use super::*;
use crate::domain::{DateSpec, JourneyData, JourneyOption, Place, RouteConfig, TimeSpec};
use crate::registry::RouteRegistry;
use crate::transperth::{ErrorKind, TransperthError};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn route(name: &str) -> RouteConfig {
    RouteConfig::new(
        name,
        Place::new(format!("{name} origin"), "-31.951,115.853"),
        Place::new(format!("{name} destination"), "-32.005,115.894"),
    )
}

fn registry(names: &[&str]) -> RouteRegistry {
    RouteRegistry::new(names.iter().map(|n| route(n))).unwrap()
}

/// Clock that only moves when told to.
struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    fn new(now: NaiveDateTime) -> Self {
        Self(Mutex::new(now))
    }

    fn set(&self, now: NaiveDateTime) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for Arc<ManualClock> {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

/// Fake planner: every route succeeds unless marked as failing.
#[derive(Default)]
struct MockSource {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MockSource {
    fn fail(&self, route: &str) {
        self.failing.lock().unwrap().insert(route.to_string());
    }

    fn recover(&self, route: &str) {
        self.failing.lock().unwrap().remove(route);
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_call(&self) -> (String, String, String) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

impl JourneySource for Arc<MockSource> {
    async fn fetch(
        &self,
        route: &RouteConfig,
        date: &str,
        time: &str,
    ) -> Result<JourneyData, TransperthError> {
        self.calls
            .lock()
            .unwrap()
            .push((route.name.clone(), date.to_string(), time.to_string()));

        if self.failing.lock().unwrap().contains(&route.name) {
            return Err(TransperthError::Timeout);
        }

        Ok(JourneyData {
            options: vec![JourneyOption {
                leave_time: "7:42am".into(),
                arrive_time: "8:51am".into(),
                travel_time: "69 mins".into(),
                legs: vec![],
                index: 1,
            }],
            from_location: route.from.location.clone(),
            to_location: route.to.location.clone(),
            date: date.to_string(),
            time: time.to_string(),
        })
    }
}

fn poller(
    names: &[&str],
) -> (
    Poller<Arc<MockSource>, Arc<ManualClock>>,
    Arc<MockSource>,
    Arc<ManualClock>,
) {
    let source = Arc::new(MockSource::default());
    let clock = Arc::new(ManualClock::new(at(2026, 1, 3, 7, 30)));
    let poller = Poller::with_clock(registry(names), source.clone(), clock.clone());
    (poller, source, clock)
}

#[tokio::test]
async fn failing_route_is_dropped_and_comes_back() {
    let (poller, source, _) = poller(&["a", "b", "c"]);
    source.fail("b");

    let snapshot = poller.poll_once().await;
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.get("a").is_some());
    assert!(snapshot.get("b").is_none());
    assert!(snapshot.get("c").is_some());
    match snapshot.status("b") {
        Some(RouteStatus::Failed { kind, message, .. }) => {
            assert_eq!(*kind, ErrorKind::Transport);
            assert_eq!(message, "request timed out");
        }
        other => panic!("expected failed status, got {other:?}"),
    }

    source.recover("b");
    let snapshot = poller.poll_once().await;
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.get("b").is_some());
    assert!(snapshot.status("b").unwrap().is_ok());
}

#[tokio::test]
async fn every_route_failing_yields_empty_snapshot() {
    let (poller, source, _) = poller(&["a", "b"]);
    source.fail("a");
    source.fail("b");

    let snapshot = poller.poll_once().await;
    assert!(snapshot.is_empty());
    assert!(snapshot.updated_at().is_some());
    assert!(!snapshot.status("a").unwrap().is_ok());
    assert!(!snapshot.status("b").unwrap().is_ok());
}

#[tokio::test]
async fn relative_date_follows_the_clock() {
    let (poller, source, clock) = poller(&["a"]);

    clock.set(at(2026, 1, 3, 23, 58));
    poller.poll_once().await;
    assert_eq!(
        source.last_call(),
        ("a".to_string(), "2026-01-03".to_string(), "23:58".to_string())
    );

    clock.set(at(2026, 1, 4, 0, 3));
    poller.poll_once().await;
    assert_eq!(
        source.last_call(),
        ("a".to_string(), "2026-01-04".to_string(), "00:03".to_string())
    );

    let snapshot = poller.snapshot().await;
    assert_eq!(snapshot.get("a").unwrap().date, "2026-01-04");
}

#[tokio::test]
async fn fixed_date_and_tomorrow() {
    let source = Arc::new(MockSource::default());
    let clock = Arc::new(ManualClock::new(at(2026, 12, 31, 18, 0)));

    let mut fixed = route("fixed");
    fixed.date = DateSpec::parse("2027-02-01");
    fixed.time = TimeSpec::parse("08:15");
    let mut later = route("later");
    later.date = DateSpec::Tomorrow;

    let poller = Poller::with_clock(
        RouteRegistry::new([fixed, later]).unwrap(),
        source.clone(),
        clock,
    );
    let snapshot = poller.poll_once().await;

    let fixed = snapshot.get("fixed").unwrap();
    assert_eq!((fixed.date.as_str(), fixed.time.as_str()), ("2027-02-01", "08:15"));
    let later = snapshot.get("later").unwrap();
    assert_eq!((later.date.as_str(), later.time.as_str()), ("2027-01-01", "18:00"));
}

#[tokio::test]
async fn readers_keep_the_snapshot_they_took() {
    let (poller, source, _) = poller(&["a", "b"]);

    let before = poller.poll_once().await;
    source.fail("a");
    let after = poller.poll_once().await;

    assert_eq!(before.len(), 2);
    assert_eq!(after.len(), 1);
    assert!(Arc::ptr_eq(&after, &poller.snapshot().await));
}

#[tokio::test]
async fn refreshing_one_route_replaces_only_that_entry() {
    let (poller, source, clock) = poller(&["a", "b"]);
    poller.poll_once().await;
    let calls = source.call_count();

    clock.set(at(2026, 1, 3, 9, 0));
    assert!(poller.refresh(Some("a")).await);
    assert_eq!(source.call_count(), calls + 1);

    let snapshot = poller.snapshot().await;
    assert_eq!(snapshot.get("a").unwrap().time, "09:00");
    assert_eq!(snapshot.get("b").unwrap().time, "07:30");

    source.fail("b");
    assert!(poller.refresh(Some("b")).await);
    let snapshot = poller.snapshot().await;
    assert!(snapshot.get("b").is_none());
    assert!(snapshot.get("a").is_some());
}

#[tokio::test]
async fn refreshing_unknown_route_is_a_no_op() {
    let (poller, source, _) = poller(&["a"]);
    let before = poller.poll_once().await;

    assert!(!poller.refresh(Some("nowhere")).await);
    assert_eq!(source.call_count(), 1);
    assert!(Arc::ptr_eq(&before, &poller.snapshot().await));
}

#[tokio::test]
async fn refresh_all_uses_the_poll_path() {
    let (poller, source, _) = poller(&["a", "b", "c"]);

    assert!(poller.refresh(None).await);
    assert_eq!(source.call_count(), 3);
    assert_eq!(poller.snapshot().await.len(), 3);
}

#[tokio::test]
async fn snapshot_is_empty_before_first_poll() {
    let (poller, _, _) = poller(&["a"]);
    let snapshot = poller.snapshot().await;
    assert!(snapshot.is_empty());
    assert!(snapshot.updated_at().is_none());
    assert!(snapshot.status("a").is_none());
}

#[tokio::test]
async fn run_polls_on_every_tick() {
    let (poller, source, _) = poller(&["a", "b"]);
    let poller = Arc::new(poller);

    let task = tokio::spawn(Arc::clone(&poller).run(Duration::from_millis(20)));
    tokio::time::sleep(Duration::from_millis(150)).await;
    task.abort();

    assert!(source.call_count() >= 4);
    assert_eq!(poller.snapshot().await.len(), 2);
}

/// Source that takes a while to answer.
#[derive(Default)]
struct SlowSource {
    calls: AtomicUsize,
}

impl JourneySource for Arc<SlowSource> {
    async fn fetch(
        &self,
        route: &RouteConfig,
        date: &str,
        time: &str,
    ) -> Result<JourneyData, TransperthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(JourneyData {
            options: vec![],
            from_location: route.from.location.clone(),
            to_location: route.to.location.clone(),
            date: date.to_string(),
            time: time.to_string(),
        })
    }
}

#[tokio::test]
async fn ticks_during_a_slow_cycle_are_skipped() {
    let source = Arc::new(SlowSource::default());
    let poller = Arc::new(Poller::new(registry(&["a"]), Arc::clone(&source)));

    let task = tokio::spawn(Arc::clone(&poller).run(Duration::from_millis(10)));
    tokio::time::sleep(Duration::from_millis(250)).await;
    task.abort();

    let started = source.calls.load(Ordering::SeqCst);
    assert!((1..=4).contains(&started), "started {started} cycles");

    // Nothing queued behind the running cycle
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(source.calls.load(Ordering::SeqCst) <= started + 1);
}
