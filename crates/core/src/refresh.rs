use crate::domain::RateSnapshot;
use crate::storage::{fetch_snapshot, RateStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Fetch at startup only.
    Once,
    /// Fetch at startup, then every interval.
    Interval(Duration),
}

impl RefreshMode {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshMode::Once => "once",
            RefreshMode::Interval(_) => "interval",
        }
    }
}

/// A snapshot together with the publish counter it was stored under.
#[derive(Debug, Clone)]
pub struct Published {
    pub generation: u64,
    pub snapshot: Arc<RateSnapshot>,
}

/// Current snapshot shared by every request handler. Writers replace the whole value; readers
/// clone the `Arc` out and never see a partially built snapshot.
#[derive(Debug)]
pub struct SharedSnapshot {
    tx: watch::Sender<Published>,
}

impl SharedSnapshot {
    pub fn new(initial: RateSnapshot) -> Self {
        let (tx, _) = watch::channel(Published {
            generation: 1,
            snapshot: Arc::new(initial),
        });
        Self { tx }
    }

    pub fn current(&self) -> Published {
        self.tx.borrow().clone()
    }

    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        Arc::clone(&self.tx.borrow().snapshot)
    }

    /// Swaps in `snapshot` and returns its generation.
    pub fn publish(&self, snapshot: RateSnapshot) -> u64 {
        let snapshot = Arc::new(snapshot);
        let mut generation = 0;
        self.tx.send_modify(|p| {
            p.generation += 1;
            p.snapshot = snapshot;
            generation = p.generation;
        });
        generation
    }
}

/// Re-fetches the snapshot on a fixed interval.
///
/// One fetch is in flight at a time: the next tick is only awaited after the current refresh
/// returns, and ticks missed during a slow fetch are delayed rather than replayed.
pub struct RefreshScheduler {
    store: Arc<dyn RateStore>,
    shared: Arc<SharedSnapshot>,
    every: Duration,
    fetch_limit: usize,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<dyn RateStore>,
        shared: Arc<SharedSnapshot>,
        every: Duration,
        fetch_limit: usize,
    ) -> Self {
        Self {
            store,
            shared,
            every,
            fetch_limit,
        }
    }

    /// Fetches and publishes. On error the previous snapshot stays current.
    pub async fn refresh_once(&self) -> anyhow::Result<u64> {
        let snapshot = fetch_snapshot(self.store.as_ref(), self.fetch_limit).await?;
        Ok(self.shared.publish(snapshot))
    }

    /// Ticks until `shutdown` resolves. The startup fetch is the caller's job, so the first
    /// refresh happens one interval after this is called.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval_at(Instant::now() + self.every, self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(every_secs = self.every.as_secs(), "refresh scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }

            match self.refresh_once().await {
                Ok(generation) => {
                    tracing::info!(generation, "rate snapshot refreshed");
                }
                Err(err) => {
                    let current = self.shared.current();
                    tracing::error!(
                        error = %format!("{err:#}"),
                        serving_generation = current.generation,
                        serving_rows = current.snapshot.len(),
                        "scheduled refresh failed; keeping previous snapshot"
                    );
                }
            }
        }

        tracing::info!("refresh scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Maturity, RateRow};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Every row of a fetch carries the same Overnight value: the number of the fetch.
    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail: AtomicBool,
        delay: Option<Duration>,
    }

    #[async_trait::async_trait]
    impl RateStore for CountingStore {
        fn store_name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_rows(&self, limit: usize) -> anyhow::Result<Vec<RateRow>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            anyhow::ensure!(!self.fail.load(Ordering::SeqCst), "store unavailable");
            Ok(rows(n as f64, limit.min(5)))
        }
    }

    fn rows(value: f64, n: usize) -> Vec<RateRow> {
        (0..n)
            .map(|i| {
                RateRow::new(NaiveDate::from_ymd_opt(2024, 1, 31 - i as u32).unwrap())
                    .with(Maturity::Overnight, Some(value))
            })
            .collect()
    }

    fn initial() -> RateSnapshot {
        RateSnapshot::from_rows(
            rows(0.0, 5),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
            100,
        )
    }

    #[test]
    fn publish_bumps_generation_and_swaps_whole_snapshot() {
        let shared = SharedSnapshot::new(initial());
        let before = shared.snapshot();
        assert_eq!(shared.current().generation, 1);

        let generation = shared.publish(RateSnapshot::empty(Utc::now()));
        assert_eq!(generation, 2);
        assert!(shared.snapshot().is_empty());
        // Readers holding the old Arc keep a complete old snapshot.
        assert_eq!(before.len(), 5);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let store = Arc::new(CountingStore::default());
        store.fail.store(true, Ordering::SeqCst);
        let shared = Arc::new(SharedSnapshot::new(initial()));
        let scheduler =
            RefreshScheduler::new(store.clone(), shared.clone(), Duration::from_secs(3600), 100);

        assert!(scheduler.refresh_once().await.is_err());
        assert_eq!(shared.current().generation, 1);
        assert_eq!(shared.snapshot().len(), 5);

        store.fail.store(false, Ordering::SeqCst);
        assert_eq!(scheduler.refresh_once().await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_refreshes_each_interval_until_shutdown() {
        let store = Arc::new(CountingStore::default());
        let shared = Arc::new(SharedSnapshot::new(initial()));
        let scheduler =
            RefreshScheduler::new(store.clone(), shared.clone(), Duration::from_secs(3600), 100);

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(async move {
            let _ = stop_rx.changed().await;
        }));

        tokio::time::sleep(Duration::from_secs(3600 * 3 + 1)).await;
        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(shared.current().generation, 4);
        let snap = shared.snapshot();
        assert!(snap
            .rows()
            .iter()
            .all(|r| r.get(Maturity::Overnight) == Some(3.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_never_overlap() {
        let store = Arc::new(CountingStore {
            delay: Some(Duration::from_secs(90)),
            ..Default::default()
        });
        let shared = Arc::new(SharedSnapshot::new(initial()));
        let scheduler =
            RefreshScheduler::new(store.clone(), shared.clone(), Duration::from_secs(60), 100);

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(async move {
            let _ = stop_rx.changed().await;
        }));

        tokio::time::sleep(Duration::from_secs(600)).await;
        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(store.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn readers_see_whole_snapshots_during_refresh() {
        let store = Arc::new(CountingStore::default());
        let shared = Arc::new(SharedSnapshot::new(initial()));
        let scheduler = Arc::new(RefreshScheduler::new(
            store,
            shared.clone(),
            Duration::from_secs(3600),
            100,
        ));

        let writer = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    scheduler.refresh_once().await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..200 {
            let snap = shared.snapshot();
            let first = snap.rows()[0].get(Maturity::Overnight);
            assert!(snap
                .rows()
                .iter()
                .all(|r| r.get(Maturity::Overnight) == first));
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(shared.current().generation, 51);
    }
}
