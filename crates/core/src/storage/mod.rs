pub mod mongo;

use crate::domain::{RateRow, RateSnapshot};
use anyhow::Result;

/// Default cap on fetched fixings (most recent first).
pub const DEFAULT_FETCH_LIMIT: usize = 10_000;

#[async_trait::async_trait]
pub trait RateStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    /// Rows ordered by date descending, at most `limit` of them. Within one date the most
    /// recently written row comes first.
    async fn fetch_rows(&self, limit: usize) -> Result<Vec<RateRow>>;
}

/// Runs one query against `store` and materializes the result as a fresh snapshot.
pub async fn fetch_snapshot(store: &dyn RateStore, limit: usize) -> Result<RateSnapshot> {
    let t0 = std::time::Instant::now();
    let rows = store.fetch_rows(limit).await?;
    let fetched = rows.len();
    let snapshot = RateSnapshot::from_rows(rows, chrono::Utc::now(), limit);

    tracing::info!(
        store = store.store_name(),
        fetched,
        rows = snapshot.len(),
        newest = ?snapshot.newest_date(),
        elapsed_ms = t0.elapsed().as_millis(),
        "fetched rate snapshot"
    );

    Ok(snapshot)
}
