use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hibor_core::domain::Maturity;
use hibor_core::refresh::{RefreshMode, SharedSnapshot};
use hibor_core::view::chart::{chart_figure, parse_selection, ChartFigure};
use hibor_core::view::table::{table_page, TablePage, DEFAULT_PAGE_SIZE};

use crate::page;

#[derive(Debug, Clone)]
pub struct AppState {
    pub shared: Arc<SharedSnapshot>,
    pub mode: RefreshMode,
    pub chart_row_limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/healthz", get(healthz))
        .route("/api/table", get(get_table))
        .route("/api/chart", get(get_chart))
        .route("/api/maturities", get(get_maturities))
        .route("/api/snapshot", get(get_snapshot_info))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct TableQuery {
    #[serde(default)]
    page: usize,
    #[serde(default = "default_page_size")]
    page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

async fn get_table(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<TablePage>, StatusCode> {
    if query.page_size == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let snapshot = state.shared.snapshot();
    Ok(Json(table_page(&snapshot, query.page, query.page_size)))
}

#[derive(Debug, Deserialize)]
struct ChartQuery {
    /// Comma separated maturity labels. Absent means the default selection.
    series: Option<String>,
}

async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Json<ChartFigure> {
    let selection = parse_selection(query.series.as_deref());
    let snapshot = state.shared.snapshot();
    let figure = chart_figure(&snapshot, &selection, state.chart_row_limit);

    tracing::debug!(
        selected = selection.len(),
        series = figure.series.len(),
        points = figure.point_count(),
        "chart rendered"
    );

    Json(figure)
}

#[derive(Debug, Serialize)]
struct MaturityOptions {
    options: Vec<Maturity>,
    default: Vec<Maturity>,
}

async fn get_maturities() -> Json<MaturityOptions> {
    Json(MaturityOptions {
        options: Maturity::ALL.to_vec(),
        default: Maturity::DEFAULT_SELECTION.to_vec(),
    })
}

#[derive(Debug, Serialize)]
struct SnapshotInfo {
    generation: u64,
    rows: usize,
    newest_date: Option<NaiveDate>,
    oldest_date: Option<NaiveDate>,
    fetched_at: DateTime<Utc>,
    refresh_mode: &'static str,
    refresh_interval_secs: Option<u64>,
    chart_row_limit: Option<usize>,
}

async fn get_snapshot_info(State(state): State<AppState>) -> Json<SnapshotInfo> {
    let current = state.shared.current();
    let snapshot = &current.snapshot;

    Json(SnapshotInfo {
        generation: current.generation,
        rows: snapshot.len(),
        newest_date: snapshot.newest_date(),
        oldest_date: snapshot.oldest_date(),
        fetched_at: snapshot.fetched_at,
        refresh_mode: state.mode.label(),
        refresh_interval_secs: match state.mode {
            RefreshMode::Once => None,
            RefreshMode::Interval(every) => Some(every.as_secs()),
        },
        chart_row_limit: state.chart_row_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hibor_core::domain::{RateRow, RateSnapshot};
    use std::time::Duration;

    fn state() -> AppState {
        let rows = vec![
            RateRow::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
                .with(Maturity::Overnight, Some(5.2))
                .with(Maturity::OneMonth, Some(5.3)),
            RateRow::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
                .with(Maturity::Overnight, Some(5.1))
                .with(Maturity::OneMonth, Some(5.25)),
        ];
        let fetched_at = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        AppState {
            shared: Arc::new(SharedSnapshot::new(RateSnapshot::from_rows(
                rows, fetched_at, 10_000,
            ))),
            mode: RefreshMode::Interval(Duration::from_secs(3600)),
            chart_row_limit: Some(1700),
        }
    }

    #[tokio::test]
    async fn table_rejects_zero_page_size() {
        let res = get_table(
            State(state()),
            Query(TableQuery {
                page: 0,
                page_size: 0,
            }),
        )
        .await;
        assert_eq!(res.unwrap_err(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn table_serves_requested_page() {
        let Json(page) = get_table(
            State(state()),
            Query(TableQuery {
                page: 1,
                page_size: 1,
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].cell(Maturity::Overnight), Some("5.100000"));
        assert!(page.rows[0].highlight.min);
    }

    #[tokio::test]
    async fn chart_defaults_and_empty_selection() {
        let Json(fig) = get_chart(State(state()), Query(ChartQuery { series: None })).await;
        // Series without any fixing still get a legend entry.
        assert_eq!(fig.series.len(), Maturity::DEFAULT_SELECTION.len());
        assert_eq!(fig.point_count(), 4);

        let Json(fig) = get_chart(
            State(state()),
            Query(ChartQuery {
                series: Some(String::new()),
            }),
        )
        .await;
        assert!(fig.series.is_empty());
    }

    #[tokio::test]
    async fn snapshot_info_tracks_publishes() {
        let state = state();
        let Json(info) = get_snapshot_info(State(state.clone())).await;
        assert_eq!(info.generation, 1);
        assert_eq!(info.rows, 2);
        assert_eq!(info.refresh_interval_secs, Some(3600));

        state.shared.publish(RateSnapshot::empty(Utc::now()));
        let Json(info) = get_snapshot_info(State(state)).await;
        assert_eq!(info.generation, 2);
        assert_eq!(info.rows, 0);
        assert_eq!(info.newest_date, None);
    }
}
