use crate::domain::{unpivot, LongRow, Maturity, RateSnapshot};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: Maturity,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendAnchor {
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub y_tick0: f64,
    pub y_dtick: f64,
    pub legend: LegendAnchor,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            y_tick0: 0.25,
            y_dtick: 1.0,
            legend: LegendAnchor {
                x: 0.01,
                y: 0.99,
                xanchor: "left",
                yanchor: "top",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFigure {
    /// Snapshot rows fed into the melt.
    pub rows_considered: usize,
    pub series: Vec<ChartSeries>,
    pub layout: ChartLayout,
}

impl ChartFigure {
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

/// Parses a comma separated list of maturity labels. `None` yields the default selection,
/// an empty string the empty one. Unknown labels are skipped.
pub fn parse_selection(raw: Option<&str>) -> BTreeSet<Maturity> {
    match raw {
        None => Maturity::DEFAULT_SELECTION.into_iter().collect(),
        Some(raw) => raw
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .filter_map(|label| {
                let parsed = Maturity::from_label(label);
                if parsed.is_none() {
                    tracing::debug!(label, "ignoring unknown maturity in selection");
                }
                parsed
            })
            .collect(),
    }
}

/// Keeps the long rows whose series is selected, preserving order.
pub fn filter_selected(long: &[LongRow], selection: &BTreeSet<Maturity>) -> Vec<LongRow> {
    long.iter()
        .filter(|lr| selection.contains(&lr.maturity))
        .copied()
        .collect()
}

/// Melts the first `row_limit` rows (all rows when `None`), filters to `selection` and groups
/// the remaining values into one series per maturity, in first-appearance order.
pub fn chart_figure(
    snapshot: &RateSnapshot,
    selection: &BTreeSet<Maturity>,
    row_limit: Option<usize>,
) -> ChartFigure {
    let rows = match row_limit {
        Some(n) => snapshot.head(n),
        None => snapshot.rows(),
    };

    let long = filter_selected(&unpivot(rows), selection);

    let mut series: Vec<ChartSeries> = Vec::new();
    for lr in long {
        let idx = match series.iter().position(|s| s.name == lr.maturity) {
            Some(i) => i,
            None => {
                series.push(ChartSeries {
                    name: lr.maturity,
                    points: Vec::new(),
                });
                series.len() - 1
            }
        };
        if let Some(value) = lr.value {
            series[idx].points.push(ChartPoint {
                date: lr.date,
                value,
            });
        }
    }

    ChartFigure {
        rows_considered: rows.len(),
        series,
        layout: ChartLayout::default(),
    }
}
