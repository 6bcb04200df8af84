use crate::domain::maturity::Maturity;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One fixing date across every maturity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub date: NaiveDate,
    values: [Option<f64>; Maturity::COUNT],
}

impl RateRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: [None; Maturity::COUNT],
        }
    }

    pub fn with(mut self, maturity: Maturity, value: Option<f64>) -> Self {
        self.set(maturity, value);
        self
    }

    pub fn get(&self, maturity: Maturity) -> Option<f64> {
        self.values[maturity.index()]
    }

    pub fn set(&mut self, maturity: Maturity, value: Option<f64>) {
        self.values[maturity.index()] = value;
    }
}

/// Un-pivoted `(date, series, value)` triple used for charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LongRow {
    pub date: NaiveDate,
    pub maturity: Maturity,
    pub value: Option<f64>,
}

/// Immutable table of fixings as held by the process. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSnapshot {
    pub fetched_at: DateTime<Utc>,
    rows: Vec<RateRow>,
}

impl RateSnapshot {
    /// Builds a snapshot from rows in fetch order, capped at `limit` rows.
    ///
    /// A date seen more than once keeps its first row. The store sorts the most recently written
    /// document first within a date, so this resolves duplicates as last-write-wins.
    pub fn from_rows(rows: Vec<RateRow>, fetched_at: DateTime<Utc>, limit: usize) -> Self {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut out = Vec::with_capacity(rows.len().min(limit));
        let mut dropped = 0usize;
        for row in rows {
            if out.len() >= limit {
                break;
            }
            if seen.insert(row.date) {
                out.push(row);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::warn!(dropped, "duplicate fixing dates in rate snapshot; kept latest write");
        }

        Self {
            fetched_at,
            rows: out,
        }
    }

    pub fn empty(fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    /// The first `n` rows (most recent first, as fetched).
    pub fn head(&self, n: usize) -> &[RateRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn newest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    pub fn oldest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).min()
    }

    /// Re-spreads long rows into one row per date, in first-appearance order of the dates.
    pub fn from_long_rows(long: &[LongRow], fetched_at: DateTime<Utc>) -> Self {
        let mut index: HashMap<NaiveDate, usize> = HashMap::new();
        let mut rows: Vec<RateRow> = Vec::new();
        for lr in long {
            let i = *index.entry(lr.date).or_insert_with(|| {
                rows.push(RateRow::new(lr.date));
                rows.len() - 1
            });
            rows[i].set(lr.maturity, lr.value);
        }
        Self { fetched_at, rows }
    }
}

/// Wide-to-long melt: every maturity column in canonical order, each over every row.
/// Nulls are kept.
pub fn unpivot(rows: &[RateRow]) -> Vec<LongRow> {
    let mut out = Vec::with_capacity(rows.len() * Maturity::ALL.len());
    for maturity in Maturity::ALL {
        out.extend(rows.iter().map(|row| LongRow {
            date: row.date,
            maturity,
            value: row.get(maturity),
        }));
    }
    out
}
