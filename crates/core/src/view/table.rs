use crate::domain::{Maturity, RateRow, RateSnapshot};
use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Only the most recent rows are ever shown in the table, whatever page is requested.
pub const DISPLAY_ROW_LIMIT: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 10;
const RATE_PRECISION: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub max: bool,
    pub min: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub date: NaiveDate,
    cells: [Option<String>; Maturity::COUNT],
    pub highlight: Highlight,
}

impl TableRow {
    pub fn cell(&self, maturity: Maturity) -> Option<&str> {
        self.cells[maturity.index()].as_deref()
    }
}

// Flat record keyed by column label, the shape the table widget consumes.
impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Maturity::COUNT + 2))?;
        map.serialize_entry("Date", &self.date.format("%Y-%m-%d").to_string())?;
        for maturity in Maturity::ALL {
            map.serialize_entry(maturity.label(), &self.cells[maturity.index()])?;
        }
        map.serialize_entry("highlight", &self.highlight)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Rows in the display window, not in the snapshot.
    pub total_rows: usize,
    pub columns: Vec<&'static str>,
    pub highlight_column: Maturity,
    pub highlight_max: Option<f64>,
    pub highlight_min: Option<f64>,
    pub rows: Vec<TableRow>,
}

/// One page of the display window: `head(100)[p*s .. (p+1)*s]`. A page past the end is empty.
pub fn table_page(snapshot: &RateSnapshot, page_index: usize, page_size: usize) -> TablePage {
    let window = snapshot.head(DISPLAY_ROW_LIMIT);
    let (max, min) = extremes(window, Maturity::HIGHLIGHT);

    let start = page_index.saturating_mul(page_size);
    let page: &[RateRow] = if page_size == 0 || start >= window.len() {
        &[]
    } else {
        &window[start..start.saturating_add(page_size).min(window.len())]
    };

    let rows = page
        .iter()
        .map(|row| {
            let value = row.get(Maturity::HIGHLIGHT);
            TableRow {
                date: row.date,
                cells: Maturity::ALL.map(|m| row.get(m).map(format_rate)),
                highlight: Highlight {
                    max: value.is_some() && value == max,
                    min: value.is_some() && value == min,
                },
            }
        })
        .collect();

    TablePage {
        page_index,
        page_size,
        page_count: if page_size == 0 {
            0
        } else {
            window.len().div_ceil(page_size)
        },
        total_rows: window.len(),
        columns: std::iter::once("Date")
            .chain(Maturity::ALL.iter().map(|m| m.label()))
            .collect(),
        highlight_column: Maturity::HIGHLIGHT,
        highlight_max: max,
        highlight_min: min,
        rows,
    }
}

/// Fixed-point with six decimals; negatives in parentheses.
pub fn format_rate(value: f64) -> String {
    let body = format!("{:.*}", RATE_PRECISION, value.abs());
    if value < 0.0 {
        format!("({body})")
    } else {
        body
    }
}

fn extremes(rows: &[RateRow], maturity: Maturity) -> (Option<f64>, Option<f64>) {
    rows.iter()
        .filter_map(|r| r.get(maturity))
        .fold((None, None), |(max, min): (Option<f64>, Option<f64>), v| {
            (
                Some(max.map_or(v, |m| m.max(v))),
                Some(min.map_or(v, |m| m.min(v))),
            )
        })
}
