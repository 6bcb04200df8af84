use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-tenor Hibor fixing. Variant order is the canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Maturity {
    #[serde(rename = "Overnight")]
    Overnight,
    #[serde(rename = "1 Week")]
    OneWeek,
    #[serde(rename = "2 Weeks")]
    TwoWeeks,
    #[serde(rename = "1 Month")]
    OneMonth,
    #[serde(rename = "2 Months")]
    TwoMonths,
    #[serde(rename = "3 Months")]
    ThreeMonths,
    #[serde(rename = "6 Months")]
    SixMonths,
    #[serde(rename = "12 Months")]
    TwelveMonths,
}

impl Maturity {
    pub const COUNT: usize = 8;

    pub const ALL: [Maturity; Self::COUNT] = [
        Maturity::Overnight,
        Maturity::OneWeek,
        Maturity::TwoWeeks,
        Maturity::OneMonth,
        Maturity::TwoMonths,
        Maturity::ThreeMonths,
        Maturity::SixMonths,
        Maturity::TwelveMonths,
    ];

    /// Checklist selection on first page load.
    pub const DEFAULT_SELECTION: [Maturity; 5] = [
        Maturity::Overnight,
        Maturity::OneMonth,
        Maturity::ThreeMonths,
        Maturity::SixMonths,
        Maturity::TwelveMonths,
    ];

    /// Column driving the table's max/min highlight.
    pub const HIGHLIGHT: Maturity = Maturity::OneMonth;

    pub fn label(self) -> &'static str {
        match self {
            Maturity::Overnight => "Overnight",
            Maturity::OneWeek => "1 Week",
            Maturity::TwoWeeks => "2 Weeks",
            Maturity::OneMonth => "1 Month",
            Maturity::TwoMonths => "2 Months",
            Maturity::ThreeMonths => "3 Months",
            Maturity::SixMonths => "6 Months",
            Maturity::TwelveMonths => "12 Months",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|m| m.label() == label)
    }

    /// Position in [`Maturity::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Maturity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_and_index_matches_order() {
        for (i, m) in Maturity::ALL.into_iter().enumerate() {
            assert_eq!(Maturity::from_label(m.label()), Some(m));
            assert_eq!(m.index(), i);
        }
    }

    #[test]
    fn from_label_trims_and_rejects_unknown() {
        assert_eq!(Maturity::from_label(" 1 Month "), Some(Maturity::OneMonth));
        assert_eq!(Maturity::from_label("1 month"), None);
        assert_eq!(Maturity::from_label("Date"), None);
    }

    #[test]
    fn serializes_as_label() {
        let v = serde_json::to_value(Maturity::TwelveMonths).unwrap();
        assert_eq!(v, serde_json::json!("12 Months"));
    }
}
