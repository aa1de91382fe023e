use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::YearMonth;

/// How one card's unit of work ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// Price found and both rows written
    Updated { price: Decimal },
    /// Source had no price; stored rows left untouched
    NoPrice,
    /// Price found but at least one write was abandoned
    WriteFailed { price: Decimal },
    TimedOut,
    Panicked,
}

impl UnitOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, UnitOutcome::Updated { .. })
    }
}

/// Totals for one price refresh run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub submitted: usize,
    pub updated: usize,
    pub no_price: usize,
    pub write_failed: usize,
    pub timed_out: usize,
    pub panicked: usize,
}

impl RefreshSummary {
    pub fn record(&mut self, outcome: &UnitOutcome) {
        match outcome {
            UnitOutcome::Updated { .. } => self.updated += 1,
            UnitOutcome::NoPrice => self.no_price += 1,
            UnitOutcome::WriteFailed { .. } => self.write_failed += 1,
            UnitOutcome::TimedOut => self.timed_out += 1,
            UnitOutcome::Panicked => self.panicked += 1,
        }
    }

    pub fn completed(&self) -> usize {
        self.updated + self.failures()
    }

    pub fn failures(&self) -> usize {
        self.no_price + self.write_failed + self.timed_out + self.panicked
    }
}

/// Totals for one monthly aggregation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSummary {
    pub month: YearMonth,
    pub daily_rows_read: usize,
    pub cards_averaged: usize,
    pub write_failed: usize,
    pub daily_rows_pruned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_counts_failures() {
        let mut summary = RefreshSummary::default();
        summary.record(&UnitOutcome::Updated { price: dec!(1) });
        summary.record(&UnitOutcome::NoPrice);
        summary.record(&UnitOutcome::TimedOut);
        summary.record(&UnitOutcome::WriteFailed { price: dec!(2) });

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failures(), 3);
        assert_eq!(summary.completed(), 4);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(UnitOutcome::NoPrice).unwrap();
        assert_eq!(json["status"], "no_price");
    }
}
