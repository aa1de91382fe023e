//! Monthly Aggregation Service
//!
//! Rolls the previous calendar month of daily prices into one average per
//! card, then prunes daily rows that have left the retention window:
//! - Daily rows dated in last month → monthly average (mean of samples present)
//! - Daily rows older than `retention_days` → deleted

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::AggregationConfig;
use crate::error::JobError;
use crate::models::job::AggregationSummary;
use crate::models::price::{DailyPriceRecord, MonthlyAverageRecord, YearMonth};
use crate::services::catalog_store::{CatalogStore, UpsertRow};
use crate::services::upsert_writer::UpsertWriter;

/// First and last day of the month before `today`, both inclusive.
pub fn previous_month_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_of_this_month = today.with_day(1).unwrap_or(today);
    let last_of_previous = first_of_this_month - Duration::days(1);
    let first_of_previous = last_of_previous.with_day(1).unwrap_or(last_of_previous);
    (first_of_previous, last_of_previous)
}

/// Mean price and sample count per card. Cards with no rows are absent.
pub fn average_by_card(rows: &[DailyPriceRecord]) -> BTreeMap<String, (Decimal, u32)> {
    let mut sums: BTreeMap<String, (Decimal, u32)> = BTreeMap::new();
    for row in rows {
        let entry = sums.entry(row.card_id.clone()).or_insert((Decimal::ZERO, 0));
        entry.0 += row.price;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(card_id, (sum, count))| (card_id, (sum / Decimal::from(count), count)))
        .collect()
}

pub struct MonthlyAggregator {
    store: Arc<dyn CatalogStore>,
    writer: UpsertWriter,
    config: AggregationConfig,
}

impl MonthlyAggregator {
    pub fn new(store: Arc<dyn CatalogStore>, config: AggregationConfig) -> Self {
        let writer = UpsertWriter::new(store.clone(), config.upsert_retry.clone());
        Self {
            store,
            writer,
            config,
        }
    }

    pub async fn run_now(&self) -> Result<AggregationSummary, JobError> {
        self.run(Utc::now().date_naive()).await
    }

    /// Aggregate the month before `today` and prune old daily rows.
    ///
    /// Failing to read or prune ends the run; an abandoned monthly upsert is
    /// only counted.
    pub async fn run(&self, today: NaiveDate) -> Result<AggregationSummary, JobError> {
        let (start, end) = previous_month_range(today);
        let month = YearMonth::of(start);
        info!(month = %month, start = %start, end = %end, "Starting monthly aggregation");

        let rows = self
            .config
            .read_retry
            .run("daily_prices_between", || self.store.daily_prices_between(start, end))
            .await?;

        let averages = average_by_card(&rows);
        let mut summary = AggregationSummary {
            month,
            daily_rows_read: rows.len(),
            cards_averaged: 0,
            write_failed: 0,
            daily_rows_pruned: 0,
        };

        for (card_id, (avg_price, sample_count)) in averages {
            let row = UpsertRow::Monthly(MonthlyAverageRecord {
                card_id,
                year: month.year,
                month: month.month,
                avg_price,
                sample_count,
            });

            if self.writer.upsert(&row).await {
                summary.cards_averaged += 1;
            } else {
                summary.write_failed += 1;
            }
        }

        if summary.write_failed > 0 {
            warn!(
                month = %month,
                write_failed = summary.write_failed,
                "Some monthly averages were not stored"
            );
        }

        let cutoff = today - Duration::days(self.config.retention_days);
        summary.daily_rows_pruned = self
            .config
            .read_retry
            .run("delete_daily_prices_before", || {
                self.store.delete_daily_prices_before(cutoff)
            })
            .await?;

        info!(
            month = %month,
            daily_rows_read = summary.daily_rows_read,
            cards_averaged = summary.cards_averaged,
            write_failed = summary.write_failed,
            daily_rows_pruned = summary.daily_rows_pruned,
            cutoff = %cutoff,
            "Monthly aggregation complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(card_id: &str, day: NaiveDate, price: Decimal) -> DailyPriceRecord {
        DailyPriceRecord {
            card_id: card_id.to_string(),
            date: day,
            price,
        }
    }

    #[test]
    fn test_previous_month_range_mid_month() {
        assert_eq!(
            previous_month_range(date(2025, 7, 15)),
            (date(2025, 6, 1), date(2025, 6, 30))
        );
    }

    #[test]
    fn test_previous_month_range_january_wraps_year() {
        assert_eq!(
            previous_month_range(date(2025, 1, 1)),
            (date(2024, 12, 1), date(2024, 12, 31))
        );
    }

    #[test]
    fn test_previous_month_range_leap_february() {
        assert_eq!(
            previous_month_range(date(2024, 3, 1)),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn test_average_is_mean_of_present_samples() {
        let rows = vec![
            daily("base1-4", date(2025, 6, 1), dec!(10)),
            daily("base1-4", date(2025, 6, 2), dec!(12)),
            daily("base1-4", date(2025, 6, 3), dec!(14)),
            daily("base1-58", date(2025, 6, 9), dec!(3.5)),
        ];

        let averages = average_by_card(&rows);
        assert_eq!(averages.len(), 2);
        assert_eq!(averages["base1-4"], (dec!(12), 3));
        assert_eq!(averages["base1-58"], (dec!(3.5), 1));
    }

    #[test]
    fn test_average_of_nothing_is_empty() {
        assert!(average_by_card(&[]).is_empty());
    }
}
