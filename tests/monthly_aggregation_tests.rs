mod common;

use std::sync::Arc;

use cardprice_backend::{
    error::JobError,
    models::price::YearMonth,
    services::{
        catalog_store::CatalogStore, memory_store::MemoryStore,
        monthly_aggregation::MonthlyAggregator,
    },
};
use rust_decimal_macros::dec;

use crate::common::{aggregation_config, daily, date};

#[tokio::test]
async fn test_average_of_last_month_samples() {
    let store = Arc::new(MemoryStore::new());
    store.seed_daily([
        daily("base1-58", date(2025, 5, 3), dec!(10)),
        daily("base1-58", date(2025, 5, 17), dec!(12)),
        daily("base1-58", date(2025, 5, 31), dec!(14)),
        // outside last month, must not count
        daily("base1-58", date(2025, 4, 30), dec!(100)),
        daily("base1-58", date(2025, 6, 1), dec!(100)),
    ]);

    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());
    let summary = aggregator.run(date(2025, 6, 1)).await.unwrap();

    assert_eq!(summary.month, YearMonth { year: 2025, month: 5 });
    assert_eq!(summary.daily_rows_read, 3);
    assert_eq!(summary.cards_averaged, 1);

    let record = store
        .get_monthly_average("base1-58", summary.month)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.avg_price, dec!(12));
    assert_eq!(record.sample_count, 3);
}

#[tokio::test]
async fn test_card_without_samples_gets_no_record() {
    let store = Arc::new(MemoryStore::new());
    store.seed_daily([
        daily("base1-4", date(2025, 5, 10), dec!(300)),
        // only sampled in an earlier month
        daily("base1-2", date(2025, 4, 10), dec!(40)),
    ]);

    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());
    aggregator.run(date(2025, 6, 15)).await.unwrap();

    let rows = store.monthly_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].card_id, "base1-4");
    assert!(
        store
            .get_monthly_average("base1-2", YearMonth { year: 2025, month: 5 })
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_january_run_aggregates_previous_december() {
    let store = Arc::new(MemoryStore::new());
    store.seed_daily([
        daily("c1", date(2024, 12, 1), dec!(2)),
        daily("c1", date(2024, 12, 31), dec!(3)),
    ]);

    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());
    let summary = aggregator.run(date(2025, 1, 1)).await.unwrap();

    assert_eq!(summary.month, YearMonth { year: 2024, month: 12 });
    let rows = store.monthly_rows();
    assert_eq!(rows[0].avg_price, dec!(2.5));
    assert_eq!((rows[0].year, rows[0].month), (2024, 12));
}

#[tokio::test]
async fn test_rows_outside_retention_are_pruned() {
    let store = Arc::new(MemoryStore::new());
    let today = date(2025, 6, 1);
    // cutoff is 2025-03-03 for the default 90 days
    store.seed_daily([
        daily("c1", date(2025, 1, 15), dec!(1)),
        daily("c1", date(2025, 3, 2), dec!(1)),
        daily("c1", date(2025, 3, 3), dec!(1)),
        daily("c1", date(2025, 5, 20), dec!(1)),
    ]);

    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());
    let summary = aggregator.run(today).await.unwrap();

    assert_eq!(summary.daily_rows_pruned, 2);
    let remaining: Vec<_> = store.daily_rows().into_iter().map(|row| row.date).collect();
    assert_eq!(remaining, vec![date(2025, 3, 3), date(2025, 5, 20)]);
}

#[tokio::test]
async fn test_rerun_overwrites_monthly_record() {
    let store = Arc::new(MemoryStore::new());
    store.seed_daily([daily("c1", date(2025, 5, 2), dec!(8))]);
    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());

    aggregator.run(date(2025, 6, 1)).await.unwrap();
    store.seed_daily([daily("c1", date(2025, 5, 3), dec!(10))]);
    aggregator.run(date(2025, 6, 2)).await.unwrap();

    let rows = store.monthly_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].avg_price, dec!(9));
    assert_eq!(rows[0].sample_count, 2);
}

#[tokio::test]
async fn test_abandoned_monthly_write_is_counted() {
    let store = Arc::new(MemoryStore::new());
    store.seed_daily([
        daily("c1", date(2025, 5, 2), dec!(8)),
        daily("c2", date(2025, 5, 2), dec!(5)),
    ]);
    store.reject_writes_for("c2");

    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());
    let summary = aggregator.run(date(2025, 6, 1)).await.unwrap();

    assert_eq!(summary.cards_averaged, 1);
    assert_eq!(summary.write_failed, 1);
    assert_eq!(store.monthly_rows().len(), 1);
}

#[tokio::test]
async fn test_empty_month_produces_no_records() {
    let store = Arc::new(MemoryStore::new());
    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());

    let summary = aggregator.run(date(2025, 6, 1)).await.unwrap();

    assert_eq!(summary.daily_rows_read, 0);
    assert_eq!(summary.cards_averaged, 0);
    assert!(store.monthly_rows().is_empty());
}

#[tokio::test]
async fn test_unreadable_daily_prices_fail_the_run() {
    let store = Arc::new(MemoryStore::new());
    store.seed_daily([daily("c1", date(2025, 5, 2), dec!(8))]);
    store.set_daily_unavailable(true);

    let aggregator = MonthlyAggregator::new(store.clone(), aggregation_config());
    let result = aggregator.run(date(2025, 6, 1)).await;

    assert!(matches!(result, Err(JobError::Store(_))));
    assert!(store.monthly_rows().is_empty());
}
