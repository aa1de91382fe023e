//! Storage seam shared by the price refresh and monthly aggregation jobs.
//!
//! Every write goes through [`CatalogStore::upsert`] with a row that names its
//! own table and conflict key, so the backing store enforces uniqueness per
//! row and callers never coordinate with each other.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::card::CatalogItem;
use crate::models::price::{
    DailyPriceRecord, MonthlyAverageRecord, PriceObservation, PriceRecord, YearMonth,
};

/// A row written with insert-or-overwrite semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertRow {
    Price(PriceObservation),
    Daily(DailyPriceRecord),
    Monthly(MonthlyAverageRecord),
}

impl UpsertRow {
    pub fn table(&self) -> &'static str {
        match self {
            UpsertRow::Price(_) => "card_prices",
            UpsertRow::Daily(_) => "daily_card_prices",
            UpsertRow::Monthly(_) => "monthly_card_prices",
        }
    }

    /// Columns the store resolves conflicts on
    pub fn conflict_key(&self) -> &'static [&'static str] {
        match self {
            UpsertRow::Price(_) => &["card_id", "price_type"],
            UpsertRow::Daily(_) => &["card_id", "date"],
            UpsertRow::Monthly(_) => &["card_id", "year", "month"],
        }
    }

    pub fn card_id(&self) -> &str {
        match self {
            UpsertRow::Price(row) => &row.card_id,
            UpsertRow::Daily(row) => &row.card_id,
            UpsertRow::Monthly(row) => &row.card_id,
        }
    }
}

/// One page of the catalog.
///
/// `scanned` counts every card row the page covered, including rows that
/// could not be turned into a [`CatalogItem`], so paging never depends on
/// what was filtered out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub scanned: u64,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Cards ordered by id, `limit` rows starting at `offset`.
    async fn fetch_catalog_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<CatalogPage, StoreError>;

    async fn upsert(&self, row: &UpsertRow) -> Result<(), StoreError>;

    /// Daily rows with `start <= date <= end`.
    async fn daily_prices_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPriceRecord>, StoreError>;

    /// Delete daily rows dated strictly before `cutoff`, returning the count.
    async fn delete_daily_prices_before(&self, cutoff: NaiveDate) -> Result<u64, StoreError>;

    async fn get_price(
        &self,
        card_id: &str,
        price_type: &str,
    ) -> Result<Option<PriceRecord>, StoreError>;

    async fn get_monthly_average(
        &self,
        card_id: &str,
        month: YearMonth,
    ) -> Result<Option<MonthlyAverageRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conflict_keys() {
        let daily = UpsertRow::Daily(DailyPriceRecord {
            card_id: "sv1-25".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            price: dec!(3.10),
        });
        assert_eq!(daily.table(), "daily_card_prices");
        assert_eq!(daily.conflict_key(), &["card_id", "date"]);
        assert_eq!(daily.card_id(), "sv1-25");

        let monthly = UpsertRow::Monthly(MonthlyAverageRecord {
            card_id: "sv1-25".to_string(),
            year: 2025,
            month: 4,
            avg_price: dec!(3),
            sample_count: 30,
        });
        assert_eq!(monthly.conflict_key(), &["card_id", "year", "month"]);
    }
}
