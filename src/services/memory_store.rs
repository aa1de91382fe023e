//! In-process catalog store.
//!
//! Backs the integration tests and local dry runs. Keyed maps give it the
//! same one-row-per-key behaviour as the database upserts, including the
//! `previous_price` carry-over. Failures can be injected per operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::models::card::CatalogItem;
use crate::models::price::{
    DailyPriceRecord, MonthlyAverageRecord, PriceRecord, YearMonth,
};
use crate::services::catalog_store::{CatalogPage, CatalogStore, UpsertRow};

#[derive(Default)]
struct Tables {
    /// `None` marks a card row whose set is missing
    catalog: BTreeMap<String, Option<CatalogItem>>,
    prices: HashMap<(String, String), PriceRecord>,
    daily: BTreeMap<(String, NaiveDate), DailyPriceRecord>,
    monthly: HashMap<(String, i32, u32), MonthlyAverageRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// Number of upcoming upserts that fail before writes succeed again
    failing_writes: AtomicU32,
    /// Card ids whose upserts always fail
    rejected_cards: Mutex<Vec<String>>,
    catalog_unavailable: AtomicBool,
    daily_unavailable: AtomicBool,
    upsert_calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let store = Self::new();
        store.insert_catalog(items);
        store
    }

    pub fn insert_catalog(&self, items: impl IntoIterator<Item = CatalogItem>) {
        let mut tables = self.tables.lock();
        for item in items {
            tables.catalog.insert(item.id.clone(), Some(item));
        }
    }

    /// Add card rows that have no set. They take up catalog positions but
    /// never come back as items.
    pub fn insert_setless_cards<'a>(&self, ids: impl IntoIterator<Item = &'a str>) {
        let mut tables = self.tables.lock();
        for id in ids {
            tables.catalog.insert(id.to_string(), None);
        }
    }

    /// Seed a stored price directly, bypassing the failure switches.
    pub fn seed_price(&self, record: PriceRecord) {
        let key = (record.card_id.clone(), record.price_type.clone());
        self.tables.lock().prices.insert(key, record);
    }

    pub fn seed_daily(&self, records: impl IntoIterator<Item = DailyPriceRecord>) {
        let mut tables = self.tables.lock();
        for record in records {
            tables
                .daily
                .insert((record.card_id.clone(), record.date), record);
        }
    }

    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn reject_writes_for(&self, card_id: &str) {
        self.rejected_cards.lock().push(card_id.to_string());
    }

    pub fn set_catalog_unavailable(&self, unavailable: bool) {
        self.catalog_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make daily-row reads and deletes fail until switched back.
    pub fn set_daily_unavailable(&self, unavailable: bool) {
        self.daily_unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_daily(&self) -> Result<(), StoreError> {
        if self.daily_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("daily prices unreachable".to_string()));
        }
        Ok(())
    }

    pub fn daily_rows(&self) -> Vec<DailyPriceRecord> {
        self.tables.lock().daily.values().cloned().collect()
    }

    pub fn monthly_rows(&self) -> Vec<MonthlyAverageRecord> {
        let mut rows: Vec<_> = self.tables.lock().monthly.values().cloned().collect();
        rows.sort_by(|a, b| a.card_id.cmp(&b.card_id));
        rows
    }

    pub fn price_count(&self) -> usize {
        self.tables.lock().prices.len()
    }

    pub fn upsert_calls(&self) -> u64 {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn check_write(&self, row: &UpsertRow) -> Result<(), StoreError> {
        if self.rejected_cards.lock().iter().any(|id| id == row.card_id()) {
            return Err(StoreError::Unavailable(format!(
                "write to {} rejected for {}",
                row.table(),
                row.card_id()
            )));
        }

        let consumed = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(StoreError::Unavailable(format!(
                "injected failure writing {}",
                row.table()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn fetch_catalog_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<CatalogPage, StoreError> {
        if self.catalog_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("catalog unreachable".to_string()));
        }

        let tables = self.tables.lock();
        let rows: Vec<_> = tables
            .catalog
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(CatalogPage {
            scanned: rows.len() as u64,
            items: rows.into_iter().flatten().cloned().collect(),
        })
    }

    async fn upsert(&self, row: &UpsertRow) -> Result<(), StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write(row)?;

        let mut tables = self.tables.lock();
        match row {
            UpsertRow::Price(obs) => {
                let key = (obs.card_id.clone(), obs.price_type.clone());
                let previous_price = tables.prices.get(&key).map(|existing| existing.price);
                tables.prices.insert(
                    key,
                    PriceRecord {
                        card_id: obs.card_id.clone(),
                        price_type: obs.price_type.clone(),
                        price: obs.price,
                        previous_price,
                        source: obs.source.clone(),
                        updated_at: obs.observed_at,
                    },
                );
            }
            UpsertRow::Daily(daily) => {
                tables
                    .daily
                    .insert((daily.card_id.clone(), daily.date), daily.clone());
            }
            UpsertRow::Monthly(monthly) => {
                tables.monthly.insert(
                    (monthly.card_id.clone(), monthly.year, monthly.month),
                    monthly.clone(),
                );
            }
        }

        Ok(())
    }

    async fn daily_prices_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPriceRecord>, StoreError> {
        self.check_daily()?;
        let tables = self.tables.lock();
        Ok(tables
            .daily
            .values()
            .filter(|row| row.date >= start && row.date <= end)
            .cloned()
            .collect())
    }

    async fn delete_daily_prices_before(&self, cutoff: NaiveDate) -> Result<u64, StoreError> {
        self.check_daily()?;
        let mut tables = self.tables.lock();
        let before = tables.daily.len();
        tables.daily.retain(|(_, date), _| *date >= cutoff);
        Ok((before - tables.daily.len()) as u64)
    }

    async fn get_price(
        &self,
        card_id: &str,
        price_type: &str,
    ) -> Result<Option<PriceRecord>, StoreError> {
        let key = (card_id.to_string(), price_type.to_string());
        Ok(self.tables.lock().prices.get(&key).cloned())
    }

    async fn get_monthly_average(
        &self,
        card_id: &str,
        month: YearMonth,
    ) -> Result<Option<MonthlyAverageRecord>, StoreError> {
        let key = (card_id.to_string(), month.year, month.month);
        Ok(self.tables.lock().monthly.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price::PriceObservation;
    use rust_decimal_macros::dec;

    fn observation(price: rust_decimal::Decimal) -> UpsertRow {
        UpsertRow::Price(PriceObservation {
            card_id: "base1-58".to_string(),
            price_type: "market".to_string(),
            price,
            source: "pricecharting".to_string(),
            observed_at: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        })
    }

    #[tokio::test]
    async fn test_price_upsert_keeps_one_row_and_tracks_previous() {
        let store = MemoryStore::new();
        store.upsert(&observation(dec!(5))).await.unwrap();
        store.upsert(&observation(dec!(6))).await.unwrap();

        let record = store.get_price("base1-58", "market").await.unwrap().unwrap();
        assert_eq!(store.price_count(), 1);
        assert_eq!(record.price, dec!(6));
        assert_eq!(record.previous_price, Some(dec!(5)));
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next_writes(1);

        assert!(store.upsert(&observation(dec!(5))).await.is_err());
        assert!(store.upsert(&observation(dec!(5))).await.is_ok());
        assert_eq!(store.upsert_calls(), 2);
    }

    #[tokio::test]
    async fn test_catalog_pages() {
        let store = MemoryStore::with_catalog((0..5).map(|i| {
            CatalogItem::new(format!("c{}", i), "Card", "1", "s1", "Base Set")
        }));

        let page = store.fetch_catalog_page(3, 10).await.unwrap();
        assert_eq!(page.scanned, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, "c3");
    }

    #[tokio::test]
    async fn test_setless_cards_count_as_scanned() {
        let store = MemoryStore::with_catalog((0..3).map(|i| {
            CatalogItem::new(format!("c{}", i), "Card", "1", "s1", "Base Set")
        }));
        store.insert_setless_cards(["c1-orphan"]);

        let page = store.fetch_catalog_page(0, 3).await.unwrap();
        assert_eq!(page.scanned, 3);
        let ids: Vec<_> = page.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1"]);
    }
}
