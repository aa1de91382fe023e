#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cardprice_backend::{
    config::{AggregationConfig, RefreshConfig},
    models::{card::CatalogItem, price::DailyPriceRecord},
    scrapers::PriceSource,
    services::{retry::RetryPolicy, sync_status::RunRecorder},
};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use sea_orm::DbErr;

/// Price source driven by per-card fixtures.
///
/// Cards without a configured price return `None`. Tracks how often each card
/// was looked up and how many lookups overlapped.
#[derive(Default)]
pub struct StubPriceSource {
    prices: HashMap<String, Decimal>,
    delays: HashMap<String, Duration>,
    panics: HashSet<String>,
    default_delay: Duration,
    calls: Mutex<HashMap<String, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, card_id: &str, price: Decimal) -> Self {
        self.prices.insert(card_id.to_string(), price);
        self
    }

    pub fn with_delay(mut self, card_id: &str, delay: Duration) -> Self {
        self.delays.insert(card_id.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_panic(mut self, card_id: &str) -> Self {
        self.panics.insert(card_id.to_string());
        self
    }

    pub fn calls_for(&self, card_id: &str) -> u32 {
        self.calls.lock().get(card_id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().values().sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for StubPriceSource {
    async fn fetch_price(&self, item: &CatalogItem) -> Option<Decimal> {
        *self.calls.lock().entry(item.id.clone()).or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = self
            .delays
            .get(&item.id)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panics.contains(&item.id) {
            panic!("stub lookup exploded for {}", item.id);
        }

        self.prices.get(&item.id).copied()
    }
}

/// A run as seen by the recorder: job name and error, if the run failed.
pub type RecordedRun = (String, Option<String>);

/// Keeps every recorded run in memory.
#[derive(Default)]
pub struct MemoryRecorder {
    runs: Mutex<Vec<RecordedRun>>,
}

impl MemoryRecorder {
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().clone()
    }
}

#[async_trait]
impl RunRecorder for MemoryRecorder {
    async fn record_success(&self, job_name: &'static str) -> Result<(), DbErr> {
        self.runs.lock().push((job_name.to_string(), None));
        Ok(())
    }

    async fn record_failure(&self, job_name: &'static str, error: &str) -> Result<(), DbErr> {
        self.runs
            .lock()
            .push((job_name.to_string(), Some(error.to_string())));
        Ok(())
    }
}

pub fn card(id: &str, name: &str, number: &str, set_name: &str) -> CatalogItem {
    CatalogItem::new(id, name, number, "set-1", set_name)
}

/// `count` cards named c000, c001, ... in one set
pub fn numbered_cards(count: usize) -> Vec<CatalogItem> {
    (0..count)
        .map(|i| card(&format!("c{:03}", i), "Card", &i.to_string(), "Base Set"))
        .collect()
}

pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::exponential(attempts, Duration::from_millis(1), Duration::from_millis(4))
}

pub fn refresh_config(worker_limit: usize) -> RefreshConfig {
    RefreshConfig {
        worker_limit,
        unit_timeout: Duration::from_secs(5),
        upsert_retry: fast_retry(3),
        catalog_retry: fast_retry(2),
        ..RefreshConfig::default()
    }
}

pub fn aggregation_config() -> AggregationConfig {
    AggregationConfig {
        upsert_retry: fast_retry(3),
        read_retry: fast_retry(2),
        ..AggregationConfig::default()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(12, 0, 0).unwrap()
}

pub fn daily(card_id: &str, day: NaiveDate, price: Decimal) -> DailyPriceRecord {
    DailyPriceRecord {
        card_id: card_id.to_string(),
        date: day,
        price,
    }
}
