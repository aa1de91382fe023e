//! Price refresh fan-out.
//!
//! Pages through the catalog and runs one unit of work per card on a bounded
//! pool: look the price up, then upsert the current price and today's daily
//! row. A unit that errors, panics or exceeds its timeout is recorded as a
//! failure for that card only. The run ends once every submitted unit has
//! reported back.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use futures_util::FutureExt;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::RefreshConfig;
use crate::error::JobError;
use crate::models::card::CatalogItem;
use crate::models::job::{RefreshSummary, UnitOutcome};
use crate::models::price::{DailyPriceRecord, PriceObservation};
use crate::scrapers::PriceSource;
use crate::scrapers::slug::derive_lookup_key;
use crate::services::catalog_store::{CatalogStore, UpsertRow};
use crate::services::upsert_writer::UpsertWriter;

pub struct PriceRefresher {
    store: Arc<dyn CatalogStore>,
    source: Arc<dyn PriceSource>,
    writer: UpsertWriter,
    config: RefreshConfig,
}

/// Everything one unit of work needs, shared by all units of a run
struct UnitContext {
    source: Arc<dyn PriceSource>,
    writer: UpsertWriter,
    price_type: String,
    source_label: String,
    observed_at: NaiveDateTime,
    today: NaiveDate,
}

impl PriceRefresher {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        source: Arc<dyn PriceSource>,
        config: RefreshConfig,
    ) -> Self {
        let writer = UpsertWriter::new(store.clone(), config.upsert_retry.clone());
        Self {
            store,
            source,
            writer,
            config,
        }
    }

    pub async fn run(&self) -> Result<RefreshSummary, JobError> {
        self.run_at(Utc::now().naive_utc()).await
    }

    /// Refresh every card, stamping rows as observed at `now`.
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<RefreshSummary, JobError> {
        let worker_limit = self.config.worker_limit.max(1);
        let batch_size = self.config.batch_size.max(1);

        info!(
            worker_limit,
            batch_size,
            unit_timeout = ?self.config.unit_timeout,
            "Starting price refresh"
        );

        let ctx = Arc::new(UnitContext {
            source: self.source.clone(),
            writer: self.writer.clone(),
            price_type: self.config.price_type.clone(),
            source_label: self.config.source_label.clone(),
            observed_at: now,
            today: now.date(),
        });

        let semaphore = Arc::new(Semaphore::new(worker_limit));
        let mut units = JoinSet::new();
        let mut summary = RefreshSummary::default();
        let mut offset = 0u64;
        let mut catalog_error = None;

        'pages: loop {
            let page = match self
                .config
                .catalog_retry
                .run("catalog_page", || self.store.fetch_catalog_page(offset, batch_size))
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(offset, error = %e, "Failed to read catalog page");
                    catalog_error = Some(e);
                    break;
                }
            };

            let scanned = page.scanned;
            info!(offset, scanned, cards = page.items.len(), "Read catalog page");

            for item in page.items {
                // The semaphore is never closed, so this only waits for a free worker
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break 'pages;
                };

                let ctx = ctx.clone();
                let unit_timeout = self.config.unit_timeout;
                summary.submitted += 1;

                units.spawn(async move {
                    let _permit = permit;
                    let outcome = match tokio::time::timeout(
                        unit_timeout,
                        AssertUnwindSafe(ctx.process(&item)).catch_unwind(),
                    )
                    .await
                    {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(_)) => UnitOutcome::Panicked,
                        Err(_) => UnitOutcome::TimedOut,
                    };
                    log_outcome(&item, &outcome);
                    outcome
                });
            }

            if scanned < batch_size {
                break;
            }
            offset += scanned;
        }

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!(error = %e, "Refresh unit did not complete");
                    summary.record(&UnitOutcome::Panicked);
                }
            }
        }

        info!(
            submitted = summary.submitted,
            updated = summary.updated,
            no_price = summary.no_price,
            write_failed = summary.write_failed,
            timed_out = summary.timed_out,
            panicked = summary.panicked,
            failures = summary.failures(),
            "Price refresh finished"
        );

        match catalog_error {
            Some(e) => Err(JobError::Catalog(e)),
            None => Ok(summary),
        }
    }
}

impl UnitContext {
    async fn process(&self, item: &CatalogItem) -> UnitOutcome {
        let price = match self.source.fetch_price(item).await {
            Some(price) if price > Decimal::ZERO => price,
            // zero or nothing: keep whatever price is already stored
            _ => return UnitOutcome::NoPrice,
        };

        let current = UpsertRow::Price(PriceObservation {
            card_id: item.id.clone(),
            price_type: self.price_type.clone(),
            price,
            source: self.source_label.clone(),
            observed_at: self.observed_at,
        });
        let daily = UpsertRow::Daily(DailyPriceRecord {
            card_id: item.id.clone(),
            date: self.today,
            price,
        });

        let (current_written, daily_written) =
            tokio::join!(self.writer.upsert(&current), self.writer.upsert(&daily));

        if current_written && daily_written {
            UnitOutcome::Updated { price }
        } else {
            UnitOutcome::WriteFailed { price }
        }
    }
}

fn log_outcome(item: &CatalogItem, outcome: &UnitOutcome) {
    let key = derive_lookup_key(item);
    match outcome {
        UnitOutcome::Updated { price } => {
            info!(card_id = %item.id, key = %key, price = %price, "{} - ${}", item.name, price)
        }
        UnitOutcome::NoPrice => {
            info!(card_id = %item.id, key = %key, "{} - no price, keeping previous", item.name)
        }
        UnitOutcome::WriteFailed { price } => {
            warn!(card_id = %item.id, key = %key, price = %price, "{} - price not fully stored", item.name)
        }
        UnitOutcome::TimedOut => warn!(card_id = %item.id, key = %key, "{} - timed out", item.name),
        UnitOutcome::Panicked => error!(card_id = %item.id, key = %key, "{} - unit panicked", item.name),
    }
}
