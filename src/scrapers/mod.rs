pub mod parser;
pub mod pricecharting;
pub mod slug;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;

use crate::models::card::CatalogItem;
use crate::services::retry::RetryPolicy;

/// External source of card prices.
///
/// `None` means "no price found" after the source's own retries; lookups
/// never fail in any other way.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self, item: &CatalogItem) -> Option<Decimal>;
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_PRICE_SOURCE_BASE_URL.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::fixed(3, Duration::from_millis(2000)),
        }
    }
}
