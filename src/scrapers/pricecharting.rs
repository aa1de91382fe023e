use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;

use super::parser::extract_price;
use super::slug::derive_lookup_key;
use super::{PriceSource, ScraperConfig};
use crate::models::card::CatalogItem;

/// Why a single lookup attempt produced no price
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(StatusCode),

    #[error("No price marker in response")]
    MissingPrice,
}

/// Scrapes the ungraded price from a card's price page.
#[derive(Clone)]
pub struct PriceChartingScraper {
    client: Client,
    config: ScraperConfig,
}

impl PriceChartingScraper {
    pub fn new(config: ScraperConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn url_for(&self, item: &CatalogItem) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            derive_lookup_key(item)
        )
    }

    async fn fetch_once(&self, url: &str) -> Result<Decimal, LookupError> {
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(LookupError::Status(response.status()));
        }

        let body = response.text().await?;
        extract_price(&body).ok_or(LookupError::MissingPrice)
    }
}

#[async_trait]
impl PriceSource for PriceChartingScraper {
    async fn fetch_price(&self, item: &CatalogItem) -> Option<Decimal> {
        let url = self.url_for(item);

        match self.config.retry.run(&url, || self.fetch_once(&url)).await {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::info!(
                    card_id = %item.id,
                    url = %url,
                    attempts = self.config.retry.max_attempts,
                    error = %e,
                    "No price found"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let scraper = PriceChartingScraper::new(ScraperConfig {
            base_url: "https://prices.example/game/".to_string(),
            ..ScraperConfig::default()
        })
        .unwrap();

        let item = CatalogItem::new("base1-58", "Pikachu", "025", "base1", "Base Set");
        assert_eq!(
            scraper.url_for(&item),
            "https://prices.example/game/pokemon-base-set/pikachu-025"
        );
    }
}
