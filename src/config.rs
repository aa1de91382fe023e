//! Runtime configuration read from the environment (after `.env` is loaded).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::scrapers::ScraperConfig;
use crate::services::retry::RetryPolicy;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_PRICE_SOURCE_BASE_URL: &str = "PRICE_SOURCE_BASE_URL";
pub const ENV_PRICE_SOURCE_LABEL: &str = "PRICE_SOURCE_LABEL";
pub const ENV_PRICE_TYPE: &str = "PRICE_TYPE";
pub const ENV_REFRESH_WORKERS: &str = "REFRESH_WORKERS";
pub const ENV_CATALOG_BATCH_SIZE: &str = "CATALOG_BATCH_SIZE";
pub const ENV_UNIT_TIMEOUT_SECS: &str = "UNIT_TIMEOUT_SECS";
pub const ENV_LOOKUP_MAX_ATTEMPTS: &str = "LOOKUP_MAX_ATTEMPTS";
pub const ENV_LOOKUP_RETRY_DELAY_MS: &str = "LOOKUP_RETRY_DELAY_MS";
pub const ENV_UPSERT_MAX_ATTEMPTS: &str = "UPSERT_MAX_ATTEMPTS";
pub const ENV_UPSERT_BASE_DELAY_MS: &str = "UPSERT_BASE_DELAY_MS";
pub const ENV_DAILY_RETENTION_DAYS: &str = "DAILY_RETENTION_DAYS";
pub const ENV_REFRESH_INTERVAL_SECS: &str = "REFRESH_INTERVAL_SECS";
pub const ENV_DRY_RUN: &str = "JOBS_DRY_RUN";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

pub const DEFAULT_PRICE_SOURCE_BASE_URL: &str = "https://www.pricecharting.com/game";
pub const DEFAULT_PRICE_SOURCE_LABEL: &str = "pricecharting";
pub const DEFAULT_PRICE_TYPE: &str = "market";
pub const DEFAULT_REFRESH_WORKERS: usize = 5;
pub const DEFAULT_CATALOG_BATCH_SIZE: u64 = 1000;
/// Headroom added on top of the worst-case lookup and upsert time when
/// `UNIT_TIMEOUT_SECS` is not set.
pub const UNIT_TIMEOUT_MARGIN_SECS: u64 = 15;
pub const DEFAULT_LOOKUP_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_LOOKUP_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_UPSERT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_UPSERT_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_UPSERT_MAX_DELAY_SECS: u64 = 30;
pub const DEFAULT_DAILY_RETENTION_DAYS: i64 = 90;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 86400;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Settings for the price refresh fan-out
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub worker_limit: usize,
    pub batch_size: u64,
    pub unit_timeout: Duration,
    pub price_type: String,
    pub source_label: String,
    pub upsert_retry: RetryPolicy,
    pub catalog_retry: RetryPolicy,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        let upsert_retry =
            default_upsert_retry(DEFAULT_UPSERT_MAX_ATTEMPTS, DEFAULT_UPSERT_BASE_DELAY_MS);
        let unit_timeout = min_unit_timeout(&ScraperConfig::default(), &upsert_retry)
            + Duration::from_secs(UNIT_TIMEOUT_MARGIN_SECS);

        Self {
            worker_limit: DEFAULT_REFRESH_WORKERS,
            batch_size: DEFAULT_CATALOG_BATCH_SIZE,
            unit_timeout,
            price_type: DEFAULT_PRICE_TYPE.to_string(),
            source_label: DEFAULT_PRICE_SOURCE_LABEL.to_string(),
            upsert_retry,
            catalog_retry: RetryPolicy::fixed(3, Duration::from_secs(1)),
        }
    }
}

/// Settings for the monthly aggregation
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    pub retention_days: i64,
    pub upsert_retry: RetryPolicy,
    pub read_retry: RetryPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_DAILY_RETENTION_DAYS,
            upsert_retry: default_upsert_retry(DEFAULT_UPSERT_MAX_ATTEMPTS, DEFAULT_UPSERT_BASE_DELAY_MS),
            read_retry: RetryPolicy::fixed(3, Duration::from_secs(1)),
        }
    }
}

/// Everything a binary needs to build and schedule the jobs
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub refresh_interval: Duration,
    pub dry_run: bool,
    pub scraper: ScraperConfig,
    pub refresh: RefreshConfig,
    pub aggregation: AggregationConfig,
}

impl JobConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var(ENV_DATABASE_URL).map_err(|_| ConfigError::Missing(ENV_DATABASE_URL))?;

        let lookup_attempts = parse_or(ENV_LOOKUP_MAX_ATTEMPTS, DEFAULT_LOOKUP_MAX_ATTEMPTS)?;
        let lookup_delay_ms = parse_or(ENV_LOOKUP_RETRY_DELAY_MS, DEFAULT_LOOKUP_RETRY_DELAY_MS)?;
        let upsert_attempts = parse_or(ENV_UPSERT_MAX_ATTEMPTS, DEFAULT_UPSERT_MAX_ATTEMPTS)?;
        let upsert_delay_ms = parse_or(ENV_UPSERT_BASE_DELAY_MS, DEFAULT_UPSERT_BASE_DELAY_MS)?;

        let worker_limit: usize = parse_or(ENV_REFRESH_WORKERS, DEFAULT_REFRESH_WORKERS)?;
        if worker_limit == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_REFRESH_WORKERS,
                value: "0".to_string(),
            });
        }

        let batch_size: u64 = parse_or(ENV_CATALOG_BATCH_SIZE, DEFAULT_CATALOG_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_CATALOG_BATCH_SIZE,
                value: "0".to_string(),
            });
        }

        let source_label = env::var(ENV_PRICE_SOURCE_LABEL)
            .unwrap_or_else(|_| DEFAULT_PRICE_SOURCE_LABEL.to_string());

        let scraper = ScraperConfig {
            base_url: env::var(ENV_PRICE_SOURCE_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_PRICE_SOURCE_BASE_URL.to_string()),
            retry: RetryPolicy::fixed(lookup_attempts, Duration::from_millis(lookup_delay_ms)),
            ..ScraperConfig::default()
        };

        let upsert_retry = default_upsert_retry(upsert_attempts, upsert_delay_ms);

        let configured_timeout = env::var(ENV_UNIT_TIMEOUT_SECS)
            .ok()
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name: ENV_UNIT_TIMEOUT_SECS,
                    value,
                })
            })
            .transpose()?;
        let unit_timeout = resolve_unit_timeout(
            configured_timeout,
            min_unit_timeout(&scraper, &upsert_retry),
        )?;

        Ok(Self {
            database_url,
            bind_addr: env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            refresh_interval: Duration::from_secs(parse_or(
                ENV_REFRESH_INTERVAL_SECS,
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?),
            dry_run: env::var(ENV_DRY_RUN)
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            scraper,
            refresh: RefreshConfig {
                worker_limit,
                batch_size,
                unit_timeout,
                price_type: env::var(ENV_PRICE_TYPE).unwrap_or_else(|_| DEFAULT_PRICE_TYPE.to_string()),
                source_label,
                upsert_retry: upsert_retry.clone(),
                ..RefreshConfig::default()
            },
            aggregation: AggregationConfig {
                retention_days: parse_or(ENV_DAILY_RETENTION_DAYS, DEFAULT_DAILY_RETENTION_DAYS)?,
                upsert_retry,
                ..AggregationConfig::default()
            },
        })
    }
}

fn default_upsert_retry(max_attempts: u32, base_delay_ms: u64) -> RetryPolicy {
    RetryPolicy::exponential(
        max_attempts,
        Duration::from_millis(base_delay_ms),
        Duration::from_secs(DEFAULT_UPSERT_MAX_DELAY_SECS),
    )
}

/// Worst-case time one unit needs to exhaust its lookup retries and then
/// its upsert retries. The price and daily upserts run concurrently, so
/// only one upsert budget counts.
pub fn min_unit_timeout(scraper: &ScraperConfig, upsert_retry: &RetryPolicy) -> Duration {
    scraper.request_timeout * scraper.retry.max_attempts.max(1)
        + scraper.retry.max_total_delay()
        + upsert_retry.max_total_delay()
}

/// Use the configured timeout if it leaves room for every retry, otherwise
/// reject it. Unset means `minimum` plus the default margin.
fn resolve_unit_timeout(
    configured_secs: Option<u64>,
    minimum: Duration,
) -> Result<Duration, ConfigError> {
    match configured_secs {
        None => Ok(minimum + Duration::from_secs(UNIT_TIMEOUT_MARGIN_SECS)),
        Some(secs) if Duration::from_secs(secs) > minimum => Ok(Duration::from_secs(secs)),
        Some(secs) => Err(ConfigError::Invalid {
            name: ENV_UNIT_TIMEOUT_SECS,
            value: format!(
                "{} (must exceed {}s of lookup and upsert retries)",
                secs,
                minimum.as_secs_f64()
            ),
        }),
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
