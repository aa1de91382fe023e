use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A freshly scraped price, written as the current price of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub card_id: String,
    pub price_type: String,
    pub price: Decimal,
    pub source: String,
    pub observed_at: NaiveDateTime,
}

/// Stored current price, one per (card, price type).
///
/// `updated_at` only moves on a successful fetch, so it is also the time the
/// source last produced a price for this card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub card_id: String,
    pub price_type: String,
    pub price: Decimal,
    pub previous_price: Option<Decimal>,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceRecord {
    pub card_id: String,
    pub date: NaiveDate,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverageRecord {
    pub card_id: String,
    pub year: i32,
    pub month: u32,
    pub avg_price: Decimal,
    pub sample_count: u32,
}

/// Calendar month identifier used as part of the monthly average key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
