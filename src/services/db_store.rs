//! PostgreSQL-backed catalog store using SeaORM upserts.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{
    card_prices, cards, daily_card_prices, monthly_card_prices, prelude::*,
};
use crate::error::StoreError;
use crate::models::card::CatalogItem;
use crate::models::price::{
    DailyPriceRecord, MonthlyAverageRecord, PriceObservation, PriceRecord, YearMonth,
};
use crate::services::catalog_store::{CatalogPage, CatalogStore, UpsertRow};

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn upsert_price(&self, row: &PriceObservation) -> Result<(), StoreError> {
        let model = card_prices::ActiveModel {
            card_id: Set(row.card_id.clone()),
            price_type: Set(row.price_type.clone()),
            price: Set(row.price),
            previous_price: Set(None),
            source: Set(row.source.clone()),
            updated_at: Set(row.observed_at),
        };

        // previous_price takes the value being overwritten, not the excluded row
        let on_conflict = OnConflict::columns([
            card_prices::Column::CardId,
            card_prices::Column::PriceType,
        ])
        .update_columns([
            card_prices::Column::Price,
            card_prices::Column::Source,
            card_prices::Column::UpdatedAt,
        ])
        .value(
            card_prices::Column::PreviousPrice,
            Expr::col((CardPrices, card_prices::Column::Price)),
        )
        .to_owned();

        CardPrices::insert(model)
            .on_conflict(on_conflict)
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn upsert_daily(&self, row: &DailyPriceRecord) -> Result<(), StoreError> {
        let model = daily_card_prices::ActiveModel {
            card_id: Set(row.card_id.clone()),
            date: Set(row.date),
            price: Set(row.price),
        };

        DailyCardPrices::insert(model)
            .on_conflict(
                OnConflict::columns([
                    daily_card_prices::Column::CardId,
                    daily_card_prices::Column::Date,
                ])
                .update_column(daily_card_prices::Column::Price)
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn upsert_monthly(&self, row: &MonthlyAverageRecord) -> Result<(), StoreError> {
        let model = monthly_card_prices::ActiveModel {
            card_id: Set(row.card_id.clone()),
            year: Set(row.year),
            month: Set(month_to_i32(row.month)?),
            avg_price: Set(row.avg_price),
            sample_count: Set(i32::try_from(row.sample_count).map_err(|_| {
                StoreError::InvalidRow(format!("sample_count {} too large", row.sample_count))
            })?),
            updated_at: Set(Some(Utc::now().naive_utc())),
        };

        MonthlyCardPrices::insert(model)
            .on_conflict(
                OnConflict::columns([
                    monthly_card_prices::Column::CardId,
                    monthly_card_prices::Column::Year,
                    monthly_card_prices::Column::Month,
                ])
                .update_columns([
                    monthly_card_prices::Column::AvgPrice,
                    monthly_card_prices::Column::SampleCount,
                    monthly_card_prices::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }
}

fn month_to_i32(month: u32) -> Result<i32, StoreError> {
    if (1..=12).contains(&month) {
        Ok(month as i32)
    } else {
        Err(StoreError::InvalidRow(format!("month {} out of range", month)))
    }
}

#[async_trait]
impl CatalogStore for SeaOrmStore {
    async fn fetch_catalog_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<CatalogPage, StoreError> {
        let rows = Cards::find()
            .find_also_related(Sets)
            .order_by_asc(cards::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        let scanned = rows.len() as u64;
        let mut items = Vec::with_capacity(rows.len());
        for (card, set) in rows {
            match set {
                Some(set) => items.push(CatalogItem {
                    id: card.id,
                    name: card.name,
                    number: card.number.unwrap_or_default(),
                    set_id: card.set_id,
                    set_name: set.name,
                }),
                None => {
                    tracing::warn!(card_id = %card.id, set_id = %card.set_id, "Card has no set, skipping");
                }
            }
        }

        Ok(CatalogPage { items, scanned })
    }

    async fn upsert(&self, row: &UpsertRow) -> Result<(), StoreError> {
        match row {
            UpsertRow::Price(price) => self.upsert_price(price).await,
            UpsertRow::Daily(daily) => self.upsert_daily(daily).await,
            UpsertRow::Monthly(monthly) => self.upsert_monthly(monthly).await,
        }
    }

    async fn daily_prices_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPriceRecord>, StoreError> {
        let rows = DailyCardPrices::find()
            .filter(daily_card_prices::Column::Date.between(start, end))
            .order_by_asc(daily_card_prices::Column::CardId)
            .order_by_asc(daily_card_prices::Column::Date)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| DailyPriceRecord {
                card_id: row.card_id,
                date: row.date,
                price: row.price,
            })
            .collect())
    }

    async fn delete_daily_prices_before(&self, cutoff: NaiveDate) -> Result<u64, StoreError> {
        let result = DailyCardPrices::delete_many()
            .filter(daily_card_prices::Column::Date.lt(cutoff))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn get_price(
        &self,
        card_id: &str,
        price_type: &str,
    ) -> Result<Option<PriceRecord>, StoreError> {
        let row = CardPrices::find_by_id((card_id.to_string(), price_type.to_string()))
            .one(&self.db)
            .await?;

        Ok(row.map(|row| PriceRecord {
            card_id: row.card_id,
            price_type: row.price_type,
            price: row.price,
            previous_price: row.previous_price,
            source: row.source,
            updated_at: row.updated_at,
        }))
    }

    async fn get_monthly_average(
        &self,
        card_id: &str,
        month: YearMonth,
    ) -> Result<Option<MonthlyAverageRecord>, StoreError> {
        let row = MonthlyCardPrices::find_by_id((
            card_id.to_string(),
            month.year,
            month_to_i32(month.month)?,
        ))
        .one(&self.db)
        .await?;

        Ok(row.map(|row| MonthlyAverageRecord {
            card_id: row.card_id,
            year: row.year,
            month: row.month as u32,
            avg_price: row.avg_price,
            sample_count: row.sample_count.max(0) as u32,
        }))
    }
}
