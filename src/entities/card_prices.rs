//! `SeaORM` Entity for card_prices table (latest price per card and price type)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "card_prices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub card_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub price_type: String,
    #[sea_orm(column_type = "Decimal(None)")]
    pub price: Decimal,
    /// Price this row held before the last overwrite
    #[sea_orm(column_type = "Decimal(None)", nullable)]
    pub previous_price: Option<Decimal>,
    pub source: String,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
