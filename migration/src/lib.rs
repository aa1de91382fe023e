pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_sets;
mod m20251001_000002_create_cards;
mod m20251002_000001_create_card_prices;
mod m20251002_000002_create_daily_card_prices;
mod m20251003_000001_create_monthly_card_prices;
mod m20251003_000002_create_sync_status;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_sets::Migration),
            Box::new(m20251001_000002_create_cards::Migration),
            Box::new(m20251002_000001_create_card_prices::Migration),
            Box::new(m20251002_000002_create_daily_card_prices::Migration),
            Box::new(m20251003_000001_create_monthly_card_prices::Migration),
            Box::new(m20251003_000002_create_sync_status::Migration),
        ]
    }
}
