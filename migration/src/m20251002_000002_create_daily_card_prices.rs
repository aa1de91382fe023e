use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailyCardPrices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DailyCardPrices::CardId).string().not_null())
                    .col(ColumnDef::new(DailyCardPrices::Date).date().not_null())
                    .col(ColumnDef::new(DailyCardPrices::Price).decimal().not_null())
                    .primary_key(
                        Index::create()
                            .col(DailyCardPrices::CardId)
                            .col(DailyCardPrices::Date),
                    )
                    .to_owned(),
            )
            .await?;

        // Month reads and retention deletes both filter on date alone
        manager
            .create_index(
                Index::create()
                    .name("idx_daily_card_prices_date")
                    .table(DailyCardPrices::Table)
                    .col(DailyCardPrices::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyCardPrices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DailyCardPrices {
    Table,
    CardId,
    Date,
    Price,
}
