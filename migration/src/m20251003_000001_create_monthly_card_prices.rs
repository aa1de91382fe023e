use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MonthlyCardPrices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MonthlyCardPrices::CardId).string().not_null())
                    .col(ColumnDef::new(MonthlyCardPrices::Year).integer().not_null())
                    .col(ColumnDef::new(MonthlyCardPrices::Month).integer().not_null())
                    .col(ColumnDef::new(MonthlyCardPrices::AvgPrice).decimal().not_null())
                    .col(
                        ColumnDef::new(MonthlyCardPrices::SampleCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MonthlyCardPrices::UpdatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .primary_key(
                        Index::create()
                            .col(MonthlyCardPrices::CardId)
                            .col(MonthlyCardPrices::Year)
                            .col(MonthlyCardPrices::Month),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MonthlyCardPrices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MonthlyCardPrices {
    Table,
    CardId,
    Year,
    Month,
    AvgPrice,
    SampleCount,
    UpdatedAt,
}
