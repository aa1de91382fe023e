use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per (card, price type), overwritten by every successful refresh
        manager
            .create_table(
                Table::create()
                    .table(CardPrices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CardPrices::CardId).string().not_null())
                    .col(ColumnDef::new(CardPrices::PriceType).string_len(32).not_null())
                    .col(ColumnDef::new(CardPrices::Price).decimal().not_null())
                    .col(ColumnDef::new(CardPrices::PreviousPrice).decimal().null())
                    .col(ColumnDef::new(CardPrices::Source).string_len(64).not_null())
                    .col(
                        ColumnDef::new(CardPrices::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .primary_key(
                        Index::create()
                            .col(CardPrices::CardId)
                            .col(CardPrices::PriceType),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_prices_card_id")
                            .from(CardPrices::Table, CardPrices::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CardPrices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CardPrices {
    Table,
    CardId,
    PriceType,
    Price,
    PreviousPrice,
    Source,
    UpdatedAt,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
}
