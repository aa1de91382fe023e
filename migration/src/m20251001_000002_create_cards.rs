use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cards::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cards::Name).string().not_null())
                    .col(ColumnDef::new(Cards::Number).string().null())
                    .col(ColumnDef::new(Cards::Rarity).string().null())
                    .col(ColumnDef::new(Cards::SetId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cards_set_id")
                            .from(Cards::Table, Cards::SetId)
                            .to(Sets::Table, Sets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cards_set_id")
                    .table(Cards::Table)
                    .col(Cards::SetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    Name,
    Number,
    Rarity,
    SetId,
}

#[derive(Iden)]
enum Sets {
    Table,
    Id,
}
