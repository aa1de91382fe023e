use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Populated by the catalog loader, read only for the price jobs
        manager
            .create_table(
                Table::create()
                    .table(Sets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Sets::Name).string().not_null())
                    .col(ColumnDef::new(Sets::Abbreviation).string().null())
                    .col(ColumnDef::new(Sets::ReleaseDate).date().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sets::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Sets {
    Table,
    Id,
    Name,
    Abbreviation,
    ReleaseDate,
}
