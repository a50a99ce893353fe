//! Counter table for transactional employee id allocation

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IdSequence::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdSequence::Scope)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IdSequence::LastValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IdSequence::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IdSequence {
    #[sea_orm(iden = "id_sequences")]
    Table,
    Scope,
    LastValue,
}
