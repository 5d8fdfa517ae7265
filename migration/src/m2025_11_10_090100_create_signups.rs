//! Migration to create the signups table.
//!
//! Each row registers one participant email for one activity. The composite
//! unique index on (activity_id, email) prevents double registration even
//! when two requests race.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Signups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Signups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Signups::ActivityId).integer().not_null())
                    .col(ColumnDef::new(Signups::Email).text().not_null())
                    .col(
                        ColumnDef::new(Signups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_signups_activity_id")
                            .from(Signups::Table, Signups::ActivityId)
                            .to(Activities::Table, Activities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_signups_activity_email")
                    .table(Signups::Table)
                    .col(Signups::ActivityId)
                    .col(Signups::Email)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Lookups by participant across activities
        manager
            .create_index(
                Index::create()
                    .name("idx_signups_email")
                    .table(Signups::Table)
                    .col(Signups::Email)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_signups_activity_email").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_signups_email").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Signups::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Signups {
    Table,
    Id,
    ActivityId,
    Email,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Activities {
    Table,
    Id,
}
