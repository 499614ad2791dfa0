//! Create `business` table with FK to its owning `user`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Business::Table)
                    .if_not_exists()
                    .col(uuid(Business::Id).primary_key())
                    .col(string_len(Business::Name, 128).not_null())
                    .col(ColumnDef::new(Business::CategoryId).uuid().null())
                    .col(text(Business::Description).not_null())
                    .col(string_len(Business::Website, 255).not_null())
                    .col(string_len(Business::Phone, 64).not_null())
                    .col(string_len(Business::Email, 128).not_null())
                    .col(uuid(Business::OwnerId).not_null())
                    .col(string_len(Business::OwnerName, 128).not_null())
                    .col(string_len(Business::OwnerJobTitle, 128).not_null())
                    .col(timestamp_with_time_zone(Business::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_business_owner")
                            .from(Business::Table, Business::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Business::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Business {
    Table,
    Id,
    Name,
    CategoryId,
    Description,
    Website,
    Phone,
    Email,
    OwnerId,
    OwnerName,
    OwnerJobTitle,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
