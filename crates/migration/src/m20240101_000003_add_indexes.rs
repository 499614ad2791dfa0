use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Rows written outside the service may not be lowercased.
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS uniq_user_email_lower ON "user" (lower(email))"#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_business_owner")
                    .table(Business::Table)
                    .col(Business::OwnerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_business_email")
                    .table(Business::Table)
                    .col(Business::Email)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uniq_user_email_lower")
            .await?;
        manager
            .drop_index(Index::drop().name("idx_business_owner").table(Business::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_business_email").table(Business::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Business { Table, OwnerId, Email }
