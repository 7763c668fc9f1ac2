//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: residents and guests; `resident` marks even-split eligibility
//! - `expenditures`: one row per recorded purchase
//! - `splits`: per-user share rows of an expenditure

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Name,
    Resident,
    Email,
    Password,
}

#[derive(Iden)]
enum Expenditures {
    Table,
    Id,
    SpenderId,
    AmountMinor,
    Currency,
    Description,
    OccurredAt,
    EnteredAt,
}

#[derive(Iden)]
enum Splits {
    Table,
    ExpenditureId,
    UserId,
    ShareMinor,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string())
                    .col(
                        ColumnDef::new(Users::Resident)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::Email).string())
                    .col(ColumnDef::new(Users::Password).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenditures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenditures::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenditures::SpenderId).string().not_null())
                    .col(
                        ColumnDef::new(Expenditures::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenditures::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Expenditures::Description).string())
                    .col(
                        ColumnDef::new(Expenditures::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenditures::EnteredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenditures-spender_id")
                            .from(Expenditures::Table, Expenditures::SpenderId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenditures-occurred_at")
                    .table(Expenditures::Table)
                    .col(Expenditures::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Splits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Splits::ExpenditureId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Splits::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Splits::ShareMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Splits::ExpenditureId)
                            .col(Splits::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-splits-expenditure_id")
                            .from(Splits::Table, Splits::ExpenditureId)
                            .to(Expenditures::Table, Expenditures::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-splits-user_id")
                            .from(Splits::Table, Splits::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-splits-user_id")
                    .table(Splits::Table)
                    .col(Splits::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Splits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenditures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
