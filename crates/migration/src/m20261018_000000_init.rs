//! Initial schema.
//!
//! - `users`: registered students and their credential
//! - `balances`: one flexi-dollar balance per user
//! - `budget_settings`: weekly budget preferences per user
//! - `transactions`: signed ledger of purchases and fairy donations
//! - `fairy_status`: the fairy directory (opt-in flag and ceiling)
//! - `fairy_requests`: help requests and their lifecycle

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    StudentId,
    Name,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(Iden)]
enum Balances {
    Table,
    UserId,
    StartingBalanceMinor,
    CurrentBalanceMinor,
    UpdatedAt,
}

#[derive(Iden)]
enum BudgetSettings {
    Table,
    UserId,
    WeeklyBudgetMinor,
    BudgetWarnings,
    StrictBudget,
    TransactionNotifications,
    WeeklyReports,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Kind,
    AmountMinor,
    Location,
    Description,
    OccurredAt,
}

#[derive(Iden)]
enum FairyStatus {
    Table,
    UserId,
    IsActive,
    MaxTransactionMinor,
    UpdatedAt,
}

#[derive(Iden)]
enum FairyRequests {
    Table,
    Id,
    RequestorId,
    FairyId,
    Location,
    AmountMinor,
    Description,
    Status,
    RequestorConfirmed,
    FairyConfirmed,
    Rating,
    RatingComment,
    CreatedAt,
    AcceptedAt,
    CompletedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::StudentId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Balances
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Balances::StartingBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Balances::CurrentBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Balances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-balances-user_id")
                            .from(Balances::Table, Balances::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Budget settings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetSettings::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BudgetSettings::WeeklyBudgetMinor)
                            .big_integer()
                            .not_null()
                            .default(10_000),
                    )
                    .col(
                        ColumnDef::new(BudgetSettings::BudgetWarnings)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BudgetSettings::StrictBudget)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(BudgetSettings::TransactionNotifications)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BudgetSettings::WeeklyReports)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BudgetSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_settings-user_id")
                            .from(BudgetSettings::Table, BudgetSettings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Location).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-occurred_at")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Fairy directory
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FairyStatus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FairyStatus::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FairyStatus::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FairyStatus::MaxTransactionMinor).big_integer())
                    .col(
                        ColumnDef::new(FairyStatus::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fairy_status-user_id")
                            .from(FairyStatus::Table, FairyStatus::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Fairy requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FairyRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FairyRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FairyRequests::RequestorId).uuid().not_null())
                    .col(ColumnDef::new(FairyRequests::FairyId).uuid())
                    .col(ColumnDef::new(FairyRequests::Location).string().not_null())
                    .col(
                        ColumnDef::new(FairyRequests::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(FairyRequests::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(FairyRequests::Description).string())
                    .col(
                        ColumnDef::new(FairyRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(FairyRequests::RequestorConfirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FairyRequests::FairyConfirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FairyRequests::Rating)
                            .integer()
                            .check(Expr::col(FairyRequests::Rating).between(1, 5)),
                    )
                    .col(ColumnDef::new(FairyRequests::RatingComment).string())
                    .col(
                        ColumnDef::new(FairyRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FairyRequests::AcceptedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(FairyRequests::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(FairyRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fairy_requests-requestor_id")
                            .from(FairyRequests::Table, FairyRequests::RequestorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-fairy_requests-fairy_id")
                            .from(FairyRequests::Table, FairyRequests::FairyId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fairy_requests-status-created_at")
                    .table(FairyRequests::Table)
                    .col(FairyRequests::Status)
                    .col(FairyRequests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fairy_requests-requestor_id")
                    .table(FairyRequests::Table)
                    .col(FairyRequests::RequestorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fairy_requests-fairy_id-status")
                    .table(FairyRequests::Table)
                    .col(FairyRequests::FairyId)
                    .col(FairyRequests::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(FairyRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FairyStatus::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
