//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: borrowers and API credentials
//! - `banks`: partner banks
//! - `loans`: loans owned by users
//! - `loan_splits`: per-bank share of a loan's principal
//! - `loan_payments`: payment events against a loan
//! - `payment_allocations`: principal/interest applied to one split
//! - `credit_applications`: loan requests awaiting a decision
//! - `user_bank_accounts`: one account per user and bank
//! - `bank_transactions`: postings feeding account balances
//!
//! Money columns store integer minor units (cents); interest rates store
//! basis points.

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
    Email,
    FullName,
    Phone,
    Password,
    CreatedAt,
}

#[derive(Iden)]
enum Banks {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Loans {
    Table,
    Id,
    UserId,
    OriginalAmountMinor,
    TakenAt,
    InterestRateBps,
    Status,
    Purpose,
    CreatedAt,
}

#[derive(Iden)]
enum LoanSplits {
    Table,
    Id,
    LoanId,
    BankId,
    SplitAmountMinor,
    RemainingPrincipalMinor,
}

#[derive(Iden)]
enum LoanPayments {
    Table,
    Id,
    LoanId,
    UserId,
    PaidAt,
    TotalAmountMinor,
    Comment,
    IdempotencyKey,
}

#[derive(Iden)]
enum PaymentAllocations {
    Table,
    Id,
    PaymentId,
    SplitId,
    PrincipalPaidMinor,
    InterestPaidMinor,
}

#[derive(Iden)]
enum CreditApplications {
    Table,
    Id,
    UserId,
    BankId,
    TypeCode,
    StatusCode,
    RequestedAmountMinor,
    LoanId,
    SubmittedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserBankAccounts {
    Table,
    Id,
    UserId,
    BankId,
    BalanceMinor,
    Currency,
    CreatedAt,
}

#[derive(Iden)]
enum BankTransactions {
    Table,
    Id,
    UserId,
    BankId,
    OccurredAt,
    AmountMinor,
    Category,
    Description,
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
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Banks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Banks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Banks::Id)
                            .small_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Banks::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Loans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Loans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Loans::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Loans::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Loans::OriginalAmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Loans::OriginalAmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(Loans::TakenAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Loans::InterestRateBps)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Loans::Status).string().not_null())
                    .col(ColumnDef::new(Loans::Purpose).string())
                    .col(ColumnDef::new(Loans::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-user_id")
                            .from(Loans::Table, Loans::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loans-user_id-status")
                    .table(Loans::Table)
                    .col(Loans::UserId)
                    .col(Loans::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Loan splits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LoanSplits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoanSplits::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoanSplits::LoanId).integer().not_null())
                    .col(ColumnDef::new(LoanSplits::BankId).small_integer().not_null())
                    .col(
                        ColumnDef::new(LoanSplits::SplitAmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LoanSplits::SplitAmountMinor).gt(0)),
                    )
                    .col(
                        ColumnDef::new(LoanSplits::RemainingPrincipalMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LoanSplits::RemainingPrincipalMinor).gte(0)),
                    )
                    .check(
                        Expr::col(LoanSplits::RemainingPrincipalMinor)
                            .lte(Expr::col(LoanSplits::SplitAmountMinor)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loan_splits-loan_id")
                            .from(LoanSplits::Table, LoanSplits::LoanId)
                            .to(Loans::Table, Loans::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loan_splits-bank_id")
                            .from(LoanSplits::Table, LoanSplits::BankId)
                            .to(Banks::Table, Banks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loan_splits-loan_id-bank_id-unique")
                    .table(LoanSplits::Table)
                    .col(LoanSplits::LoanId)
                    .col(LoanSplits::BankId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Loan payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LoanPayments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoanPayments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoanPayments::LoanId).integer().not_null())
                    .col(ColumnDef::new(LoanPayments::UserId).string().not_null())
                    .col(ColumnDef::new(LoanPayments::PaidAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(LoanPayments::TotalAmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LoanPayments::TotalAmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(LoanPayments::Comment).string())
                    .col(ColumnDef::new(LoanPayments::IdempotencyKey).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loan_payments-loan_id")
                            .from(LoanPayments::Table, LoanPayments::LoanId)
                            .to(Loans::Table, Loans::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loan_payments-user_id")
                            .from(LoanPayments::Table, LoanPayments::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loan_payments-loan_id-paid_at")
                    .table(LoanPayments::Table)
                    .col(LoanPayments::LoanId)
                    .col(LoanPayments::PaidAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loan_payments-idempotency_key")
                    .table(LoanPayments::Table)
                    .col(LoanPayments::LoanId)
                    .col(LoanPayments::UserId)
                    .col(LoanPayments::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Payment allocations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PaymentAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentAllocations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentAllocations::PaymentId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentAllocations::SplitId).integer().not_null())
                    .col(
                        ColumnDef::new(PaymentAllocations::PrincipalPaidMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(PaymentAllocations::PrincipalPaidMinor).gte(0)),
                    )
                    .col(
                        ColumnDef::new(PaymentAllocations::InterestPaidMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(PaymentAllocations::InterestPaidMinor).gte(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_allocations-payment_id")
                            .from(PaymentAllocations::Table, PaymentAllocations::PaymentId)
                            .to(LoanPayments::Table, LoanPayments::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_allocations-split_id")
                            .from(PaymentAllocations::Table, PaymentAllocations::SplitId)
                            .to(LoanSplits::Table, LoanSplits::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payment_allocations-payment_id")
                    .table(PaymentAllocations::Table)
                    .col(PaymentAllocations::PaymentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Credit applications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CreditApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditApplications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditApplications::UserId).string().not_null())
                    .col(
                        ColumnDef::new(CreditApplications::BankId)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditApplications::TypeCode).string().not_null())
                    .col(
                        ColumnDef::new(CreditApplications::StatusCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditApplications::RequestedAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditApplications::LoanId).integer())
                    .col(
                        ColumnDef::new(CreditApplications::SubmittedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditApplications::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_applications-user_id")
                            .from(CreditApplications::Table, CreditApplications::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_applications-bank_id")
                            .from(CreditApplications::Table, CreditApplications::BankId)
                            .to(Banks::Table, Banks::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_applications-loan_id")
                            .from(CreditApplications::Table, CreditApplications::LoanId)
                            .to(Loans::Table, Loans::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-credit_applications-user_id")
                    .table(CreditApplications::Table)
                    .col(CreditApplications::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. User bank accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(UserBankAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserBankAccounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserBankAccounts::UserId).string().not_null())
                    .col(
                        ColumnDef::new(UserBankAccounts::BankId)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserBankAccounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(UserBankAccounts::Currency).string().not_null())
                    .col(
                        ColumnDef::new(UserBankAccounts::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_bank_accounts-user_id")
                            .from(UserBankAccounts::Table, UserBankAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_bank_accounts-bank_id")
                            .from(UserBankAccounts::Table, UserBankAccounts::BankId)
                            .to(Banks::Table, Banks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-user_bank_accounts-user_id-bank_id-unique")
                    .table(UserBankAccounts::Table)
                    .col(UserBankAccounts::UserId)
                    .col(UserBankAccounts::BankId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Bank transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankTransactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankTransactions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(BankTransactions::BankId)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankTransactions::Category).string())
                    .col(ColumnDef::new(BankTransactions::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_transactions-user_id")
                            .from(BankTransactions::Table, BankTransactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_transactions-bank_id")
                            .from(BankTransactions::Table, BankTransactions::BankId)
                            .to(Banks::Table, Banks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_transactions-user_id-occurred_at")
                    .table(BankTransactions::Table)
                    .col(BankTransactions::UserId)
                    .col(BankTransactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(BankTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserBankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditApplications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoanPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoanSplits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Banks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
