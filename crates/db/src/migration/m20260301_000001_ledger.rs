//! Ledger schema: accounts, entries, items and voucher counters.
//!
//! Built with the schema builder so the same migration runs on PostgreSQL
//! and SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum LedgerAccounts {
    Table,
    Id,
    Code,
    Name,
    AccountType,
    FundTag,
    ParentId,
    IsSystem,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JournalEntries {
    Table,
    Id,
    VoucherNumber,
    VoucherType,
    EntryDate,
    Narration,
    DonorMemberId,
    DonorName,
    DonorPan,
    SupplierId,
    SupplierName,
    PaymentMode,
    Status,
    IsFinalized,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JournalItems {
    Table,
    Id,
    JournalEntryId,
    LedgerAccountId,
    Position,
    DebitMinor,
    CreditMinor,
    Particulars,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VoucherSequences {
    Table,
    Prefix,
    Year,
    LastValue,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerAccounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LedgerAccounts::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(LedgerAccounts::Code)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(LedgerAccounts::Name).string_len(255).not_null())
                    .col(ColumnDef::new(LedgerAccounts::AccountType).text().not_null())
                    .col(ColumnDef::new(LedgerAccounts::FundTag).text().null())
                    .col(ColumnDef::new(LedgerAccounts::ParentId).uuid().null())
                    .col(
                        ColumnDef::new(LedgerAccounts::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_accounts_parent")
                            .from(LedgerAccounts::Table, LedgerAccounts::ParentId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_accounts_parent")
                    .table(LedgerAccounts::Table)
                    .col(LedgerAccounts::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalEntries::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(JournalEntries::VoucherNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(JournalEntries::VoucherType).text().not_null())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Narration).text().not_null())
                    .col(ColumnDef::new(JournalEntries::DonorMemberId).uuid().null())
                    .col(ColumnDef::new(JournalEntries::DonorName).string_len(255).null())
                    .col(ColumnDef::new(JournalEntries::DonorPan).string_len(10).null())
                    .col(ColumnDef::new(JournalEntries::SupplierId).uuid().null())
                    .col(ColumnDef::new(JournalEntries::SupplierName).string_len(255).null())
                    .col(ColumnDef::new(JournalEntries::PaymentMode).text().null())
                    .col(ColumnDef::new(JournalEntries::Status).text().not_null())
                    .col(
                        ColumnDef::new(JournalEntries::IsFinalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(JournalEntries::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_entries_date")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::EntryDate)
                    .col(JournalEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JournalItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JournalItems::JournalEntryId).uuid().not_null())
                    .col(ColumnDef::new(JournalItems::LedgerAccountId).uuid().not_null())
                    .col(ColumnDef::new(JournalItems::Position).integer().not_null())
                    .col(
                        ColumnDef::new(JournalItems::DebitMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(JournalItems::DebitMinor).gte(0)),
                    )
                    .col(
                        ColumnDef::new(JournalItems::CreditMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(JournalItems::CreditMinor).gte(0)),
                    )
                    .col(ColumnDef::new(JournalItems::Particulars).text().null())
                    .col(
                        ColumnDef::new(JournalItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_items_entry")
                            .from(JournalItems::Table, JournalItems::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journal_items_account")
                            .from(JournalItems::Table, JournalItems::LedgerAccountId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_items_entry")
                    .table(JournalItems::Table)
                    .col(JournalItems::JournalEntryId)
                    .col(JournalItems::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_journal_items_account")
                    .table(JournalItems::Table)
                    .col(JournalItems::LedgerAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VoucherSequences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(VoucherSequences::Prefix).string_len(8).not_null())
                    .col(ColumnDef::new(VoucherSequences::Year).integer().not_null())
                    .col(
                        ColumnDef::new(VoucherSequences::LastValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VoucherSequences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_voucher_sequences")
                            .col(VoucherSequences::Prefix)
                            .col(VoucherSequences::Year),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VoucherSequences::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalItems::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerAccounts::Table).if_exists().to_owned())
            .await
    }
}
