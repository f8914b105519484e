//! `SeaORM` entity definitions.

pub mod prelude;

pub mod journal_entries;
pub mod journal_items;
pub mod ledger_accounts;
pub mod sea_orm_active_enums;
pub mod voucher_sequences;
