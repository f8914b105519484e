//! Entity re-exports.

pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_items::Entity as JournalItems;
pub use super::ledger_accounts::Entity as LedgerAccounts;
pub use super::voucher_sequences::Entity as VoucherSequences;
