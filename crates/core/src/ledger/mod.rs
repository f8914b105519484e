//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Chart of accounts (typed, fund-tagged, hierarchical)
//! - Journal lines and entries with their lifecycle
//! - Voucher numbering
//! - Balance calculations
//! - Business rule validation, including fund restrictions
//! - Error types for ledger operations

pub mod account;
pub mod balance;
pub mod chart;
pub mod entry;
pub mod error;
pub mod funds;
pub mod transaction;
pub mod validation;
pub mod voucher;

#[cfg(test)]
mod validation_props;

pub use account::{
    AccountChanges, AccountMatcher, AccountType, FundTag, FundTagAdvisory, LedgerAccount,
    NewAccount, WellKnownAccount, fund_tag_advisory,
};
pub use balance::{AccountBalance, BalanceScope, NormalBalance};
pub use chart::{AccountNode, ChartOfAccounts};
pub use entry::{EntryTotals, JournalItem, JournalLine, Side, check_line_amounts};
pub use error::{LedgerError, ProtectionReason};
pub use funds::{AssetPosition, FundHoldings};
pub use transaction::{
    DonorRef, EntryHeader, EntryStatus, JournalEntry, PaymentMode, SupplierRef, VoucherType,
    validate_pan,
};
pub use validation::{AccountInfo, FundPolicy, JournalValidator, LedgerPolicy, ResolvedLine};
pub use voucher::{VoucherNumber, VoucherPrefix, next_from_existing};
