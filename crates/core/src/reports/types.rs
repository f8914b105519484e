//! Report data types.

use chrono::NaiveDate;
use mizan_shared::types::{AccountId, JournalEntryId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{AccountType, VoucherNumber, VoucherType};

/// One account row of the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Net debit balance, zero if the account nets to credit.
    pub debit: Decimal,
    /// Net credit balance, zero if the account nets to debit.
    pub credit: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrialBalanceTotals {
    /// Total of the debit column.
    pub total_debit: Decimal,
    /// Total of the credit column.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceReport {
    /// Rows ordered by account code.
    pub rows: Vec<TrialBalanceRow>,
    /// Column totals.
    pub totals: TrialBalanceTotals,
}

/// One voucher in the day book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBookRow {
    /// Entry ID.
    pub entry_id: JournalEntryId,
    /// Voucher number.
    pub voucher_number: VoucherNumber,
    /// Voucher kind.
    pub voucher_type: VoucherType,
    /// Narration.
    pub narration: String,
    /// Voucher amount.
    pub total_amount: Decimal,
    /// Donor name, for receipts.
    pub donor_name: Option<String>,
    /// Supplier name, for payments.
    pub supplier_name: Option<String>,
    /// Whether the voucher is locked.
    pub is_finalized: bool,
}

/// Day book totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayBookSummary {
    /// Sum of receipt vouchers.
    pub total_receipts: Decimal,
    /// Sum of payment vouchers.
    pub total_payments: Decimal,
    /// Number of vouchers.
    pub voucher_count: usize,
}

/// All vouchers recorded on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBookReport {
    /// Report date.
    pub date: NaiveDate,
    /// Vouchers ordered by voucher number.
    pub rows: Vec<DayBookRow>,
    /// Totals.
    pub summary: DayBookSummary,
}
