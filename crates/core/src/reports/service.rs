//! Report generation service.

use std::collections::HashMap;

use chrono::NaiveDate;
use mizan_shared::types::AccountId;
use rust_decimal::Decimal;

use super::types::{
    DayBookReport, DayBookRow, DayBookSummary, TrialBalanceReport, TrialBalanceRow,
    TrialBalanceTotals,
};
use crate::ledger::{AccountBalance, JournalEntry, LedgerAccount, VoucherType};

/// Service for generating ledger reports.
pub struct ReportService;

impl ReportService {
    /// Generates a trial balance from the chart and per-account balances.
    ///
    /// Each account with activity appears once, its net placed in the debit or
    /// credit column. When every entry balances, the columns agree.
    #[must_use]
    pub fn trial_balance(
        accounts: &[LedgerAccount],
        balances: &HashMap<AccountId, AccountBalance>,
    ) -> TrialBalanceReport {
        let mut rows: Vec<TrialBalanceRow> = accounts
            .iter()
            .filter_map(|account| {
                let balance = balances.get(&account.id).filter(|b| !b.is_empty())?;
                let net = balance.net_debit();
                Some(TrialBalanceRow {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    debit: net.max(Decimal::ZERO),
                    credit: (-net).max(Decimal::ZERO),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = rows.iter().map(|r| r.debit).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit).sum();

        TrialBalanceReport {
            rows,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        }
    }

    /// Generates the day book for `date`. Entries on other dates are ignored.
    #[must_use]
    pub fn day_book(date: NaiveDate, entries: &[JournalEntry]) -> DayBookReport {
        let mut rows: Vec<DayBookRow> = entries
            .iter()
            .filter(|entry| entry.date == date)
            .map(|entry| DayBookRow {
                entry_id: entry.id,
                voucher_number: entry.voucher_number,
                voucher_type: entry.voucher_type,
                narration: entry.narration.clone(),
                total_amount: entry.total_amount(),
                donor_name: entry.donor.as_ref().and_then(|d| d.name.clone()),
                supplier_name: entry.supplier.as_ref().and_then(|s| s.name.clone()),
                is_finalized: entry.is_finalized(),
            })
            .collect();
        rows.sort_by_key(|row| row.voucher_number);

        let summary = rows.iter().fold(DayBookSummary::default(), |mut summary, row| {
            match row.voucher_type {
                VoucherType::Receipt => summary.total_receipts += row.total_amount,
                VoucherType::Payment => summary.total_payments += row.total_amount,
                VoucherType::Journal => {}
            }
            summary.voucher_count += 1;
            summary
        });

        DayBookReport { date, rows, summary }
    }
}
