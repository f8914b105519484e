//! Account balance calculations.
//!
//! Balances are always derived from journal lines, never stored:
//! - Asset/Expense: balance = Σ debit - Σ credit (debit-normal)
//! - Liability/Income/Equity: balance = Σ credit - Σ debit (credit-normal)

use mizan_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountType;
use super::transaction::EntryStatus;

/// Side on which an account's balance grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Income, Equity).
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change for one line.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Which entries contribute to a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BalanceScope {
    /// Every persisted entry, finalized or not.
    #[default]
    AllEntries,
    /// Only finalized entries.
    FinalizedOnly,
}

impl BalanceScope {
    /// Returns true if lines of an entry with `status` count toward the balance.
    #[must_use]
    pub const fn includes(self, status: EntryStatus) -> bool {
        match self {
            Self::AllEntries => true,
            Self::FinalizedOnly => matches!(status, EntryStatus::Finalized),
        }
    }
}

/// Account balance derived from journal lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Account type, which fixes the sign convention.
    pub account_type: AccountType,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance on the account's normal side.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub const fn new(account_id: AccountId, account_type: AccountType) -> Self {
        Self {
            account_id,
            account_type,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Folds a set of `(debit, credit)` lines into a balance.
    #[must_use]
    pub fn from_lines<I>(account_id: AccountId, account_type: AccountType, lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let mut balance = Self::new(account_id, account_type);
        for (debit, credit) in lines {
            balance.record(debit, credit);
        }
        balance
    }

    /// Adds one line.
    pub fn record(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
        self.balance = self
            .account_type
            .normal_balance()
            .balance_change(self.debit_total, self.credit_total);
    }

    /// Net debit minus credit, regardless of normal side.
    #[must_use]
    pub fn net_debit(&self) -> Decimal {
        self.debit_total - self.credit_total
    }

    /// Returns true if no amount has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.debit_total.is_zero() && self.credit_total.is_zero()
    }
}
