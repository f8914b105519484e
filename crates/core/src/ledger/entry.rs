//! Journal lines (debits and credits).

use mizan_shared::types::{AccountId, JournalEntryId, JournalItemId, has_sub_minor_precision};
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::LedgerError;

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit (left side).
    Debit,
    /// Credit (right side).
    Credit,
}

/// Checks that exactly one of `debit`/`credit` is strictly positive and the
/// other is zero, and that neither has sub-paisa precision.
pub fn check_line_amounts(debit: Decimal, credit: Decimal) -> Result<(), LedgerError> {
    let single_sided = (debit > Decimal::ZERO && credit.is_zero())
        || (credit > Decimal::ZERO && debit.is_zero());
    if !single_sided {
        return Err(LedgerError::InvalidLine { debit, credit });
    }
    let amount = debit.max(credit);
    if has_sub_minor_precision(amount) {
        return Err(LedgerError::ExcessPrecision(amount));
    }
    Ok(())
}

/// One debit or credit against an account.
///
/// Construction enforces the single-sided invariant, so a `JournalLine` value
/// is always valid on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalLine {
    account_id: AccountId,
    debit: Decimal,
    credit: Decimal,
    particulars: Option<String>,
}

impl JournalLine {
    /// Creates a line from raw amounts.
    ///
    /// # Errors
    ///
    /// `InvalidLine` unless exactly one side is positive; `ExcessPrecision` for
    /// amounts finer than one paisa.
    pub fn new(
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<Self, LedgerError> {
        check_line_amounts(debit, credit)?;
        Ok(Self {
            account_id,
            debit,
            credit,
            particulars: None,
        })
    }

    /// Creates a debit line.
    pub fn debit(account_id: AccountId, amount: Decimal) -> Result<Self, LedgerError> {
        Self::new(account_id, amount, Decimal::ZERO)
    }

    /// Creates a credit line.
    pub fn credit(account_id: AccountId, amount: Decimal) -> Result<Self, LedgerError> {
        Self::new(account_id, Decimal::ZERO, amount)
    }

    /// Attaches a particulars note.
    #[must_use]
    pub fn with_particulars(mut self, particulars: impl Into<String>) -> Self {
        self.particulars = Some(particulars.into());
        self
    }

    /// Account posted to.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Debit amount (zero on credit lines).
    #[must_use]
    pub const fn debit_amount(&self) -> Decimal {
        self.debit
    }

    /// Credit amount (zero on debit lines).
    #[must_use]
    pub const fn credit_amount(&self) -> Decimal {
        self.credit
    }

    /// Particulars note.
    #[must_use]
    pub fn particulars(&self) -> Option<&str> {
        self.particulars.as_deref()
    }

    /// Which side carries the amount.
    #[must_use]
    pub fn side(&self) -> Side {
        if self.debit > Decimal::ZERO {
            Side::Debit
        } else {
            Side::Credit
        }
    }

    /// The positive amount, whichever side it is on.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.debit.max(self.credit)
    }
}

/// A persisted journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalItem {
    /// Unique identifier.
    pub id: JournalItemId,
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Order within the entry, starting at zero.
    pub position: i32,
    /// The line itself.
    pub line: JournalLine,
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EntryTotals {
    /// Sum of all debits.
    pub total_debit: Decimal,
    /// Sum of all credits.
    pub total_credit: Decimal,
}

impl EntryTotals {
    /// Sums a set of lines with exact decimal arithmetic.
    #[must_use]
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a JournalLine>,
    {
        lines.into_iter().fold(Self::default(), |mut totals, line| {
            totals.total_debit += line.debit;
            totals.total_credit += line.credit;
            totals
        })
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    /// Debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }
}
