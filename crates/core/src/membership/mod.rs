//! Membership payments as ledger receipts.
//!
//! A member's online payment is split between the outstanding subscription and
//! a voluntary donation, then recorded as one finalized RECEIPT voucher:
//! Bank debit for the full amount, one credit per non-zero portion.

use chrono::NaiveDate;
use mizan_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{DonorRef, EntryHeader, JournalLine, LedgerError, PaymentMode, VoucherType};

/// How a payment divides between membership fee and donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MembershipSplit {
    /// Portion applied to the subscription.
    pub membership_portion: Decimal,
    /// Portion recorded as a voluntary donation.
    pub donation_portion: Decimal,
}

impl MembershipSplit {
    /// Splits `amount` against the fee still owed.
    ///
    /// - nothing owed: everything is a donation
    /// - amount covers what is owed: fee = owed, donation = remainder
    /// - otherwise: everything goes to the fee
    ///
    /// # Errors
    ///
    /// `InvalidSplit` if `amount` is not positive.
    pub fn compute(amount: Decimal, remaining_fee: Decimal) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidSplit(format!(
                "payment amount {amount} must be positive"
            )));
        }
        let split = if remaining_fee <= Decimal::ZERO {
            Self::new(Decimal::ZERO, amount)
        } else if amount >= remaining_fee {
            Self::new(remaining_fee, amount - remaining_fee)
        } else {
            Self::new(amount, Decimal::ZERO)
        };
        Ok(split)
    }

    /// An explicit split.
    #[must_use]
    pub const fn new(membership_portion: Decimal, donation_portion: Decimal) -> Self {
        Self {
            membership_portion,
            donation_portion,
        }
    }

    /// Sum of both portions.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.membership_portion + self.donation_portion
    }
}

/// Accounts a membership receipt posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptAccounts {
    /// Bank account receiving the money.
    pub bank: AccountId,
    /// Membership fee income.
    pub membership_fees: AccountId,
    /// Donation income.
    pub general_donations: AccountId,
}

/// A completed membership payment to be recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipReceipt {
    /// Receipt number issued by the payment processor.
    pub receipt_number: String,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount received.
    pub amount: Decimal,
    /// Fee/donation split.
    pub split: MembershipSplit,
    /// Paying member.
    pub donor: DonorRef,
    /// Payment mode.
    pub payment_mode: PaymentMode,
    /// Free-text note from the payment.
    pub notes: Option<String>,
}

impl MembershipReceipt {
    /// Checks that the split is non-negative and adds up to the amount.
    ///
    /// # Errors
    ///
    /// `InvalidSplit` describing the mismatch.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidSplit(format!(
                "payment amount {} must be positive",
                self.amount
            )));
        }
        if self.split.membership_portion < Decimal::ZERO
            || self.split.donation_portion < Decimal::ZERO
        {
            return Err(LedgerError::InvalidSplit("portions cannot be negative".to_string()));
        }
        if self.split.total() != self.amount {
            return Err(LedgerError::InvalidSplit(format!(
                "portions total {} but payment is {}",
                self.split.total(),
                self.amount
            )));
        }
        Ok(())
    }

    /// Narration of the receipt voucher.
    #[must_use]
    pub fn narration(&self) -> String {
        let note = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Payment");
        format!("Online - {} ({note})", self.receipt_number)
    }

    /// Header of the finalized receipt voucher.
    #[must_use]
    pub fn header(&self) -> EntryHeader {
        EntryHeader::new(VoucherType::Receipt, self.date, self.narration())
            .with_donor(self.donor.clone())
            .with_payment_mode(self.payment_mode)
            .finalized()
    }

    /// Lines of the receipt voucher. Zero portions produce no line.
    ///
    /// # Errors
    ///
    /// `InvalidSplit` if the split is inconsistent; line errors for bad amounts.
    pub fn lines(&self, accounts: ReceiptAccounts) -> Result<Vec<JournalLine>, LedgerError> {
        self.validate()?;
        let payer = self.donor.name.as_deref().unwrap_or("member");
        let mut lines = vec![
            JournalLine::debit(accounts.bank, self.amount)?
                .with_particulars(format!("Received from {payer}")),
        ];
        if self.split.membership_portion > Decimal::ZERO {
            lines.push(
                JournalLine::credit(accounts.membership_fees, self.split.membership_portion)?
                    .with_particulars("Membership Subscription"),
            );
        }
        if self.split.donation_portion > Decimal::ZERO {
            lines.push(
                JournalLine::credit(accounts.general_donations, self.split.donation_portion)?
                    .with_particulars("Voluntary Donation"),
            );
        }
        Ok(lines)
    }
}
