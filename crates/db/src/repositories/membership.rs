//! Membership payments posted as receipt vouchers.

use mizan_core::ledger::{JournalEntry, LedgerPolicy, WellKnownAccount};
use mizan_core::membership::{MembershipReceipt, ReceiptAccounts};
use mizan_shared::config::WellKnownCodes;
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::account::AccountRepository;
use super::journal::{JournalError, JournalRepository};

/// Records completed membership payments in the ledger.
#[derive(Debug, Clone)]
pub struct MembershipLedger {
    db: DatabaseConnection,
    journal: JournalRepository,
    codes: WellKnownCodes,
}

impl MembershipLedger {
    /// Creates the integration with the posting policy and well-known account codes.
    #[must_use]
    pub fn new(db: DatabaseConnection, policy: LedgerPolicy, codes: WellKnownCodes) -> Self {
        let journal = JournalRepository::new(db.clone(), policy);
        Self { db, journal, codes }
    }

    /// Posts a finalized receipt for `receipt` in one transaction, provisioning
    /// the bank and income accounts on first use.
    ///
    /// Failures are logged and returned; nothing is persisted on failure.
    ///
    /// # Errors
    ///
    /// `InvalidSplit` for an inconsistent split, `AccountTypeMismatch` if a
    /// well-known code belongs to an account of another type, any posting
    /// error, or a storage failure.
    pub async fn post_receipt(
        &self,
        receipt: &MembershipReceipt,
    ) -> Result<JournalEntry, JournalError> {
        match self.post_receipt_inner(receipt).await {
            Ok(entry) => {
                tracing::info!(
                    receipt_number = %receipt.receipt_number,
                    voucher_number = %entry.voucher_number,
                    membership = %receipt.split.membership_portion,
                    donation = %receipt.split.donation_portion,
                    "Membership payment recorded"
                );
                Ok(entry)
            }
            Err(err) => {
                tracing::error!(
                    receipt_number = %receipt.receipt_number,
                    error = %err,
                    "Failed to record membership payment in ledger"
                );
                Err(err)
            }
        }
    }

    async fn post_receipt_inner(
        &self,
        receipt: &MembershipReceipt,
    ) -> Result<JournalEntry, JournalError> {
        receipt.validate()?;

        let txn = self.db.begin().await?;
        let codes = &self.codes;
        let bank = AccountRepository::provision_in(&txn, WellKnownAccount::Bank, codes).await?;
        let membership_fees =
            AccountRepository::provision_in(&txn, WellKnownAccount::MembershipFees, codes).await?;
        let general_donations =
            AccountRepository::provision_in(&txn, WellKnownAccount::GeneralDonations, codes)
                .await?;

        let lines = receipt.lines(ReceiptAccounts {
            bank: bank.id,
            membership_fees: membership_fees.id,
            general_donations: general_donations.id,
        })?;
        let entry = self.journal.post_entry_in(&txn, receipt.header(), lines).await?;
        txn.commit().await?;
        Ok(entry)
    }
}
