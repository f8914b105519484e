//! Balance and report queries.
//!
//! Balances are never stored. Every call sums the journal lines again.

use std::collections::HashMap;

use chrono::NaiveDate;
use mizan_core::ledger::{AccountBalance, BalanceScope, LedgerAccount};
use mizan_core::reports::{DayBookReport, ReportService, TrialBalanceReport};
use mizan_shared::types::{AccountId, from_minor_units};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};
use uuid::Uuid;

use super::account::{AccountError, AccountRepository};
use super::journal::{JournalError, load_entries};
use crate::entities::{journal_entries, journal_items, ledger_accounts};

/// Read-only balance engine over the journal.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Balance of an account over all entries, in its normal-balance sign.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account does not exist.
    pub async fn balance(&self, account_id: AccountId) -> Result<Decimal, AccountError> {
        Ok(self.account_balance(account_id, BalanceScope::AllEntries).await?.balance)
    }

    /// Balance of an account with its debit and credit totals.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account does not exist.
    pub async fn account_balance(
        &self,
        account_id: AccountId,
        scope: BalanceScope,
    ) -> Result<AccountBalance, AccountError> {
        let account = AccountRepository::get_in(&self.db, account_id).await?;

        let amounts: Vec<(i64, i64)> = scoped(journal_items::Entity::find(), scope)
            .select_only()
            .column(journal_items::Column::DebitMinor)
            .column(journal_items::Column::CreditMinor)
            .filter(journal_items::Column::LedgerAccountId.eq(account_id.into_inner()))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(AccountBalance::from_lines(
            account.id,
            account.account_type,
            amounts
                .into_iter()
                .map(|(debit, credit)| (from_minor_units(debit), from_minor_units(credit))),
        ))
    }

    /// Balances of every account in the chart, including accounts without lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balances(
        &self,
        scope: BalanceScope,
    ) -> Result<HashMap<AccountId, AccountBalance>, AccountError> {
        let accounts = ledger_accounts::Entity::find().all(&self.db).await?;
        let mut balances: HashMap<AccountId, AccountBalance> = accounts
            .into_iter()
            .map(|model| {
                let account = LedgerAccount::from(model);
                (account.id, AccountBalance::new(account.id, account.account_type))
            })
            .collect();

        let amounts: Vec<(Uuid, i64, i64)> = scoped(journal_items::Entity::find(), scope)
            .select_only()
            .column(journal_items::Column::LedgerAccountId)
            .column(journal_items::Column::DebitMinor)
            .column(journal_items::Column::CreditMinor)
            .into_tuple()
            .all(&self.db)
            .await?;

        for (account_id, debit, credit) in amounts {
            if let Some(balance) = balances.get_mut(&AccountId::from(account_id)) {
                balance.record(from_minor_units(debit), from_minor_units(credit));
            }
        }
        Ok(balances)
    }

    /// Balances with every child account rolled up into its ancestors.
    ///
    /// # Errors
    ///
    /// `ParentCycle` if stored parent links loop; database errors otherwise.
    pub async fn rolled_up_balances(
        &self,
        scope: BalanceScope,
    ) -> Result<HashMap<AccountId, Decimal>, AccountError> {
        let chart = AccountRepository::chart_in(&self.db).await?;
        let own: HashMap<AccountId, Decimal> = self
            .balances(scope)
            .await?
            .into_iter()
            .map(|(id, balance)| (id, balance.balance))
            .collect();
        Ok(chart.roll_up(&own)?)
    }

    /// Trial balance over every account with activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance(
        &self,
        scope: BalanceScope,
    ) -> Result<TrialBalanceReport, AccountError> {
        let accounts: Vec<LedgerAccount> = ledger_accounts::Entity::find()
            .order_by_asc(ledger_accounts::Column::Code)
            .all(&self.db)
            .await?
            .into_iter()
            .map(LedgerAccount::from)
            .collect();
        let balances = self.balances(scope).await?;
        Ok(ReportService::trial_balance(&accounts, &balances))
    }

    /// Every voucher dated `date`, ordered by voucher number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn day_book(&self, date: NaiveDate) -> Result<DayBookReport, JournalError> {
        let models = journal_entries::Entity::find()
            .filter(journal_entries::Column::EntryDate.eq(date))
            .order_by_asc(journal_entries::Column::VoucherNumber)
            .all(&self.db)
            .await?;
        let entries = load_entries(&self.db, models).await?;
        Ok(ReportService::day_book(date, &entries))
    }
}

/// Restricts an item query to the entries `scope` counts.
fn scoped(
    query: Select<journal_items::Entity>,
    scope: BalanceScope,
) -> Select<journal_items::Entity> {
    match scope {
        BalanceScope::AllEntries => query,
        BalanceScope::FinalizedOnly => query
            .inner_join(journal_entries::Entity)
            .filter(journal_entries::Column::IsFinalized.eq(true)),
    }
}
