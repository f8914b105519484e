//! Account repository for chart of accounts database operations.

use chrono::Utc;
use mizan_core::ledger::{
    AccountChanges, AccountMatcher, AccountNode, AccountType, ChartOfAccounts, FundTag,
    LedgerAccount, LedgerError, NewAccount, ProtectionReason, WellKnownAccount, fund_tag_advisory,
};
use mizan_shared::AppError;
use mizan_shared::config::WellKnownCodes;
use mizan_shared::types::AccountId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use crate::entities::{journal_items, ledger_accounts, sea_orm_active_enums as db};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// A ledger rule was violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Ledger(err) => err.into(),
            AccountError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Filter by account type.
    pub account_type: Option<AccountType>,
    /// Filter by fund tag.
    pub fund_tag: Option<FundTag>,
    /// Filter by active status.
    pub is_active: Option<bool>,
    /// Filter by parent ID (`Some(None)` = root accounts only).
    pub parent_id: Option<Option<AccountId>>,
}

/// Account repository for the chart of accounts.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// - `DuplicateCode` if the code is taken
    /// - `ParentNotFound` if the parent does not exist
    pub async fn create(&self, input: NewAccount) -> Result<LedgerAccount, AccountError> {
        Self::create_in(&self.db, input).await
    }

    /// Creates a new account on `conn`, which may be an open transaction.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`].
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        input: NewAccount,
    ) -> Result<LedgerAccount, AccountError> {
        if Self::find_by_code_in(conn, &input.code).await?.is_some() {
            return Err(LedgerError::DuplicateCode(input.code).into());
        }

        if let Some(parent_id) = input.parent_id {
            let parent = ledger_accounts::Entity::find_by_id(parent_id.into_inner())
                .one(conn)
                .await?;
            if parent.is_none() {
                return Err(LedgerError::ParentNotFound(parent_id).into());
            }
        }

        if let Some(advisory) = fund_tag_advisory(input.account_type, input.fund_tag) {
            tracing::warn!(
                account_code = %input.code,
                account_type = %input.account_type,
                "{advisory}"
            );
        }

        let now = Utc::now();
        let code = input.code.clone();
        let account = ledger_accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            code: Set(input.code),
            name: Set(input.name),
            account_type: Set(input.account_type.into()),
            fund_tag: Set(input.fund_tag.map(Into::into)),
            parent_id: Set(input.parent_id.map(AccountId::into_inner)),
            is_system: Set(input.is_system),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = account
            .insert(conn)
            .await
            .map_err(|err| unique_code(err, &code))?;

        tracing::info!(
            account_code = %model.code,
            account_id = %model.id,
            "Ledger account created"
        );
        Ok(model.into())
    }

    /// Returns the account matching `matcher`, creating it from `defaults` if absent.
    ///
    /// # Errors
    ///
    /// - `AccountTypeMismatch` if an account with the code exists with another type
    /// - creation errors as in [`Self::create`]
    pub async fn find_or_create(
        &self,
        matcher: &AccountMatcher,
        defaults: NewAccount,
    ) -> Result<LedgerAccount, AccountError> {
        Self::find_or_create_in(&self.db, matcher, defaults).await
    }

    /// [`Self::find_or_create`] on `conn`, which may be an open transaction.
    ///
    /// # Errors
    ///
    /// Same as [`Self::find_or_create`].
    pub async fn find_or_create_in<C: ConnectionTrait>(
        conn: &C,
        matcher: &AccountMatcher,
        defaults: NewAccount,
    ) -> Result<LedgerAccount, AccountError> {
        if let Some(existing) = Self::find_by_code_in(conn, &matcher.code).await? {
            matcher.check(&existing)?;
            return Ok(existing);
        }
        Self::create_in(conn, defaults).await
    }

    /// Resolves a well-known account, provisioning it on first use.
    ///
    /// # Errors
    ///
    /// Same as [`Self::find_or_create`].
    pub async fn provision_in<C: ConnectionTrait>(
        conn: &C,
        account: WellKnownAccount,
        codes: &WellKnownCodes,
    ) -> Result<LedgerAccount, AccountError> {
        Self::find_or_create_in(conn, &account.matcher(codes), account.defaults(codes)).await
    }

    /// Gets an account by ID.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if no account has this ID.
    pub async fn get(&self, id: AccountId) -> Result<LedgerAccount, AccountError> {
        Self::get_in(&self.db, id).await
    }

    /// [`Self::get`] on `conn`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub async fn get_in<C: ConnectionTrait>(
        conn: &C,
        id: AccountId,
    ) -> Result<LedgerAccount, AccountError> {
        ledger_accounts::Entity::find_by_id(id.into_inner())
            .one(conn)
            .await?
            .map(LedgerAccount::from)
            .ok_or_else(|| LedgerError::AccountNotFound(id).into())
    }

    /// Finds an account by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<LedgerAccount>, AccountError> {
        Self::find_by_code_in(&self.db, code).await
    }

    async fn find_by_code_in<C: ConnectionTrait>(
        conn: &C,
        code: &str,
    ) -> Result<Option<LedgerAccount>, AccountError> {
        let account = ledger_accounts::Entity::find()
            .filter(ledger_accounts::Column::Code.eq(code))
            .one(conn)
            .await?;
        Ok(account.map(LedgerAccount::from))
    }

    /// Lists accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: AccountFilter) -> Result<Vec<LedgerAccount>, AccountError> {
        let mut query = ledger_accounts::Entity::find().order_by_asc(ledger_accounts::Column::Code);

        if let Some(account_type) = filter.account_type {
            let account_type = db::AccountType::from(account_type);
            query = query.filter(ledger_accounts::Column::AccountType.eq(account_type));
        }

        if let Some(fund_tag) = filter.fund_tag {
            query = query.filter(ledger_accounts::Column::FundTag.eq(db::FundTag::from(fund_tag)));
        }

        if let Some(is_active) = filter.is_active {
            query = query.filter(ledger_accounts::Column::IsActive.eq(is_active));
        }

        if let Some(parent_id) = filter.parent_id {
            match parent_id {
                Some(pid) => {
                    query = query.filter(ledger_accounts::Column::ParentId.eq(pid.into_inner()));
                }
                None => {
                    query = query.filter(ledger_accounts::Column::ParentId.is_null());
                }
            }
        }

        let accounts = query.all(&self.db).await?;
        Ok(accounts.into_iter().map(LedgerAccount::from).collect())
    }

    /// Loads the whole chart.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn chart(&self) -> Result<ChartOfAccounts, AccountError> {
        Self::chart_in(&self.db).await
    }

    pub(crate) async fn chart_in<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<ChartOfAccounts, AccountError> {
        let accounts = ledger_accounts::Entity::find().all(conn).await?;
        Ok(ChartOfAccounts::new(accounts.into_iter().map(LedgerAccount::from)))
    }

    /// The chart as a forest, each level ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn chart_tree(&self) -> Result<Vec<AccountNode>, AccountError> {
        Ok(self.chart().await?.tree())
    }

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account does not exist
    /// - `AccountTypeImmutable` if the change requests another type
    /// - `DuplicateCode` if the new code is taken
    /// - `ParentNotFound` / `ParentCycle` for an invalid new parent
    pub async fn update(
        &self,
        id: AccountId,
        changes: AccountChanges,
    ) -> Result<LedgerAccount, AccountError> {
        let txn = self.db.begin().await?;

        let model = ledger_accounts::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let mut account = LedgerAccount::from(model.clone());
        changes.apply_to(&mut account)?;

        if account.code != model.code
            && Self::find_by_code_in(&txn, &account.code).await?.is_some()
        {
            return Err(LedgerError::DuplicateCode(account.code).into());
        }

        if let Some(Some(parent_id)) = changes.parent_id {
            Self::chart_in(&txn).await?.validate_parent(Some(id), parent_id)?;
        }

        if changes.fund_tag.is_some()
            && let Some(advisory) = fund_tag_advisory(account.account_type, account.fund_tag)
        {
            tracing::warn!(
                account_code = %account.code,
                account_type = %account.account_type,
                "{advisory}"
            );
        }

        let mut active: ledger_accounts::ActiveModel = model.into();
        active.code = Set(account.code.clone());
        active.name = Set(account.name.clone());
        active.fund_tag = Set(account.fund_tag.map(Into::into));
        active.parent_id = Set(account.parent_id.map(AccountId::into_inner));
        active.is_active = Set(account.is_active);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&txn)
            .await
            .map_err(|err| unique_code(err, &account.code))?;
        txn.commit().await?;

        tracing::info!(
            account_code = %updated.code,
            account_id = %updated.id,
            "Ledger account updated"
        );
        Ok(updated.into())
    }

    /// Deletes an account.
    ///
    /// System accounts, accounts referenced by journal lines and accounts with
    /// children are never deleted.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account does not exist
    /// - `ProtectedAccount` naming the reason deletion was refused
    pub async fn delete(&self, id: AccountId) -> Result<(), AccountError> {
        let account = self.get(id).await?;

        if account.is_system {
            return Err(protected(&account, ProtectionReason::System));
        }

        let references = journal_items::Entity::find()
            .filter(journal_items::Column::LedgerAccountId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if references > 0 {
            return Err(protected(&account, ProtectionReason::Referenced(references)));
        }

        let children = ledger_accounts::Entity::find()
            .filter(ledger_accounts::Column::ParentId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if children > 0 {
            return Err(protected(&account, ProtectionReason::HasChildren(children)));
        }

        ledger_accounts::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        tracing::info!(account_code = %account.code, "Ledger account deleted");
        Ok(())
    }
}

fn protected(account: &LedgerAccount, reason: ProtectionReason) -> AccountError {
    tracing::warn!(account_code = %account.code, %reason, "Refused to delete ledger account");
    LedgerError::ProtectedAccount {
        code: account.code.clone(),
        reason,
    }
    .into()
}

/// Maps a unique-index violation on the account code to `DuplicateCode`.
fn unique_code(err: DbErr, code: &str) -> AccountError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            LedgerError::DuplicateCode(code.to_string()).into()
        }
        _ => AccountError::Database(err),
    }
}
