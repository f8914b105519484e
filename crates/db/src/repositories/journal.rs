//! Journal repository: posting, amending and reading vouchers.
//!
//! Every write runs as one database transaction. Lines are persisted first and
//! validated against what was written, re-read inside the transaction; any
//! violation drops the transaction so nothing of the entry survives, including
//! its voucher number.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use mizan_core::ledger::{
    AccountInfo, EntryHeader, EntryStatus, EntryTotals, FundHoldings, JournalEntry, JournalLine,
    JournalValidator, LedgerAccount, LedgerError, LedgerPolicy, ResolvedLine, VoucherNumber,
    VoucherType,
};
use mizan_shared::AppError;
use mizan_shared::types::{AccountId, JournalEntryId, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use super::account::AccountError;
use super::voucher;
use crate::entities::{journal_entries, journal_items, ledger_accounts, sea_orm_active_enums as db};
use crate::mapping::{entry_from_models, item_from_model, minor_units};

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// A ledger rule was violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl JournalError {
    /// The ledger rule that was violated, if this is not a storage failure.
    #[must_use]
    pub const fn ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(err) => Some(err),
            Self::Database(_) => None,
        }
    }
}

impl From<AccountError> for JournalError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Ledger(err) => Self::Ledger(err),
            AccountError::Database(err) => Self::Database(err),
        }
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Ledger(err) => err.into(),
            JournalError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

/// Filter options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Filter by voucher type.
    pub voucher_type: Option<VoucherType>,
    /// Filter by lifecycle status.
    pub status: Option<EntryStatus>,
    /// Earliest transaction date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest transaction date (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Only entries with a line on this account.
    pub account_id: Option<AccountId>,
}

/// Journal repository: the transaction orchestrator.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    policy: LedgerPolicy,
    validator: JournalValidator,
}

impl JournalRepository {
    /// Creates a new journal repository enforcing `policy`.
    #[must_use]
    pub fn new(db: DatabaseConnection, policy: LedgerPolicy) -> Self {
        let validator = JournalValidator::new(policy.funds.clone());
        Self { db, policy, validator }
    }

    /// The posting policy in force.
    #[must_use]
    pub const fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Posts an entry with its lines as one unit of work.
    ///
    /// An entry without lines is kept as a draft. Otherwise the entry is
    /// validated and stored as VALID, or FINALIZED if the header asks for it.
    ///
    /// # Errors
    ///
    /// Any ledger rule violation (`UnbalancedEntry`, `FundMixingViolation`,
    /// `DuplicateVoucherNumber`, ...) or a storage failure. Nothing is persisted.
    pub async fn post_entry(
        &self,
        header: EntryHeader,
        lines: Vec<JournalLine>,
    ) -> Result<JournalEntry, JournalError> {
        let txn = self.db.begin().await?;
        let entry = self
            .post_entry_in(&txn, header, lines)
            .await
            .inspect_err(log_rejection)?;
        txn.commit().await?;

        tracing::info!(
            voucher_number = %entry.voucher_number,
            voucher_type = %entry.voucher_type,
            status = %entry.status,
            total = %entry.total_amount(),
            "Journal entry posted"
        );
        Ok(entry)
    }

    /// [`Self::post_entry`] inside the caller's transaction. The caller commits.
    ///
    /// # Errors
    ///
    /// Same as [`Self::post_entry`]; the caller must drop the transaction on error.
    pub async fn post_entry_in(
        &self,
        txn: &DatabaseTransaction,
        header: EntryHeader,
        lines: Vec<JournalLine>,
    ) -> Result<JournalEntry, JournalError> {
        let voucher_number = match header.supplied_voucher_number()? {
            Some(number) => {
                if voucher_number_taken(txn, number).await? {
                    return Err(LedgerError::DuplicateVoucherNumber(number.to_string()).into());
                }
                voucher::reserve_number(txn, number).await?;
                number
            }
            None => voucher::next_number(txn, header.voucher_type.prefix(), header.date).await?,
        };

        let status = if lines.is_empty() {
            EntryStatus::Draft
        } else {
            EntryStatus::Draft.transition(EntryStatus::Pending)?
        };
        let model = insert_header(txn, &header, voucher_number, status).await?;
        let entry_id = JournalEntryId::from(model.id);

        if lines.is_empty() {
            if header.finalize {
                return Err(LedgerError::InvalidTransition {
                    from: EntryStatus::Draft,
                    to: EntryStatus::Finalized,
                }
                .into());
            }
            return load_entry(txn, entry_id).await;
        }

        insert_lines(txn, entry_id, 0, &lines).await?;
        self.validate_persisted(txn, entry_id, &header).await?;

        let mut status = status.transition(EntryStatus::Valid)?;
        if header.finalize {
            status = status.transition(EntryStatus::Finalized)?;
        }
        set_status(txn, model, status).await?;
        load_entry(txn, entry_id).await
    }

    /// Appends lines to a draft or valid entry and revalidates the whole entry.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound` if the entry does not exist
    /// - `EntryFinalized` if the entry is locked
    /// - any validation failure of the combined line set; nothing is appended
    pub async fn add_lines(
        &self,
        entry_id: JournalEntryId,
        lines: Vec<JournalLine>,
    ) -> Result<JournalEntry, JournalError> {
        let txn = self.db.begin().await?;
        let entry = self
            .add_lines_in(&txn, entry_id, lines)
            .await
            .inspect_err(log_rejection)?;
        txn.commit().await?;

        tracing::info!(
            voucher_number = %entry.voucher_number,
            lines = entry.items.len(),
            total = %entry.total_amount(),
            "Journal lines added"
        );
        Ok(entry)
    }

    async fn add_lines_in(
        &self,
        txn: &DatabaseTransaction,
        entry_id: JournalEntryId,
        lines: Vec<JournalLine>,
    ) -> Result<JournalEntry, JournalError> {
        let existing = load_entry(txn, entry_id).await?;
        if existing.is_finalized() {
            return Err(LedgerError::EntryFinalized(existing.voucher_number.to_string()).into());
        }
        if lines.is_empty() {
            return Ok(existing);
        }

        let pending = existing.status.transition(EntryStatus::Pending)?;
        let model = find_header(txn, entry_id).await?;
        let model = set_status(txn, model, pending).await?;

        let next_position = existing
            .items
            .iter()
            .map(|item| item.position + 1)
            .max()
            .unwrap_or(0);
        insert_lines(txn, entry_id, next_position, &lines).await?;
        self.validate_persisted(txn, entry_id, &header_of(&existing)).await?;

        set_status(txn, model, pending.transition(EntryStatus::Valid)?).await?;
        load_entry(txn, entry_id).await
    }

    /// Locks a valid entry.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound` if the entry does not exist
    /// - `EntryFinalized` if it is already locked
    /// - `InvalidTransition` if it is a draft
    pub async fn finalize_entry(
        &self,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, JournalError> {
        let txn = self.db.begin().await?;
        let model = find_header(&txn, entry_id).await?;
        let status = EntryStatus::from(model.status);
        if status.is_terminal() {
            return Err(LedgerError::EntryFinalized(model.voucher_number).into());
        }
        let status = status.transition(EntryStatus::Finalized).inspect_err(|err| {
            tracing::warn!(
                voucher_number = %model.voucher_number,
                error = %err,
                "Finalization refused"
            );
        })?;
        set_status(&txn, model, status).await?;
        let entry = load_entry(&txn, entry_id).await?;
        txn.commit().await?;

        tracing::info!(voucher_number = %entry.voucher_number, "Journal entry finalized");
        Ok(entry)
    }

    /// Deletes a non-finalized entry together with its lines.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound` if the entry does not exist
    /// - `EntryFinalized` if the entry is locked
    pub async fn delete_entry(&self, entry_id: JournalEntryId) -> Result<(), JournalError> {
        let txn = self.db.begin().await?;
        let model = find_header(&txn, entry_id).await?;
        if model.is_finalized || EntryStatus::from(model.status).is_terminal() {
            return Err(LedgerError::EntryFinalized(model.voucher_number).into());
        }

        journal_items::Entity::delete_many()
            .filter(journal_items::Column::JournalEntryId.eq(model.id))
            .exec(&txn)
            .await?;
        journal_entries::Entity::delete_by_id(model.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(voucher_number = %model.voucher_number, "Journal entry deleted");
        Ok(())
    }

    /// Gets an entry with its lines.
    ///
    /// # Errors
    ///
    /// `EntryNotFound` if the entry does not exist.
    pub async fn get_entry(&self, entry_id: JournalEntryId) -> Result<JournalEntry, JournalError> {
        load_entry(&self.db, entry_id).await
    }

    /// Finds an entry by voucher number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_voucher_number(
        &self,
        voucher_number: &str,
    ) -> Result<Option<JournalEntry>, JournalError> {
        let model = journal_entries::Entity::find()
            .filter(journal_entries::Column::VoucherNumber.eq(voucher_number))
            .one(&self.db)
            .await?;
        match model {
            Some(model) => Ok(load_entries(&self.db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Lists entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_entries(
        &self,
        filter: EntryFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<JournalEntry>, JournalError> {
        let mut query = journal_entries::Entity::find()
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::CreatedAt)
            .order_by_desc(journal_entries::Column::Id);

        if let Some(voucher_type) = filter.voucher_type {
            let voucher_type = db::VoucherType::from(voucher_type);
            query = query.filter(journal_entries::Column::VoucherType.eq(voucher_type));
        }
        if let Some(status) = filter.status {
            query = query.filter(journal_entries::Column::Status.eq(db::EntryStatus::from(status)));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(journal_entries::Column::EntryDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(journal_entries::Column::EntryDate.lte(date_to));
        }
        if let Some(account_id) = filter.account_id {
            let entry_ids: Vec<Uuid> = journal_items::Entity::find()
                .select_only()
                .column(journal_items::Column::JournalEntryId)
                .filter(journal_items::Column::LedgerAccountId.eq(account_id.into_inner()))
                .distinct()
                .into_tuple()
                .all(&self.db)
                .await?;
            query = query.filter(journal_entries::Column::Id.is_in(entry_ids));
        }

        let total = query.clone().count(&self.db).await?;
        let models = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        let entries = load_entries(&self.db, models).await?;

        Ok(PageResponse::new(entries, page.page, page.per_page, total))
    }

    /// Validates the entry as persisted: re-reads its lines, resolves their
    /// accounts and applies the ledger rules.
    async fn validate_persisted(
        &self,
        txn: &DatabaseTransaction,
        entry_id: JournalEntryId,
        header: &EntryHeader,
    ) -> Result<EntryTotals, JournalError> {
        let items = journal_items::Entity::find()
            .filter(journal_items::Column::JournalEntryId.eq(entry_id.into_inner()))
            .order_by_asc(journal_items::Column::Position)
            .all(txn)
            .await?;
        let lines = items
            .into_iter()
            .map(|model| item_from_model(model).map(|item| item.line))
            .collect::<Result<Vec<_>, _>>()?;

        let accounts = account_infos(txn, lines.iter().map(JournalLine::account_id)).await?;
        let resolved = ResolvedLine::resolve_all(&lines, |id| {
            accounts.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id))
        })?;

        let holdings = if self.validator.needs_history() {
            self.fund_holdings(txn, entry_id, &resolved).await?
        } else {
            FundHoldings::new()
        };
        let totals = self.validator.validate_with_history(&resolved, &holdings)?;
        header.check_donor_pan(totals.total_debit, self.policy.pan_required_above)?;
        Ok(totals)
    }

    /// Replays committed history of the untagged assets this entry pays from.
    async fn fund_holdings(
        &self,
        txn: &DatabaseTransaction,
        entry_id: JournalEntryId,
        resolved: &[ResolvedLine],
    ) -> Result<FundHoldings, JournalError> {
        let sources: HashSet<Uuid> = resolved
            .iter()
            .filter(|r| r.is_untagged_asset() && r.is_credit())
            .map(|r| r.account.id.into_inner())
            .collect();
        if sources.is_empty() {
            return Ok(FundHoldings::new());
        }

        let entry_ids: Vec<Uuid> = journal_items::Entity::find()
            .select_only()
            .column(journal_items::Column::JournalEntryId)
            .filter(journal_items::Column::LedgerAccountId.is_in(sources))
            .filter(journal_items::Column::JournalEntryId.ne(entry_id.into_inner()))
            .distinct()
            .into_tuple()
            .all(txn)
            .await?;
        if entry_ids.is_empty() {
            return Ok(FundHoldings::new());
        }

        let history = journal_entries::Entity::find()
            .filter(journal_entries::Column::Id.is_in(entry_ids.clone()))
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::CreatedAt)
            .order_by_asc(journal_entries::Column::Id)
            .all(txn)
            .await?;
        let mut items_by_entry = items_by_entry(txn, entry_ids).await?;

        let mut lines_by_entry = Vec::with_capacity(history.len());
        for model in &history {
            let lines = items_by_entry
                .remove(&model.id)
                .unwrap_or_default()
                .into_iter()
                .map(|item| item_from_model(item).map(|item| item.line))
                .collect::<Result<Vec<_>, _>>()?;
            lines_by_entry.push(lines);
        }

        let referenced = lines_by_entry.iter().flatten().map(JournalLine::account_id);
        let accounts = account_infos(txn, referenced).await?;
        let resolved_history = lines_by_entry
            .iter()
            .map(|lines| {
                ResolvedLine::resolve_all(lines, |id| {
                    accounts.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FundHoldings::from_history(
            self.validator.policy(),
            resolved_history.iter().map(Vec::as_slice),
        ))
    }
}

fn log_rejection(err: &JournalError) {
    match err {
        JournalError::Ledger(err) => {
            tracing::warn!(error_code = err.error_code(), error = %err, "Journal entry rejected");
        }
        JournalError::Database(err) => {
            tracing::error!(error = %err, "Journal entry not stored");
        }
    }
}

/// Header fields of a stored entry, for rules that read the header.
fn header_of(entry: &JournalEntry) -> EntryHeader {
    let mut header = EntryHeader::new(entry.voucher_type, entry.date, entry.narration.clone());
    header.donor.clone_from(&entry.donor);
    header.supplier.clone_from(&entry.supplier);
    header.payment_mode = entry.payment_mode;
    header
}

async fn voucher_number_taken<C: ConnectionTrait>(
    conn: &C,
    number: VoucherNumber,
) -> Result<bool, DbErr> {
    let count = journal_entries::Entity::find()
        .filter(journal_entries::Column::VoucherNumber.eq(number.to_string()))
        .count(conn)
        .await?;
    Ok(count > 0)
}

async fn insert_header(
    txn: &DatabaseTransaction,
    header: &EntryHeader,
    voucher_number: VoucherNumber,
    status: EntryStatus,
) -> Result<journal_entries::Model, JournalError> {
    let now = Utc::now();
    let donor = header.donor.as_ref();
    let supplier = header.supplier.as_ref();
    let entry = journal_entries::ActiveModel {
        id: Set(JournalEntryId::new().into_inner()),
        voucher_number: Set(voucher_number.to_string()),
        voucher_type: Set(header.voucher_type.into()),
        entry_date: Set(header.date),
        narration: Set(header.narration.clone()),
        donor_member_id: Set(donor.and_then(|d| d.member_id).map(Into::into)),
        donor_name: Set(donor.and_then(|d| d.name.clone())),
        donor_pan: Set(donor.and_then(|d| d.pan.clone())),
        supplier_id: Set(supplier.and_then(|s| s.supplier_id).map(Into::into)),
        supplier_name: Set(supplier.and_then(|s| s.name.clone())),
        payment_mode: Set(header.payment_mode.map(Into::into)),
        status: Set(status.into()),
        is_finalized: Set(false),
        created_by: Set(header.created_by.map(Into::into)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    entry.insert(txn).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            JournalError::from(LedgerError::DuplicateVoucherNumber(voucher_number.to_string()))
        }
        _ => JournalError::from(err),
    })
}

/// Appends `lines` from `first_position` on. Every referenced account must exist.
async fn insert_lines(
    txn: &DatabaseTransaction,
    entry_id: JournalEntryId,
    first_position: i32,
    lines: &[JournalLine],
) -> Result<(), JournalError> {
    let known = account_infos(txn, lines.iter().map(JournalLine::account_id)).await?;
    if let Some(missing) = lines
        .iter()
        .map(JournalLine::account_id)
        .find(|id| !known.contains_key(id))
    {
        return Err(LedgerError::AccountNotFound(missing).into());
    }

    let now = Utc::now();
    let mut rows = Vec::with_capacity(lines.len());
    for (position, line) in (first_position..).zip(lines) {
        rows.push(journal_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            journal_entry_id: Set(entry_id.into_inner()),
            ledger_account_id: Set(line.account_id().into_inner()),
            position: Set(position),
            debit_minor: Set(minor_units(line.debit_amount())?),
            credit_minor: Set(minor_units(line.credit_amount())?),
            particulars: Set(line.particulars().map(str::to_string)),
            created_at: Set(now),
        });
    }
    if rows.is_empty() {
        return Ok(());
    }
    journal_items::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await?;
    Ok(())
}

async fn set_status(
    txn: &DatabaseTransaction,
    model: journal_entries::Model,
    status: EntryStatus,
) -> Result<journal_entries::Model, JournalError> {
    let mut active: journal_entries::ActiveModel = model.into();
    active.status = Set(status.into());
    active.is_finalized = Set(status == EntryStatus::Finalized);
    active.updated_at = Set(Utc::now());
    Ok(active.update(txn).await?)
}

async fn find_header<C: ConnectionTrait>(
    conn: &C,
    entry_id: JournalEntryId,
) -> Result<journal_entries::Model, JournalError> {
    journal_entries::Entity::find_by_id(entry_id.into_inner())
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()).into())
}

async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: JournalEntryId,
) -> Result<JournalEntry, JournalError> {
    let model = find_header(conn, entry_id).await?;
    load_entries(conn, vec![model])
        .await?
        .pop()
        .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()).into())
}

/// Attaches lines to entry rows, keeping the given order.
pub(crate) async fn load_entries<C: ConnectionTrait>(
    conn: &C,
    models: Vec<journal_entries::Model>,
) -> Result<Vec<JournalEntry>, JournalError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let mut items = items_by_entry(conn, models.iter().map(|m| m.id).collect()).await?;
    models
        .into_iter()
        .map(|model| {
            let lines = items.remove(&model.id).unwrap_or_default();
            entry_from_models(model, lines).map_err(JournalError::from)
        })
        .collect()
}

async fn items_by_entry<C: ConnectionTrait>(
    conn: &C,
    entry_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<journal_items::Model>>, DbErr> {
    let items = journal_items::Entity::find()
        .filter(journal_items::Column::JournalEntryId.is_in(entry_ids))
        .order_by_asc(journal_items::Column::Position)
        .all(conn)
        .await?;
    let mut grouped: HashMap<Uuid, Vec<journal_items::Model>> = HashMap::new();
    for item in items {
        grouped.entry(item.journal_entry_id).or_default().push(item);
    }
    Ok(grouped)
}

async fn account_infos<C, I>(conn: &C, ids: I) -> Result<HashMap<AccountId, AccountInfo>, DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = AccountId>,
{
    let ids: HashSet<Uuid> = ids.into_iter().map(AccountId::into_inner).collect();
    let accounts = ledger_accounts::Entity::find()
        .filter(ledger_accounts::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(accounts
        .into_iter()
        .map(|model| {
            let account = LedgerAccount::from(model);
            (account.id, AccountInfo::from(&account))
        })
        .collect())
}
