//! Persistent voucher numbering.
//!
//! Each (prefix, year) series has one counter row in `voucher_sequences`.
//! Numbers are drawn by incrementing the row inside the posting transaction:
//! PostgreSQL holds the row lock until commit, SQLite serializes writers, so
//! concurrent postings never see the same value. A rolled-back posting rolls
//! its increment back with it.

use chrono::{Datelike, NaiveDate, Utc};
use mizan_core::ledger::{LedgerError, VoucherNumber, VoucherPrefix, next_from_existing};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};

use super::journal::JournalError;
use crate::entities::{journal_entries, voucher_sequences};

/// Draws the next number of the `prefix` series for the year of `date`.
///
/// # Errors
///
/// Returns an error if the counter cannot be read or updated.
pub async fn next_number<C: ConnectionTrait>(
    conn: &C,
    prefix: VoucherPrefix,
    date: NaiveDate,
) -> Result<VoucherNumber, JournalError> {
    let year = date.year();
    ensure_series(conn, prefix, year).await?;

    voucher_sequences::Entity::update_many()
        .col_expr(
            voucher_sequences::Column::LastValue,
            Expr::col(voucher_sequences::Column::LastValue).add(1),
        )
        .col_expr(voucher_sequences::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(voucher_sequences::Column::Prefix.eq(prefix.as_str()))
        .filter(voucher_sequences::Column::Year.eq(year))
        .exec(conn)
        .await?;

    let last_value = last_value(conn, prefix, year)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("voucher sequence {prefix}-{year}")))?;
    let sequence = u32::try_from(last_value)
        .map_err(|_| LedgerError::InvalidVoucherNumber(format!("{prefix}-{year}-{last_value}")))?;
    Ok(VoucherNumber::new(prefix, year, sequence)?)
}

/// Records a caller-supplied number so later generated numbers exceed it.
///
/// # Errors
///
/// Returns an error if the counter cannot be updated.
pub async fn reserve_number<C: ConnectionTrait>(
    conn: &C,
    number: VoucherNumber,
) -> Result<(), JournalError> {
    ensure_series(conn, number.prefix(), number.year()).await?;

    voucher_sequences::Entity::update_many()
        .col_expr(
            voucher_sequences::Column::LastValue,
            Expr::value(i64::from(number.sequence())),
        )
        .col_expr(voucher_sequences::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(voucher_sequences::Column::Prefix.eq(number.prefix().as_str()))
        .filter(voucher_sequences::Column::Year.eq(number.year()))
        .filter(voucher_sequences::Column::LastValue.lt(i64::from(number.sequence())))
        .exec(conn)
        .await?;
    Ok(())
}

/// Creates the counter row of a series if it does not exist yet.
///
/// A new row starts from the highest number already used by stored entries,
/// so series that predate the counter table continue without collisions.
async fn ensure_series<C: ConnectionTrait>(
    conn: &C,
    prefix: VoucherPrefix,
    year: i32,
) -> Result<(), JournalError> {
    if last_value(conn, prefix, year).await?.is_some() {
        return Ok(());
    }

    let existing: Vec<String> = journal_entries::Entity::find()
        .select_only()
        .column(journal_entries::Column::VoucherNumber)
        .filter(journal_entries::Column::VoucherNumber.starts_with(format!("{prefix}-{year:04}-")))
        .into_tuple()
        .all(conn)
        .await?;
    let start = match NaiveDate::from_ymd_opt(year, 1, 1) {
        Some(date) => i64::from(next_from_existing(prefix, date, &existing)?.sequence()) - 1,
        None => 0,
    };

    let row = voucher_sequences::ActiveModel {
        prefix: Set(prefix.as_str().to_string()),
        year: Set(year),
        last_value: Set(start),
        updated_at: Set(Utc::now()),
    };
    let inserted = voucher_sequences::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                voucher_sequences::Column::Prefix,
                voucher_sequences::Column::Year,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await;
    match inserted {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn last_value<C: ConnectionTrait>(
    conn: &C,
    prefix: VoucherPrefix,
    year: i32,
) -> Result<Option<i64>, DbErr> {
    voucher_sequences::Entity::find()
        .select_only()
        .column(voucher_sequences::Column::LastValue)
        .filter(voucher_sequences::Column::Prefix.eq(prefix.as_str()))
        .filter(voucher_sequences::Column::Year.eq(year))
        .into_tuple()
        .one(conn)
        .await
}

/// Read access to voucher counters.
#[derive(Debug, Clone)]
pub struct VoucherSequenceRepository {
    db: DatabaseConnection,
}

impl VoucherSequenceRepository {
    /// Creates a new voucher sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The last number issued in a series, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn last_issued(
        &self,
        prefix: VoucherPrefix,
        year: i32,
    ) -> Result<Option<VoucherNumber>, JournalError> {
        let Some(value) = last_value(&self.db, prefix, year).await? else {
            return Ok(None);
        };
        let Ok(sequence) = u32::try_from(value) else {
            let raw = format!("{prefix}-{year}-{value}");
            return Err(LedgerError::InvalidVoucherNumber(raw).into());
        };
        if sequence == 0 {
            return Ok(None);
        }
        Ok(Some(VoucherNumber::new(prefix, year, sequence)?))
    }
}
