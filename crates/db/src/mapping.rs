//! Conversions between stored rows and ledger domain types.
//!
//! Amounts cross this boundary as minor units: rows hold `i64` paise, the
//! domain holds `Decimal`.

use mizan_core::ledger::{
    self, DonorRef, JournalEntry, JournalItem, JournalLine, LedgerAccount, LedgerError,
    SupplierRef,
};
use mizan_shared::types::{
    AccountId, JournalEntryId, JournalItemId, MemberId, SupplierId, UserId, from_minor_units,
    has_sub_minor_precision, to_minor_units,
};
use rust_decimal::Decimal;

use crate::entities::{journal_entries, journal_items, ledger_accounts, sea_orm_active_enums as db};

/// Converts an amount to stored minor units.
///
/// # Errors
///
/// - `ExcessPrecision` if the amount has more than two decimal places
/// - `AmountOutOfRange` if it does not fit in 64 bits of paise
pub fn minor_units(amount: Decimal) -> Result<i64, LedgerError> {
    if has_sub_minor_precision(amount) {
        return Err(LedgerError::ExcessPrecision(amount));
    }
    to_minor_units(amount).ok_or(LedgerError::AmountOutOfRange(amount))
}

macro_rules! mirror_enum {
    ($domain:ty, $stored:ty, { $($variant:ident),+ $(,)? }) => {
        impl From<$domain> for $stored {
            fn from(value: $domain) -> Self {
                match value {
                    $(<$domain>::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$stored> for $domain {
            fn from(value: $stored) -> Self {
                match value {
                    $(<$stored>::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(ledger::AccountType, db::AccountType, { Asset, Liability, Income, Expense, Equity });
mirror_enum!(ledger::FundTag, db::FundTag, { Zakat, Sadaqah, Construction, General });
mirror_enum!(ledger::VoucherType, db::VoucherType, { Receipt, Payment, Journal });
mirror_enum!(ledger::PaymentMode, db::PaymentMode, { Cash, Upi, BankTransfer, Cheque });
mirror_enum!(ledger::EntryStatus, db::EntryStatus, { Draft, Pending, Valid, Finalized });

impl From<ledger_accounts::Model> for LedgerAccount {
    fn from(model: ledger_accounts::Model) -> Self {
        Self {
            id: AccountId::from(model.id),
            code: model.code,
            name: model.name,
            account_type: model.account_type.into(),
            fund_tag: model.fund_tag.map(Into::into),
            parent_id: model.parent_id.map(AccountId::from),
            is_system: model.is_system,
            is_active: model.is_active,
        }
    }
}

/// Rebuilds a journal item from its row.
///
/// # Errors
///
/// `InvalidLine` if the stored amounts break the single-sided rule.
pub fn item_from_model(model: journal_items::Model) -> Result<JournalItem, LedgerError> {
    let mut line = JournalLine::new(
        AccountId::from(model.ledger_account_id),
        from_minor_units(model.debit_minor),
        from_minor_units(model.credit_minor),
    )?;
    if let Some(particulars) = model.particulars {
        line = line.with_particulars(particulars);
    }
    Ok(JournalItem {
        id: JournalItemId::from(model.id),
        entry_id: JournalEntryId::from(model.journal_entry_id),
        position: model.position,
        line,
    })
}

/// Rebuilds a journal entry from its header row and item rows.
///
/// Items are ordered by position regardless of the order given.
///
/// # Errors
///
/// `InvalidVoucherNumber` for a malformed stored number; item errors as in
/// [`item_from_model`].
pub fn entry_from_models(
    model: journal_entries::Model,
    items: Vec<journal_items::Model>,
) -> Result<JournalEntry, LedgerError> {
    let mut items = items
        .into_iter()
        .map(item_from_model)
        .collect::<Result<Vec<_>, _>>()?;
    items.sort_by_key(|item| item.position);

    let has_donor =
        model.donor_member_id.is_some() || model.donor_name.is_some() || model.donor_pan.is_some();
    let donor = has_donor.then(|| DonorRef {
        member_id: model.donor_member_id.map(MemberId::from),
        name: model.donor_name,
        pan: model.donor_pan,
    });
    let has_supplier = model.supplier_id.is_some() || model.supplier_name.is_some();
    let supplier = has_supplier.then(|| SupplierRef {
        supplier_id: model.supplier_id.map(SupplierId::from),
        name: model.supplier_name,
    });

    Ok(JournalEntry {
        id: JournalEntryId::from(model.id),
        voucher_number: model.voucher_number.parse()?,
        voucher_type: model.voucher_type.into(),
        date: model.entry_date,
        narration: model.narration,
        donor,
        supplier,
        payment_mode: model.payment_mode.map(Into::into),
        status: model.status.into(),
        created_by: model.created_by.map(UserId::from),
        created_at: model.created_at,
        updated_at: model.updated_at,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_minor_units() {
        assert_eq!(minor_units(dec!(1500.25)).unwrap(), 150_025);
        assert_eq!(minor_units(dec!(0.10)).unwrap(), 10);
        assert!(matches!(minor_units(dec!(1.005)), Err(LedgerError::ExcessPrecision(_))));
    }

    #[test]
    fn test_entry_from_models_orders_items() {
        let entry_id = Uuid::now_v7();
        let bank = Uuid::now_v7();
        let income = Uuid::now_v7();
        let now = Utc::now();
        let header = journal_entries::Model {
            id: entry_id,
            voucher_number: "RCP-2025-004".to_string(),
            voucher_type: db::VoucherType::Receipt,
            entry_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            narration: "Friday collection".to_string(),
            donor_member_id: None,
            donor_name: Some("Anonymous".to_string()),
            donor_pan: None,
            supplier_id: None,
            supplier_name: None,
            payment_mode: Some(db::PaymentMode::Cash),
            status: db::EntryStatus::Valid,
            is_finalized: false,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        let item = |position: i32, account: Uuid, debit: i64, credit: i64| journal_items::Model {
            id: Uuid::now_v7(),
            journal_entry_id: entry_id,
            ledger_account_id: account,
            position,
            debit_minor: debit,
            credit_minor: credit,
            particulars: None,
            created_at: now,
        };

        let items = vec![item(1, income, 0, 25_050), item(0, bank, 25_050, 0)];
        let entry = entry_from_models(header, items).unwrap();
        assert_eq!(entry.voucher_number.to_string(), "RCP-2025-004");
        assert_eq!(entry.items[0].line.account_id(), AccountId::from(bank));
        assert_eq!(entry.total_amount(), dec!(250.50));
        assert_eq!(entry.donor.unwrap().name.as_deref(), Some("Anonymous"));
        assert!(entry.supplier.is_none());
        assert_eq!(entry.payment_mode, Some(ledger::PaymentMode::Cash));
    }
}
