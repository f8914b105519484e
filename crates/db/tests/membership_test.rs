//! Integration tests for recording membership payments.

mod common;

use mizan_core::ledger::{
    AccountType, DonorRef, EntryStatus, LedgerError, LedgerPolicy, NewAccount, PaymentMode,
    VoucherType,
};
use mizan_core::membership::{MembershipReceipt, MembershipSplit};
use mizan_db::entities::{journal_entries, journal_items};
use mizan_db::repositories::AccountFilter;
use mizan_db::{AccountRepository, BalanceRepository, JournalError, MembershipLedger};
use mizan_shared::config::WellKnownCodes;
use mizan_shared::types::MemberId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};

use common::{date, setup};

fn receipt(number: &str, amount: Decimal, remaining_fee: Decimal) -> MembershipReceipt {
    MembershipReceipt {
        receipt_number: number.to_string(),
        date: date(2025, 7, 14),
        amount,
        split: MembershipSplit::compute(amount, remaining_fee).unwrap(),
        donor: DonorRef::member(MemberId::new(), "Yusuf Khan"),
        payment_mode: PaymentMode::Upi,
        notes: Some("Annual subscription".to_string()),
    }
}

#[tokio::test]
async fn test_split_posting() {
    let db = setup().await;
    let codes = WellKnownCodes::default();
    let ledger = MembershipLedger::new(db.clone(), LedgerPolicy::default(), codes.clone());

    let entry = ledger
        .post_receipt(&receipt("MR-1001", dec!(1500), dec!(1200)))
        .await
        .unwrap();

    assert_eq!(entry.voucher_type, VoucherType::Receipt);
    assert_eq!(entry.voucher_number.to_string(), "RCP-2025-001");
    assert_eq!(entry.status, EntryStatus::Finalized);
    assert_eq!(entry.narration, "Online - MR-1001 (Annual subscription)");
    assert_eq!(entry.items.len(), 3);
    assert_eq!(entry.total_amount(), dec!(1500));

    let accounts = AccountRepository::new(db.clone());
    let balances = BalanceRepository::new(db);
    let fees = accounts.find_by_code(&codes.membership_fees).await.unwrap().unwrap();
    let donations = accounts.find_by_code(&codes.general_donations).await.unwrap().unwrap();
    let bank = accounts.find_by_code(&codes.bank).await.unwrap().unwrap();
    assert!(bank.is_system);
    assert_eq!(balances.balance(fees.id).await.unwrap(), dec!(1200));
    assert_eq!(balances.balance(donations.id).await.unwrap(), dec!(300));
    assert_eq!(balances.balance(bank.id).await.unwrap(), dec!(1500));
}

#[tokio::test]
async fn test_provisioning_is_idempotent() {
    let db = setup().await;
    let ledger =
        MembershipLedger::new(db.clone(), LedgerPolicy::default(), WellKnownCodes::default());

    ledger
        .post_receipt(&receipt("MR-2001", dec!(1200), dec!(1200)))
        .await
        .unwrap();
    let second = ledger
        .post_receipt(&receipt("MR-2002", dec!(500), Decimal::ZERO))
        .await
        .unwrap();

    // Zero membership portion produces no line.
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.voucher_number.to_string(), "RCP-2025-002");

    let accounts = AccountRepository::new(db).list(AccountFilter::default()).await.unwrap();
    assert_eq!(accounts.len(), 3);
}

#[tokio::test]
async fn test_type_mismatch_persists_nothing() {
    let db = setup().await;
    let codes = WellKnownCodes::default();
    AccountRepository::new(db.clone())
        .create(NewAccount::new(codes.general_donations.clone(), "Misfiled", AccountType::Expense))
        .await
        .unwrap();
    let ledger = MembershipLedger::new(db.clone(), LedgerPolicy::default(), codes);

    let result = ledger.post_receipt(&receipt("MR-3001", dec!(800), dec!(500))).await;
    assert!(matches!(
        result,
        Err(JournalError::Ledger(LedgerError::AccountTypeMismatch { .. }))
    ));

    assert_eq!(journal_entries::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(journal_items::Entity::find().count(&db).await.unwrap(), 0);
    // Accounts provisioned before the failure were rolled back too.
    let accounts = AccountRepository::new(db).list(AccountFilter::default()).await.unwrap();
    assert_eq!(accounts.len(), 1);
}

#[tokio::test]
async fn test_inconsistent_split_rejected() {
    let db = setup().await;
    let ledger =
        MembershipLedger::new(db.clone(), LedgerPolicy::default(), WellKnownCodes::default());
    let mut bad = receipt("MR-4001", dec!(1000), dec!(1000));
    bad.split = MembershipSplit::new(dec!(600), dec!(300));

    let result = ledger.post_receipt(&bad).await;
    assert!(matches!(result, Err(JournalError::Ledger(LedgerError::InvalidSplit(_)))));
    assert_eq!(journal_entries::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_large_payment_requires_member_pan() {
    let db = setup().await;
    let ledger =
        MembershipLedger::new(db.clone(), LedgerPolicy::default(), WellKnownCodes::default());

    let result = ledger.post_receipt(&receipt("MR-5001", dec!(5000), dec!(1200))).await;
    assert!(matches!(
        result,
        Err(JournalError::Ledger(LedgerError::MissingDonorPan { .. }))
    ));

    let mut with_pan = receipt("MR-5002", dec!(5000), dec!(1200));
    with_pan.donor = with_pan.donor.with_pan("PQRSX6789K");
    ledger.post_receipt(&with_pan).await.unwrap();
}
