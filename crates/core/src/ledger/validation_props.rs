//! Property-based tests for journal validation rules.

use mizan_shared::types::AccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{AccountType, FundTag};
use super::entry::JournalLine;
use super::error::LedgerError;
use super::validation::{AccountInfo, JournalValidator, ResolvedLine};

/// Strategy for a positive amount from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

fn account(account_type: AccountType, fund_tag: Option<FundTag>) -> AccountInfo {
    let id = AccountId::new();
    AccountInfo {
        id,
        code: format!("{account_type}-{}", &id.to_string()[..8]),
        account_type,
        fund_tag,
        is_active: true,
    }
}

fn resolved(account: &AccountInfo, debit: Decimal, credit: Decimal) -> ResolvedLine {
    ResolvedLine {
        line: JournalLine::new(account.id, debit, credit).unwrap(),
        account: account.clone(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* split of a debit across several credits, the entry validates
    /// and its totals equal the debit.
    #[test]
    fn prop_balanced_entries_accepted(parts in prop::collection::vec(positive_amount(), 1..6)) {
        let bank = account(AccountType::Asset, None);
        let total: Decimal = parts.iter().copied().sum();
        let mut lines = vec![resolved(&bank, total, Decimal::ZERO)];
        for part in &parts {
            let income = account(AccountType::Income, Some(FundTag::General));
            lines.push(resolved(&income, Decimal::ZERO, *part));
        }

        let totals = JournalValidator::default().validate(&lines).unwrap();
        prop_assert_eq!(totals.total_debit, total);
        prop_assert!(totals.is_balanced());
    }

    /// *For any* non-zero difference between the sides, the entry is rejected.
    #[test]
    fn prop_unbalanced_entries_rejected(debit in positive_amount(), skew in positive_amount()) {
        let bank = account(AccountType::Asset, None);
        let income = account(AccountType::Income, None);
        let lines = vec![
            resolved(&bank, debit, Decimal::ZERO),
            resolved(&income, Decimal::ZERO, debit + skew),
        ];

        let result = JournalValidator::default().validate(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::UnbalancedEntry { .. })),
            "expected UnbalancedEntry, got {:?}",
            result
        );
    }

    /// *For any* amount, Zakat money paying a non-Zakat expense in the same
    /// entry is rejected, and paying a Zakat expense is accepted.
    #[test]
    fn prop_zakat_only_pays_zakat(amount in positive_amount()) {
        let zakat_fund = account(AccountType::Income, Some(FundTag::Zakat));
        let relief = account(AccountType::Expense, Some(FundTag::Zakat));
        let salary = account(AccountType::Expense, Some(FundTag::General));
        let validator = JournalValidator::default();

        let mixed = vec![
            resolved(&salary, amount, Decimal::ZERO),
            resolved(&zakat_fund, Decimal::ZERO, amount),
        ];
        let result = validator.validate(&mixed);
        prop_assert!(
            matches!(result, Err(LedgerError::FundMixingViolation { .. })),
            "expected FundMixingViolation, got {:?}",
            result
        );

        let proper = vec![
            resolved(&relief, amount, Decimal::ZERO),
            resolved(&zakat_fund, Decimal::ZERO, amount),
        ];
        prop_assert!(validator.validate(&proper).is_ok());
    }

    /// *For any* balanced entry touching an inactive account, validation fails.
    #[test]
    fn prop_inactive_account_rejected(amount in positive_amount()) {
        let bank = account(AccountType::Asset, None);
        let mut closed = account(AccountType::Income, None);
        closed.is_active = false;
        let lines = vec![
            resolved(&bank, amount, Decimal::ZERO),
            resolved(&closed, Decimal::ZERO, amount),
        ];

        let result = JournalValidator::default().validate(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::AccountInactive(_))),
            "expected AccountInactive, got {:?}",
            result
        );
    }
}
