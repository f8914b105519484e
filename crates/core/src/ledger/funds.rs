//! Cross-entry tracing of restricted fund money held in asset accounts.
//!
//! A bank account that received Zakat yesterday holds Zakat money today even
//! though today's payment entry never mentions the Zakat fund. Holdings are
//! derived from committed entries in date order:
//! - an untagged asset debited in an entry that credits an exclusive-fund
//!   account takes on that fund's money, up to the amount credited;
//! - an asset credited in an entry that debits an expense of that fund
//!   releases the holding, up to the expense amount;
//! - holdings never exceed the asset's balance.
//!
//! Transfers between asset accounts do not carry holdings.

use std::collections::{BTreeMap, HashMap};

use mizan_shared::types::AccountId;
use rust_decimal::Decimal;

use super::account::{AccountType, FundTag};
use super::error::LedgerError;
use super::validation::{FundPolicy, ResolvedLine};

/// Balance of one asset account split into restricted holdings and free money.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPosition {
    balance: Decimal,
    holdings: BTreeMap<FundTag, Decimal>,
}

impl AssetPosition {
    /// Debit-normal balance of the asset.
    #[must_use]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Money of `tag` held in the asset.
    #[must_use]
    pub fn holding(&self, tag: FundTag) -> Decimal {
        self.holdings.get(&tag).copied().unwrap_or_default()
    }

    /// Sum of all restricted holdings.
    #[must_use]
    pub fn restricted_total(&self) -> Decimal {
        self.holdings.values().copied().sum()
    }

    /// Balance not held for any restricted fund.
    #[must_use]
    pub fn free_balance(&self) -> Decimal {
        (self.balance - self.restricted_total()).max(Decimal::ZERO)
    }

    fn clamp_to_balance(&mut self) {
        let mut excess = self.restricted_total() - self.balance.max(Decimal::ZERO);
        for held in self.holdings.values_mut() {
            if excess <= Decimal::ZERO {
                break;
            }
            let cut = excess.min(*held);
            *held -= cut;
            excess -= cut;
        }
        self.holdings.retain(|_, held| !held.is_zero());
    }
}

/// Restricted holdings of every untagged asset account.
#[derive(Debug, Clone, Default)]
pub struct FundHoldings {
    positions: HashMap<AccountId, AssetPosition>,
}

impl FundHoldings {
    /// Creates empty holdings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays committed entries, oldest first.
    #[must_use]
    pub fn from_history<'a, I>(policy: &FundPolicy, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a [ResolvedLine]>,
    {
        let mut holdings = Self::new();
        for lines in entries {
            holdings.apply_entry(policy, lines);
        }
        holdings
    }

    /// Position of an asset account, if it has any history.
    #[must_use]
    pub fn position(&self, account: AccountId) -> Option<&AssetPosition> {
        self.positions.get(&account)
    }

    /// Folds one committed entry into the holdings.
    pub fn apply_entry(&mut self, policy: &FundPolicy, lines: &[ResolvedLine]) {
        let mut inflow: BTreeMap<FundTag, Decimal> = BTreeMap::new();
        let mut outflow: BTreeMap<FundTag, Decimal> = BTreeMap::new();
        for resolved in lines.iter().filter(|l| l.account.account_type != AccountType::Asset) {
            if let Some(tag) = policy.exclusive_tag(&resolved.account) {
                *inflow.entry(tag).or_default() += resolved.line.credit_amount();
                *outflow.entry(tag).or_default() += resolved.line.debit_amount();
            }
        }

        for resolved in lines.iter().filter(|l| l.is_untagged_asset()) {
            let position = self.positions.entry(resolved.account.id).or_default();
            let debit = resolved.line.debit_amount();
            let credit = resolved.line.credit_amount();
            position.balance += debit - credit;

            let mut unattributed = debit;
            for (tag, available) in &mut inflow {
                let take = unattributed.min(*available);
                if take > Decimal::ZERO {
                    *position.holdings.entry(*tag).or_default() += take;
                    *available -= take;
                    unattributed -= take;
                }
            }

            let mut unreleased = credit;
            for (tag, pending) in &mut outflow {
                let release = unreleased.min(*pending).min(position.holding(*tag));
                if release > Decimal::ZERO {
                    *position.holdings.entry(*tag).or_default() -= release;
                    *pending -= release;
                    unreleased -= release;
                }
            }

            position.clamp_to_balance();
        }
    }

    /// Checks that expenses paid out of untagged assets in `lines` do not
    /// consume restricted money held for another fund.
    ///
    /// # Errors
    ///
    /// `FundMixingViolation` naming the asset and the first expense of the
    /// offending fund group.
    pub fn check_spend(
        &self,
        policy: &FundPolicy,
        lines: &[ResolvedLine],
    ) -> Result<(), LedgerError> {
        // Expense spend grouped by exclusive fund; `None` collects everything else.
        let mut groups: BTreeMap<Option<FundTag>, (Decimal, &str)> = BTreeMap::new();
        for expense in lines.iter().filter(|l| l.is_expense_debit()) {
            let group = policy.exclusive_tag(&expense.account);
            let slot = groups
                .entry(group)
                .or_insert((Decimal::ZERO, expense.account.code.as_str()));
            slot.0 += expense.line.debit_amount();
        }
        if groups.is_empty() {
            return Ok(());
        }

        let empty = AssetPosition::default();
        for source in lines.iter().filter(|l| l.is_untagged_asset() && l.is_credit()) {
            let position = self.positions.get(&source.account.id).unwrap_or(&empty);
            if position.restricted_total().is_zero() {
                continue;
            }
            let paid = source.line.credit_amount();
            for (group, (spend, expense_code)) in &groups {
                let attributed = paid.min(*spend);
                let own = group.map_or(Decimal::ZERO, |tag| position.holding(tag));
                if attributed > position.free_balance() + own {
                    return Err(LedgerError::FundMixingViolation {
                        source_account: source.account.code.clone(),
                        expense_account: (*expense_code).to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::JournalLine;
    use crate::ledger::validation::AccountInfo;
    use mizan_shared::config::FundTracing;
    use rust_decimal_macros::dec;

    struct Chart {
        bank: AccountInfo,
        cash: AccountInfo,
        zakat_fund: AccountInfo,
        donations: AccountInfo,
        relief: AccountInfo,
        salary: AccountInfo,
    }

    fn info(code: &str, account_type: AccountType, fund_tag: Option<FundTag>) -> AccountInfo {
        AccountInfo {
            id: AccountId::new(),
            code: code.to_string(),
            account_type,
            fund_tag,
            is_active: true,
        }
    }

    fn chart() -> Chart {
        Chart {
            bank: info("1001", AccountType::Asset, None),
            cash: info("1002", AccountType::Asset, None),
            zakat_fund: info("4003", AccountType::Income, Some(FundTag::Zakat)),
            donations: info("4002", AccountType::Income, Some(FundTag::General)),
            relief: info("5003", AccountType::Expense, Some(FundTag::Zakat)),
            salary: info("5001", AccountType::Expense, Some(FundTag::General)),
        }
    }

    fn dr(account: &AccountInfo, amount: Decimal) -> ResolvedLine {
        ResolvedLine {
            line: JournalLine::debit(account.id, amount).unwrap(),
            account: account.clone(),
        }
    }

    fn cr(account: &AccountInfo, amount: Decimal) -> ResolvedLine {
        ResolvedLine {
            line: JournalLine::credit(account.id, amount).unwrap(),
            account: account.clone(),
        }
    }

    fn policy() -> FundPolicy {
        FundPolicy::new([FundTag::Zakat], FundTracing::CrossEntry)
    }

    #[test]
    fn test_zakat_receipt_is_held_in_bank() {
        let c = chart();
        let holdings = FundHoldings::from_history(
            &policy(),
            [&[dr(&c.bank, dec!(1000)), cr(&c.zakat_fund, dec!(1000))][..]],
        );
        let bank = holdings.position(c.bank.id).unwrap();
        assert_eq!(bank.balance(), dec!(1000));
        assert_eq!(bank.holding(FundTag::Zakat), dec!(1000));
        assert_eq!(bank.free_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_salary_from_zakat_money_rejected() {
        let c = chart();
        let holdings = FundHoldings::from_history(
            &policy(),
            [&[dr(&c.bank, dec!(1000)), cr(&c.zakat_fund, dec!(1000))][..]],
        );
        let salary_run = [dr(&c.salary, dec!(1000)), cr(&c.bank, dec!(1000))];
        let result = holdings.check_spend(&policy(), &salary_run);
        assert!(matches!(
            result,
            Err(LedgerError::FundMixingViolation { ref source_account, ref expense_account })
                if source_account == "1001" && expense_account == "5001"
        ));
    }

    #[test]
    fn test_relief_from_zakat_money_allowed_and_released() {
        let c = chart();
        let receipt = [dr(&c.bank, dec!(1000)), cr(&c.zakat_fund, dec!(1000))];
        let relief = [dr(&c.relief, dec!(1000)), cr(&c.bank, dec!(1000))];
        let mut holdings = FundHoldings::from_history(&policy(), [&receipt[..]]);
        assert!(holdings.check_spend(&policy(), &relief).is_ok());

        holdings.apply_entry(&policy(), &relief);
        let bank = holdings.position(c.bank.id).unwrap();
        assert_eq!(bank.balance(), Decimal::ZERO);
        assert_eq!(bank.restricted_total(), Decimal::ZERO);
    }

    #[test]
    fn test_free_money_alongside_zakat() {
        let c = chart();
        let history = [
            vec![dr(&c.bank, dec!(1000)), cr(&c.zakat_fund, dec!(1000))],
            vec![dr(&c.bank, dec!(500)), cr(&c.donations, dec!(500))],
        ];
        let holdings = FundHoldings::from_history(&policy(), history.iter().map(Vec::as_slice));
        assert!(holdings
            .check_spend(&policy(), &[dr(&c.salary, dec!(500)), cr(&c.bank, dec!(500))])
            .is_ok());
        assert!(holdings
            .check_spend(&policy(), &[dr(&c.salary, dec!(500.01)), cr(&c.bank, dec!(500.01))])
            .is_err());
    }

    #[test]
    fn test_holdings_clamped_to_balance() {
        let c = chart();
        let history = [
            vec![dr(&c.bank, dec!(1000)), cr(&c.zakat_fund, dec!(1000))],
            vec![dr(&c.bank, dec!(500)), cr(&c.donations, dec!(500))],
            vec![dr(&c.cash, dec!(1200)), cr(&c.bank, dec!(1200))],
        ];
        let holdings = FundHoldings::from_history(&policy(), history.iter().map(Vec::as_slice));
        let bank = holdings.position(c.bank.id).unwrap();
        assert_eq!(bank.balance(), dec!(300));
        assert_eq!(bank.holding(FundTag::Zakat), dec!(300));

        // Transfers do not carry holdings.
        let cash = holdings.position(c.cash.id).unwrap();
        assert_eq!(cash.restricted_total(), Decimal::ZERO);
        assert!(holdings
            .check_spend(&policy(), &[dr(&c.salary, dec!(1200)), cr(&c.cash, dec!(1200))])
            .is_ok());
    }

    #[test]
    fn test_asset_without_holdings_is_unrestricted() {
        let c = chart();
        let holdings = FundHoldings::new();
        assert!(holdings
            .check_spend(&policy(), &[dr(&c.salary, dec!(10)), cr(&c.bank, dec!(10))])
            .is_ok());
    }
}
