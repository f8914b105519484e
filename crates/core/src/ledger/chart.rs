//! Chart of accounts as an arena indexed by account id.
//!
//! Parent links are plain ids; the chart validates acyclicity on every
//! create/reparent and walks ancestors with a bounded loop so corrupt data
//! cannot hang a caller.

use std::collections::{HashMap, HashSet};

use mizan_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Serialize;

use super::account::LedgerAccount;
use super::error::LedgerError;

/// An account with its children, for hierarchical listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountNode {
    /// The account.
    pub account: LedgerAccount,
    /// Child accounts ordered by code.
    pub children: Vec<AccountNode>,
}

/// The full chart of accounts.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: HashMap<AccountId, LedgerAccount>,
    children: HashMap<AccountId, Vec<AccountId>>,
}

impl ChartOfAccounts {
    /// Builds the arena from a flat account list.
    #[must_use]
    pub fn new<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = LedgerAccount>,
    {
        let accounts: HashMap<AccountId, LedgerAccount> =
            accounts.into_iter().map(|account| (account.id, account)).collect();
        let mut children: HashMap<AccountId, Vec<AccountId>> = HashMap::new();
        for account in accounts.values() {
            if let Some(parent) = account.parent_id {
                children.entry(parent).or_default().push(account.id);
            }
        }
        for ids in children.values_mut() {
            ids.sort_by(|a, b| accounts[a].code.cmp(&accounts[b].code));
        }
        Self { accounts, children }
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&LedgerAccount> {
        self.accounts.get(&id)
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Direct children of `id`, ordered by code.
    #[must_use]
    pub fn children_of(&self, id: AccountId) -> &[AccountId] {
        self.children.get(&id).map_or(&[][..], Vec::as_slice)
    }

    /// Ancestors of `id`, nearest first.
    ///
    /// # Errors
    ///
    /// `ParentCycle` if the stored parent links loop.
    pub fn ancestors(&self, id: AccountId) -> Result<Vec<AccountId>, LedgerError> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|account| account.parent_id);
        while let Some(parent) = current {
            if parent == id || chain.len() > self.accounts.len() {
                return Err(LedgerError::ParentCycle { account: id, parent });
            }
            chain.push(parent);
            current = self.get(parent).and_then(|account| account.parent_id);
        }
        Ok(chain)
    }

    /// Checks that `account` (or a new account, when `None`) may be placed under `parent`.
    ///
    /// # Errors
    ///
    /// - `ParentNotFound` if `parent` is not in the chart
    /// - `ParentCycle` if `parent` is `account` or one of its descendants
    pub fn validate_parent(
        &self,
        account: Option<AccountId>,
        parent: AccountId,
    ) -> Result<(), LedgerError> {
        if self.get(parent).is_none() {
            return Err(LedgerError::ParentNotFound(parent));
        }
        let Some(account) = account else {
            return Ok(());
        };
        if account == parent || self.ancestors(parent)?.contains(&account) {
            return Err(LedgerError::ParentCycle { account, parent });
        }
        Ok(())
    }

    /// Top-level accounts ordered by code.
    #[must_use]
    pub fn roots(&self) -> Vec<&LedgerAccount> {
        let mut roots: Vec<&LedgerAccount> = self
            .accounts
            .values()
            .filter(|account| {
                account
                    .parent_id
                    .is_none_or(|parent| !self.accounts.contains_key(&parent))
            })
            .collect();
        roots.sort_by(|a, b| a.code.cmp(&b.code));
        roots
    }

    /// The chart as a forest ordered by code.
    #[must_use]
    pub fn tree(&self) -> Vec<AccountNode> {
        let mut visited = HashSet::new();
        self.roots()
            .into_iter()
            .filter_map(|root| self.node(root.id, &mut visited))
            .collect()
    }

    fn node(&self, id: AccountId, visited: &mut HashSet<AccountId>) -> Option<AccountNode> {
        if !visited.insert(id) {
            return None;
        }
        let account = self.get(id)?.clone();
        let children = self
            .children_of(id)
            .iter()
            .filter_map(|child| self.node(*child, visited))
            .collect();
        Some(AccountNode { account, children })
    }

    /// Rolls each account's own balance up into all its ancestors.
    ///
    /// Accounts missing from `balances` contribute zero. The result has an
    /// entry for every account in the chart.
    pub fn roll_up(
        &self,
        balances: &HashMap<AccountId, Decimal>,
    ) -> Result<HashMap<AccountId, Decimal>, LedgerError> {
        let mut totals: HashMap<AccountId, Decimal> =
            self.accounts.keys().map(|id| (*id, Decimal::ZERO)).collect();
        for id in self.accounts.keys() {
            let own = balances.get(id).copied().unwrap_or_default();
            if own.is_zero() {
                continue;
            }
            *totals.entry(*id).or_default() += own;
            for ancestor in self.ancestors(*id)? {
                *totals.entry(ancestor).or_default() += own;
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::account::AccountType;
    use rust_decimal_macros::dec;

    fn account(
        code: &str,
        account_type: AccountType,
        parent: Option<&LedgerAccount>,
    ) -> LedgerAccount {
        LedgerAccount {
            id: AccountId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type,
            fund_tag: None,
            parent_id: parent.map(|p| p.id),
            is_system: false,
            is_active: true,
        }
    }

    fn sample() -> (ChartOfAccounts, Vec<LedgerAccount>) {
        let assets = account("1000", AccountType::Asset, None);
        let bank = account("1001", AccountType::Asset, Some(&assets));
        let cash = account("1002", AccountType::Asset, Some(&assets));
        let petty = account("1003", AccountType::Asset, Some(&cash));
        let income = account("4000", AccountType::Income, None);
        let all = vec![assets, bank, cash, petty, income];
        (ChartOfAccounts::new(all.clone()), all)
    }

    #[test]
    fn test_tree_ordering() {
        let (chart, _) = sample();
        let tree = chart.tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].account.code, "1000");
        assert_eq!(tree[1].account.code, "4000");
        let codes: Vec<&str> = tree[0].children.iter().map(|n| n.account.code.as_str()).collect();
        assert_eq!(codes, ["1001", "1002"]);
        assert_eq!(tree[0].children[1].children[0].account.code, "1003");
    }

    #[test]
    fn test_ancestors() {
        let (chart, all) = sample();
        assert_eq!(chart.ancestors(all[3].id).unwrap(), vec![all[2].id, all[0].id]);
        assert!(chart.ancestors(all[0].id).unwrap().is_empty());
    }

    #[test]
    fn test_validate_parent_rejects_cycles() {
        let (chart, all) = sample();
        // Moving "Assets" under its grandchild.
        assert!(matches!(
            chart.validate_parent(Some(all[0].id), all[3].id),
            Err(LedgerError::ParentCycle { .. })
        ));
        assert!(matches!(
            chart.validate_parent(Some(all[1].id), all[1].id),
            Err(LedgerError::ParentCycle { .. })
        ));
        assert!(chart.validate_parent(Some(all[3].id), all[1].id).is_ok());
        assert!(chart.validate_parent(None, all[4].id).is_ok());
        assert!(matches!(
            chart.validate_parent(None, AccountId::new()),
            Err(LedgerError::ParentNotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_cycle_detected() {
        let mut a = account("9001", AccountType::Asset, None);
        let b = account("9002", AccountType::Asset, Some(&a));
        a.parent_id = Some(b.id);
        let chart = ChartOfAccounts::new([a.clone(), b]);
        assert!(matches!(chart.ancestors(a.id), Err(LedgerError::ParentCycle { .. })));
        assert!(chart.tree().is_empty());
    }

    #[test]
    fn test_roll_up() {
        let (chart, all) = sample();
        let balances = HashMap::from([
            (all[1].id, dec!(1000)),
            (all[2].id, dec!(200)),
            (all[3].id, dec!(50)),
        ]);
        let totals = chart.roll_up(&balances).unwrap();
        assert_eq!(totals[&all[0].id], dec!(1250));
        assert_eq!(totals[&all[2].id], dec!(250));
        assert_eq!(totals[&all[3].id], dec!(50));
        assert_eq!(totals[&all[4].id], Decimal::ZERO);
    }
}
