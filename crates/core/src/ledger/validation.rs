//! Business rule validation for journal entries.
//!
//! Validation runs against the full line set of an entry, with each line
//! resolved to the account facts the rules need:
//! 1. Empty line sets pass (draft under construction)
//! 2. Every line is single-sided and posts to an active account
//! 3. Total debits equal total credits, exactly
//! 4. Money from an exclusive fund only pays expenses of the same fund

use std::collections::BTreeSet;

use mizan_shared::config::{FundTracing, LedgerConfig};
use mizan_shared::types::AccountId;
use rust_decimal::Decimal;

use super::account::{AccountType, FundTag, LedgerAccount};
use super::entry::{EntryTotals, JournalLine, check_line_amounts};
use super::error::LedgerError;
use super::funds::FundHoldings;

/// Information about an account needed for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// The account code, used in error reports.
    pub code: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Fund restriction class.
    pub fund_tag: Option<FundTag>,
    /// Whether the account accepts postings.
    pub is_active: bool,
}

impl From<&LedgerAccount> for AccountInfo {
    fn from(account: &LedgerAccount) -> Self {
        Self {
            id: account.id,
            code: account.code.clone(),
            account_type: account.account_type,
            fund_tag: account.fund_tag,
            is_active: account.is_active,
        }
    }
}

/// A line paired with its account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    /// The line.
    pub line: JournalLine,
    /// The account it posts to.
    pub account: AccountInfo,
}

impl ResolvedLine {
    /// Resolves every line through `lookup`.
    ///
    /// # Errors
    ///
    /// Propagates the first lookup failure (usually `AccountNotFound`).
    pub fn resolve_all<A>(lines: &[JournalLine], lookup: A) -> Result<Vec<Self>, LedgerError>
    where
        A: Fn(AccountId) -> Result<AccountInfo, LedgerError>,
    {
        lines
            .iter()
            .map(|line| {
                Ok(Self {
                    account: lookup(line.account_id())?,
                    line: line.clone(),
                })
            })
            .collect()
    }

    /// Returns true if the line debits an expense account.
    #[must_use]
    pub fn is_expense_debit(&self) -> bool {
        self.account.account_type == AccountType::Expense
            && self.line.debit_amount() > Decimal::ZERO
    }

    /// Returns true if the line is a credit.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.line.credit_amount() > Decimal::ZERO
    }

    /// Returns true if the line posts to an asset account without a fund tag.
    #[must_use]
    pub fn is_untagged_asset(&self) -> bool {
        self.account.account_type == AccountType::Asset && self.account.fund_tag.is_none()
    }
}

/// Which funds are exclusive and how far restrictions are traced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundPolicy {
    exclusive: BTreeSet<FundTag>,
    tracing: FundTracing,
}

impl Default for FundPolicy {
    fn default() -> Self {
        Self::new([FundTag::Zakat], FundTracing::SameEntry)
    }
}

impl FundPolicy {
    /// Creates a policy. `GENERAL` is never exclusive and is dropped if given.
    #[must_use]
    pub fn new<I>(exclusive: I, tracing: FundTracing) -> Self
    where
        I: IntoIterator<Item = FundTag>,
    {
        Self {
            exclusive: exclusive
                .into_iter()
                .filter(|tag| *tag != FundTag::General)
                .collect(),
            tracing,
        }
    }

    /// Returns true if money tagged `tag` may only pay expenses tagged `tag`.
    #[must_use]
    pub fn is_exclusive(&self, tag: FundTag) -> bool {
        self.exclusive.contains(&tag)
    }

    /// Exclusive funds in a stable order.
    pub fn exclusive_funds(&self) -> impl Iterator<Item = FundTag> + '_ {
        self.exclusive.iter().copied()
    }

    /// Tracing scope.
    #[must_use]
    pub const fn tracing(&self) -> FundTracing {
        self.tracing
    }

    /// The exclusive fund an account's money belongs to, if any.
    #[must_use]
    pub fn exclusive_tag(&self, account: &AccountInfo) -> Option<FundTag> {
        account.fund_tag.filter(|tag| self.is_exclusive(*tag))
    }
}

/// Posting rules derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Fund restriction rules.
    pub funds: FundPolicy,
    /// Receipts above this total naming a donor must carry a PAN.
    pub pan_required_above: Option<Decimal>,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            funds: FundPolicy::default(),
            pan_required_above: Some(Decimal::new(2000, 0)),
        }
    }
}

impl LedgerPolicy {
    /// Builds the policy from the `ledger` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `UnknownValue` if an exclusive fund name is not a fund tag.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let exclusive = config
            .exclusive_funds
            .iter()
            .map(|name| name.parse::<FundTag>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            funds: FundPolicy::new(exclusive, config.fund_tracing),
            pan_required_above: config.pan_required_above,
        })
    }
}

/// Validates journal entries before commit.
///
/// Pure business logic: callers resolve accounts and, for cross-entry
/// tracing, supply the fund holdings derived from committed history.
#[derive(Debug, Clone, Default)]
pub struct JournalValidator {
    policy: FundPolicy,
}

impl JournalValidator {
    /// Creates a validator with the given fund policy.
    #[must_use]
    pub const fn new(policy: FundPolicy) -> Self {
        Self { policy }
    }

    /// The fund policy in force.
    #[must_use]
    pub const fn policy(&self) -> &FundPolicy {
        &self.policy
    }

    /// Returns true if validation needs fund holdings from committed entries.
    #[must_use]
    pub fn needs_history(&self) -> bool {
        self.policy.tracing() == FundTracing::CrossEntry
    }

    /// Validates an entry's lines on their own.
    ///
    /// # Errors
    ///
    /// - `InvalidLine` / `ExcessPrecision` for a malformed line
    /// - `AccountInactive` for a line posting to an inactive account
    /// - `UnbalancedEntry` if debits and credits differ
    /// - `FundMixingViolation` if exclusive-fund money pays another fund's expense
    pub fn validate(&self, lines: &[ResolvedLine]) -> Result<EntryTotals, LedgerError> {
        if lines.is_empty() {
            return Ok(EntryTotals::default());
        }

        for resolved in lines {
            check_line_amounts(resolved.line.debit_amount(), resolved.line.credit_amount())?;
            if !resolved.account.is_active {
                return Err(LedgerError::AccountInactive(resolved.account.code.clone()));
            }
        }

        let totals = EntryTotals::from_lines(lines.iter().map(|resolved| &resolved.line));
        if !totals.is_balanced() {
            return Err(LedgerError::UnbalancedEntry {
                total_debit: totals.total_debit,
                total_credit: totals.total_credit,
            });
        }

        self.check_same_entry_funds(lines)?;
        Ok(totals)
    }

    /// Validates an entry, additionally tracing restricted money held in asset
    /// accounts when the policy asks for cross-entry tracing.
    ///
    /// `holdings` must be built from committed entries only, excluding this one.
    pub fn validate_with_history(
        &self,
        lines: &[ResolvedLine],
        holdings: &FundHoldings,
    ) -> Result<EntryTotals, LedgerError> {
        let totals = self.validate(lines)?;
        if self.needs_history() {
            holdings.check_spend(&self.policy, lines)?;
        }
        Ok(totals)
    }

    fn check_same_entry_funds(&self, lines: &[ResolvedLine]) -> Result<(), LedgerError> {
        for expense in lines.iter().filter(|l| l.is_expense_debit()) {
            for source in lines.iter().filter(|l| l.is_credit()) {
                let Some(tag) = self.policy.exclusive_tag(&source.account) else {
                    continue;
                };
                if expense.account.fund_tag != Some(tag) {
                    return Err(LedgerError::FundMixingViolation {
                        source_account: source.account.code.clone(),
                        expense_account: expense.account.code.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
