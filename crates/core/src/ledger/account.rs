//! Ledger accounts: types, fund tags, and the well-known accounts the
//! membership integration posts against.

use mizan_shared::config::WellKnownCodes;
use mizan_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use super::balance::NormalBalance;
use super::error::LedgerError;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Resources held (bank, cash).
    Asset,
    /// Obligations (amanat deposits, payables).
    Liability,
    /// Receipts (fees, donations, zakat collections).
    Income,
    /// Spending (salaries, relief).
    Expense,
    /// Corpus and accumulated funds.
    Equity,
}

impl AccountType {
    /// All account types in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
    ];

    /// Stable uppercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Equity => "EQUITY",
        }
    }

    /// Side on which this account type grows.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Income | Self::Equity => NormalBalance::Credit,
        }
    }

    /// Income and expense accounts are expected to carry a fund tag.
    #[must_use]
    pub const fn expects_fund_tag(self) -> bool {
        matches!(self, Self::Income | Self::Expense)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASSET" => Ok(Self::Asset),
            "LIABILITY" => Ok(Self::Liability),
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            "EQUITY" => Ok(Self::Equity),
            _ => Err(LedgerError::UnknownValue {
                kind: "account type",
                value: s.to_string(),
            }),
        }
    }
}

/// Restriction class of the money an account holds or spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundTag {
    /// Zakat; may only be spent on zakat-eligible purposes.
    Zakat,
    /// Voluntary charity.
    Sadaqah,
    /// Earmarked for construction.
    Construction,
    /// Unrestricted.
    General,
}

impl FundTag {
    /// All fund tags.
    pub const ALL: [Self; 4] = [Self::Zakat, Self::Sadaqah, Self::Construction, Self::General];

    /// Stable uppercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zakat => "ZAKAT",
            Self::Sadaqah => "SADAQAH",
            Self::Construction => "CONSTRUCTION",
            Self::General => "GENERAL",
        }
    }
}

impl std::fmt::Display for FundTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FundTag {
    type Err = LedgerError;

    /// Accepts the plain tag names and the legacy `RESTRICTED_*` / `UNRESTRICTED_GENERAL`
    /// spellings found in imported charts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ZAKAT" | "RESTRICTED_ZAKAT" => Ok(Self::Zakat),
            "SADAQAH" | "RESTRICTED_SADAQAH" => Ok(Self::Sadaqah),
            "CONSTRUCTION" | "RESTRICTED_CONSTRUCTION" => Ok(Self::Construction),
            "GENERAL" | "UNRESTRICTED_GENERAL" => Ok(Self::General),
            _ => Err(LedgerError::UnknownValue {
                kind: "fund tag",
                value: s.to_string(),
            }),
        }
    }
}

/// An account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique account code (e.g. "1001").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification. Immutable after creation.
    pub account_type: AccountType,
    /// Fund restriction class.
    pub fund_tag: Option<FundTag>,
    /// Parent account in the chart tree.
    pub parent_id: Option<AccountId>,
    /// System accounts cannot be deleted.
    pub is_system: bool,
    /// Inactive accounts cannot be posted to.
    pub is_active: bool,
}

/// Advisory about how an account's fund tag fits its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundTagAdvisory {
    /// An income or expense account has no fund tag.
    MissingOnIncomeOrExpense,
    /// A balance-sheet account carries a fund tag.
    UnexpectedOnBalanceSheet,
}

impl std::fmt::Display for FundTagAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOnIncomeOrExpense => {
                write!(f, "income and expense accounts should carry a fund tag")
            }
            Self::UnexpectedOnBalanceSheet => {
                write!(f, "fund tags are not expected on balance-sheet accounts")
            }
        }
    }
}

/// Checks the fund-tag recommendation. Never fails; callers log the advisory.
#[must_use]
pub fn fund_tag_advisory(
    account_type: AccountType,
    fund_tag: Option<FundTag>,
) -> Option<FundTagAdvisory> {
    match (account_type.expects_fund_tag(), fund_tag) {
        (true, None) => Some(FundTagAdvisory::MissingOnIncomeOrExpense),
        (false, Some(_)) => Some(FundTagAdvisory::UnexpectedOnBalanceSheet),
        _ => None,
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Fund restriction class.
    pub fund_tag: Option<FundTag>,
    /// Parent account.
    pub parent_id: Option<AccountId>,
    /// Protect from deletion.
    pub is_system: bool,
}

impl NewAccount {
    /// Creates input for an active, non-system, top-level account.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            fund_tag: None,
            parent_id: None,
            is_system: false,
        }
    }

    /// Sets the fund tag.
    #[must_use]
    pub const fn with_fund_tag(mut self, fund_tag: FundTag) -> Self {
        self.fund_tag = Some(fund_tag);
        self
    }

    /// Places the account under `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Marks the account as a protected system account.
    #[must_use]
    pub const fn system(mut self) -> Self {
        self.is_system = true;
        self
    }
}

/// Changes to an existing account. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    /// New code.
    pub code: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// Requested type. Rejected unless equal to the current type.
    pub account_type: Option<AccountType>,
    /// New fund tag; `Some(None)` clears it.
    pub fund_tag: Option<Option<FundTag>>,
    /// New parent; `Some(None)` moves the account to the top level.
    pub parent_id: Option<Option<AccountId>>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
}

impl AccountChanges {
    /// Applies the changes to `account`, enforcing type immutability.
    ///
    /// Parent validity is checked separately against the chart.
    pub fn apply_to(&self, account: &mut LedgerAccount) -> Result<(), LedgerError> {
        if let Some(requested) = self.account_type
            && requested != account.account_type
        {
            return Err(LedgerError::AccountTypeImmutable {
                code: account.code.clone(),
                current: account.account_type,
                requested,
            });
        }
        if let Some(code) = &self.code {
            account.code.clone_from(code);
        }
        if let Some(name) = &self.name {
            account.name.clone_from(name);
        }
        if let Some(fund_tag) = self.fund_tag {
            account.fund_tag = fund_tag;
        }
        if let Some(parent_id) = self.parent_id {
            account.parent_id = parent_id;
        }
        if let Some(is_active) = self.is_active {
            account.is_active = is_active;
        }
        Ok(())
    }
}

/// Accounts the ledger provisions on demand for integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownAccount {
    /// Bank account receiving online payments.
    Bank,
    /// Membership subscription income.
    MembershipFees,
    /// Voluntary donation income.
    GeneralDonations,
}

impl WellKnownAccount {
    /// Account type the well-known account must have.
    #[must_use]
    pub const fn account_type(self) -> AccountType {
        match self {
            Self::Bank => AccountType::Asset,
            Self::MembershipFees | Self::GeneralDonations => AccountType::Income,
        }
    }

    /// Name used when the account is created.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Bank => "Bank Account (Default)",
            Self::MembershipFees => "Membership Fees",
            Self::GeneralDonations => "General Donations",
        }
    }

    /// Fund tag used when the account is created.
    #[must_use]
    pub const fn fund_tag(self) -> Option<FundTag> {
        match self {
            Self::Bank => None,
            Self::MembershipFees | Self::GeneralDonations => Some(FundTag::General),
        }
    }

    /// Configured code for this account.
    #[must_use]
    pub fn code(self, codes: &WellKnownCodes) -> &str {
        match self {
            Self::Bank => &codes.bank,
            Self::MembershipFees => &codes.membership_fees,
            Self::GeneralDonations => &codes.general_donations,
        }
    }

    /// Matcher resolving this account within the chart.
    #[must_use]
    pub fn matcher(self, codes: &WellKnownCodes) -> AccountMatcher {
        AccountMatcher {
            code: self.code(codes).to_string(),
            account_type: self.account_type(),
        }
    }

    /// Creation defaults for this account.
    #[must_use]
    pub fn defaults(self, codes: &WellKnownCodes) -> NewAccount {
        let account =
            NewAccount::new(self.code(codes), self.default_name(), self.account_type()).system();
        match self.fund_tag() {
            Some(tag) => account.with_fund_tag(tag),
            None => account,
        }
    }
}

/// Identifies an account by code and the type it must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMatcher {
    /// Account code.
    pub code: String,
    /// Required account type.
    pub account_type: AccountType,
}

impl AccountMatcher {
    /// Checks a found account against the matcher.
    ///
    /// An account with the right code but the wrong type is an error, never a silent match.
    pub fn check(&self, account: &LedgerAccount) -> Result<(), LedgerError> {
        if account.account_type == self.account_type {
            Ok(())
        } else {
            Err(LedgerError::AccountTypeMismatch {
                code: account.code.clone(),
                expected: self.account_type,
                actual: account.account_type,
            })
        }
    }
}
