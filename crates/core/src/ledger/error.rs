//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during ledger operations:
//! chart of accounts errors, line and entry validation errors, fund restriction
//! violations, voucher numbering errors, and entry lifecycle errors.

use mizan_shared::types::AccountId;
use mizan_shared::{AppError, Rejection};
use rust_decimal::Decimal;
use thiserror::Error;

use super::account::AccountType;
use super::transaction::EntryStatus;

/// Why an account cannot be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionReason {
    /// The account is part of the system chart.
    System,
    /// Journal lines reference the account.
    Referenced(u64),
    /// Other accounts are parented under it.
    HasChildren(u64),
}

impl std::fmt::Display for ProtectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "it is a system account"),
            Self::Referenced(count) => write!(f, "{count} journal line(s) reference it"),
            Self::HasChildren(count) => write!(f, "it has {count} child account(s)"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Chart of Accounts Errors ==========
    /// Another account already uses this code.
    #[error("Account code {0} is already in use")]
    DuplicateCode(String),

    /// Account cannot be deleted.
    #[error("Account {code} cannot be deleted: {reason}")]
    ProtectedAccount {
        /// Code of the protected account.
        code: String,
        /// Why deletion was refused.
        reason: ProtectionReason,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Parent account not found.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    /// Reparenting would create a cycle in the chart.
    #[error("Account {account} cannot be placed under {parent}: the chart would contain a cycle")]
    ParentCycle {
        /// Account being moved.
        account: AccountId,
        /// Requested parent.
        parent: AccountId,
    },

    /// Account type cannot change after creation.
    #[error("Account {code} is {current}; its type cannot be changed to {requested}")]
    AccountTypeImmutable {
        /// Account code.
        code: String,
        /// Current type.
        current: AccountType,
        /// Requested type.
        requested: AccountType,
    },

    /// An account exists under a well-known code but with the wrong type.
    #[error("Account {code} is {actual}, expected {expected}")]
    AccountTypeMismatch {
        /// Account code.
        code: String,
        /// Type required by the caller.
        expected: AccountType,
        /// Type found in the chart.
        actual: AccountType,
    },

    /// A stored or supplied enumeration value was not recognized.
    #[error("Unknown {kind}: {value}")]
    UnknownValue {
        /// Which enumeration was being parsed.
        kind: &'static str,
        /// The unrecognized text.
        value: String,
    },

    // ========== Line & Entry Validation Errors ==========
    /// A line must carry exactly one strictly positive side.
    #[error("Line must have exactly one positive side. Debit: {debit}, Credit: {credit}")]
    InvalidLine {
        /// Debit amount supplied.
        debit: Decimal,
        /// Credit amount supplied.
        credit: Decimal,
    },

    /// Amount has more precision than one paisa.
    #[error("Amount {0} has more than two decimal places")]
    ExcessPrecision(Decimal),

    /// Amount cannot be represented in storage.
    #[error("Amount {0} is out of range")]
    AmountOutOfRange(Decimal),

    /// Entry is not balanced (debits != credits).
    #[error("Entry is not balanced. Debit: {total_debit}, Credit: {total_credit}")]
    UnbalancedEntry {
        /// Sum of all debits.
        total_debit: Decimal,
        /// Sum of all credits.
        total_credit: Decimal,
    },

    /// Restricted fund money would pay an expense outside its fund.
    #[error("Fund mixing: {source_account} cannot fund expense {expense_account}")]
    FundMixingViolation {
        /// Code of the account the money comes from.
        source_account: String,
        /// Code of the expense account being paid.
        expense_account: String,
    },

    /// Receipt above the 80G threshold names a donor without a PAN.
    #[error("Donor PAN is required for receipts above {threshold} (total {total})")]
    MissingDonorPan {
        /// Receipt total.
        total: Decimal,
        /// Configured threshold.
        threshold: Decimal,
    },

    /// PAN is not in the `AAAAA9999A` format.
    #[error("Invalid PAN: {0}")]
    InvalidPan(String),

    /// Membership fee/donation split does not add up.
    #[error("Invalid membership split: {0}")]
    InvalidSplit(String),

    // ========== Voucher Errors ==========
    /// Voucher number is not of the form `PREFIX-YEAR-NNN`.
    #[error("Invalid voucher number: {0}")]
    InvalidVoucherNumber(String),

    /// Voucher number is already taken.
    #[error("Voucher number {0} already exists")]
    DuplicateVoucherNumber(String),

    // ========== Entry State Errors ==========
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(String),

    /// Finalized entries are immutable.
    #[error("Journal entry {0} is finalized and cannot be modified")]
    EntryFinalized(String),

    /// Status change is not allowed by the entry lifecycle.
    #[error("Cannot move journal entry from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EntryStatus,
        /// Requested status.
        to: EntryStatus,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::ProtectedAccount { .. } => "PROTECTED_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::ParentCycle { .. } => "PARENT_CYCLE",
            Self::AccountTypeImmutable { .. } => "ACCOUNT_TYPE_IMMUTABLE",
            Self::AccountTypeMismatch { .. } => "ACCOUNT_TYPE_MISMATCH",
            Self::UnknownValue { .. } => "UNKNOWN_VALUE",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::ExcessPrecision(_) => "EXCESS_PRECISION",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::FundMixingViolation { .. } => "FUND_MIXING_VIOLATION",
            Self::MissingDonorPan { .. } => "MISSING_DONOR_PAN",
            Self::InvalidPan(_) => "INVALID_PAN",
            Self::InvalidSplit(_) => "INVALID_SPLIT",
            Self::InvalidVoucherNumber(_) => "INVALID_VOUCHER_NUMBER",
            Self::DuplicateVoucherNumber(_) => "DUPLICATE_VOUCHER_NUMBER",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::EntryFinalized(_) => "ENTRY_FINALIZED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidLine { .. }
            | Self::ExcessPrecision(_)
            | Self::AmountOutOfRange(_)
            | Self::UnknownValue { .. }
            | Self::InvalidPan(_)
            | Self::InvalidSplit(_)
            | Self::InvalidVoucherNumber(_)
            | Self::ParentCycle { .. } => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::ParentNotFound(_) | Self::EntryNotFound(_) => 404,

            // 409 Conflict - uniqueness and state conflicts
            Self::DuplicateCode(_)
            | Self::DuplicateVoucherNumber(_)
            | Self::EntryFinalized(_)
            | Self::InvalidTransition { .. } => 409,

            // 422 Unprocessable - accounting rule violations
            Self::ProtectedAccount { .. }
            | Self::AccountInactive(_)
            | Self::AccountTypeImmutable { .. }
            | Self::AccountTypeMismatch { .. }
            | Self::UnbalancedEntry { .. }
            | Self::FundMixingViolation { .. }
            | Self::MissingDonorPan { .. } => 422,
        }
    }

    /// Returns true if the proposed entry itself is invalid, as opposed to a
    /// lookup or state problem.
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidLine { .. }
                | Self::ExcessPrecision(_)
                | Self::UnbalancedEntry { .. }
                | Self::FundMixingViolation { .. }
                | Self::AccountInactive(_)
                | Self::MissingDonorPan { .. }
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let rejection = Rejection::new(err.error_code(), err.to_string());
        match err.http_status_code() {
            404 => Self::NotFound(rejection),
            409 => Self::Conflict(rejection),
            422 => Self::BusinessRule(rejection),
            _ => Self::Validation(rejection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::UnbalancedEntry {
                total_debit: dec!(100),
                total_credit: dec!(50),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(
            LedgerError::FundMixingViolation {
                source_account: "4003".into(),
                expense_account: "5001".into(),
            }
            .error_code(),
            "FUND_MIXING_VIOLATION"
        );
        assert_eq!(LedgerError::DuplicateCode("1001".into()).error_code(), "DUPLICATE_CODE");
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            LedgerError::InvalidLine {
                debit: dec!(500),
                credit: dec!(500),
            }
            .http_status_code(),
            400
        );
        assert_eq!(LedgerError::AccountNotFound(AccountId::new()).http_status_code(), 404);
        assert_eq!(
            LedgerError::DuplicateVoucherNumber("RCP-2025-001".into()).http_status_code(),
            409
        );
        assert_eq!(
            LedgerError::ProtectedAccount {
                code: "1001".into(),
                reason: ProtectionReason::System,
            }
            .http_status_code(),
            422
        );
    }

    #[test]
    fn test_converts_into_app_error() {
        let app: AppError = LedgerError::EntryNotFound("RCP-2025-009".into()).into();
        assert!(matches!(app, AppError::NotFound(_)));

        let app: AppError = LedgerError::FundMixingViolation {
            source_account: "4003".into(),
            expense_account: "5001".into(),
        }
        .into();
        assert!(matches!(app, AppError::BusinessRule(_)));
        assert_eq!(app.status_code(), 422);
        assert_eq!(app.error_code(), "FUND_MIXING_VIOLATION");

        let app: AppError = LedgerError::EntryFinalized("PAY-2025-001".into()).into();
        assert!(matches!(app, AppError::Conflict(_)));

        let app: AppError = LedgerError::ExcessPrecision(dec!(1.005)).into();
        assert!(matches!(app, AppError::Validation(_)));
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::UnbalancedEntry {
            total_debit: dec!(100.00),
            total_credit: dec!(50.00),
        };
        assert_eq!(err.to_string(), "Entry is not balanced. Debit: 100.00, Credit: 50.00");

        let err = LedgerError::ProtectedAccount {
            code: "1001".into(),
            reason: ProtectionReason::Referenced(3),
        };
        assert_eq!(
            err.to_string(),
            "Account 1001 cannot be deleted: 3 journal line(s) reference it"
        );

        let err = LedgerError::AccountTypeImmutable {
            code: "5001".into(),
            current: AccountType::Expense,
            requested: AccountType::Asset,
        };
        assert_eq!(
            err.to_string(),
            "Account 5001 is EXPENSE; its type cannot be changed to ASSET"
        );
    }
}
