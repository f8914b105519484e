//! String-backed enums stored in text columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum AccountType {
    /// Asset.
    #[sea_orm(string_value = "ASSET")]
    Asset,
    /// Liability.
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    /// Income.
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Expense.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// Equity.
    #[sea_orm(string_value = "EQUITY")]
    Equity,
}

/// Fund restriction class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum FundTag {
    /// Zakat.
    #[sea_orm(string_value = "ZAKAT")]
    Zakat,
    /// Sadaqah.
    #[sea_orm(string_value = "SADAQAH")]
    Sadaqah,
    /// Construction.
    #[sea_orm(string_value = "CONSTRUCTION")]
    Construction,
    /// General.
    #[sea_orm(string_value = "GENERAL")]
    General,
}

/// Voucher kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum VoucherType {
    /// Receipt.
    #[sea_orm(string_value = "RECEIPT")]
    Receipt,
    /// Payment.
    #[sea_orm(string_value = "PAYMENT")]
    Payment,
    /// Journal.
    #[sea_orm(string_value = "JOURNAL")]
    Journal,
}

/// How money moved.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMode {
    /// Cash.
    #[sea_orm(string_value = "CASH")]
    Cash,
    /// UPI.
    #[sea_orm(string_value = "UPI")]
    Upi,
    /// Bank transfer.
    #[sea_orm(string_value = "BANK_TRANSFER")]
    BankTransfer,
    /// Cheque.
    #[sea_orm(string_value = "CHEQUE")]
    Cheque,
}

/// Journal entry lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum EntryStatus {
    /// No lines.
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    /// Lines attached, unvalidated.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Validated.
    #[sea_orm(string_value = "VALID")]
    Valid,
    /// Locked.
    #[sea_orm(string_value = "FINALIZED")]
    Finalized,
}
