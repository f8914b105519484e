//! Journal entry aggregate: voucher header, lifecycle status, and lines.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use mizan_shared::types::{JournalEntryId, MemberId, SupplierId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::{EntryTotals, JournalItem, JournalLine};
use super::error::LedgerError;
use super::voucher::{VoucherNumber, VoucherPrefix};

/// Kind of voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherType {
    /// Money received.
    Receipt,
    /// Money paid out.
    Payment,
    /// Adjustments and transfers.
    Journal,
}

impl VoucherType {
    /// Stable uppercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "RECEIPT",
            Self::Payment => "PAYMENT",
            Self::Journal => "JOURNAL",
        }
    }

    /// Voucher number prefix.
    #[must_use]
    pub const fn prefix(self) -> VoucherPrefix {
        match self {
            Self::Receipt => VoucherPrefix::Rcp,
            Self::Payment => VoucherPrefix::Pay,
            Self::Journal => VoucherPrefix::Jrn,
        }
    }
}

impl std::fmt::Display for VoucherType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VoucherType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RECEIPT" => Ok(Self::Receipt),
            "PAYMENT" => Ok(Self::Payment),
            "JOURNAL" => Ok(Self::Journal),
            _ => Err(LedgerError::UnknownValue {
                kind: "voucher type",
                value: s.to_string(),
            }),
        }
    }
}

/// How money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Cash.
    Cash,
    /// UPI transfer.
    Upi,
    /// NEFT/IMPS/RTGS.
    BankTransfer,
    /// Cheque.
    Cheque,
}

impl PaymentMode {
    /// Stable uppercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Upi => "UPI",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Cheque => "CHEQUE",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "UPI" => Ok(Self::Upi),
            "BANK_TRANSFER" | "BANK" => Ok(Self::BankTransfer),
            "CHEQUE" => Ok(Self::Cheque),
            _ => Err(LedgerError::UnknownValue {
                kind: "payment mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a journal entry.
///
/// `Draft` (no lines) → `Pending` (lines attached, unvalidated) → `Valid` → `Finalized`.
/// `Pending` only exists inside a unit of work; it never survives a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// No lines yet.
    Draft,
    /// Lines attached, validation not yet run.
    Pending,
    /// Lines validated.
    Valid,
    /// Locked. Terminal.
    Finalized,
}

impl EntryStatus {
    /// Stable uppercase name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Pending => "PENDING",
            Self::Valid => "VALID",
            Self::Finalized => "FINALIZED",
        }
    }

    /// Returns true if the lifecycle allows moving from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft | Self::Valid, Self::Pending)
                | (Self::Pending, Self::Valid | Self::Draft)
                | (Self::Valid, Self::Finalized)
        )
    }

    /// Moves to `to`, or fails with `InvalidTransition`.
    pub fn transition(self, to: Self) -> Result<Self, LedgerError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(LedgerError::InvalidTransition { from: self, to })
        }
    }

    /// Returns true once no further change is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "PENDING" => Ok(Self::Pending),
            "VALID" => Ok(Self::Valid),
            "FINALIZED" => Ok(Self::Finalized),
            _ => Err(LedgerError::UnknownValue {
                kind: "entry status",
                value: s.to_string(),
            }),
        }
    }
}

/// Validates an Indian PAN (`AAAAA9999A`).
pub fn validate_pan(pan: &str) -> Result<(), LedgerError> {
    let bytes = pan.as_bytes();
    let valid = bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_uppercase)
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_uppercase();
    if valid {
        Ok(())
    } else {
        Err(LedgerError::InvalidPan(pan.to_string()))
    }
}

/// Donor named on a receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorRef {
    /// Registered member, if the donor is one.
    pub member_id: Option<MemberId>,
    /// Name entered manually for walk-in donors.
    pub name: Option<String>,
    /// Permanent Account Number for 80G certificates.
    pub pan: Option<String>,
}

impl DonorRef {
    /// A registered member.
    #[must_use]
    pub fn member(member_id: MemberId, name: impl Into<String>) -> Self {
        Self {
            member_id: Some(member_id),
            name: Some(name.into()),
            pan: None,
        }
    }

    /// A walk-in donor known only by name.
    #[must_use]
    pub fn walk_in(name: impl Into<String>) -> Self {
        Self {
            member_id: None,
            name: Some(name.into()),
            pan: None,
        }
    }

    /// Attaches a PAN.
    #[must_use]
    pub fn with_pan(mut self, pan: impl Into<String>) -> Self {
        self.pan = Some(pan.into());
        self
    }

    /// Returns true if neither a member nor a name is given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.member_id.is_none() && self.name.as_deref().is_none_or(|n| n.trim().is_empty())
    }

    /// Non-blank PAN, if any.
    #[must_use]
    pub fn pan(&self) -> Option<&str> {
        self.pan.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Supplier named on a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRef {
    /// Registered supplier.
    pub supplier_id: Option<SupplierId>,
    /// Supplier name.
    pub name: Option<String>,
}

/// Everything about an entry except its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Voucher kind.
    pub voucher_type: VoucherType,
    /// Caller-supplied voucher number. Generated when `None`.
    pub voucher_number: Option<String>,
    /// Transaction date.
    pub date: NaiveDate,
    /// Narration.
    pub narration: String,
    /// Donor, for receipts.
    pub donor: Option<DonorRef>,
    /// Supplier, for payments.
    pub supplier: Option<SupplierRef>,
    /// Payment mode.
    pub payment_mode: Option<PaymentMode>,
    /// Finalize immediately after validation.
    pub finalize: bool,
    /// Staff user recording the entry.
    pub created_by: Option<UserId>,
}

impl EntryHeader {
    /// Creates a header with a generated voucher number.
    #[must_use]
    pub fn new(voucher_type: VoucherType, date: NaiveDate, narration: impl Into<String>) -> Self {
        Self {
            voucher_type,
            voucher_number: None,
            date,
            narration: narration.into(),
            donor: None,
            supplier: None,
            payment_mode: None,
            finalize: false,
            created_by: None,
        }
    }

    /// Uses a caller-supplied voucher number.
    #[must_use]
    pub fn with_voucher_number(mut self, number: impl Into<String>) -> Self {
        self.voucher_number = Some(number.into());
        self
    }

    /// Sets the donor.
    #[must_use]
    pub fn with_donor(mut self, donor: DonorRef) -> Self {
        self.donor = Some(donor);
        self
    }

    /// Sets the supplier.
    #[must_use]
    pub fn with_supplier(mut self, supplier: SupplierRef) -> Self {
        self.supplier = Some(supplier);
        self
    }

    /// Sets the payment mode.
    #[must_use]
    pub const fn with_payment_mode(mut self, mode: PaymentMode) -> Self {
        self.payment_mode = Some(mode);
        self
    }

    /// Requests finalization on post.
    #[must_use]
    pub const fn finalized(mut self) -> Self {
        self.finalize = true;
        self
    }

    /// Records the creating user.
    #[must_use]
    pub const fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }

    /// Resolves the voucher number to use: the supplied one if present (which
    /// must carry this voucher type's prefix and the year of the entry date),
    /// else `None` for generation.
    pub fn supplied_voucher_number(&self) -> Result<Option<VoucherNumber>, LedgerError> {
        let Some(raw) = &self.voucher_number else {
            return Ok(None);
        };
        let number: VoucherNumber = raw.parse()?;
        if number.prefix() != self.voucher_type.prefix() || number.year() != self.date.year() {
            return Err(LedgerError::InvalidVoucherNumber(raw.clone()));
        }
        Ok(Some(number))
    }

    /// 80G compliance: a receipt above `threshold` naming a donor must carry a valid PAN.
    pub fn check_donor_pan(
        &self,
        total: Decimal,
        threshold: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        let Some(donor) = &self.donor else {
            return Ok(());
        };
        if let Some(pan) = donor.pan() {
            validate_pan(pan)?;
        }
        let Some(threshold) = threshold else {
            return Ok(());
        };
        if self.voucher_type == VoucherType::Receipt
            && !donor.is_empty()
            && donor.pan().is_none()
            && total > threshold
        {
            return Err(LedgerError::MissingDonorPan { total, threshold });
        }
        Ok(())
    }
}

/// A journal entry (voucher) with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Voucher number, unique across the ledger.
    pub voucher_number: VoucherNumber,
    /// Voucher kind.
    pub voucher_type: VoucherType,
    /// Transaction date.
    pub date: NaiveDate,
    /// Narration.
    pub narration: String,
    /// Donor, for receipts.
    pub donor: Option<DonorRef>,
    /// Supplier, for payments.
    pub supplier: Option<SupplierRef>,
    /// Payment mode.
    pub payment_mode: Option<PaymentMode>,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Staff user who recorded the entry.
    pub created_by: Option<UserId>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated.
    pub updated_at: DateTime<Utc>,
    /// Lines ordered by position.
    pub items: Vec<JournalItem>,
}

impl JournalEntry {
    /// Returns true if the entry is locked.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status == EntryStatus::Finalized
    }

    /// Lines in position order.
    pub fn lines(&self) -> impl Iterator<Item = &JournalLine> {
        self.items.iter().map(|item| &item.line)
    }

    /// Debit and credit totals.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::from_lines(self.lines())
    }

    /// Voucher amount (the debit total).
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.totals().total_debit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn receipt() -> EntryHeader {
        EntryHeader::new(
            VoucherType::Receipt,
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            "Friday collection",
        )
    }

    #[test]
    fn test_status_transitions() {
        assert!(EntryStatus::Draft.can_transition_to(EntryStatus::Pending));
        assert!(EntryStatus::Pending.can_transition_to(EntryStatus::Valid));
        assert!(EntryStatus::Valid.can_transition_to(EntryStatus::Finalized));
        assert!(EntryStatus::Valid.can_transition_to(EntryStatus::Pending));
        assert!(!EntryStatus::Draft.can_transition_to(EntryStatus::Finalized));
        assert!(!EntryStatus::Pending.can_transition_to(EntryStatus::Finalized));
        assert!(!EntryStatus::Finalized.can_transition_to(EntryStatus::Pending));
        assert!(EntryStatus::Finalized.is_terminal());

        assert!(matches!(
            EntryStatus::Draft.transition(EntryStatus::Finalized),
            Err(LedgerError::InvalidTransition {
                from: EntryStatus::Draft,
                to: EntryStatus::Finalized
            })
        ));
    }

    #[test]
    fn test_pan_format() {
        assert!(validate_pan("ABCDE1234F").is_ok());
        assert!(validate_pan("abcde1234f").is_err());
        assert!(validate_pan("ABCD1234F").is_err());
        assert!(validate_pan("ABCDE12345").is_err());
    }

    #[test]
    fn test_donor_pan_required_above_threshold() {
        let header = receipt().with_donor(DonorRef::walk_in("Abdul Rahman"));
        assert!(matches!(
            header.check_donor_pan(dec!(2500), Some(dec!(2000))),
            Err(LedgerError::MissingDonorPan { .. })
        ));
        assert!(header.check_donor_pan(dec!(2000), Some(dec!(2000))).is_ok());
        assert!(header.check_donor_pan(dec!(2500), None).is_ok());

        let with_pan =
            receipt().with_donor(DonorRef::walk_in("Abdul Rahman").with_pan("ABCDE1234F"));
        assert!(with_pan.check_donor_pan(dec!(2500), Some(dec!(2000))).is_ok());

        let bad_pan = receipt().with_donor(DonorRef::walk_in("Abdul Rahman").with_pan("12345"));
        assert!(matches!(
            bad_pan.check_donor_pan(dec!(100), Some(dec!(2000))),
            Err(LedgerError::InvalidPan(_))
        ));
    }

    #[test]
    fn test_anonymous_receipts_need_no_pan() {
        assert!(receipt().check_donor_pan(dec!(50000), Some(dec!(2000))).is_ok());
        let blank = receipt().with_donor(DonorRef::default());
        assert!(blank.check_donor_pan(dec!(50000), Some(dec!(2000))).is_ok());
    }

    #[test]
    fn test_supplied_voucher_number_must_match_type() {
        let header = receipt().with_voucher_number("RCP-2025-014");
        assert_eq!(
            header.supplied_voucher_number().unwrap().map(|n| n.to_string()),
            Some("RCP-2025-014".to_string())
        );

        let header = receipt().with_voucher_number("PAY-2025-014");
        assert!(matches!(
            header.supplied_voucher_number(),
            Err(LedgerError::InvalidVoucherNumber(_))
        ));

        // The year must be the calendar year of the entry date.
        let header = receipt().with_voucher_number("RCP-2019-007");
        assert!(matches!(
            header.supplied_voucher_number(),
            Err(LedgerError::InvalidVoucherNumber(number)) if number == "RCP-2019-007"
        ));
        assert_eq!(receipt().supplied_voucher_number().unwrap(), None);
    }
}
